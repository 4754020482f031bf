// src/lib.rs
// =============================================================================
// link-checker: find broken links in a source tree.
//
// The pieces, in the order a scan uses them:
// - scan:    walk the directory, pick files, run everything below
// - extract: pull links out of Markdown, JSX/TSX and HTML
// - checker: classify links and validate them (filesystem or HTTP)
// - cache:   remember external results between runs
// - report:  turn results into text
//
// Quick use from Rust:
//
//   let options = ScanOptions::default();
//   let results = scan_directory(Path::new("."), &options).await?;
//   println!("{}", format_report(&results));
// =============================================================================

pub mod cache;
pub mod checker;
pub mod error;
pub mod extract;
pub mod link;
pub mod logging;
pub mod report;
pub mod scan;

pub use checker::{validate_link, HttpProbe, LinkKind, LinkProbe};
pub use error::{CacheError, ScanError};
pub use extract::{extract_html_links, extract_jsx_links, extract_links, extract_markdown_links};
pub use link::{LinkInfo, LinkOccurrence, LinkSource, LinkSummary, Location, ValidationResult};
pub use report::{format_report, summarize};
pub use scan::{check_directory, scan_directory, CacheLookup, ScanOptions, Scanner};
