// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There is a single command: point it at a directory and it scans it.
//
//   link-checker                       # scan the current directory
//   link-checker docs --live           # also make real HTTP requests
//   link-checker . --exclude "**/dist/**" --json
//
// Rust concepts:
// - Derive macros: #[derive(Parser)] generates the parsing code
// - Option<T>: for flags that may or may not be given
// - Vec<T>: for flags that can be repeated
// =============================================================================

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use link_checker::cache::{DEFAULT_CONFIG_PATH, DEFAULT_SKIP_CONFIG_PATH};
use link_checker::logging::LogLevel;
use link_checker::scan::{DEFAULT_CONCURRENCY, DEFAULT_EXCLUDES};
use link_checker::ScanOptions;

#[derive(Parser, Debug)]
#[command(
    name = "link-checker",
    version,
    about = "Scan a source tree for broken links in Markdown, JSX/TSX and HTML",
    long_about = "link-checker finds every link, image, import and href in a project's \
                  Markdown and JSX/TSX files, checks internal links against the filesystem \
                  and external links by URL syntax (or with real requests using --live). \
                  It exits with code 1 when any link is broken, so it drops straight into CI."
)]
pub struct Cli {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Check external links with real HTTP requests
    ///
    /// Without this flag external links only get a URL syntax check.
    /// overrides_with lets a later --no-live win over an earlier --live.
    #[arg(long, overrides_with = "no_live")]
    pub live: bool,

    /// Only check URL syntax for external links (the default)
    #[arg(long, overrides_with = "live")]
    pub no_live: bool,

    /// Only scan files matching this glob (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip files matching this glob (repeatable, added to the defaults)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Maximum number of external checks in flight at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Per-request timeout for live checks, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    pub timeout: u64,

    /// Result cache file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Skip cache file (recently failed URLs)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SKIP_CONFIG_PATH)]
    pub skip_config: PathBuf,

    /// Don't read or write any cache file
    #[arg(long)]
    pub no_cache: bool,

    /// Print results as JSON instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Also write the text report to this file
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// How much to log to stderr
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,
}

impl Cli {
    // Builds the library options from the parsed flags
    pub fn scan_options(&self) -> ScanOptions {
        let mut exclude_patterns: Vec<String> =
            DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect();
        exclude_patterns.extend(self.exclude.iter().cloned());

        ScanOptions {
            check_live_links: self.live && !self.no_live,
            include_patterns: self.include.clone(),
            exclude_patterns,
            concurrent: self.concurrency,
            timeout: Duration::from_millis(self.timeout),
        }
    }
}

// Rejects 0 at parse time; a pool of zero workers would never finish
fn parse_concurrency(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a Vec<String> for --include?
//    - clap collects every occurrence of a repeated flag into the Vec
//    - `--include "docs/**" --include "*.md"` gives a Vec with two items
//
// 2. Why PathBuf instead of String for paths?
//    - PathBuf is the owned path type; it handles OS-specific separators
//    - It converts to &Path for free when passing it to functions
//
// 3. What does value_parser = parse_concurrency do?
//    - clap calls our function to turn the text into a number
//    - Returning Err makes clap print the message and exit with a usage error
//
// 4. Why is scan_options() a method here?
//    - The library doesn't know about clap; ScanOptions is plain data
//    - Keeping the conversion next to the flags makes it easy to keep in sync
// -----------------------------------------------------------------------------
