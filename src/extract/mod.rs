// src/extract/mod.rs
// =============================================================================
// This module finds links in source files.
//
// Submodules:
// - markdown: .md / .mdx files (pulldown-cmark plus a pass for definitions)
// - jsx: .js / .jsx / .ts / .tsx files (imports, attributes)
// - html: <a>/<img>/<source> tags, also used inside the other two
// - position: byte offset -> line/column
//
// Every extractor is a pure function: same input, same output, no I/O, and
// malformed syntax just means "no match" instead of an error.
// =============================================================================

mod html;
mod jsx;
mod markdown;
mod position;

pub use html::extract_html_links;
pub use jsx::extract_jsx_links;
pub use markdown::extract_markdown_links;

use std::collections::HashSet;
use std::path::Path;

use crate::link::{LinkOccurrence, LinkSource};

/// File extensions the scanner looks at by default.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["md", "mdx", "js", "jsx", "ts", "tsx"];

/// The extraction strategy for one kind of file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Markdown,
    Jsx,
    Html,
}

impl Extractor {
    // Picks the extractor from the file extension (case-insensitive)
    //
    // Returns None for files we don't know how to read.
    pub fn for_path(path: &Path) -> Option<Extractor> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "md" | "mdx" => Some(Extractor::Markdown),
            "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" => Some(Extractor::Jsx),
            "html" | "htm" => Some(Extractor::Html),
            _ => None,
        }
    }

    pub fn extract(self, content: &str, file_path: &str) -> Vec<LinkOccurrence> {
        match self {
            Extractor::Markdown => extract_markdown_links(content, file_path),
            Extractor::Jsx => extract_jsx_links(content, file_path),
            Extractor::Html => extract_html_links(content, file_path),
        }
    }
}

// Convenience wrapper: choose by extension, then extract
//
// Unknown extensions go through the JSX extractor, which also covers plain
// HTML tags.
pub fn extract_links(content: &str, file_path: &str) -> Vec<LinkOccurrence> {
    Extractor::for_path(Path::new(file_path))
        .unwrap_or(Extractor::Jsx)
        .extract(content, file_path)
}

// A match before it is turned into a LinkOccurrence
#[derive(Debug, Clone)]
pub(crate) struct RawMatch {
    /// Byte offset of the first character of the URL
    pub offset: usize,
    pub url: String,
    pub source: LinkSource,
}

// Sorts matches by position and drops duplicates of the same token
//
// Two patterns matching the same (offset, url) describe one occurrence; the
// more specialized source (lower priority value) is kept. Matches at
// different offsets are always kept, even when the URL repeats.
pub(crate) fn dedupe(mut matches: Vec<RawMatch>) -> Vec<RawMatch> {
    matches.sort_by(|a, b| {
        a.offset
            .cmp(&b.offset)
            .then_with(|| a.source.priority().cmp(&b.source.priority()))
    });

    let mut seen = HashSet::new();
    matches.retain(|m| seen.insert((m.offset, m.url.clone())));
    matches
}
