// src/extract/html.rs
// =============================================================================
// This module extracts links from HTML-like text: real HTML, the raw HTML
// blocks people drop into Markdown, and the plain tags inside JSX.
//
// We look for three tags:
// - <a href="...">
// - <img src="...">
// - <source src="...">
//
// Why regex instead of a real HTML parser?
// - We need the exact line and column of every URL, and DOM parsers throw
//   source positions away
// - The input is often not a full document (a JSX file, a Markdown snippet)
// - Broken markup should simply produce no match, never an error
//
// Rust concepts:
// - LazyLock: a value built on first use and then shared (read-only)
// - captures_iter: an iterator over all regex matches, with its own state,
//   so the shared Regex can be used from many threads at once
// =============================================================================

use regex::Regex;
use std::sync::LazyLock;

use super::position::LineIndex;
use super::RawMatch;
use crate::link::{LinkOccurrence, LinkSource, Location};

// Matches the tag name, any attributes before the one we want, then the
// quoted value. [^>] also matches newlines, so tags split over several
// lines work too.
//
// The pattern is a constant and known to be valid, so unwrap() is fine here.
static TAG_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<(?:a\b[^>]*?\shref|(?:img|source)\b[^>]*?\ssrc)\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
    )
    .unwrap()
});

// Extracts all <a>/<img>/<source> URLs from HTML-like text
//
// Parameters:
//   content: the file content (borrowed as &str)
//   file_path: path relative to the scan root, stored in each Location
//
// Returns: one LinkOccurrence per tag, in the order they appear
//
// Example:
//   content = "<p>\n  <a href=\"/docs\">Docs</a>\n</p>"
//   result  = [LinkOccurrence { url: "/docs", line 2, column 12 }]
pub fn extract_html_links(content: &str, file_path: &str) -> Vec<LinkOccurrence> {
    let index = LineIndex::new(content);

    html_matches(content)
        .into_iter()
        .map(|m| {
            let (line, column) = index.position(m.offset);
            LinkOccurrence::new(m.url, Location::new(file_path, line, column), m.source)
        })
        .collect()
}

// The raw matches, as byte offsets into `text`
//
// Shared with the Markdown and JSX extractors, which map the offsets
// themselves.
pub(super) fn html_matches(text: &str) -> Vec<RawMatch> {
    TAG_URL
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|value| RawMatch {
            offset: value.start(),
            url: value.as_str().to_string(),
            source: LinkSource::HtmlTag,
        })
        .collect()
}
