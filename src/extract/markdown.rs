// src/extract/markdown.rs
// =============================================================================
// This module extracts links from Markdown text.
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Follows the CommonMark specification
// - Can tell us the byte range each event came from (into_offset_iter)
//
// What we pick up:
// - Inline links and images:   [text](url)   ![alt](url)
// - Autolinks:                 <https://example.com>   <me@example.com>
// - Reference definitions:     [ref]: url
// - Raw HTML:                  <a href="...">, <img src="...">
// - JSX samples in fenced code blocks tagged js/jsx/ts/tsx/html
//
// Other code blocks are skipped: a link inside ```bash``` is an example, not
// a real link.
//
// Rust concepts:
// - Iterators: For processing sequences of items
// - Pattern matching: To identify link events
// - Ranges: start..end byte positions into the original text
// =============================================================================

use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use super::html::html_matches;
use super::jsx::jsx_matches;
use super::position::LineIndex;
use super::{dedupe, RawMatch};
use crate::link::{LinkOccurrence, LinkSource, Location};

// Code fence languages whose content we scan as JSX
const JSX_FENCE_LANGUAGES: &[&str] = &[
    "js",
    "jsx",
    "ts",
    "tsx",
    "javascript",
    "typescript",
    "html",
];

// `[label]: destination` at the start of a line (up to 3 spaces indent).
// pulldown-cmark resolves definitions silently, so we find them ourselves.
static REFERENCE_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ {0,3}\[([^\]\n]+)\]:[ \t]*(?:<([^>\n]*)>|([^\s<]\S*))").unwrap()
});

// Extracts all links from Markdown text
//
// Parameters:
//   markdown: the markdown text to parse (borrowed as &str)
//   file_path: path relative to the scan root, stored in each Location
//
// Returns: Vec<LinkOccurrence>, sorted by position
//
// Example input:
//   "# Test\n[Example](https://example.com)"
//
// Example output:
//   [LinkOccurrence { url: "https://example.com", line 2, column 11 }]
pub fn extract_markdown_links(markdown: &str, file_path: &str) -> Vec<LinkOccurrence> {
    let index = LineIndex::new(markdown);
    let mut matches = Vec::new();

    // Byte ranges of every code block, so definitions inside them are ignored
    let mut code_blocks: Vec<Range<usize>> = Vec::new();
    // Raw HTML arrives one line at a time; we glue neighbours back together
    let mut html_blocks: Vec<Range<usize>> = Vec::new();

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    for (event, range) in Parser::new_ext(markdown, options).into_offset_iter() {
        match event {
            // In pulldown-cmark 0.9, Link is Tag::Link(link_type, dest_url, title)
            Event::Start(Tag::Link(link_type, dest_url, _title)) => {
                let found = match link_type {
                    LinkType::Inline => Some(RawMatch {
                        offset: inline_url_offset(markdown, &range, &dest_url),
                        url: dest_url.to_string(),
                        source: LinkSource::MarkdownLink,
                    }),
                    LinkType::Autolink => Some(RawMatch {
                        offset: range.start + 1,
                        url: dest_url.to_string(),
                        source: LinkSource::MarkdownAutolink,
                    }),
                    LinkType::Email => Some(RawMatch {
                        offset: range.start + 1,
                        url: format!("mailto:{}", dest_url),
                        source: LinkSource::MarkdownAutolink,
                    }),
                    // [text][ref] and friends: the definition line is the
                    // occurrence, see reference_definitions()
                    _ => None,
                };
                matches.extend(found);
            }

            Event::Start(Tag::Image(LinkType::Inline, dest_url, _title)) => {
                matches.push(RawMatch {
                    offset: inline_url_offset(markdown, &range, &dest_url),
                    url: dest_url.to_string(),
                    source: LinkSource::MarkdownImage,
                });
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                if is_jsx_fence(&kind) {
                    matches.extend(offset_by(
                        jsx_matches(&markdown[range.clone()]),
                        range.start,
                    ));
                }
                code_blocks.push(range);
            }

            Event::Html(_) => {
                let joins_previous = html_blocks.last().is_some_and(|last| {
                    markdown
                        .get(last.end..range.start)
                        .is_some_and(|gap| gap.trim().is_empty())
                });
                if joins_previous {
                    if let Some(last) = html_blocks.last_mut() {
                        last.end = range.end;
                    }
                } else {
                    html_blocks.push(range);
                }
            }

            // We don't care about other events (text, headings, etc.)
            _ => {}
        }
    }

    for block in html_blocks {
        matches.extend(offset_by(html_matches(&markdown[block.clone()]), block.start));
    }

    matches.extend(reference_definitions(markdown, &code_blocks));

    dedupe(matches)
        .into_iter()
        .map(|m| {
            let (line, column) = index.position(m.offset);
            LinkOccurrence::new(m.url, Location::new(file_path, line, column), m.source)
        })
        .collect()
}

// Finds where the destination starts inside `[text](dest "title")`
//
// The event range covers the whole link. We look for the "](" that is
// followed by the destination; if the destination was rewritten by the
// parser (escapes, entities) we settle for the last "](".
fn inline_url_offset(markdown: &str, range: &Range<usize>, dest_url: &str) -> usize {
    let Some(slice) = markdown.get(range.clone()) else {
        return range.start;
    };

    let mut fallback = None;
    for (pos, _) in slice.match_indices("](") {
        let (offset, rest) = after_paren(slice, pos);
        if rest.starts_with(dest_url) {
            return range.start + offset;
        }
        fallback = Some(offset);
    }

    range.start + fallback.unwrap_or(0)
}

// Skips "](", whitespace and an opening '<'; returns the offset within
// `slice` and the text from there on
fn after_paren(slice: &str, pos: usize) -> (usize, &str) {
    let rest = &slice[pos + 2..];
    let skipped = rest.len() - rest.trim_start().len();
    let rest = &rest[skipped..];
    let angle = usize::from(rest.starts_with('<'));
    (pos + 2 + skipped + angle, &rest[angle..])
}

// ```jsx, ```tsx title="x", ```html ... (the info string's first word)
fn is_jsx_fence(kind: &CodeBlockKind) -> bool {
    match kind {
        CodeBlockKind::Fenced(info) => {
            let language = info.split_whitespace().next().unwrap_or("");
            JSX_FENCE_LANGUAGES
                .iter()
                .any(|l| l.eq_ignore_ascii_case(language))
        }
        CodeBlockKind::Indented => false,
    }
}

// `[ref]: url` lines outside code blocks. Footnotes (`[^1]: ...`) are not
// links and are skipped.
fn reference_definitions(markdown: &str, code_blocks: &[Range<usize>]) -> Vec<RawMatch> {
    REFERENCE_DEFINITION
        .captures_iter(markdown)
        .filter(|caps| !caps[1].starts_with('^'))
        .filter_map(|caps| caps.get(2).or_else(|| caps.get(3)))
        .filter(|dest| !code_blocks.iter().any(|block| block.contains(&dest.start())))
        .map(|dest| RawMatch {
            offset: dest.start(),
            url: dest.as_str().to_string(),
            source: LinkSource::MarkdownReference,
        })
        .collect()
}

fn offset_by(matches: Vec<RawMatch>, base: usize) -> Vec<RawMatch> {
    matches
        .into_iter()
        .map(|mut m| {
            m.offset += base;
            m
        })
        .collect()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does into_offset_iter() add?
//    - A normal Parser yields just events
//    - into_offset_iter() yields (event, byte_range) pairs
//    - The range tells us where in the original text the event came from,
//      which is how we compute line and column numbers
//
// 2. What is `let ... else`?
//    - let Some(x) = value else { return ...; };
//    - Binds x when the pattern matches, otherwise runs the else block,
//      which must leave the function (return, break, continue, panic)
//
// 3. Why collect RawMatch first and convert later?
//    - Offsets from code blocks and HTML are relative to a snippet
//    - Adding the snippet start (offset_by) makes them file offsets
//    - Then one LineIndex turns all of them into line/column at the end
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(links: &[LinkOccurrence]) -> Vec<&str> {
        links.iter().map(|l| l.url.as_str()).collect()
    }

    #[test]
    fn test_extract_links_with_lines() {
        let markdown = "# Test\n[Example](https://example.com)\n[Google](https://google.com)";
        let links = extract_markdown_links(markdown, "test.md");

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://example.com");
        assert_eq!(links[0].location.line_number, 2);
        assert_eq!(links[1].url, "https://google.com");
        assert_eq!(links[1].location.line_number, 3);
        assert_eq!(links[0].location.file_path, "test.md");
    }

    #[test]
    fn test_column_points_at_url() {
        let links = extract_markdown_links("See [the docs](./docs/README.md).", "a.md");
        assert_eq!(links.len(), 1);
        // "See [the docs](" is 15 characters
        assert_eq!(links[0].location.column_number, Some(16));
    }

    #[test]
    fn test_same_url_twice_is_two_occurrences() {
        let markdown = "[a](https://x.dev) and [b](https://x.dev)";
        let links = extract_markdown_links(markdown, "a.md");
        assert_eq!(urls(&links), vec!["https://x.dev", "https://x.dev"]);
    }

    #[test]
    fn test_images_and_autolinks() {
        let markdown = "![logo](./logo.png)\n\n<https://rust-lang.org>\n\n<team@example.com>";
        let links = extract_markdown_links(markdown, "a.md");

        assert_eq!(
            urls(&links),
            vec!["./logo.png", "https://rust-lang.org", "mailto:team@example.com"]
        );
        assert_eq!(links[0].source, LinkSource::MarkdownImage);
        assert_eq!(links[1].source, LinkSource::MarkdownAutolink);
        assert_eq!(links[1].location.column_number, Some(2));
    }

    #[test]
    fn test_reference_definitions() {
        let markdown = "Read the [guide][g] and [^1].\n\n[g]: ./guide.md\n[rust]: <https://www.rust-lang.org>\n\n[^1]: a footnote\n";
        let links = extract_markdown_links(markdown, "a.md");

        assert_eq!(urls(&links), vec!["./guide.md", "https://www.rust-lang.org"]);
        assert!(links
            .iter()
            .all(|l| l.source == LinkSource::MarkdownReference));
        assert_eq!(links[0].location.line_number, 3);
        assert_eq!(links[0].location.column_number, Some(6));
    }

    #[test]
    fn test_code_blocks() {
        let markdown = r#"# Usage

```bash
curl [not a link](https://skip.me)
```

```jsx
<Link href="/dashboard">Dashboard</Link>
```

    [indented]: ./also-skipped.md
"#;
        let links = extract_markdown_links(markdown, "a.md");

        assert_eq!(urls(&links), vec!["/dashboard"]);
        assert_eq!(links[0].source, LinkSource::NextLink);
        assert_eq!(links[0].location.line_number, 8);
        assert_eq!(links[0].location.column_number, Some(13));
    }

    #[test]
    fn test_raw_html() {
        let markdown = "Intro\n\n<p align=\"center\">\n  <img src=\"./banner.png\">\n</p>\n";
        let links = extract_markdown_links(markdown, "a.md");

        assert_eq!(urls(&links), vec!["./banner.png"]);
        assert_eq!(links[0].location.line_number, 4);
    }

    #[test]
    fn test_empty_url() {
        let links = extract_markdown_links("[Empty]()", "a.md");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "");
    }

    #[test]
    fn test_url_encoded_path_is_kept_literal() {
        let links = extract_markdown_links("[Encoded](%2Fpath%2Fto%2Ffile.md)", "a.md");
        assert_eq!(urls(&links), vec!["%2Fpath%2Fto%2Ffile.md"]);
    }

    #[test]
    fn test_malformed_markdown_does_not_panic() {
        let markdown = "[unclosed](https://example.com\n[also [nested](x\n]: \n<a href=";
        let links = extract_markdown_links(markdown, "a.md");
        assert!(links.iter().all(|l| !l.url.contains('\n')));
    }
}
