// src/extract/jsx.rs
// =============================================================================
// This module extracts references from JavaScript / TypeScript / JSX / TSX.
//
// What counts as a reference:
// - Module specifiers:  import x from './x'   export * from './y'
//                       import './styles.css' require('./z')  import('./lazy')
// - Next.js links:      <Link href="/about">
// - Plain HTML tags:    <a href>, <img src>, <source src>  (see html.rs)
// - Any attribute named href / src / to / url / path with a quoted string
//   value, e.g. <Route path="/users" /> or <Image src={"/hero.png"} />
//
// Only string literals are read. Expressions like href={`/u/${id}`} are
// skipped because we would have to run the code to know the value.
//
// Every pattern is a read-only static Regex and every call builds its own
// match iterator, so there is no hidden state between calls.
// =============================================================================

use regex::Regex;
use std::sync::LazyLock;

use super::html::html_matches;
use super::position::LineIndex;
use super::{dedupe, RawMatch};
use crate::link::{LinkOccurrence, LinkSource, Location};

// A single- or double-quoted string on one line. Groups 1 and 2.
macro_rules! quoted {
    () => {
        r#"(?:'([^'\n]*)'|"([^"\n]*)")"#
    };
}

// `import { a, b } from './x'`, `export * from "./y"`, `import type T from './t'`
//
// The part between the keyword and `from` may only contain names, braces,
// commas, `*` and whitespace, so prose like `data from "the API"` inside JSX
// text is not mistaken for an import.
static IMPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^[ \t]*(?:import|export)\b[\w\s{},*$]*?\bfrom\s*",
        quoted!()
    ))
    .unwrap()
});

// `import './polyfills'`
static IMPORT_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(concat!(r"(?m)^[ \t]*import\s*", quoted!())).unwrap());

static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(r"\brequire\s*\(\s*", quoted!(), r"\s*\)")).unwrap()
});

static DYNAMIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(r"\bimport\s*\(\s*", quoted!(), r"\s*\)")).unwrap()
});

// <Link href="/about"> and <Link href={"/about"}>
static NEXT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(r"<Link\b[^>]*?\shref\s*=\s*\{?\s*", quoted!())).unwrap()
});

// The generic fallback: any of the known attribute names. Only counts
// inside an opening tag, see in_opening_tag().
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)(?:^|\s)(?:href|src|to|url|path)\s*=\s*\{?\s*",
        quoted!()
    ))
    .unwrap()
});

// Extracts all references from a JS/TS/JSX/TSX file
//
// Parameters:
//   content: the source text
//   file_path: path relative to the scan root, stored in each Location
//
// Returns: one LinkOccurrence per reference, sorted by position
pub fn extract_jsx_links(content: &str, file_path: &str) -> Vec<LinkOccurrence> {
    let index = LineIndex::new(content);

    jsx_matches(content)
        .into_iter()
        .map(|m| {
            let (line, column) = index.position(m.offset);
            LinkOccurrence::new(m.url, Location::new(file_path, line, column), m.source)
        })
        .collect()
}

// All matches as byte offsets, already de-duplicated and sorted
pub(super) fn jsx_matches(text: &str) -> Vec<RawMatch> {
    let mut matches = Vec::new();

    let patterns: [(&Regex, LinkSource); 6] = [
        (&*IMPORT_FROM, LinkSource::Import),
        (&*IMPORT_BARE, LinkSource::Import),
        (&*REQUIRE, LinkSource::Require),
        (&*DYNAMIC_IMPORT, LinkSource::DynamicImport),
        (&*NEXT_LINK, LinkSource::NextLink),
        (&*ATTRIBUTE, LinkSource::JsxAttribute),
    ];

    for (regex, source) in patterns {
        let found = quoted_matches(regex, text, source);
        if source == LinkSource::JsxAttribute {
            // `let path = "./data.json"` is code, not an attribute
            matches.extend(found.into_iter().filter(|m| in_opening_tag(text, m.offset)));
        } else {
            matches.extend(found);
        }
    }
    matches.extend(html_matches(text));

    dedupe(matches)
}

fn quoted_matches(regex: &Regex, text: &str, source: LinkSource) -> Vec<RawMatch> {
    regex
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|value| RawMatch {
            offset: value.start(),
            url: value.as_str().to_string(),
            source,
        })
        .collect()
}

// Walks back from `offset` to decide whether it sits inside `<Tag ...`
//
// Reaching `<` followed by a letter first means yes. A `>` (other than the
// `=>` of an arrow function inside an attribute) or a `;` means the
// position is in plain code or text.
fn in_opening_tag(text: &str, offset: usize) -> bool {
    let bytes = text.as_bytes();
    let mut i = offset.min(bytes.len());

    while i > 0 {
        i -= 1;
        match bytes[i] {
            b'<' => {
                if bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
                    return true;
                }
            }
            b'>' if i > 0 && bytes[i - 1] == b'=' => i -= 1,
            b'>' | b';' => return false,
            _ => {}
        }
    }

    false
}
