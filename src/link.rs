// src/link.rs
// =============================================================================
// The data model shared by every part of the link checker.
//
// A scan goes through three shapes:
// - LinkOccurrence: one URL found at one file/line/column (extractors)
// - ValidationResult: whether that URL is OK (checker)
// - LinkInfo: the two glued together (scanner, report)
//
// Everything derives Serialize/Deserialize so results can be printed as JSON
// with the same camelCase field names the cache files use.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a link was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Path relative to the scan root, always with '/' separators
    pub file_path: String,
    /// 1-based line number
    pub line_number: usize,
    /// 1-based column (in characters) where the URL text starts
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub column_number: Option<usize>,
}

impl Location {
    pub fn new(file_path: impl Into<String>, line_number: usize, column_number: usize) -> Self {
        Location {
            file_path: file_path.into(),
            line_number,
            column_number: Some(column_number),
        }
    }
}

// "docs/guide.md:12" - the form used in reports and in the cache files
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_path, self.line_number)
    }
}

/// Which syntax produced an occurrence.
///
/// Ordered roughly from most to least specific; when two patterns match the
/// same token the more specific source is kept (see `LinkSource::priority`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkSource {
    /// `[text](url)`
    MarkdownLink,
    /// `![alt](url)`
    MarkdownImage,
    /// `[ref]: url`
    MarkdownReference,
    /// `<https://...>`
    MarkdownAutolink,
    /// `import x from './x'` / `export * from './x'` / `import './x'`
    Import,
    /// `require('./x')`
    Require,
    /// `import('./x')`
    DynamicImport,
    /// `<Link href="...">` (Next.js)
    NextLink,
    /// `<a href>`, `<img src>`, `<source src>`
    HtmlTag,
    /// any `href=`/`src=`/`to=`/`url=`/`path=` attribute
    JsxAttribute,
}

impl LinkSource {
    // Lower wins when two extractors report the same token
    pub fn priority(self) -> u8 {
        match self {
            LinkSource::NextLink => 0,
            LinkSource::HtmlTag => 1,
            LinkSource::JsxAttribute => 2,
            _ => 0,
        }
    }

    /// True for module specifiers (imports and requires)
    pub fn is_module(self) -> bool {
        matches!(
            self,
            LinkSource::Import | LinkSource::Require | LinkSource::DynamicImport
        )
    }
}

/// One raw discovery of a URL-like string in a source file.
///
/// The same URL appearing twice in a file gives two occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOccurrence {
    /// The reference exactly as written (not decoded, not resolved)
    pub url: String,
    pub location: Location,
    pub source: LinkSource,
}

impl LinkOccurrence {
    pub fn new(url: impl Into<String>, location: Location, source: LinkSource) -> Self {
        LinkOccurrence {
            url: url.into(),
            location,
            source,
        }
    }
}

/// Outcome of checking one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    /// Only set when a live HTTP request was made
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status_code: Option<u16>,
    /// Reused from a cache file instead of being checked this run
    #[serde(skip_serializing_if = "is_false", default)]
    pub cached: bool,
    /// When a reused result was really checked
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub checked_at: Option<DateTime<Utc>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ValidationResult {
    pub fn valid() -> Self {
        ValidationResult {
            is_valid: true,
            error: None,
            status_code: None,
            cached: false,
            checked_at: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        ValidationResult {
            is_valid: false,
            error: Some(error.into()),
            status_code: None,
            cached: false,
            checked_at: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    // Marks a result as reused, keeping the time of the real check
    pub fn from_cache(mut self, checked_at: DateTime<Utc>) -> Self {
        self.cached = true;
        self.checked_at = Some(checked_at);
        self
    }
}

/// An occurrence together with its (optional) validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInfo {
    #[serde(flatten)]
    pub link: LinkOccurrence,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub validation_result: Option<ValidationResult>,
}

impl LinkInfo {
    pub fn unchecked(link: LinkOccurrence) -> Self {
        LinkInfo {
            link,
            validation_result: None,
        }
    }

    pub fn checked(link: LinkOccurrence, result: ValidationResult) -> Self {
        LinkInfo {
            link,
            validation_result: Some(result),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(&self.validation_result, Some(r) if r.is_valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(&self.validation_result, Some(r) if !r.is_valid)
    }

    pub fn error(&self) -> Option<&str> {
        self.validation_result.as_ref()?.error.as_deref()
    }
}

/// Results split into the two buckets CI cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub valid: Vec<LinkInfo>,
    pub invalid: Vec<LinkInfo>,
}

impl LinkSummary {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }
}
