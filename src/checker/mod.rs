// src/checker/mod.rs
// =============================================================================
// This module decides whether a single link is valid.
//
// Submodules:
// - internal: links to files in the scanned tree (checked on disk)
// - http: links to the web (syntax check, or a live HEAD request)
//
// Every link is first classified by its URL:
//   https://... or http://...  -> External
//   #section                   -> Anchor   (always valid)
//   mailto:...                 -> Mailto   (always valid, never contacted)
//   anything else              -> Internal (resolved against the filesystem)
// plus one extra rule for code: a bare import specifier like 'react' is a
// Package and is not resolved at all.
//
// None of the functions here return errors. A broken link is a *result*
// (ValidationResult { is_valid: false, error: Some(..) }), not a failure.
// =============================================================================

mod http;
mod internal;

pub use http::{check_syntax, HttpProbe, DEFAULT_TIMEOUT, USER_AGENT};
pub use internal::{resolve_path, validate_internal};

use futures::future::BoxFuture;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use crate::link::{LinkOccurrence, ValidationResult};

/// The validation strategy a link needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    External,
    Anchor,
    Mailto,
    Package,
    Internal,
}

impl LinkKind {
    // Classifies a bare URL string
    //
    // Note that "example.com" (no scheme) is Internal, not External.
    pub fn classify(url: &str) -> LinkKind {
        if is_external(url) {
            LinkKind::External
        } else if url.starts_with('#') {
            LinkKind::Anchor
        } else if has_prefix_ignore_case(url, "mailto:") {
            LinkKind::Mailto
        } else {
            LinkKind::Internal
        }
    }

    // Classifies an occurrence, which also knows what syntax produced it
    pub fn of(link: &LinkOccurrence) -> LinkKind {
        match LinkKind::classify(&link.url) {
            LinkKind::Internal if link.source.is_module() && is_package_specifier(&link.url) => {
                LinkKind::Package
            }
            kind => kind,
        }
    }
}

/// `^https?://`, case-insensitive
pub fn is_external(url: &str) -> bool {
    has_prefix_ignore_case(url, "http://") || has_prefix_ignore_case(url, "https://")
}

fn has_prefix_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

// 'react', '@scope/pkg', 'node:fs' - anything that isn't a relative or
// absolute path
fn is_package_specifier(url: &str) -> bool {
    !url.is_empty() && !url.starts_with('.') && !url.starts_with('/')
}

/// Something that can check an external URL over the network.
///
/// `HttpProbe` is the real implementation; tests plug in fakes to observe
/// how the scanner schedules requests.
pub trait LinkProbe: Send + Sync {
    fn probe<'a>(&'a self, url: &'a str, timeout: Duration) -> BoxFuture<'a, ValidationResult>;
}

// Validates one link
//
// Parameters:
//   link: the occurrence to check
//   root_dir: the scan root (internal links resolve against it)
//   check_live_links: false = syntax-only check for external links
//   timeout: per-request limit for live checks
//   probe: the HTTP implementation used for live checks
//
// Returns: the ValidationResult; this never fails
pub async fn validate_link<P>(
    link: &LinkOccurrence,
    root_dir: &Path,
    check_live_links: bool,
    timeout: Duration,
    probe: &P,
) -> ValidationResult
where
    P: LinkProbe + ?Sized,
{
    match LinkKind::of(link) {
        LinkKind::Anchor | LinkKind::Mailto | LinkKind::Package => ValidationResult::valid(),
        LinkKind::External => validate_external(&link.url, check_live_links, timeout, probe).await,
        LinkKind::Internal => validate_internal(link, root_dir).await,
    }
}

// External links only: live request or syntax check
pub async fn validate_external<P>(
    url: &str,
    check_live_links: bool,
    timeout: Duration,
    probe: &P,
) -> ValidationResult
where
    P: LinkProbe + ?Sized,
{
    if check_live_links {
        probe.probe(url, timeout).await
    } else {
        check_syntax(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{LinkSource, Location};
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Records how often it was called and always says "valid"
    #[derive(Default)]
    struct RecordingProbe {
        calls: AtomicUsize,
    }

    impl LinkProbe for RecordingProbe {
        fn probe<'a>(&'a self, _url: &'a str, _timeout: Duration) -> BoxFuture<'a, ValidationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async { ValidationResult::valid().with_status(200) }.boxed()
        }
    }

    fn link(url: &str, source: LinkSource) -> LinkOccurrence {
        LinkOccurrence::new(url, Location::new("docs/a.md", 1, 1), source)
    }

    #[test]
    fn test_classify() {
        assert_eq!(LinkKind::classify("https://example.com"), LinkKind::External);
        assert_eq!(LinkKind::classify("HTTP://EXAMPLE.COM"), LinkKind::External);
        assert_eq!(LinkKind::classify("#installation"), LinkKind::Anchor);
        assert_eq!(LinkKind::classify("mailto:team@example.com"), LinkKind::Mailto);
        assert_eq!(LinkKind::classify("./guide.md"), LinkKind::Internal);
        assert_eq!(LinkKind::classify("/docs/guide.md"), LinkKind::Internal);
        // no scheme -> not external
        assert_eq!(LinkKind::classify("example.com"), LinkKind::Internal);
        assert_eq!(LinkKind::classify("ftp://example.com"), LinkKind::Internal);
    }

    #[test]
    fn test_package_specifiers_only_for_imports() {
        assert_eq!(LinkKind::of(&link("react", LinkSource::Import)), LinkKind::Package);
        assert_eq!(
            LinkKind::of(&link("@scope/pkg/sub", LinkSource::Require)),
            LinkKind::Package
        );
        assert_eq!(
            LinkKind::of(&link("./Button", LinkSource::Import)),
            LinkKind::Internal
        );
        assert_eq!(
            LinkKind::of(&link("react", LinkSource::MarkdownLink)),
            LinkKind::Internal
        );
    }

    #[tokio::test]
    async fn test_anchor_and_mailto_never_touch_anything() {
        let probe = RecordingProbe::default();
        let root = Path::new("/definitely/not/here");

        for url in ["#usage", "mailto:someone@example.com"] {
            let result = validate_link(
                &link(url, LinkSource::MarkdownLink),
                root,
                true,
                DEFAULT_TIMEOUT,
                &probe,
            )
            .await;
            assert!(result.is_valid);
        }
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_syntax_only_mode_skips_the_network() {
        let probe = RecordingProbe::default();
        let root = Path::new(".");

        let ok = validate_link(
            &link("https://example.com", LinkSource::MarkdownLink),
            root,
            false,
            DEFAULT_TIMEOUT,
            &probe,
        )
        .await;
        assert!(ok.is_valid);
        assert_eq!(ok.status_code, None);

        let bad = validate_link(
            &link("https://", LinkSource::MarkdownLink),
            root,
            false,
            DEFAULT_TIMEOUT,
            &probe,
        )
        .await;
        assert!(!bad.is_valid);
        assert!(bad.error.unwrap().starts_with("Invalid URL format"));

        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_mode_uses_the_probe() {
        let probe = RecordingProbe::default();
        let result = validate_link(
            &link("https://example.com", LinkSource::MarkdownLink),
            Path::new("."),
            true,
            DEFAULT_TIMEOUT,
            &probe,
        )
        .await;

        assert!(result.is_valid);
        assert_eq!(result.status_code, Some(200));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }
}
