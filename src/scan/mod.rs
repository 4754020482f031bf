// src/scan/mod.rs
// =============================================================================
// This module ties everything together: find files, extract links, validate
// them, and hand back one LinkInfo per occurrence.
//
// How a scan runs:
// 1. Walk the directory (walk.rs) and read each file, one after another
// 2. Run the right extractor for the file's extension
// 3. Sort the links into internal / external / always-valid
// 4. External: each distinct URL is checked once; fresh cache entries are
//    reused instead of hitting the network again
// 5. Validate everything concurrently, with a separate cap for external
//    requests so a big repo doesn't open hundreds of sockets at once
//
// A file we can't read is logged and skipped. A dead host costs at most its
// own timeout. Only "the root directory is unusable" or "a glob pattern is
// invalid" stop a scan.
//
// Rust concepts:
// - Generic struct: Scanner<P> works with any LinkProbe (real or fake)
// - buffer_unordered(N): run up to N futures at once, results in any order
// - futures::join!: wait for two futures running side by side
// =============================================================================

mod walk;

pub use walk::{discover_files, FileFilter, SourceFile};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::cache::{LinkConfig, SkipConfig};
use crate::checker::{validate_external, validate_internal, HttpProbe, LinkKind, LinkProbe, DEFAULT_TIMEOUT};
use crate::error::ScanError;
use crate::extract::Extractor;
use crate::link::{LinkInfo, LinkOccurrence, LinkSummary, ValidationResult};
use crate::report::summarize;

/// Default number of external checks in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Always excluded, in addition to user patterns.
pub const DEFAULT_EXCLUDES: &[&str] = &["**/node_modules/**", "**/.git/**"];

// Filesystem checks are cheap; this only keeps file handles bounded
const INTERNAL_CONCURRENCY: usize = 64;

/// Everything a scan can be configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// false = external links only get a URL syntax check
    pub check_live_links: bool,
    /// Only scan files matching one of these (empty = all supported files)
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Max external checks in flight at once
    pub concurrent: usize,
    /// Per-request timeout for live checks
    pub timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            check_live_links: false,
            include_patterns: Vec::new(),
            exclude_patterns: DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect(),
            concurrent: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Read-only view of the caches a scan may reuse results from.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheLookup<'a> {
    pub results: Option<&'a LinkConfig>,
    pub skip: Option<&'a SkipConfig>,
}

impl CacheLookup<'_> {
    // A fresh entry in the result cache (pass or fail), otherwise a fresh
    // failure from the skip cache
    fn find(&self, url: &str, now: DateTime<Utc>) -> Option<ValidationResult> {
        self.results
            .and_then(|config| config.fresh_result(url, now))
            .or_else(|| {
                self.skip
                    .and_then(|skip| skip.fresh_result(url, now))
                    .filter(|result| !result.is_valid)
            })
    }
}

/// Scans directories for links and validates them.
pub struct Scanner<P = HttpProbe> {
    options: ScanOptions,
    probe: P,
}

impl Scanner<HttpProbe> {
    // Creates a scanner that uses real HTTP requests for live checks
    pub fn new(options: ScanOptions) -> Result<Self, ScanError> {
        Ok(Scanner::with_probe(options, HttpProbe::new()?))
    }
}

impl<P: LinkProbe> Scanner<P> {
    pub fn with_probe(options: ScanOptions, probe: P) -> Self {
        Scanner { options, probe }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    // Scans without any cache
    pub async fn scan(&self, directory: &Path) -> Result<Vec<LinkInfo>, ScanError> {
        self.scan_with_cache(directory, CacheLookup::default()).await
    }

    // Scans `directory`, reusing fresh cached results for external links
    // when live checking is on
    pub async fn scan_with_cache(
        &self,
        directory: &Path,
        cache: CacheLookup<'_>,
    ) -> Result<Vec<LinkInfo>, ScanError> {
        let links = self.collect_links(directory).await?;
        Ok(self.validate_all(directory, links, cache).await)
    }

    // Steps 1-2: find files and extract links, without validating
    pub async fn collect_links(&self, directory: &Path) -> Result<Vec<LinkOccurrence>, ScanError> {
        let metadata = tokio::fs::metadata(directory)
            .await
            .map_err(|e| ScanError::InvalidRoot {
                path: directory.to_path_buf(),
                reason: e.to_string(),
            })?;
        if !metadata.is_dir() {
            return Err(ScanError::InvalidRoot {
                path: directory.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        let filter = FileFilter::new(
            &self.options.include_patterns,
            &self.options.exclude_patterns,
        )?;
        let files = discover_files(directory, &filter);
        log::info!("Found {} file(s) to scan in {}", files.len(), directory.display());

        let mut links = Vec::new();
        for file in files {
            // Sequential reads: this part is I/O-light compared to validation
            let content = match tokio::fs::read_to_string(&file.path).await {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Skipping {}: {}", file.relative, e);
                    continue;
                }
            };

            let extractor = Extractor::for_path(&file.path).unwrap_or(Extractor::Jsx);
            let found = extractor.extract(&content, &file.relative);
            log::debug!("{} link(s) found in {}", found.len(), file.relative);
            links.extend(found);
        }

        Ok(links)
    }

    // Steps 3-5: validate every occurrence
    //
    // The output has one LinkInfo per input link, in the same order, no
    // matter in which order the checks finish.
    pub async fn validate_all(
        &self,
        root: &Path,
        links: Vec<LinkOccurrence>,
        cache: CacheLookup<'_>,
    ) -> Vec<LinkInfo> {
        let mut results: Vec<Option<ValidationResult>> = vec![None; links.len()];
        let mut internal = Vec::new();

        // url -> indexes of every occurrence, in first-seen order
        let mut external: Vec<(String, Vec<usize>)> = Vec::new();
        let mut external_slots: HashMap<String, usize> = HashMap::new();

        for (i, link) in links.iter().enumerate() {
            match LinkKind::of(link) {
                LinkKind::Internal => internal.push(i),
                LinkKind::External => match external_slots.get(link.url.as_str()) {
                    Some(&slot) => external[slot].1.push(i),
                    None => {
                        external_slots.insert(link.url.clone(), external.len());
                        external.push((link.url.clone(), vec![i]));
                    }
                },
                LinkKind::Anchor | LinkKind::Mailto | LinkKind::Package => {
                    results[i] = Some(ValidationResult::valid());
                }
            }
        }

        let live = self.options.check_live_links;
        let timeout = self.options.timeout;

        // Reuse fresh cache entries instead of asking the network again
        let mut pending = Vec::new();
        if live {
            let now = Utc::now();
            for (url, indexes) in external {
                match cache.find(&url, now) {
                    Some(cached) => {
                        log::debug!("Using cached result for {}", url);
                        for &i in &indexes {
                            results[i] = Some(cached.clone());
                        }
                    }
                    None => pending.push((url, indexes)),
                }
            }
        } else {
            pending = external;
        }

        log::info!(
            "Validating {} internal link(s) and {} external URL(s)",
            internal.len(),
            pending.len()
        );

        let probe = &self.probe;
        let external_checks = stream::iter(pending)
            .map(|(url, indexes)| async move {
                let result = validate_external(&url, live, timeout, probe).await;
                (indexes, result)
            })
            .buffer_unordered(self.options.concurrent.max(1))
            .collect::<Vec<_>>();

        let links_ref = &links;
        let internal_checks = stream::iter(internal)
            .map(|i| async move { (i, validate_internal(&links_ref[i], root).await) })
            .buffer_unordered(INTERNAL_CONCURRENCY)
            .collect::<Vec<_>>();

        let (external_done, internal_done) = futures::join!(external_checks, internal_checks);

        for (indexes, result) in external_done {
            for i in indexes {
                results[i] = Some(result.clone());
            }
        }
        for (i, result) in internal_done {
            results[i] = Some(result);
        }

        links
            .into_iter()
            .zip(results)
            .map(|(link, validation_result)| LinkInfo {
                link,
                validation_result,
            })
            .collect()
    }
}

// Scans a directory with a fresh scanner and no cache
//
// Returns every link found, each with its validation result.
pub async fn scan_directory(
    directory: &Path,
    options: &ScanOptions,
) -> Result<Vec<LinkInfo>, ScanError> {
    Scanner::new(options.clone())?.scan(directory).await
}

// Same as scan_directory, split into valid and invalid links
pub async fn check_directory(
    directory: &Path,
    options: &ScanOptions,
) -> Result<LinkSummary, ScanError> {
    Ok(summarize(scan_directory(directory, options).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::update_link_status;
    use crate::link::LinkSource;
    use crate::report::format_report;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Fake network: counts calls and how many run at the same time.
    // URLs containing "broken" fail with a 404.
    #[derive(Default)]
    struct CountingProbe {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl LinkProbe for CountingProbe {
        fn probe<'a>(&'a self, url: &'a str, _timeout: Duration) -> BoxFuture<'a, ValidationResult> {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.seen.lock().unwrap().push(url.to_string());
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);

                tokio::time::sleep(Duration::from_millis(20)).await;

                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                if url.contains("broken") {
                    ValidationResult::invalid("HTTP 404: Not Found").with_status(404)
                } else {
                    ValidationResult::valid().with_status(200)
                }
            }
            .boxed()
        }
    }

    fn scanner(options: ScanOptions) -> Scanner<CountingProbe> {
        Scanner::with_probe(options, CountingProbe::default())
    }

    fn live(concurrent: usize) -> ScanOptions {
        ScanOptions {
            check_live_links: true,
            concurrent,
            ..ScanOptions::default()
        }
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "README.md",
            "# Project\n\
             [Guide](./docs/guide.md)\n\
             [Missing](./docs/missing.md)\n\
             [Site](https://example.com)\n\
             [Top](#project)\n",
        );
        write(root, "docs/guide.md", "Back to [readme](../README.md)\n");
        write(
            root,
            "src/App.tsx",
            "import React from 'react';\n\
             import { Nav } from './Nav';\n\
             export const App = () => <a href=\"https://example.com\">x</a>;\n",
        );
        write(root, "src/Nav.tsx", "export const Nav = () => null;\n");
        write(root, "excluded/old.md", "[gone](./nowhere.md)\n");
        write(root, "node_modules/pkg/README.md", "[dep](./nowhere.md)\n");
        dir
    }

    #[tokio::test]
    async fn test_scan_project() {
        let dir = project();
        let options = ScanOptions {
            exclude_patterns: vec!["**/excluded/**".to_string(), "**/node_modules/**".to_string()],
            ..ScanOptions::default()
        };
        let results = scanner(options).scan(dir.path()).await.unwrap();

        let invalid: Vec<_> = results.iter().filter(|r| r.is_invalid()).collect();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].link.url, "./docs/missing.md");
        assert_eq!(invalid[0].link.location.file_path, "README.md");
        assert_eq!(invalid[0].link.location.line_number, 3);

        // README (4) + guide (1) + App.tsx (3)
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.validation_result.is_some()));
        assert!(!results.iter().any(|r| r.link.location.file_path.starts_with("excluded/")));
        assert!(!results.iter().any(|r| r.link.location.file_path.starts_with("node_modules/")));
    }

    #[tokio::test]
    async fn test_syntax_only_never_probes() {
        let dir = project();
        let scanner = scanner(ScanOptions::default());
        scanner.scan(dir.path()).await.unwrap();
        assert_eq!(scanner.probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scan_is_idempotent() {
        let dir = project();
        let scanner = scanner(ScanOptions::default());

        let first = scanner.scan(dir.path()).await.unwrap();
        let second = scanner.scan(dir.path()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let results = scanner(ScanOptions::default()).scan(dir.path()).await.unwrap();

        assert!(results.is_empty());
        assert!(format_report(&results).contains("Total Links: 0"));
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = scanner(ScanOptions::default())
            .scan(&dir.path().join("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidRoot { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("binary.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        write(dir.path(), "ok.md", "[x](https://example.com)\n");

        let results = scanner(ScanOptions::default()).scan(dir.path()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].link.location.file_path, "ok.md");
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let dir = TempDir::new().unwrap();
        let content: String = (0..10)
            .map(|i| format!("[link {i}](https://site{i}.example.com)\n"))
            .collect();
        write(dir.path(), "links.md", &content);

        let scanner = scanner(live(2));
        let results = scanner.scan(dir.path()).await.unwrap();

        assert_eq!(results.len(), 10);
        assert_eq!(scanner.probe.calls.load(Ordering::SeqCst), 10);
        let max = scanner.probe.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 2, "{} requests were in flight at once", max);
        assert_eq!(max, 2);
    }

    #[tokio::test]
    async fn test_each_external_url_checked_once() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "[a](https://broken.example.com)\n[b](https://broken.example.com)\n");
        write(dir.path(), "b.md", "[c](https://broken.example.com)\n");

        let scanner = scanner(live(5));
        let results = scanner.scan(dir.path()).await.unwrap();

        assert_eq!(scanner.probe.calls.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.error() == Some("HTTP 404: Not Found")));
        let locations: Vec<_> = results.iter().map(|r| r.link.location.to_string()).collect();
        assert_eq!(locations, vec!["a.md:1", "a.md:2", "b.md:1"]);
    }

    #[tokio::test]
    async fn test_fresh_cache_entries_are_reused() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.md",
            "[a](https://cached-broken.example.com)\n[b](https://new.example.com)\n",
        );

        let mut config = LinkConfig::default();
        update_link_status(&mut config, "https://cached-broken.example.com", "a.md:1", false, Some("HTTP 410: Gone"));

        let scanner = scanner(live(5));
        let cache = CacheLookup {
            results: Some(&config),
            skip: None,
        };
        let results = scanner.scan_with_cache(dir.path(), cache).await.unwrap();

        assert_eq!(*scanner.probe.seen.lock().unwrap(), vec!["https://new.example.com"]);
        let cached = results[0].validation_result.as_ref().unwrap();
        assert!(cached.cached);
        assert_eq!(cached.error.as_deref(), Some("HTTP 410: Gone"));
        assert!(results[1].is_valid());
    }

    #[tokio::test]
    async fn test_skip_cache_failures_are_reused() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "[a](https://gone.example.com)\n");

        let mut skip = SkipConfig::default();
        let failed = vec![LinkInfo::checked(
            LinkOccurrence::new(
                "https://gone.example.com",
                crate::link::Location::new("a.md", 1, 5),
                LinkSource::MarkdownLink,
            ),
            ValidationResult::invalid("Network error: connection failed"),
        )];
        crate::cache::update_skip_config(&mut skip, &failed);

        let scanner = scanner(live(5));
        let cache = CacheLookup {
            results: None,
            skip: Some(&skip),
        };
        let results = scanner.scan_with_cache(dir.path(), cache).await.unwrap();

        assert_eq!(scanner.probe.calls.load(Ordering::SeqCst), 0);
        assert_eq!(results[0].error(), Some("Network error: connection failed"));
    }
}
