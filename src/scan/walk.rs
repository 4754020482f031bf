// src/scan/walk.rs
// =============================================================================
// This module finds the files a scan should look at.
//
// How it works:
// 1. Walk the directory tree with `walkdir` (sorted, so runs are repeatable)
// 2. Keep files whose extension we can extract links from
// 3. If include patterns were given, keep only files matching one of them
// 4. Drop files matching an exclude pattern, e.g. "**/node_modules/**"
//
// Patterns are matched against the path relative to the scan root, always
// with '/' separators. An exclude pattern also matches if it matches any
// parent directory, so "**/vendor" excludes everything under vendor/.
//
// Rust concepts:
// - walkdir::WalkDir: a recursive directory iterator
// - glob::Pattern: shell-style wildcards (*, **, ?, [abc])
// =============================================================================

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ScanError;
use crate::extract::SUPPORTED_EXTENSIONS;

// '*' stays inside one directory, '**' crosses directories
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A file picked for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (or root-joined) path used to read the file
    pub path: PathBuf,
    /// Path relative to the scan root with '/' separators
    pub relative: String,
}

/// Compiled include/exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    // "X/**" exclude patterns with the "/**" cut off: a directory matching
    // one of these has nothing left to scan
    exclude_dirs: Vec<Pattern>,
}

impl FileFilter {
    // Compiles the patterns; a bad pattern is a configuration error
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ScanError> {
        let dir_prefixes: Vec<String> = exclude
            .iter()
            .filter_map(|p| p.strip_suffix("/**"))
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_string)
            .collect();

        Ok(FileFilter {
            include: compile(include)?,
            exclude: compile(exclude)?,
            exclude_dirs: compile(&dir_prefixes)?,
        })
    }

    // Decides whether a file (by its relative path) is scanned
    pub fn accepts(&self, relative: &str) -> bool {
        has_supported_extension(relative)
            && (self.include.is_empty()
                || self.include.iter().any(|p| p.matches_with(relative, MATCH_OPTIONS)))
            && !self.is_excluded(relative)
    }

    // True when no file below this directory could be accepted, so the walk
    // doesn't need to enter it
    pub fn excludes_dir(&self, relative: &str) -> bool {
        self.is_excluded(relative)
            || self
                .exclude_dirs
                .iter()
                .any(|p| p.matches_with(relative, MATCH_OPTIONS))
    }

    fn is_excluded(&self, relative: &str) -> bool {
        // the file itself, then every parent directory: a/b/c.md -> a/b, a
        let mut candidates = vec![relative];
        let mut rest = relative;
        while let Some((parent, _)) = rest.rsplit_once('/') {
            candidates.push(parent);
            rest = parent;
        }

        candidates.iter().any(|candidate| {
            self.exclude
                .iter()
                .any(|p| p.matches_with(candidate, MATCH_OPTIONS))
        })
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, ScanError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| ScanError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

fn has_supported_extension(relative: &str) -> bool {
    Path::new(relative)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

// Walks `root` and returns every file the filter accepts, sorted by path
//
// Excluded directories (node_modules, .git, ...) are pruned, not entered.
// Entries that can't be read (permissions, races with deletion) are logged
// and skipped; they never abort the walk.
pub fn discover_files(root: &Path, filter: &FileFilter) -> Vec<SourceFile> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            match relative_path(root, entry.path()) {
                Some(relative) => !filter.excludes_dir(&relative),
                None => true,
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable path: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(relative) = relative_path(root, entry.path()) else {
            continue;
        };

        if filter.accepts(&relative) {
            files.push(SourceFile {
                path: entry.path().to_path_buf(),
                relative,
            });
        }
    }

    files
}

// `root/docs/a.md` -> "docs/a.md", always with '/' separators
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(relative.to_string_lossy().replace('\\', "/"))
}
