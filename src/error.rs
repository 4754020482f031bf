// src/error.rs
// =============================================================================
// Error types for the link checker library.
//
// Broken links are never errors; they are reported as data in
// ValidationResult. The types here cover the few things that stop a run:
// a scan root we cannot read, a bad glob, or a cache file we cannot write.
//
// Rust concepts:
// - thiserror: derives Display and std::error::Error from the #[error] text
// - #[from]: lets `?` convert a reqwest/serde_json error automatically
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Errors that prevent a scan from starting.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The scan root does not exist or is not a directory.
    #[error("Cannot scan {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// An include/exclude pattern could not be compiled.
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// The HTTP client for live checks could not be built.
    #[error("HTTP client initialization error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Errors from writing a cache file.
///
/// Loading never fails (a missing or corrupt file means "start fresh"),
/// so only saving has an error type.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The file (or its temporary sibling) could not be written.
    #[error("Failed to write cache file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory cache could not be turned into JSON.
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}
