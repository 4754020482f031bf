// src/cache/mod.rs
// =============================================================================
// This module persists what we learned about external links between runs.
//
// Submodules:
// - config: the result cache (.link-checker.json). One entry per URL in
//   either `successfulLinks` or `failedLinks`, with every file:line that
//   references it. Used for bookkeeping and to reuse fresh results.
// - skip: the skip cache (link-checker-skip.json). A plain TTL store of
//   recently failed URLs so a rerun doesn't hammer the same dead hosts.
//
// Both files are loaded once when a scan starts and saved once when it ends.
// There is no locking: two scans sharing a cache file will overwrite each
// other's updates. Saving goes through a temporary file and a rename, so a
// crash mid-write leaves the previous file intact.
// =============================================================================

mod config;
mod skip;

pub use config::{
    cleanup_config, load_config, record_results, save_config, update_link_status, CacheEntry,
    LinkConfig, DEFAULT_CONFIG_PATH,
};
pub use skip::{
    load_skip_config, save_skip_config, should_skip_url, update_skip_config, SkipConfig,
    SkipEntry, DEFAULT_SKIP_CONFIG_PATH,
};

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::CacheError;

/// Version string written into both cache files.
pub const CACHE_VERSION: &str = "1.0";

/// How long a cached result is trusted, in hours.
pub const FRESHNESS_HOURS: i64 = 24;

// True when `last_checked` lies within the freshness window before `now`
//
// A timestamp from the future (clock skew, hand-edited file) is never
// fresh, otherwise it would never expire.
pub fn is_fresh(last_checked: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    last_checked <= now
        && now.signed_duration_since(last_checked) < Duration::hours(FRESHNESS_HOURS)
}

// Reads and parses a JSON cache file
//
// Returns None (and logs why) when the file is missing, unreadable or not
// valid JSON for `T`. Callers then start with an empty cache.
fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("No cache file at {}, starting fresh", path.display());
            return None;
        }
        Err(e) => {
            log::warn!("Could not read {}: {}; starting fresh", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
            None
        }
    }
}

// Writes `value` as pretty JSON to `path` without ever leaving a
// half-written file behind: write `<path>.tmp`, then rename over `path`.
fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> Result<(), CacheError> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CacheError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, json).map_err(|source| CacheError::Write {
        path: tmp.clone(),
        source,
    })?;

    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        CacheError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
