// src/cache/skip.rs
// =============================================================================
// The skip cache: "we checked this URL less than 24 hours ago, don't ask
// the server again."
//
// Unlike the result cache it doesn't care about locations. It is rebuilt at
// the end of every run from that run's failed external links, so a URL that
// got fixed simply drops out.
//
// On disk (link-checker-skip.json):
// {
//   "version": "1.0",
//   "lastUpdated": "...",
//   "links": { "https://gone.dev": { "lastChecked": "...", "isValid": false, "error": "HTTP 404: Not Found", "statusCode": 404 } }
// }
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::{is_fresh, read_json, write_json_atomic, CACHE_VERSION};
use crate::checker::LinkKind;
use crate::error::CacheError;
use crate::link::{LinkInfo, ValidationResult};

/// Default location of the skip cache, relative to the working directory.
pub const DEFAULT_SKIP_CONFIG_PATH: &str = "link-checker-skip.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipEntry {
    pub last_checked: DateTime<Utc>,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl SkipEntry {
    fn to_result(&self) -> ValidationResult {
        let result = if self.is_valid {
            ValidationResult::valid()
        } else {
            ValidationResult::invalid(self.error.as_deref().unwrap_or("Previously failed"))
        };
        let result = match self.status_code {
            Some(code) => result.with_status(code),
            None => result,
        };
        result.from_cache(self.last_checked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipConfig {
    pub version: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub links: BTreeMap<String, SkipEntry>,
}

impl Default for SkipConfig {
    fn default() -> Self {
        SkipConfig {
            version: CACHE_VERSION.to_string(),
            last_updated: Utc::now(),
            links: BTreeMap::new(),
        }
    }
}

impl SkipConfig {
    // The stored result for `url` if it is still fresh at `now`
    pub fn fresh_result(&self, url: &str, now: DateTime<Utc>) -> Option<ValidationResult> {
        let entry = self.links.get(url)?;
        is_fresh(entry.last_checked, now).then(|| entry.to_result())
    }
}

// Loads the skip cache, falling back to an empty one
pub fn load_skip_config(path: &Path) -> SkipConfig {
    read_json(path).unwrap_or_default()
}

// Saves the skip cache, stamping `lastUpdated`
pub fn save_skip_config(config: &mut SkipConfig, path: &Path) -> Result<(), CacheError> {
    config.last_updated = Utc::now();
    write_json_atomic(config, path)
}

// True iff `url` has an entry checked within the last 24 hours, whether it
// passed or failed
pub fn should_skip_url(url: &str, config: &SkipConfig) -> bool {
    config.fresh_result(url, Utc::now()).is_some()
}

// Rebuilds the skip cache from a run's results
//
// Keeps exactly the external links that failed this run. A failure that was
// itself served from a fresh skip entry keeps its original timestamp, so it
// still expires 24 hours after the real check.
pub fn update_skip_config(config: &mut SkipConfig, results: &[LinkInfo]) {
    let now = Utc::now();
    let mut links = BTreeMap::new();

    for info in results {
        let Some(result) = &info.validation_result else {
            continue;
        };
        if result.is_valid || LinkKind::of(&info.link) != LinkKind::External {
            continue;
        }
        let url = &info.link.url;
        if links.contains_key(url) {
            continue;
        }

        let previous = config
            .links
            .get(url)
            .filter(|entry| result.cached && is_fresh(entry.last_checked, now));

        let entry = match previous {
            Some(entry) => entry.clone(),
            None => SkipEntry {
                last_checked: now,
                is_valid: false,
                error: result.error.clone(),
                status_code: result.status_code,
            },
        };
        links.insert(url.clone(), entry);
    }

    config.links = links;
    config.last_updated = now;
}
