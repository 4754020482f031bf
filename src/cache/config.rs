// src/cache/config.rs
// =============================================================================
// The result cache: a long-term record of every external URL the project
// links to, whether it worked last time, and where it is referenced.
//
// On disk (.link-checker.json):
// {
//   "version": "1.0",
//   "lastUpdated": "2024-05-01T12:00:00Z",
//   "successfulLinks": { "https://a.dev": { "lastChecked": ..., "locations": ["README.md:3"] } },
//   "failedLinks":     { "https://b.dev": { "lastChecked": ..., "locations": [...], "error": "HTTP 404: Not Found" } }
// }
//
// A URL lives in exactly one of the two maps. update_link_status() is the
// only function that moves it between them.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::{is_fresh, read_json, write_json_atomic, CACHE_VERSION};
use crate::checker::LinkKind;
use crate::error::CacheError;
use crate::link::{LinkInfo, ValidationResult};

/// Default location of the result cache, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".link-checker.json";

/// What we know about one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub last_checked: DateTime<Utc>,
    /// "file:line" strings, no duplicates
    #[serde(default)]
    pub locations: Vec<String>,
    /// Only set for failed links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The whole result cache. BTreeMaps keep the JSON output sorted and stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkConfig {
    pub version: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    successful_links: BTreeMap<String, CacheEntry>,
    #[serde(default)]
    failed_links: BTreeMap<String, CacheEntry>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            version: CACHE_VERSION.to_string(),
            last_updated: Utc::now(),
            successful_links: BTreeMap::new(),
            failed_links: BTreeMap::new(),
        }
    }
}

impl LinkConfig {
    pub fn successful_links(&self) -> &BTreeMap<String, CacheEntry> {
        &self.successful_links
    }

    pub fn failed_links(&self) -> &BTreeMap<String, CacheEntry> {
        &self.failed_links
    }

    pub fn is_empty(&self) -> bool {
        self.successful_links.is_empty() && self.failed_links.is_empty()
    }

    // A cached result for `url`, if one was recorded within the freshness
    // window. Works for both successes and failures.
    pub fn fresh_result(&self, url: &str, now: DateTime<Utc>) -> Option<ValidationResult> {
        if let Some(entry) = self.successful_links.get(url) {
            return is_fresh(entry.last_checked, now)
                .then(|| ValidationResult::valid().from_cache(entry.last_checked));
        }

        let entry = self.failed_links.get(url)?;
        is_fresh(entry.last_checked, now).then(|| {
            let error = entry.error.as_deref().unwrap_or("Previously failed");
            ValidationResult::invalid(error).from_cache(entry.last_checked)
        })
    }

    // Empties every location list, keeping the entries themselves
    //
    // Used before recording a full scan: afterwards only URLs that are still
    // referenced have locations, and cleanup_config() drops the rest.
    pub fn clear_locations(&mut self) {
        for entry in self
            .successful_links
            .values_mut()
            .chain(self.failed_links.values_mut())
        {
            entry.locations.clear();
        }
    }

    // Adds a location to an existing entry without touching its status or
    // timestamp. Returns false when the URL is not in the cache.
    fn add_location(&mut self, url: &str, location: &str) -> bool {
        let entry = match self.successful_links.get_mut(url) {
            Some(entry) => entry,
            None => match self.failed_links.get_mut(url) {
                Some(entry) => entry,
                None => return false,
            },
        };
        push_unique(&mut entry.locations, location);
        true
    }
}

// Loads the result cache, falling back to an empty one
//
// A missing or corrupt file is not an error: the cache is only an
// optimization, so we log it and start over.
pub fn load_config(path: &Path) -> LinkConfig {
    read_json(path).unwrap_or_default()
}

// Saves the result cache, stamping `lastUpdated`
pub fn save_config(config: &mut LinkConfig, path: &Path) -> Result<(), CacheError> {
    config.last_updated = Utc::now();
    write_json_atomic(config, path)
}

// Records the outcome of checking `url` at `location`
//
// - valid:   the URL leaves failedLinks (if it was there) and is upserted
//            into successfulLinks
// - invalid: the mirror image, also storing/overwriting `error`
//
// Either way `location` is added if new and `lastChecked` is set to now.
// Locations already known for the URL move with it to the other map.
pub fn update_link_status(
    config: &mut LinkConfig,
    url: &str,
    location: &str,
    is_valid: bool,
    error: Option<&str>,
) {
    set_link_status(config, url, location, is_valid, error, Utc::now());
}

fn set_link_status(
    config: &mut LinkConfig,
    url: &str,
    location: &str,
    is_valid: bool,
    error: Option<&str>,
    checked_at: DateTime<Utc>,
) {
    let (target, other) = if is_valid {
        (&mut config.successful_links, &mut config.failed_links)
    } else {
        (&mut config.failed_links, &mut config.successful_links)
    };

    let carried = other.remove(url).map(|e| e.locations).unwrap_or_default();

    let entry = target.entry(url.to_string()).or_insert_with(|| CacheEntry {
        last_checked: checked_at,
        locations: Vec::new(),
        error: None,
    });

    for old in &carried {
        push_unique(&mut entry.locations, old);
    }
    push_unique(&mut entry.locations, location);
    entry.last_checked = checked_at;
    entry.error = if is_valid {
        None
    } else {
        Some(error.unwrap_or("Unknown error").to_string())
    };
}

// Removes every entry, in either map, that no longer has any location
pub fn cleanup_config(config: &mut LinkConfig) {
    let before = config.successful_links.len() + config.failed_links.len();

    config
        .successful_links
        .retain(|_, entry| !entry.locations.is_empty());
    config
        .failed_links
        .retain(|_, entry| !entry.locations.is_empty());

    let removed = before - config.successful_links.len() - config.failed_links.len();
    if removed > 0 {
        log::info!("Removed {} unreferenced URL(s) from the cache", removed);
    }
}

// Feeds a scan's results into the cache
//
// Only external links are recorded: a relative path like "./intro.md" means
// a different file in every directory, so it makes a poor cache key.
// Results that were themselves served from the cache only add their
// location, so the original lastChecked still decides when they expire.
pub fn record_results(config: &mut LinkConfig, results: &[LinkInfo]) {
    for info in results {
        let Some(result) = &info.validation_result else {
            continue;
        };
        if LinkKind::of(&info.link) != LinkKind::External {
            continue;
        }

        let location = info.link.location.to_string();
        if result.cached && config.add_location(&info.link.url, &location) {
            continue;
        }
        // A reused result (e.g. from the skip cache) keeps its original time
        let checked_at = match (result.cached, result.checked_at) {
            (true, Some(checked_at)) => checked_at,
            _ => Utc::now(),
        };
        set_link_status(
            config,
            &info.link.url,
            &location,
            result.is_valid,
            result.error.as_deref(),
            checked_at,
        );
    }
}

fn push_unique(locations: &mut Vec<String>, location: &str) {
    if !locations.iter().any(|l| l == location) {
        locations.push(location.to_string());
    }
}
