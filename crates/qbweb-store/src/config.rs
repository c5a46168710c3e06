//! User configuration: defaults, deep-merge with the persisted document, and
//! load/save against [`KeyValueStorage`].

use std::time::Duration;

use qbweb_models::{StateType, deep_merge, merge::merge_object};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::storage::KeyValueStorage;

/// Storage key the user configuration is persisted under.
pub const CONFIG_KEY: &str = "qb-config";

/// Default polling interval for main data, in milliseconds.
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 2000;

/// Default number of torrent rows per page.
pub const DEFAULT_ROWS_PER_PAGE: u32 = 1000;

/// Effective configuration: defaults deep-merged with user overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Polling interval in milliseconds; never zero.
    pub update_interval: u64,
    /// Torrent list paging.
    pub pagination: PaginationConfig,
    /// Active torrent list filter.
    pub filter: FilterConfig,
    /// User sections this client does not model, kept as stored.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pagination of the torrent list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationConfig {
    /// Rows shown per page.
    pub rows_per_page: u32,
}

/// Active torrent-list filter; `None` means unfiltered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Coarse state category.
    pub state: Option<StateType>,
    /// Category name.
    pub category: Option<String>,
    /// Tracker hostname.
    pub site: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL_MS,
            pagination: PaginationConfig::default(),
            filter: FilterConfig::default(),
            extra: Map::new(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

impl Config {
    /// Polling interval as a [`Duration`]. A zero interval reads as the
    /// default so timers built from it never see a zero period.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        if self.update_interval == 0 {
            Duration::from_millis(DEFAULT_UPDATE_INTERVAL_MS)
        } else {
            Duration::from_millis(self.update_interval)
        }
    }
}

/// Default configuration as a JSON document.
#[must_use]
pub fn default_document() -> Value {
    json!({
        "updateInterval": DEFAULT_UPDATE_INTERVAL_MS,
        "pagination": {"rowsPerPage": DEFAULT_ROWS_PER_PAGE},
        "filter": {"state": null, "category": null, "site": null}
    })
}

/// Defaults deep-merged with `user`, including sections this client does
/// not model.
#[must_use]
pub fn effective_document(user: &Map<String, Value>) -> Map<String, Value> {
    let mut document = default_document();
    deep_merge(&mut document, Value::Object(user.clone()));
    match document {
        Value::Object(sections) => sections,
        _ => Map::new(),
    }
}

/// Deep-merge `user` over the defaults and decode the result.
///
/// Each field is decoded on its own. A value that does not decode (for
/// instance a filter state that was renamed) or a zero polling interval is
/// reported and replaced by its default; every other user value still wins.
#[must_use]
pub fn effective_config(user: &Map<String, Value>) -> Config {
    let defaults = Config::default();
    let mut sections = effective_document(user);

    let mut update_interval =
        take_field(&mut sections, "updateInterval", defaults.update_interval);
    if update_interval == 0 {
        warn!(field = "updateInterval", "polling interval must be positive; using default");
        update_interval = defaults.update_interval;
    }

    let mut pagination = take_section(&mut sections, "pagination");
    let pagination = PaginationConfig {
        rows_per_page: take_field(
            &mut pagination,
            "rowsPerPage",
            defaults.pagination.rows_per_page,
        ),
    };

    let mut filter = take_section(&mut sections, "filter");
    let filter = FilterConfig {
        state: take_field(&mut filter, "state", None),
        category: take_field(&mut filter, "category", None),
        site: take_field(&mut filter, "site", None),
    };

    Config {
        update_interval,
        pagination,
        filter,
        extra: sections,
    }
}

fn take_section(sections: &mut Map<String, Value>, key: &'static str) -> Map<String, Value> {
    match sections.remove(key) {
        Some(Value::Object(section)) => section,
        Some(_) => {
            warn!(field = key, "user configuration section is not an object; using defaults");
            Map::new()
        }
        None => Map::new(),
    }
}

fn take_field<T: DeserializeOwned>(
    section: &mut Map<String, Value>,
    key: &'static str,
    fallback: T,
) -> T {
    let Some(value) = section.remove(key) else {
        return fallback;
    };
    serde_json::from_value(value).unwrap_or_else(|err| {
        warn!(error = %err, field = key, "invalid user configuration value; using default");
        fallback
    })
}

/// Deep-merge a partial fragment into the section named `key`.
///
/// Object fragments merge into an existing object section; anything else
/// replaces the section.
pub fn merge_section(user: &mut Map<String, Value>, key: &str, value: Value) {
    let mut fragment = Map::new();
    fragment.insert(key.to_string(), value);
    merge_object(user, fragment);
}

/// Read the persisted user document. Missing or unreadable data yields an
/// empty document.
#[must_use]
pub fn load_user_config(storage: &dyn KeyValueStorage) -> Map<String, Value> {
    let raw = match storage.load(CONFIG_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Map::new(),
        Err(err) => {
            warn!(error = %err, key = CONFIG_KEY, "failed to read user configuration");
            return Map::new();
        }
    };
    match serde_json::from_str::<Map<String, Value>>(&raw) {
        Ok(document) => document,
        Err(err) => {
            warn!(
                error = %err,
                key = CONFIG_KEY,
                "persisted user configuration is not a JSON object"
            );
            Map::new()
        }
    }
}

/// Persist the user document. Failures are logged and otherwise ignored;
/// the in-memory state stays authoritative.
pub fn save_user_config(storage: &dyn KeyValueStorage, user: &Map<String, Value>) {
    let serialized = Value::Object(user.clone()).to_string();
    if let Err(err) = storage.save(CONFIG_KEY, &serialized) {
        warn!(error = %err, key = CONFIG_KEY, "failed to persist user configuration");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use anyhow::Result;

    fn document(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn empty_user_document_yields_defaults() {
        let config = effective_config(&Map::new());
        assert_eq!(config, Config::default());
        assert_eq!(config.update_interval, 2000);
        assert_eq!(config.pagination.rows_per_page, 1000);
        assert_eq!(config.filter, FilterConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn default_document_decodes_to_defaults() -> Result<()> {
        let decoded: Config = serde_json::from_value(default_document())?;
        assert_eq!(decoded, Config::default());
        Ok(())
    }

    #[test]
    fn user_overrides_merge_over_defaults() {
        let user = document(json!({"filter": {"state": "seeding"}}));
        let config = effective_config(&user);
        assert_eq!(config.filter.state, Some(StateType::Seeding));
        assert_eq!(config.filter.category, None);
        assert_eq!(config.filter.site, None);
        assert_eq!(config.update_interval, DEFAULT_UPDATE_INTERVAL_MS);
    }

    #[test]
    fn undecodable_values_fall_back_one_field_at_a_time() {
        let user = document(json!({
            "updateInterval": "fast",
            "pagination": {"rowsPerPage": 50},
            "filter": {"state": "sleeping", "category": "linux"}
        }));
        let config = effective_config(&user);
        assert_eq!(config.update_interval, DEFAULT_UPDATE_INTERVAL_MS);
        assert_eq!(config.pagination.rows_per_page, 50);
        assert_eq!(config.filter.state, None);
        assert_eq!(config.filter.category.as_deref(), Some("linux"));
    }

    #[test]
    fn non_object_section_only_resets_that_section() {
        let user = document(json!({"pagination": 5, "updateInterval": 500}));
        let config = effective_config(&user);
        assert_eq!(config.pagination, PaginationConfig::default());
        assert_eq!(config.update_interval, 500);
    }

    #[test]
    fn zero_update_interval_is_replaced_by_the_default() {
        let config = effective_config(&document(json!({"updateInterval": 0})));
        assert_eq!(config.update_interval, DEFAULT_UPDATE_INTERVAL_MS);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));

        let forced = Config {
            update_interval: 0,
            ..Config::default()
        };
        assert_eq!(forced.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn unmodelled_sections_stay_visible() {
        let mut user = Map::new();
        merge_section(&mut user, "locale", json!({"lang": "de"}));

        let config = effective_config(&user);
        assert_eq!(config.extra.get("locale"), Some(&json!({"lang": "de"})));

        let document = effective_document(&user);
        assert_eq!(document.get("locale"), Some(&json!({"lang": "de"})));
        assert_eq!(document.get("updateInterval"), Some(&json!(2000)));
    }

    #[test]
    fn merge_section_merges_objects_and_replaces_scalars() {
        let mut user = document(json!({"filter": {"state": "seeding"}}));
        merge_section(&mut user, "filter", json!({"category": "linux"}));
        merge_section(&mut user, "updateInterval", json!(500));
        merge_section(&mut user, "updateInterval", json!(750));

        assert_eq!(
            Value::Object(user),
            json!({
                "filter": {"state": "seeding", "category": "linux"},
                "updateInterval": 750
            })
        );
    }

    #[test]
    fn user_document_survives_a_save_and_load() {
        let storage = MemoryStorage::new();
        assert!(load_user_config(&storage).is_empty());

        let user = document(json!({"pagination": {"rowsPerPage": 50}}));
        save_user_config(&storage, &user);

        let loaded = load_user_config(&storage);
        assert_eq!(loaded, user);
        assert_eq!(effective_config(&loaded).pagination.rows_per_page, 50);
    }

    #[test]
    fn corrupt_persisted_document_loads_as_empty() -> Result<()> {
        let storage = MemoryStorage::new();
        storage.save(CONFIG_KEY, "[1, 2")?;
        assert!(load_user_config(&storage).is_empty());
        Ok(())
    }
}
