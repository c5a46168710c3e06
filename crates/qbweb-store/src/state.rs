//! The store's owned state, the mutations that change it, and the change
//! notifications emitted after each commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use qbweb_models::{MainData, MainDataUpdate, Preferences};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::config::{self, Config};
use crate::error::StoreResult;
use crate::maindata;
use crate::path;

/// Dialog opened by the add-torrent flow.
pub const ADD_DIALOG: &str = "add";

/// Open flag and parameters of a named dialog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogState {
    /// Whether the dialog is shown.
    pub open: bool,
    /// Caller-supplied parameters, `null` when none were given.
    pub params: Value,
}

/// Everything the store owns.
#[derive(Clone, Debug, PartialEq)]
pub struct AppState {
    /// Revision cursor of the last applied main-data payload.
    pub rid: u64,
    /// Cached snapshot; `None` until the first full update.
    pub main_data: Option<Arc<MainData>>,
    /// Last known daemon preferences.
    pub preferences: Preferences,
    /// Persisted user overrides, merged over the defaults on read.
    pub user_config: Map<String, Value>,
    /// Dialog flags keyed by dialog name.
    pub dialogs: BTreeMap<String, DialogState>,
    /// Free-form UI state addressed by path.
    pub ui: Value,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_user_config(Map::new())
    }
}

impl AppState {
    /// Fresh state around an already-loaded user configuration.
    #[must_use]
    pub fn with_user_config(user_config: Map<String, Value>) -> Self {
        let mut dialogs = BTreeMap::new();
        dialogs.insert(ADD_DIALOG.to_string(), DialogState::default());
        Self {
            rid: 0,
            main_data: None,
            preferences: Preferences::new(),
            user_config,
            dialogs,
            ui: json!({"addParams": {}}),
        }
    }

    /// True once a full main-data snapshot has been applied.
    #[must_use]
    pub const fn is_data_ready(&self) -> bool {
        self.main_data.is_some()
    }

    /// Defaults deep-merged with the user overrides.
    #[must_use]
    pub fn config(&self) -> Config {
        config::effective_config(&self.user_config)
    }

    /// Defaults deep-merged with the user overrides as a raw document,
    /// including sections [`Config`] does not model.
    #[must_use]
    pub fn config_document(&self) -> Map<String, Value> {
        config::effective_document(&self.user_config)
    }

    /// Dialog state by name; unknown dialogs read as closed.
    #[must_use]
    pub fn dialog(&self, key: &str) -> DialogState {
        self.dialogs.get(key).cloned().unwrap_or_default()
    }

    /// Apply one mutation. Returns the change to announce, or `None` when the
    /// mutation was a no-op.
    ///
    /// # Errors
    ///
    /// Fails without touching the state when a delta arrives before any
    /// snapshot or a UI path is malformed.
    pub fn apply(&mut self, mutation: Mutation) -> StoreResult<Option<StoreChange>> {
        match mutation {
            Mutation::UpdateMainData(update) => {
                let full_update = update.full_update;
                let next = maindata::apply_update(self.main_data.as_deref(), update)?;
                self.rid = next.rid;
                self.main_data = Some(Arc::new(next));
                Ok(Some(StoreChange::MainData {
                    rid: self.rid,
                    full_update,
                }))
            }
            Mutation::UpdatePreferences(preferences) => {
                self.preferences = preferences;
                Ok(Some(StoreChange::Preferences))
            }
            Mutation::UpdateConfig { key, value } => {
                config::merge_section(&mut self.user_config, &key, value);
                Ok(Some(StoreChange::Config { key }))
            }
            Mutation::DialogAction { key, open, params } => {
                let open = open.unwrap_or_else(|| !self.dialog(&key).open);
                self.dialogs
                    .insert(key.clone(), DialogState { open, params });
                Ok(Some(StoreChange::Dialog { key, open }))
            }
            Mutation::UpdateState { path, value } => {
                if path.is_empty() {
                    return Ok(None);
                }
                path::set_path(&mut self.ui, &path, value)?;
                Ok(Some(StoreChange::State { path }))
            }
        }
    }
}

/// The only ways to change [`AppState`].
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// Apply a `/sync/maindata` payload.
    UpdateMainData(MainDataUpdate),
    /// Replace the cached daemon preferences.
    UpdatePreferences(Preferences),
    /// Deep-merge `value` into the user config section `key` and persist it.
    UpdateConfig {
        /// Section name, e.g. `filter`.
        key: String,
        /// Fragment merged into the section.
        value: Value,
    },
    /// Set a dialog open (`Some(true)`), closed (`Some(false)`) or toggle it
    /// (`None`), replacing its parameters.
    DialogAction {
        /// Dialog name.
        key: String,
        /// Target flag; `None` toggles.
        open: Option<bool>,
        /// New parameters.
        params: Value,
    },
    /// Write `value` at a dotted/indexed path in the UI state.
    UpdateState {
        /// Target path, e.g. `addParams.urls[0]`.
        path: String,
        /// Value to write.
        value: Value,
    },
}

impl Mutation {
    /// Shorthand for [`Mutation::UpdateConfig`].
    pub fn update_config(key: impl Into<String>, value: Value) -> Self {
        Self::UpdateConfig {
            key: key.into(),
            value,
        }
    }

    /// Shorthand for [`Mutation::DialogAction`] without parameters.
    pub fn dialog(key: impl Into<String>, open: Option<bool>) -> Self {
        Self::DialogAction {
            key: key.into(),
            open,
            params: Value::Null,
        }
    }

    /// Shorthand for [`Mutation::UpdateState`].
    pub fn update_state(path: impl Into<String>, value: Value) -> Self {
        Self::UpdateState {
            path: path.into(),
            value,
        }
    }
}

/// Announcement broadcast after a mutation commits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreChange {
    /// A new main-data snapshot is available.
    MainData {
        /// Revision of the new snapshot.
        rid: u64,
        /// Whether the snapshot was rebuilt from a full update.
        full_update: bool,
    },
    /// The cached preferences were replaced.
    Preferences,
    /// A user config section changed and was persisted.
    Config {
        /// Section name.
        key: String,
    },
    /// A dialog opened or closed.
    Dialog {
        /// Dialog name.
        key: String,
        /// Flag after the change.
        open: bool,
    },
    /// UI state changed at `path`.
    State {
        /// Path that was written.
        path: String,
    },
}
