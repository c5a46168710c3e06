//! The [`Store`]: owned state, mutation commit, change broadcast and the
//! async actions that round-trip through the API client.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use qbweb_api::{ApiClient, RawCall};
use qbweb_models::{
    AddTorrentsRequest, MainData, Preferences, StateType, TorrentAction, TorrentFile,
};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::{self, Config};
use crate::error::{StoreError, StoreResult};
use crate::state::{AppState, DialogState, Mutation, StoreChange};
use crate::storage::KeyValueStorage;
use crate::views::{self, TorrentRow};

/// Buffered change notifications per subscriber before lagging.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Single source of truth for client state.
pub struct Store {
    api: Arc<ApiClient>,
    storage: Arc<dyn KeyValueStorage>,
    state: Mutex<AppState>,
    changes: broadcast::Sender<StoreChange>,
}

impl Store {
    /// Build a store, loading the persisted user configuration from `storage`.
    #[must_use]
    pub fn new(api: Arc<ApiClient>, storage: Arc<dyn KeyValueStorage>) -> Self {
        let user_config = config::load_user_config(storage.as_ref());
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            api,
            storage,
            state: Mutex::new(AppState::with_user_config(user_config)),
            changes,
        }
    }

    /// Client the actions call through.
    #[must_use]
    pub const fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Receive a [`StoreChange`] for every committed mutation from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Apply a mutation atomically, persist the user config if it changed,
    /// then announce the change.
    ///
    /// Saving and sending happen under the state lock, so storage always ends
    /// up with the last committed config and subscribers see changes in commit
    /// order.
    ///
    /// # Errors
    ///
    /// Propagates the mutation's failure; state is left unchanged.
    pub fn commit(&self, mutation: Mutation) -> StoreResult<()> {
        let mut state = self.lock();
        let Some(change) = state.apply(mutation)? else {
            return Ok(());
        };
        if matches!(change, StoreChange::Config { .. }) {
            config::save_user_config(self.storage.as_ref(), &state.user_config);
        }
        // No subscribers is fine.
        let _ = self.changes.send(change);
        drop(state);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the whole state.
    #[must_use]
    pub fn snapshot(&self) -> AppState {
        self.lock().clone()
    }

    /// Revision cursor of the last applied main-data payload.
    #[must_use]
    pub fn rid(&self) -> u64 {
        self.lock().rid
    }

    /// Current main-data snapshot, if one has been fetched.
    #[must_use]
    pub fn main_data(&self) -> Option<Arc<MainData>> {
        self.lock().main_data.clone()
    }

    /// True once a full main-data snapshot has been applied.
    #[must_use]
    pub fn is_data_ready(&self) -> bool {
        self.lock().is_data_ready()
    }

    /// Last known daemon preferences.
    #[must_use]
    pub fn preferences(&self) -> Preferences {
        self.lock().preferences.clone()
    }

    /// Effective configuration (defaults under user overrides).
    #[must_use]
    pub fn config(&self) -> Config {
        self.lock().config()
    }

    /// Effective configuration as a raw document, including sections
    /// [`Config`] does not model.
    #[must_use]
    pub fn config_document(&self) -> serde_json::Map<String, Value> {
        self.lock().config_document()
    }

    /// Named dialog state; unknown dialogs read as closed.
    #[must_use]
    pub fn dialog(&self, key: &str) -> DialogState {
        self.lock().dialog(key)
    }

    /// Free-form UI state.
    #[must_use]
    pub fn ui_state(&self) -> Value {
        self.lock().ui.clone()
    }

    /// Every torrent with its hash; empty before the first snapshot.
    #[must_use]
    pub fn all_torrents(&self) -> Vec<TorrentRow> {
        self.main_data()
            .map(|data| views::all_torrents(&data))
            .unwrap_or_default()
    }

    /// Distinct non-empty save paths across all torrents.
    #[must_use]
    pub fn all_save_paths(&self) -> Vec<String> {
        self.main_data()
            .map(|data| views::all_save_paths(&data))
            .unwrap_or_default()
    }

    /// Torrents grouped by tracker hostname (`""` when trackerless).
    #[must_use]
    pub fn torrents_by_site(&self) -> BTreeMap<String, Vec<TorrentRow>> {
        self.main_data()
            .map(|data| views::group_by_site(&data))
            .unwrap_or_default()
    }

    /// Torrents grouped by coarse state; a torrent can sit in several groups.
    #[must_use]
    pub fn torrents_by_state(&self) -> BTreeMap<StateType, Vec<TorrentRow>> {
        self.main_data()
            .map(|data| views::group_by_state(&data))
            .unwrap_or_default()
    }

    /// Fetch daemon preferences and replace the cached copy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] when the request fails.
    pub async fn fetch_preferences(&self) -> StoreResult<()> {
        let preferences = self
            .api
            .app_preferences()
            .await
            .map_err(|source| StoreError::api("store.fetch_preferences", source))?;
        self.commit(Mutation::UpdatePreferences(preferences))
    }

    /// Shallow-merge `partial` onto the cached preferences, send the merged
    /// whole and commit it once the daemon accepts it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] when the request fails; the cache is left
    /// as it was.
    pub async fn push_preferences(&self, partial: Preferences) -> StoreResult<()> {
        let mut merged = self.preferences();
        merged.extend(partial);
        self.api
            .set_preferences(&merged)
            .await
            .map_err(|source| StoreError::api("store.push_preferences", source))?;
        self.commit(Mutation::UpdatePreferences(merged))
    }

    /// Poll `/sync/maindata` with the current cursor and merge the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] when the request fails or
    /// [`StoreError::NotPopulated`] for a delta with no snapshot.
    pub async fn poll_main_data(&self) -> StoreResult<()> {
        let rid = self.rid();
        let cursor = (rid != 0).then_some(rid);
        let update = self
            .api
            .main_data(cursor)
            .await
            .map_err(|source| StoreError::api("store.poll_main_data", source))?;

        if update.full_update {
            info!(
                rid = update.rid,
                torrents = update.torrents.len(),
                "received full main data snapshot"
            );
        } else {
            debug!(
                rid = update.rid,
                changed = update.torrents.len(),
                removed = update.torrents_removed.len(),
                "received main data delta"
            );
        }
        self.commit(Mutation::UpdateMainData(update))
    }

    /// Run a typed torrent action. The next poll reflects the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] when the request fails.
    pub async fn torrent_action(
        &self,
        action: &TorrentAction,
        hashes: &[String],
    ) -> StoreResult<()> {
        self.api
            .torrent_action(action, hashes)
            .await
            .map(drop)
            .map_err(|source| StoreError::api("store.torrent_action", source))
    }

    /// Add torrents by URL and/or file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] when the request fails.
    pub async fn add_torrents(
        &self,
        request: &AddTorrentsRequest,
        files: &[TorrentFile],
    ) -> StoreResult<()> {
        self.api
            .add_torrents(request, files)
            .await
            .map(drop)
            .map_err(|source| StoreError::api("store.add_torrents", source))
    }

    /// Create a category with an optional default save path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] when the request fails.
    pub async fn create_category(&self, name: &str, save_path: &str) -> StoreResult<()> {
        let call = RawCall::root("torrents/createCategory")
            .param("category", name)
            .param("savePath", save_path);
        self.raw("store.create_category", &call).await
    }

    /// Delete categories by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] when the request fails.
    pub async fn remove_categories(&self, names: &[String]) -> StoreResult<()> {
        let call = RawCall::root("torrents/removeCategories").param("categories", names.join("\n"));
        self.raw("store.remove_categories", &call).await
    }

    /// Register tags with the daemon.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] when the request fails.
    pub async fn create_tags(&self, tags: &[String]) -> StoreResult<()> {
        let call = RawCall::root("torrents/createTags").param("tags", tags.join(","));
        self.raw("store.create_tags", &call).await
    }

    /// Delete tags, detaching them from every torrent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] when the request fails.
    pub async fn delete_tags(&self, tags: &[String]) -> StoreResult<()> {
        let call = RawCall::root("torrents/deleteTags").param("tags", tags.join(","));
        self.raw("store.delete_tags", &call).await
    }

    /// Ask the daemon to refresh an RSS feed or folder.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Api`] when the request fails.
    pub async fn refresh_rss_item(&self, item_path: &str) -> StoreResult<()> {
        let call = RawCall::rss("refreshItem").param("itemPath", item_path);
        self.raw("store.refresh_rss_item", &call).await
    }

    async fn raw(&self, operation: &'static str, call: &RawCall) -> StoreResult<()> {
        self.api
            .call(call)
            .await
            .map(drop)
            .map_err(|source| StoreError::api(operation, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_KEY;
    use crate::storage::MemoryStorage;
    use anyhow::{Result, anyhow};
    use httpmock::prelude::*;
    use qbweb_test_support::fixtures::{SEEDING_HASH, sample_full_update_json};
    use qbweb_test_support::mocks::{api_path, client_for};
    use serde_json::json;

    fn store_for(server: &MockServer, storage: Arc<MemoryStorage>) -> Result<Store> {
        Ok(Store::new(Arc::new(client_for(server)?), storage))
    }

    #[tokio::test]
    async fn polling_starts_without_a_cursor_then_sends_it() -> Result<()> {
        let server = MockServer::start_async().await;
        let mut first = server.mock(|when, then| {
            when.method(GET).path(api_path("sync/maindata"));
            then.status(200).json_body(sample_full_update_json());
        });

        let store = store_for(&server, Arc::new(MemoryStorage::new()))?;
        let mut changes = store.subscribe();
        assert!(!store.is_data_ready());

        store.poll_main_data().await?;
        first.assert();
        first.delete();
        assert!(store.is_data_ready());
        assert_eq!(store.rid(), 1);
        assert_eq!(
            changes.try_recv()?,
            StoreChange::MainData {
                rid: 1,
                full_update: true
            }
        );

        let second = server.mock(|when, then| {
            when.method(GET)
                .path(api_path("sync/maindata"))
                .query_param("rid", "1");
            then.status(200).json_body(json!({
                "rid": 2,
                "torrents_removed": [SEEDING_HASH]
            }));
        });
        store.poll_main_data().await?;
        second.assert();

        assert_eq!(store.rid(), 2);
        assert_eq!(store.all_torrents().len(), 2);
        assert!(!store.torrents_by_site().contains_key("tracker.alpha.example"));
        Ok(())
    }

    #[tokio::test]
    async fn failed_poll_keeps_the_cache() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path(api_path("sync/maindata"));
            then.status(500).body("boom");
        });

        let store = store_for(&server, Arc::new(MemoryStorage::new()))?;
        let err = store
            .poll_main_data()
            .await
            .err()
            .ok_or_else(|| anyhow!("expected failure"))?;
        mock.assert();
        assert!(matches!(
            err,
            StoreError::Api {
                operation: "store.poll_main_data",
                ..
            }
        ));
        assert!(!store.is_data_ready());
        assert_eq!(store.rid(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn pushing_preferences_merges_over_the_cache() -> Result<()> {
        let server = MockServer::start_async().await;
        let fetch = server.mock(|when, then| {
            when.method(GET).path(api_path("app/preferences"));
            then.status(200)
                .json_body(json!({"save_path": "/data", "dl_limit": 0}));
        });
        let push = server.mock(|when, then| {
            when.method(POST).path(api_path("app/setPreferences"));
            then.status(200);
        });

        let store = store_for(&server, Arc::new(MemoryStorage::new()))?;
        store.fetch_preferences().await?;
        fetch.assert();

        let mut partial = Preferences::new();
        partial.insert("dl_limit".into(), json!(1024));
        store.push_preferences(partial).await?;
        push.assert();

        assert_eq!(
            Value::Object(store.preferences()),
            json!({"save_path": "/data", "dl_limit": 1024})
        );
        Ok(())
    }

    #[tokio::test]
    async fn rejected_preferences_push_leaves_the_cache() -> Result<()> {
        let server = MockServer::start_async().await;
        let push = server.mock(|when, then| {
            when.method(POST).path(api_path("app/setPreferences"));
            then.status(403).body("Forbidden");
        });

        let store = store_for(&server, Arc::new(MemoryStorage::new()))?;
        let mut partial = Preferences::new();
        partial.insert("dl_limit".into(), json!(1));
        assert!(store.push_preferences(partial).await.is_err());
        push.assert();
        assert!(store.preferences().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn config_updates_persist_and_reload() -> Result<()> {
        let server = MockServer::start_async().await;
        let storage = Arc::new(MemoryStorage::new());

        let store = store_for(&server, storage.clone())?;
        let mut changes = store.subscribe();
        store.commit(Mutation::update_config(
            "pagination",
            json!({"rowsPerPage": 50}),
        ))?;
        assert_eq!(
            changes.try_recv()?,
            StoreChange::Config {
                key: "pagination".into()
            }
        );

        let persisted = storage
            .load(CONFIG_KEY)?
            .ok_or_else(|| anyhow!("config not persisted"))?;
        assert_eq!(
            serde_json::from_str::<Value>(&persisted)?,
            json!({"pagination": {"rowsPerPage": 50}})
        );

        let reloaded = store_for(&server, storage)?;
        let config = reloaded.config();
        assert_eq!(config.pagination.rows_per_page, 50);
        assert_eq!(config.update_interval, config::DEFAULT_UPDATE_INTERVAL_MS);
        Ok(())
    }

    #[tokio::test]
    async fn non_config_mutations_do_not_touch_storage() -> Result<()> {
        let server = MockServer::start_async().await;
        let storage = Arc::new(MemoryStorage::new());
        let store = store_for(&server, storage.clone())?;

        store.commit(Mutation::dialog("add", Some(true)))?;
        store.commit(Mutation::update_state("addParams.paused", json!(true)))?;

        assert!(store.dialog("add").open);
        assert_eq!(store.ui_state()["addParams"]["paused"], json!(true));
        assert_eq!(storage.load(CONFIG_KEY)?, None);
        Ok(())
    }

    #[tokio::test]
    async fn category_tag_and_rss_actions_send_their_form_fields() -> Result<()> {
        let server = MockServer::start_async().await;
        let create_category = server.mock(|when, then| {
            when.method(POST)
                .path(api_path("torrents/createCategory"))
                .form_urlencoded_tuple("category", "linux")
                .form_urlencoded_tuple("savePath", "/data/linux");
            then.status(200);
        });
        let remove_categories = server.mock(|when, then| {
            when.method(POST)
                .path(api_path("torrents/removeCategories"))
                .form_urlencoded_tuple("categories", "linux\niso");
            then.status(200);
        });
        let create_tags = server.mock(|when, then| {
            when.method(POST)
                .path(api_path("torrents/createTags"))
                .form_urlencoded_tuple("tags", "x,y");
            then.status(200);
        });
        let delete_tags = server.mock(|when, then| {
            when.method(POST)
                .path(api_path("torrents/deleteTags"))
                .form_urlencoded_tuple("tags", "x");
            then.status(200);
        });
        let refresh = server.mock(|when, then| {
            when.method(POST)
                .path(api_path("rss/refreshItem"))
                .form_urlencoded_tuple("itemPath", "News\\Linux");
            then.status(200);
        });

        let store = store_for(&server, Arc::new(MemoryStorage::new()))?;
        store.create_category("linux", "/data/linux").await?;
        store
            .remove_categories(&["linux".into(), "iso".into()])
            .await?;
        store.create_tags(&["x".into(), "y".into()]).await?;
        store.delete_tags(&["x".into()]).await?;
        store.refresh_rss_item("News\\Linux").await?;

        create_category.assert();
        remove_categories.assert();
        create_tags.assert();
        delete_tags.assert();
        refresh.assert();
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_config_commits_persist_the_final_document() -> Result<()> {
        let server = MockServer::start_async().await;
        let storage = Arc::new(MemoryStorage::new());
        let store = Arc::new(store_for(&server, storage.clone())?);

        let writers: Vec<_> = (0..16)
            .map(|writer| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for step in 0..25 {
                        store.commit(Mutation::update_config(
                            format!("section{writer}"),
                            json!({"step": step}),
                        ))?;
                    }
                    Ok::<_, StoreError>(())
                })
            })
            .collect();
        for writer in writers {
            writer.await??;
        }

        let persisted = storage
            .load(CONFIG_KEY)?
            .ok_or_else(|| anyhow!("config not persisted"))?;
        let persisted: Value = serde_json::from_str(&persisted)?;
        assert_eq!(persisted, Value::Object(store.snapshot().user_config));
        for writer in 0..16 {
            assert_eq!(persisted[format!("section{writer}")], json!({"step": 24}));
        }
        Ok(())
    }

    #[tokio::test]
    async fn rejected_state_path_leaves_the_store_untouched() -> Result<()> {
        let server = MockServer::start_async().await;
        let store = store_for(&server, Arc::new(MemoryStorage::new()))?;
        let mut changes = store.subscribe();
        let before = store.ui_state();

        let result = store.commit(Mutation::update_state(
            "addParams.urls[18446744073709551615]",
            json!("magnet:?xt=abc"),
        ));
        assert!(matches!(result, Err(StoreError::InvalidPath { .. })));
        assert_eq!(store.ui_state(), before);
        assert!(changes.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn torrent_actions_are_delegated() -> Result<()> {
        let server = MockServer::start_async().await;
        let pause = server.mock(|when, then| {
            when.method(POST).path(api_path("torrents/pause"));
            then.status(200);
        });
        let add = server.mock(|when, then| {
            when.method(POST).path(api_path("torrents/add"));
            then.status(200).body("Ok.");
        });

        let store = store_for(&server, Arc::new(MemoryStorage::new()))?;
        store
            .torrent_action(&TorrentAction::Pause, &[SEEDING_HASH.to_string()])
            .await?;
        store
            .add_torrents(
                &AddTorrentsRequest::from_urls(["magnet:?xt=urn:btih:abc"]),
                &[],
            )
            .await?;

        pause.assert();
        add.assert();
        Ok(())
    }
}
