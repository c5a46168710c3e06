//! Payloads of `/sync/maindata` and the records they carry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::TorrentState;

patchable_record! {
    /// A single torrent as cached from the main-data feed, keyed by its hash.
    pub struct Torrent => TorrentPatch {
        /// Unix time the torrent was added.
        added_on: i64,
        /// Bytes still to download.
        amount_left: i64,
        /// Whether automatic torrent management is enabled.
        auto_tmm: bool,
        /// Distributed copies available in the swarm.
        availability: f64,
        /// Assigned category (empty when uncategorised).
        category: String,
        /// Bytes completed.
        completed: i64,
        /// Unix time the torrent completed, `-1` when it has not.
        completion_on: i64,
        /// Absolute path of the torrent content.
        content_path: String,
        /// Download limit in bytes/s, `-1` when unlimited.
        dl_limit: i64,
        /// Download rate in bytes/s.
        dlspeed: i64,
        /// Bytes downloaded over the torrent's lifetime.
        downloaded: i64,
        /// Bytes downloaded this session.
        downloaded_session: i64,
        /// Estimated seconds to completion.
        eta: i64,
        /// Whether first and last pieces are prioritised.
        f_l_piece_prio: bool,
        /// Whether the queue is bypassed.
        force_start: bool,
        /// Unix time of the last transfer.
        last_activity: i64,
        /// Magnet link for the torrent.
        magnet_uri: String,
        /// Effective share ratio limit.
        max_ratio: f64,
        /// Effective seeding time limit in minutes.
        max_seeding_time: i64,
        /// Display name.
        name: String,
        /// Seeds in the swarm.
        num_complete: i64,
        /// Leechers in the swarm.
        num_incomplete: i64,
        /// Connected leechers.
        num_leechs: i64,
        /// Connected seeds.
        num_seeds: i64,
        /// Queue position, `-1` when queueing is disabled or the torrent is seeding.
        priority: i64,
        /// Completion ratio in the range 0.0-1.0.
        progress: f64,
        /// Share ratio.
        ratio: f64,
        /// Per-torrent ratio limit, `-2` to use the global one.
        ratio_limit: f64,
        /// Directory the payload is saved to.
        save_path: String,
        /// Seconds spent seeding.
        seeding_time: i64,
        /// Per-torrent seeding limit in minutes.
        seeding_time_limit: i64,
        /// Unix time a complete copy was last seen.
        seen_complete: i64,
        /// Whether sequential download is enabled.
        seq_dl: bool,
        /// Bytes selected for download.
        size: i64,
        /// Fine-grained daemon status.
        state: TorrentState,
        /// Whether super seeding is enabled.
        super_seeding: bool,
        /// Comma-separated tag list.
        tags: String,
        /// Seconds the torrent has been active.
        time_active: i64,
        /// Total payload size in bytes.
        total_size: i64,
        /// URL of the currently working tracker, empty when none.
        tracker: String,
        /// Number of trackers.
        trackers_count: i64,
        /// Upload limit in bytes/s, `-1` when unlimited.
        up_limit: i64,
        /// Bytes uploaded over the torrent's lifetime.
        uploaded: i64,
        /// Bytes uploaded this session.
        uploaded_session: i64,
        /// Upload rate in bytes/s.
        upspeed: i64,
    }
}

impl Torrent {
    /// Tags split out of the comma-separated wire representation.
    #[must_use]
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

patchable_record! {
    /// A torrent category and its default save path.
    pub struct Category => CategoryPatch {
        /// Category name.
        name: String,
        /// Default save path for the category.
        #[serde(rename = "savePath")]
        save_path: String,
    }
}

patchable_record! {
    /// Global transfer statistics and connection state.
    pub struct ServerState => ServerStatePatch {
        /// Bytes downloaded across all sessions.
        alltime_dl: i64,
        /// Bytes uploaded across all sessions.
        alltime_ul: i64,
        /// `connected`, `firewalled` or `disconnected`.
        connection_status: String,
        /// Connected DHT nodes.
        dht_nodes: i64,
        /// Bytes downloaded this session.
        dl_info_data: i64,
        /// Global download rate in bytes/s.
        dl_info_speed: i64,
        /// Global download limit in bytes/s.
        dl_rate_limit: i64,
        /// Free bytes in the default save path.
        free_space_on_disk: i64,
        /// Global share ratio, formatted by the daemon.
        global_ratio: String,
        /// Whether torrent queueing is enabled.
        queueing: bool,
        /// Suggested poll interval in milliseconds.
        refresh_interval: i64,
        /// Open peer connections.
        total_peer_connections: i64,
        /// Bytes uploaded this session.
        up_info_data: i64,
        /// Global upload rate in bytes/s.
        up_info_speed: i64,
        /// Global upload limit in bytes/s.
        up_rate_limit: i64,
        /// Whether the alternative speed limits are active.
        use_alt_speed_limits: bool,
    }
}

/// Fully materialised main-data snapshot held by the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainData {
    /// Revision this snapshot corresponds to.
    pub rid: u64,
    /// Torrents keyed by info hash.
    pub torrents: BTreeMap<String, Torrent>,
    /// Categories keyed by name.
    pub categories: BTreeMap<String, Category>,
    /// Known tags, in the order the daemon reported them.
    pub tags: Vec<String>,
    /// Global statistics.
    pub server_state: ServerState,
}

/// Body of a `/sync/maindata` response: either a full snapshot
/// (`full_update = true`) or a delta since the requested `rid`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainDataUpdate {
    /// Revision cursor to send with the next request.
    pub rid: u64,
    /// Whether this payload replaces all cached state.
    pub full_update: bool,
    /// New torrents and changed torrent fields.
    pub torrents: BTreeMap<String, TorrentPatch>,
    /// Hashes of torrents that no longer exist.
    pub torrents_removed: Vec<String>,
    /// New categories and changed category fields.
    pub categories: BTreeMap<String, CategoryPatch>,
    /// Names of deleted categories.
    pub categories_removed: Vec<String>,
    /// Tags to append.
    pub tags: Vec<String>,
    /// Tags that were deleted.
    pub tags_removed: Vec<String>,
    /// Changed server statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_state: Option<ServerStatePatch>,
}

impl From<MainDataUpdate> for MainData {
    /// Materialise a payload as a snapshot on its own. Removal lists are ignored.
    fn from(update: MainDataUpdate) -> Self {
        Self {
            rid: update.rid,
            torrents: update
                .torrents
                .into_iter()
                .map(|(hash, patch)| (hash, Torrent::from(patch)))
                .collect(),
            categories: update
                .categories
                .into_iter()
                .map(|(name, patch)| (name, Category::from(patch)))
                .collect(),
            tags: update.tags,
            server_state: update.server_state.map(ServerState::from).unwrap_or_default(),
        }
    }
}
