//! Typed bodies of the read endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `/transfer/info`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferInfo {
    /// Global download rate in bytes/s.
    pub dl_info_speed: i64,
    /// Bytes downloaded this session.
    pub dl_info_data: i64,
    /// Global upload rate in bytes/s.
    pub up_info_speed: i64,
    /// Bytes uploaded this session.
    pub up_info_data: i64,
    /// Global download limit in bytes/s.
    pub dl_rate_limit: i64,
    /// Global upload limit in bytes/s.
    pub up_rate_limit: i64,
    /// Connected DHT nodes.
    pub dht_nodes: i64,
    /// `connected`, `firewalled` or `disconnected`.
    pub connection_status: String,
}

/// Severity of a daemon log message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Routine message.
    Normal,
    /// Informational message.
    Info,
    /// Something needs attention.
    Warning,
    /// A failure.
    Critical,
}

/// One entry of `/log/main`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic message id; pass the last one seen as `last_known_id`.
    pub id: i64,
    /// Message text.
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Raw type bit flag (1 normal, 2 info, 4 warning, 8 critical).
    #[serde(rename = "type")]
    pub kind: u8,
}

impl LogEntry {
    /// Decoded severity; unknown flags read as [`LogLevel::Normal`].
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        match self.kind {
            2 => LogLevel::Info,
            4 => LogLevel::Warning,
            8 => LogLevel::Critical,
            _ => LogLevel::Normal,
        }
    }

    /// Timestamp as a UTC date, when it is in range.
    #[must_use]
    pub fn logged_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// One entry of `/torrents/trackers`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerEntry {
    /// Tracker URL, or a pseudo-tracker label such as `** [DHT] **`.
    pub url: String,
    /// 0 disabled, 1 not contacted, 2 working, 3 updating, 4 not working.
    pub status: i64,
    /// Tier number; pseudo-trackers (DHT, PeX, LSD) report an empty string.
    pub tier: Value,
    /// Peers reported by the tracker.
    pub num_peers: i64,
    /// Seeds reported by the tracker.
    pub num_seeds: i64,
    /// Leechers reported by the tracker.
    pub num_leeches: i64,
    /// Completed downloads reported by the tracker.
    pub num_downloaded: i64,
    /// Last tracker message.
    pub msg: String,
}

/// Body of `/sync/torrentPeers`, itself a delta keyed by `ip:port`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorrentPeers {
    /// Revision cursor for the next request.
    pub rid: u64,
    /// Whether `peers` is a complete list.
    pub full_update: bool,
    /// Whether the peer flags column applies.
    pub show_flags: Option<bool>,
    /// Peer fields keyed by `ip:port`.
    pub peers: BTreeMap<String, Map<String, Value>>,
    /// Keys of peers that disconnected.
    pub peers_removed: Vec<String>,
}
