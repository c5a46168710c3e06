#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
//! Shared DTOs for the qBittorrent Web API v2.
//!
//! These types are used by the HTTP client for request/response encoding and by
//! the store for its cached snapshot, so the wire contract has a single source
//! of truth. Records that the daemon updates incrementally come in pairs: the
//! cached record and a `*Patch` carrying only the fields that changed.

#[macro_use]
mod macros;

pub mod maindata;
pub mod merge;
pub mod requests;
pub mod responses;
pub mod state;

pub use maindata::{
    Category, CategoryPatch, MainData, MainDataUpdate, ServerState, ServerStatePatch, Torrent,
    TorrentPatch,
};
pub use merge::deep_merge;
pub use requests::{AddTorrentsRequest, LoginCredentials, TorrentAction, TorrentFile};
pub use responses::{LogEntry, LogLevel, TorrentPeers, TrackerEntry, TransferInfo};
pub use state::{StateType, TorrentState};

/// Flat key/value daemon preferences as served by `/app/preferences`.
pub type Preferences = serde_json::Map<String, serde_json::Value>;
