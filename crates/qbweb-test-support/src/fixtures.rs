//! Canned daemon payloads.

use anyhow::Result;
use qbweb_models::MainDataUpdate;
use serde_json::{Value, json};

/// Hash of the seeding torrent in [`sample_full_update`].
pub const SEEDING_HASH: &str = "aaa";
/// Hash of the paused download in [`sample_full_update`].
pub const PAUSED_HASH: &str = "bbb";
/// Hash of the trackerless stalled download in [`sample_full_update`].
pub const STALLED_HASH: &str = "ccc";

/// Decode a JSON payload into a main-data update.
///
/// # Errors
///
/// Returns an error when the payload does not match the wire format.
pub fn main_data_update(payload: Value) -> Result<MainDataUpdate> {
    Ok(serde_json::from_value(payload)?)
}

/// A torrent record with the fields the views look at.
#[must_use]
pub fn torrent_json(name: &str, state: &str, tracker: &str, save_path: &str) -> Value {
    json!({
        "name": name,
        "state": state,
        "tracker": tracker,
        "save_path": save_path,
        "progress": 0.0,
        "dlspeed": 0,
        "upspeed": 0
    })
}

/// Full-update payload with three torrents, two categories and one tag.
#[must_use]
pub fn sample_full_update_json() -> Value {
    json!({
        "rid": 1,
        "full_update": true,
        "torrents": {
            SEEDING_HASH: torrent_json(
                "debian.iso",
                "uploading",
                "udp://tracker.alpha.example:1337/announce",
                "/data/linux"
            ),
            PAUSED_HASH: torrent_json(
                "arch.iso",
                "pausedDL",
                "https://tracker.beta.example/announce",
                "/data/iso"
            ),
            STALLED_HASH: torrent_json("notes.tar", "stalledDL", "", "/data/linux")
        },
        "categories": {
            "linux": {"name": "linux", "savePath": "/data/linux"},
            "iso": {"name": "iso", "savePath": "/data/iso"}
        },
        "tags": ["x"],
        "server_state": {
            "connection_status": "connected",
            "dl_info_speed": 1024,
            "up_info_speed": 512
        }
    })
}

/// [`sample_full_update_json`] decoded.
///
/// # Errors
///
/// Returns an error if the fixture no longer matches the wire format.
pub fn sample_full_update() -> Result<MainDataUpdate> {
    main_data_update(sample_full_update_json())
}
