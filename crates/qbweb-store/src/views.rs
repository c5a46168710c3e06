//! Derived views over a main-data snapshot. All pure; callers recompute
//! them after a [`StoreChange`](crate::StoreChange).

use std::collections::{BTreeMap, BTreeSet};

use qbweb_models::{MainData, StateType, Torrent};
use serde::Serialize;
use url::Url;

/// A torrent with its hash injected alongside the record fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TorrentRow {
    /// Info hash the torrent is keyed by.
    pub hash: String,
    /// The cached record.
    #[serde(flatten)]
    pub torrent: Torrent,
}

/// Every cached torrent as a row, ordered by hash.
#[must_use]
pub fn all_torrents(data: &MainData) -> Vec<TorrentRow> {
    data.torrents
        .iter()
        .map(|(hash, torrent)| TorrentRow {
            hash: hash.clone(),
            torrent: torrent.clone(),
        })
        .collect()
}

/// Distinct non-empty save paths, sorted.
#[must_use]
pub fn all_save_paths(data: &MainData) -> Vec<String> {
    data.torrents
        .values()
        .map(|torrent| torrent.save_path.as_str())
        .filter(|path| !path.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Hostname of a torrent's current tracker; `""` when it has none or the
/// URL does not parse.
#[must_use]
pub fn tracker_site(torrent: &Torrent) -> String {
    Url::parse(&torrent.tracker)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Rows grouped by tracker hostname.
#[must_use]
pub fn group_by_site(data: &MainData) -> BTreeMap<String, Vec<TorrentRow>> {
    let mut groups: BTreeMap<String, Vec<TorrentRow>> = BTreeMap::new();
    for row in all_torrents(data) {
        groups.entry(tracker_site(&row.torrent)).or_default().push(row);
    }
    groups
}

/// Rows grouped by coarse state. A row appears under every category its
/// state matches; categories nothing matches are omitted.
#[must_use]
pub fn group_by_state(data: &MainData) -> BTreeMap<StateType, Vec<TorrentRow>> {
    let mut groups: BTreeMap<StateType, Vec<TorrentRow>> = BTreeMap::new();
    for row in all_torrents(data) {
        for kind in StateType::ALL {
            if kind.matches(row.torrent.state) {
                groups.entry(kind).or_default().push(row.clone());
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use qbweb_test_support::fixtures::{
        PAUSED_HASH, SEEDING_HASH, STALLED_HASH, sample_full_update,
    };
    use serde_json::json;

    fn sample() -> Result<MainData> {
        Ok(MainData::from(sample_full_update()?))
    }

    fn hashes(rows: &[TorrentRow]) -> Vec<&str> {
        rows.iter().map(|row| row.hash.as_str()).collect()
    }

    #[test]
    fn rows_carry_their_hash() -> Result<()> {
        let rows = all_torrents(&sample()?);
        assert_eq!(hashes(&rows), vec![SEEDING_HASH, PAUSED_HASH, STALLED_HASH]);

        let encoded = serde_json::to_value(&rows[0])?;
        assert_eq!(encoded["hash"], json!(SEEDING_HASH));
        assert_eq!(encoded["name"], json!("debian.iso"));
        Ok(())
    }

    #[test]
    fn save_paths_are_distinct_and_non_empty() -> Result<()> {
        let mut data = sample()?;
        if let Some(torrent) = data.torrents.get_mut(PAUSED_HASH) {
            torrent.save_path.clear();
        }
        assert_eq!(all_save_paths(&data), vec!["/data/linux".to_string()]);
        Ok(())
    }

    #[test]
    fn torrents_group_by_tracker_host() -> Result<()> {
        let groups = group_by_site(&sample()?);
        assert_eq!(
            groups.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["", "tracker.alpha.example", "tracker.beta.example"]
        );
        assert_eq!(hashes(&groups[""]), vec![STALLED_HASH]);
        assert_eq!(hashes(&groups["tracker.alpha.example"]), vec![SEEDING_HASH]);
        Ok(())
    }

    #[test]
    fn a_torrent_appears_in_every_matching_state_group() -> Result<()> {
        let groups = group_by_state(&sample()?);

        let seeding = &groups[&StateType::Seeding];
        let completed = &groups[&StateType::Completed];
        assert!(hashes(seeding).contains(&SEEDING_HASH));
        assert!(hashes(completed).contains(&SEEDING_HASH));

        let downloading = hashes(&groups[&StateType::Downloading]);
        assert_eq!(downloading, vec![PAUSED_HASH, STALLED_HASH]);
        assert_eq!(hashes(&groups[&StateType::Paused]), vec![PAUSED_HASH]);
        assert!(!groups.contains_key(&StateType::Errored));
        Ok(())
    }

    #[test]
    fn empty_snapshot_has_empty_views() {
        let data = MainData::default();
        assert!(all_torrents(&data).is_empty());
        assert!(all_save_paths(&data).is_empty());
        assert!(group_by_site(&data).is_empty());
        assert!(group_by_state(&data).is_empty());
    }
}
