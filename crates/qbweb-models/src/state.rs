//! Fine-grained torrent states and the coarse categories the UI filters by.

use serde::{Deserialize, Serialize};

/// Torrent status as reported by the daemon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TorrentState {
    /// Some error occurred; applies to paused torrents.
    Error,
    /// Torrent data files are missing.
    MissingFiles,
    /// Seeding and data is being transferred.
    Uploading,
    /// Paused after finishing the download.
    #[serde(rename = "pausedUP")]
    PausedUp,
    /// Stopped after finishing the download (daemon 5.x naming).
    #[serde(rename = "stoppedUP")]
    StoppedUp,
    /// Queueing is enabled and the torrent is queued for upload.
    #[serde(rename = "queuedUP")]
    QueuedUp,
    /// Seeding, but no connections are being made.
    #[serde(rename = "stalledUP")]
    StalledUp,
    /// Finished downloading and is being checked.
    #[serde(rename = "checkingUP")]
    CheckingUp,
    /// Forced uploading, ignoring the queue limit.
    #[serde(rename = "forcedUP")]
    ForcedUp,
    /// Allocating disk space.
    Allocating,
    /// Downloading.
    Downloading,
    /// Fetching metadata for a magnet link.
    #[serde(rename = "metaDL")]
    MetaDl,
    /// Forced metadata fetch, ignoring the queue limit.
    #[serde(rename = "forcedMetaDL")]
    ForcedMetaDl,
    /// Paused before finishing the download.
    #[serde(rename = "pausedDL")]
    PausedDl,
    /// Stopped before finishing the download (daemon 5.x naming).
    #[serde(rename = "stoppedDL")]
    StoppedDl,
    /// Queueing is enabled and the torrent is queued for download.
    #[serde(rename = "queuedDL")]
    QueuedDl,
    /// Downloading, but no connections are being made.
    #[serde(rename = "stalledDL")]
    StalledDl,
    /// Checking before finishing the download.
    #[serde(rename = "checkingDL")]
    CheckingDl,
    /// Forced downloading, ignoring the queue limit.
    #[serde(rename = "forcedDL")]
    ForcedDl,
    /// Checking resume data on daemon startup.
    CheckingResumeData,
    /// Moving to another location.
    Moving,
    /// Any state this client does not recognise.
    #[default]
    #[serde(other)]
    Unknown,
}

impl TorrentState {
    const fn is_download_side(self) -> bool {
        matches!(
            self,
            Self::Downloading
                | Self::MetaDl
                | Self::ForcedMetaDl
                | Self::PausedDl
                | Self::StoppedDl
                | Self::QueuedDl
                | Self::StalledDl
                | Self::CheckingDl
                | Self::ForcedDl
                | Self::Allocating
        )
    }

    const fn is_seeding(self) -> bool {
        matches!(
            self,
            Self::Uploading | Self::StalledUp | Self::CheckingUp | Self::QueuedUp | Self::ForcedUp
        )
    }

    const fn is_paused(self) -> bool {
        matches!(
            self,
            Self::PausedDl | Self::PausedUp | Self::StoppedDl | Self::StoppedUp
        )
    }

    const fn is_transferring(self) -> bool {
        matches!(
            self,
            Self::Downloading
                | Self::ForcedDl
                | Self::MetaDl
                | Self::ForcedMetaDl
                | Self::Uploading
                | Self::ForcedUp
        )
    }
}

/// Coarse, UI-facing state categories. A torrent may belong to several.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    /// Still fetching payload data (including paused or queued downloads).
    Downloading,
    /// Actively offering data to peers.
    Seeding,
    /// Payload fully downloaded.
    Completed,
    /// Not paused.
    Resumed,
    /// Paused or stopped.
    Paused,
    /// Transferring data right now.
    Active,
    /// Not transferring data.
    Inactive,
    /// Failed or missing its files.
    Errored,
}

impl StateType {
    /// Every category, in display order.
    pub const ALL: [Self; 8] = [
        Self::Downloading,
        Self::Seeding,
        Self::Completed,
        Self::Resumed,
        Self::Paused,
        Self::Active,
        Self::Inactive,
        Self::Errored,
    ];

    /// Whether a torrent in `state` belongs to this category.
    #[must_use]
    pub const fn matches(self, state: TorrentState) -> bool {
        match self {
            Self::Downloading => state.is_download_side(),
            Self::Seeding => state.is_seeding(),
            Self::Completed => {
                state.is_seeding()
                    || matches!(state, TorrentState::PausedUp | TorrentState::StoppedUp)
            }
            Self::Resumed => !state.is_paused(),
            Self::Paused => state.is_paused(),
            Self::Active => state.is_transferring(),
            Self::Inactive => !state.is_transferring(),
            Self::Errored => matches!(state, TorrentState::Error | TorrentState::MissingFiles),
        }
    }

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Downloading => "downloading",
            Self::Seeding => "seeding",
            Self::Completed => "completed",
            Self::Resumed => "resumed",
            Self::Paused => "paused",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Errored => "errored",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(state: TorrentState) -> Vec<StateType> {
        StateType::ALL
            .into_iter()
            .filter(|kind| kind.matches(state))
            .collect()
    }

    #[test]
    fn uploading_belongs_to_several_categories() {
        assert_eq!(
            categories(TorrentState::Uploading),
            vec![
                StateType::Seeding,
                StateType::Completed,
                StateType::Resumed,
                StateType::Active
            ]
        );
    }

    #[test]
    fn paused_download_is_downloading_and_paused() {
        assert_eq!(
            categories(TorrentState::PausedDl),
            vec![StateType::Downloading, StateType::Paused, StateType::Inactive]
        );
    }

    #[test]
    fn errors_are_flagged() {
        assert!(StateType::Errored.matches(TorrentState::MissingFiles));
        assert!(StateType::Errored.matches(TorrentState::Error));
        assert!(!StateType::Errored.matches(TorrentState::StalledDl));
    }

    #[test]
    fn wire_names_round_through_serde() -> anyhow::Result<()> {
        let state: TorrentState = serde_json::from_str("\"stalledUP\"")?;
        assert_eq!(state, TorrentState::StalledUp);
        let state: TorrentState = serde_json::from_str("\"checkingResumeData\"")?;
        assert_eq!(state, TorrentState::CheckingResumeData);
        let state: TorrentState = serde_json::from_str("\"somethingNew\"")?;
        assert_eq!(state, TorrentState::Unknown);
        assert_eq!(serde_json::to_string(&StateType::Errored)?, "\"errored\"");
        Ok(())
    }
}
