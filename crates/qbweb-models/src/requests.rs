//! Typed request parameters for the mutating endpoints.

use serde::{Deserialize, Serialize};

/// Form body for `/auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    /// Web UI user name.
    pub username: String,
    /// Web UI password.
    pub password: String,
}

/// Bulk torrent actions served by `POST /torrents/<action>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TorrentAction {
    /// Pause transfers.
    Pause,
    /// Resume transfers.
    Resume,
    /// Remove the torrents, optionally deleting their payload from disk.
    Delete {
        /// Whether downloaded files are removed as well.
        delete_files: bool,
    },
    /// Force a hash recheck.
    Recheck,
    /// Force a reannounce to all trackers.
    Reannounce,
    /// Assign a category (empty string clears it).
    SetCategory {
        /// Category name.
        category: String,
    },
    /// Toggle automatic torrent management.
    SetAutoManagement {
        /// Whether automatic management is enabled.
        enable: bool,
    },
}

impl TorrentAction {
    /// Endpoint name under `/torrents/`.
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Delete { .. } => "delete",
            Self::Recheck => "recheck",
            Self::Reannounce => "reannounce",
            Self::SetCategory { .. } => "setCategory",
            Self::SetAutoManagement { .. } => "setAutoManagement",
        }
    }

    /// Form fields for the action: the pipe-joined `hashes` plus any extras.
    #[must_use]
    pub fn form_fields(&self, hashes: &[String]) -> Vec<(&'static str, String)> {
        let mut fields = vec![("hashes", hashes.join("|"))];
        match self {
            Self::Delete { delete_files } => fields.push(("deleteFiles", delete_files.to_string())),
            Self::SetCategory { category } => fields.push(("category", category.clone())),
            Self::SetAutoManagement { enable } => fields.push(("enable", enable.to_string())),
            Self::Pause | Self::Resume | Self::Recheck | Self::Reannounce => {}
        }
        fields
    }
}

/// A `.torrent` file attached to an add request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TorrentFile {
    /// File name reported in the multipart part.
    pub file_name: String,
    /// Raw metainfo bytes.
    pub bytes: Vec<u8>,
}

/// Scalar parameters of `/torrents/add`.
///
/// Booleans are sent as `true`/`false` strings, lists are joined the way the
/// daemon expects (newlines for URLs, commas for tags).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTorrentsRequest {
    /// Magnet links or HTTP(S) URLs.
    pub urls: Vec<String>,
    /// Download folder.
    pub savepath: Option<String>,
    /// Cookie sent when fetching `urls`.
    pub cookie: Option<String>,
    /// Category to assign.
    pub category: Option<String>,
    /// Tags to assign, joined with commas on the wire.
    pub tags: Vec<String>,
    /// Skip the hash check.
    pub skip_checking: Option<bool>,
    /// Add in paused state.
    pub paused: Option<bool>,
    /// Create the root folder.
    pub root_folder: Option<bool>,
    /// Rename the torrent.
    pub rename: Option<String>,
    /// Upload limit in bytes/s.
    pub up_limit: Option<i64>,
    /// Download limit in bytes/s.
    pub dl_limit: Option<i64>,
    /// Use automatic torrent management.
    pub auto_tmm: Option<bool>,
    /// Download pieces in order.
    pub sequential_download: Option<bool>,
    /// Prioritise the first and last pieces.
    pub first_last_piece_prio: Option<bool>,
}

impl AddTorrentsRequest {
    /// Request that adds the given magnet links or URLs.
    #[must_use]
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Flatten the set parameters into form fields, skipping unset ones.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if !self.urls.is_empty() {
            fields.push(("urls", self.urls.join("\n")));
        }
        push_opt(&mut fields, "savepath", self.savepath.as_ref());
        push_opt(&mut fields, "cookie", self.cookie.as_ref());
        push_opt(&mut fields, "category", self.category.as_ref());
        if !self.tags.is_empty() {
            fields.push(("tags", self.tags.join(",")));
        }
        push_opt(&mut fields, "skip_checking", self.skip_checking.as_ref());
        push_opt(&mut fields, "paused", self.paused.as_ref());
        push_opt(&mut fields, "root_folder", self.root_folder.as_ref());
        push_opt(&mut fields, "rename", self.rename.as_ref());
        push_opt(&mut fields, "upLimit", self.up_limit.as_ref());
        push_opt(&mut fields, "dlLimit", self.dl_limit.as_ref());
        push_opt(&mut fields, "autoTMM", self.auto_tmm.as_ref());
        push_opt(
            &mut fields,
            "sequentialDownload",
            self.sequential_download.as_ref(),
        );
        push_opt(
            &mut fields,
            "firstLastPiecePrio",
            self.first_last_piece_prio.as_ref(),
        );
        fields
    }
}

fn push_opt<T: ToString>(
    fields: &mut Vec<(&'static str, String)>,
    name: &'static str,
    value: Option<&T>,
) {
    if let Some(value) = value {
        fields.push((name, value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes() -> Vec<String> {
        vec!["aaa".to_string(), "bbb".to_string()]
    }

    #[test]
    fn action_fields_join_hashes_with_pipes() {
        let fields = TorrentAction::Pause.form_fields(&hashes());
        assert_eq!(fields, vec![("hashes", "aaa|bbb".to_string())]);
        assert_eq!(TorrentAction::Pause.endpoint(), "pause");
    }

    #[test]
    fn action_extras_are_appended() {
        let delete = TorrentAction::Delete { delete_files: true };
        assert_eq!(
            delete.form_fields(&hashes()),
            vec![
                ("hashes", "aaa|bbb".to_string()),
                ("deleteFiles", "true".to_string())
            ]
        );
        let category = TorrentAction::SetCategory {
            category: "tv".into(),
        };
        assert_eq!(category.endpoint(), "setCategory");
        assert_eq!(category.form_fields(&[])[1], ("category", "tv".to_string()));
        let auto = TorrentAction::SetAutoManagement { enable: false };
        assert_eq!(auto.form_fields(&[])[1], ("enable", "false".to_string()));
    }

    #[test]
    fn add_request_skips_unset_fields() {
        let mut request = AddTorrentsRequest::from_urls(["magnet:?xt=1", "magnet:?xt=2"]);
        request.paused = Some(true);
        request.tags = vec!["a".into(), "b".into()];
        assert_eq!(
            request.form_fields(),
            vec![
                ("urls", "magnet:?xt=1\nmagnet:?xt=2".to_string()),
                ("tags", "a,b".to_string()),
                ("paused", "true".to_string()),
            ]
        );
        assert!(AddTorrentsRequest::default().form_fields().is_empty());
    }
}
