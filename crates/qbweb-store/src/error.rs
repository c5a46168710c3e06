//! Error types for store operations.

use qbweb_api::ApiError;
use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by mutations and actions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A delta arrived before any full snapshot was cached.
    #[error("main data delta received before a full snapshot")]
    NotPopulated {
        /// Revision carried by the rejected delta.
        rid: u64,
    },
    /// A state path could not be parsed.
    #[error("invalid state path")]
    InvalidPath {
        /// Offending path.
        path: String,
        /// Machine-readable reason.
        reason: &'static str,
    },
    /// An API call made by an action failed.
    #[error("api call failed")]
    Api {
        /// Operation identifier.
        operation: &'static str,
        /// Source client error.
        source: ApiError,
    },
}

impl StoreError {
    pub(crate) const fn api(operation: &'static str, source: ApiError) -> Self {
        Self::Api { operation, source }
    }

    pub(crate) fn invalid_path(path: &str, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason,
        }
    }
}
