//! Error types for API client operations.

use thiserror::Error;

/// Result alias for API client operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures surfaced by [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL could not be combined with an endpoint path.
    #[error("invalid API url")]
    InvalidUrl {
        /// Offending URL or path.
        url: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// A raw action path would resolve outside its scope.
    #[error("invalid raw action")]
    InvalidAction {
        /// Offending action.
        action: String,
    },
    /// A default header value could not be built.
    #[error("invalid header value")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
    },
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    ClientBuild {
        /// Source client error.
        source: reqwest::Error,
    },
    /// The request could not be sent or its body could not be read.
    #[error("http request failed")]
    Transport {
        /// Endpoint path relative to the API base.
        path: String,
        /// Source transport error.
        source: reqwest::Error,
    },
    /// The daemon answered with a status the operation does not accept.
    #[error("unexpected response status")]
    Status {
        /// Endpoint path relative to the API base.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// The response body was not the expected JSON shape.
    #[error("failed to decode response body")]
    Decode {
        /// Endpoint path relative to the API base.
        path: String,
        /// Source decoding error.
        source: serde_json::Error,
    },
    /// A request body could not be encoded.
    #[error("failed to encode request body")]
    Encode {
        /// Endpoint path relative to the API base.
        path: String,
        /// Source encoding error.
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status carried by the error, if the daemon answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
