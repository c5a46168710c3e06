//! # Design
//!
//! - Centralise errors raised while wiring and running the client.
//! - Keep messages constant and carry context in fields.

use qbweb_api::ApiError;
use qbweb_store::StoreError;
use qbweb_telemetry::TelemetryError;
use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable was missing.
    #[error("missing environment configuration")]
    MissingEnv {
        /// Name of the missing variable.
        name: &'static str,
    },
    /// An environment value failed validation.
    #[error("invalid configuration")]
    InvalidConfig {
        /// Variable that failed validation.
        field: &'static str,
        /// Machine-readable reason.
        reason: &'static str,
        /// Offending value.
        value: Option<String>,
    },
    /// The daemon refused the supplied credentials.
    #[error("login rejected")]
    LoginRejected {
        /// HTTP status of the login response.
        status: u16,
        /// Response body, usually `Fails.`.
        body: String,
    },
    /// Logging could not be initialised.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: TelemetryError,
    },
    /// A direct API call failed.
    #[error("api operation failed")]
    Api {
        /// Operation identifier.
        operation: &'static str,
        /// Source client error.
        source: ApiError,
    },
    /// A store action failed.
    #[error("store operation failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Source store error.
        source: StoreError,
    },
}

impl AppError {
    pub(crate) const fn telemetry(operation: &'static str, source: TelemetryError) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn api(operation: &'static str, source: ApiError) -> Self {
        Self::Api { operation, source }
    }

    pub(crate) const fn store(operation: &'static str, source: StoreError) -> Self {
        Self::Store { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn messages_are_constant_and_sources_are_kept() {
        let missing = AppError::MissingEnv { name: "QBWEB_URL" };
        assert_eq!(missing.to_string(), "missing environment configuration");
        assert!(missing.source().is_none());

        let store = AppError::store(
            "store.poll_main_data",
            StoreError::NotPopulated { rid: 3 },
        );
        assert_eq!(store.to_string(), "store operation failed");
        assert!(store.source().is_some());
    }
}
