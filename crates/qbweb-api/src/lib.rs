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
//! Async client for the qBittorrent Web API v2.
//!
//! # Design
//! - One method per logical operation; no retries, no caching, no state beyond
//!   the session cookie.
//! - Bulk torrent actions share a single form-encoded primitive.
//! - Untyped escape hatches live in [`RawCall`] so new daemon endpoints do not
//!   need a dedicated wrapper.

pub mod client;
pub mod error;
pub mod raw;

pub use client::{API_BASE_PATH, ApiClient, ClientConfig, DEFAULT_TIMEOUT_SECS, LoginResponse};
pub use error::{ApiError, ApiResult};
pub use raw::{RawCall, RawScope};
