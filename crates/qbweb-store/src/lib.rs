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
//! Client-side state store for the qBittorrent Web API.
//!
//! # Design
//! - One owned [`AppState`] behind the [`Store`]; [`Mutation`] values are the
//!   only writers and each one applies atomically.
//! - Async actions call the API client, then commit a mutation.
//! - Derived views are pure functions recomputed on read.
//! - Main-data snapshots are shared as `Arc`s and replaced on commit, so a
//!   reader holding an old snapshot never observes a merge in progress.

pub mod config;
pub mod error;
pub mod maindata;
pub mod path;
pub mod state;
pub mod storage;
pub mod store;
pub mod views;

pub use config::{CONFIG_KEY, Config, FilterConfig, PaginationConfig};
pub use error::{StoreError, StoreResult};
pub use state::{AppState, DialogState, Mutation, StoreChange};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError, StorageResult};
pub use store::Store;
pub use views::TorrentRow;
