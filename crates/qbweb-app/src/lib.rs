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

//! qbweb composition root.
//!
//! Layout: `settings.rs` (environment), `bootstrap.rs` (wiring and the
//! polling loop), `error.rs`.

pub mod bootstrap;
pub mod error;
pub mod settings;

pub use bootstrap::{run_app, run_until};
pub use error::{AppError, AppResult};
pub use settings::AppSettings;
