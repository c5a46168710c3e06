#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]

//! Binary entrypoint: connects to the daemon and keeps the store polling
//! until interrupted.

use qbweb_app::{AppResult, run_app};

/// Boot the runner and block until shutdown.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
