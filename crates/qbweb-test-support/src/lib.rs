#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]

//! Shared test helpers used across the qbweb suites.
//! Layout: fixtures.rs (daemon payloads), mocks.rs (mock daemon wiring).

pub mod fixtures;
pub mod mocks;
