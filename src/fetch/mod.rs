//! Remote collection retrieval.
//!
//! This module provides the HTTP fetcher and the fan-out/fan-in
//! orchestration that runs the three fetches concurrently.

pub mod fetcher;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_server;

pub use fetcher::{Fetcher, FetcherConfig};
pub use orchestrator::{fetch_all, Endpoints};
