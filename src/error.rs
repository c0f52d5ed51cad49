//! Typed errors for the fetch, store and join stages.
//!
//! Each stage returns its own error type so the driver can tell a failed
//! download from a failed file write and pick the matching exit code.

use crate::models::{JoinAnomalies, Resource};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while downloading one of the remote collections.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent or its body could not be read.
    #[error("failed to fetch {resource} from {url}")]
    Request {
        resource: Resource,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint did not answer within the configured timeout.
    #[error("{resource} request to {url} timed out after {seconds}s")]
    Timeout {
        resource: Resource,
        url: String,
        seconds: u64,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("{resource} endpoint {url} returned HTTP {status}")]
    Status {
        resource: Resource,
        url: String,
        status: u16,
    },

    /// The body was not a JSON array of the expected records.
    #[error("failed to decode {resource} from {url}")]
    Decode {
        resource: Resource,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The task running the fetch panicked or was cancelled.
    #[error("{resource} fetch task did not complete")]
    Task {
        resource: Resource,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl FetchError {
    /// The collection this error belongs to, if any.
    pub fn resource(&self) -> Option<Resource> {
        match self {
            FetchError::Client(_) => None,
            FetchError::Request { resource, .. }
            | FetchError::Timeout { resource, .. }
            | FetchError::Status { resource, .. }
            | FetchError::Decode { resource, .. }
            | FetchError::Task { resource, .. } => Some(*resource),
        }
    }
}

/// Errors raised while persisting or re-reading the aggregate file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode aggregate for {}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Raised in strict mode when the join would drop records.
#[derive(Debug, Error)]
#[error(
    "join dropped {} post(s) with unknown users and {} comment(s) with unknown posts",
    .anomalies.orphan_posts.len(),
    .anomalies.orphan_comments.len()
)]
pub struct IntegrityError {
    pub anomalies: JoinAnomalies,
}
