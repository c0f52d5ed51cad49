//! Concurrent fan-out/fan-in over the three remote collections.
//!
//! Each collection is fetched by its own task, and each task hands its
//! result back through its own join handle. The handles carry exactly one
//! payload type each, so the join point needs no tagging or dispatch: it
//! awaits all three and assembles them into a [`FetchOutcome`].

use crate::config::EndpointsConfig;
use crate::error::FetchError;
use crate::fetch::fetcher::Fetcher;
use crate::models::{Comment, Post, Resource, User};
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use std::error::Error as _;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

/// Number of concurrent producers.
const FAN_OUT: u64 = 3;

/// Endpoint URLs for the three collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub users_url: String,
    pub posts_url: String,
    pub comments_url: String,
}

impl From<&EndpointsConfig> for Endpoints {
    fn from(config: &EndpointsConfig) -> Self {
        Self {
            users_url: config.users_url.clone(),
            posts_url: config.posts_url.clone(),
            comments_url: config.comments_url.clone(),
        }
    }
}

/// The three collections once every fetch has succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedData {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
}

/// Per-collection results of a fan-out.
#[derive(Debug)]
pub struct FetchOutcome {
    pub users: Result<Vec<User>, FetchError>,
    pub posts: Result<Vec<Post>, FetchError>,
    pub comments: Result<Vec<Comment>, FetchError>,
}

impl FetchOutcome {
    /// All failed fetches, in users, posts, comments order.
    pub fn failures(&self) -> Vec<&FetchError> {
        [
            self.users.as_ref().err(),
            self.posts.as_ref().err(),
            self.comments.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Collapse into the three collections, or the first failure.
    pub fn into_data(self) -> Result<FetchedData, FetchError> {
        Ok(FetchedData {
            users: self.users?,
            posts: self.posts?,
            comments: self.comments?,
        })
    }
}

/// Counts finished fetches and renders them as a progress bar.
#[derive(Clone)]
struct CompletionTracker {
    bar: ProgressBar,
}

impl CompletionTracker {
    fn new(units: u64, show_progress: bool) -> Self {
        let bar = if show_progress {
            let pb = ProgressBar::new(units);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:20.cyan/blue}] {pos}/{len} {msg}",
            ) {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let pb = ProgressBar::hidden();
            pb.set_length(units);
            pb
        };

        Self { bar }
    }

    /// Record one finished fetch, successful or not.
    fn complete<T>(&self, resource: Resource, result: &Result<Vec<T>, FetchError>) {
        match result {
            Ok(items) => self
                .bar
                .set_message(format!("{} ({} records)", resource, items.len())),
            Err(_) => self.bar.set_message(format!("{} failed", resource)),
        }
        self.bar.inc(1);
    }

    #[cfg(test)]
    fn remaining(&self) -> u64 {
        self.bar.length().unwrap_or(0) - self.bar.position()
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Fetch users, posts and comments concurrently and wait for all three.
///
/// A failing fetch does not cancel its siblings; every collection gets
/// its own entry in the returned outcome.
pub async fn fetch_all(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    show_progress: bool,
) -> FetchOutcome {
    let tracker = CompletionTracker::new(FAN_OUT, show_progress);
    info!("Fetching {} collections concurrently", FAN_OUT);

    let users = spawn_fetch::<User>(fetcher, Resource::Users, &endpoints.users_url, &tracker);
    let posts = spawn_fetch::<Post>(fetcher, Resource::Posts, &endpoints.posts_url, &tracker);
    let comments = spawn_fetch::<Comment>(
        fetcher,
        Resource::Comments,
        &endpoints.comments_url,
        &tracker,
    );

    let (users, posts, comments) = tokio::join!(users, posts, comments);

    let outcome = FetchOutcome {
        users: settle(Resource::Users, users, &tracker),
        posts: settle(Resource::Posts, posts, &tracker),
        comments: settle(Resource::Comments, comments, &tracker),
    };
    tracker.finish();

    for failure in outcome.failures() {
        match failure.source() {
            Some(cause) => warn!("{}: {}", failure, cause),
            None => warn!("{}", failure),
        }
    }

    outcome
}

fn spawn_fetch<T>(
    fetcher: &Fetcher,
    resource: Resource,
    url: &str,
    tracker: &CompletionTracker,
) -> JoinHandle<Result<Vec<T>, FetchError>>
where
    T: DeserializeOwned + Send + 'static,
{
    let fetcher = fetcher.clone();
    let url = url.to_string();
    let tracker = tracker.clone();

    tokio::spawn(async move {
        let result = fetcher.fetch_collection::<T>(resource, &url).await;
        tracker.complete(resource, &result);
        result
    })
}

fn settle<T>(
    resource: Resource,
    joined: Result<Result<Vec<T>, FetchError>, JoinError>,
    tracker: &CompletionTracker,
) -> Result<Vec<T>, FetchError> {
    match joined {
        Ok(result) => result,
        Err(source) => {
            // The task never reached its own completion report.
            warn!("{} fetch task ended without reporting", resource);
            let result = Err(FetchError::Task { resource, source });
            tracker.complete(resource, &result);
            result
        }
    }
}
