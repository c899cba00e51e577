//! Backend access layer.
//!
//! This module defines the [`NewsBackend`] trait, the query type it takes,
//! and the decoded [`Article`] / [`NewsStats`] types.  The only concrete
//! backend is [`HttpBackend`], which talks to the REST service.
//!
//! ## For contributors — adding a backend
//!
//! 1. Create a new file in this directory (e.g. `fixture.rs`).
//! 2. Define a struct and implement [`NewsBackend`] for it.
//! 3. Add `mod fixture;` below and re-export it in the `pub use` block.
//! 4. Construct it in `main.rs` instead of `HttpBackend`.
//!
//! The worker, the feed controller and the UI never see anything but the
//! trait.

mod article;
mod http;
mod stats;

pub use article::{decode_articles, Article};
pub use http::HttpBackend;
pub use stats::{decode_stats, NewsStats};

use anyhow::Result;
use serde::Serialize;

/// Parameters of one `GET /news` call.
///
/// Always sent with `sort=latest`: the server's own random sampling ignores
/// `skip`, so shuffling is done client-side on a chronological batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsQuery {
    pub skip: usize,
    pub limit: usize,
    /// Ask the server to keep only relevant or categorised articles.
    pub smart_filter: bool,
}

impl NewsQuery {
    /// A newest-first window starting at `skip`.
    pub fn latest(skip: usize, limit: usize, smart_filter: bool) -> Self {
        Self {
            skip,
            limit,
            smart_filter,
        }
    }
}

/// Everything the worker needs from the news service.
///
/// Called from the background worker thread, so implementations must be
/// [`Send`].  Every error is treated the same way upstream: logged, shown in
/// the status bar, and otherwise ignored.
pub trait NewsBackend: Send {
    /// One page of articles.
    fn list_news(&self, query: &NewsQuery) -> Result<Vec<Article>>;

    /// Per-source article counts.
    fn stats(&self) -> Result<NewsStats>;

    /// Ask the server to pull fresh articles from its upstream feeds.
    /// Returns the server's human-readable summary.
    fn trigger_fetch(&self) -> Result<String>;
}
