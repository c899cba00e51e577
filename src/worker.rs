//! Background network worker.
//!
//! Runs on a dedicated thread, executing [`Job`]s from the feed controller
//! one at a time against a [`NewsBackend`] and sending one [`Outcome`] per
//! job back to the UI thread over an [`mpsc`] channel.
//!
//! ## For contributors
//!
//! Jobs are executed strictly in the order they were sent.  The controller
//! only issues a new job once the previous one has settled, so there is no
//! queue to speak of; staleness is handled by the controller, not here.

use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::feed::{Job, Outcome};
use crate::source::NewsBackend;

/// Spawn the worker thread.
///
/// Returns the job sender and the outcome receiver.  The thread exits when
/// the sender is dropped or the receiver goes away.
pub fn spawn(backend: Box<dyn NewsBackend>) -> Result<(mpsc::Sender<Job>, mpsc::Receiver<Outcome>)> {
    let (job_tx, job_rx) = mpsc::channel::<Job>();
    let (out_tx, out_rx) = mpsc::channel();

    thread::Builder::new()
        .name("news-worker".into())
        .spawn(move || {
            for job in job_rx {
                let outcome = run_job(backend.as_ref(), job);
                // If the receiver is gone the main thread has exited;
                // silently stop.
                if out_tx.send(outcome).is_err() {
                    return;
                }
            }
            debug!("job channel closed, worker exiting");
        })
        .context("failed to spawn news worker thread")?;

    Ok((job_tx, out_rx))
}

/// Execute a single job.
///
/// For reloads, upstream ingestion and stats are best-effort: their
/// failures are logged and the article fetch still runs.  Only the article
/// fetch decides whether the outcome is a success.
pub fn run_job(backend: &dyn NewsBackend, job: Job) -> Outcome {
    match job {
        Job::Reload {
            seq,
            query,
            refresh_upstream,
            stats,
        } => {
            if refresh_upstream {
                match backend.trigger_fetch() {
                    Ok(message) => info!(seq, %message, "upstream ingestion triggered"),
                    Err(e) => warn!(seq, error = %format!("{e:#}"), "upstream ingestion failed"),
                }
            }

            let stats = if stats {
                backend
                    .stats()
                    .map_err(|e| warn!(seq, error = %format!("{e:#}"), "stats fetch failed"))
                    .ok()
            } else {
                None
            };

            Outcome {
                seq,
                stats,
                articles: backend.list_news(&query),
            }
        }
        Job::Page { seq, query } => Outcome {
            seq,
            stats: None,
            articles: backend.list_news(&query),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use anyhow::bail;

    use crate::source::{Article, NewsQuery, NewsStats};

    /// Records every call; fails whichever endpoints it is told to.
    #[derive(Clone, Default)]
    struct FakeBackend {
        calls: Arc<Mutex<Vec<String>>>,
        fail_fetch: bool,
        fail_stats: bool,
        fail_list: bool,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl NewsBackend for FakeBackend {
        fn list_news(&self, query: &NewsQuery) -> Result<Vec<Article>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("list {} {}", query.skip, query.limit));
            if self.fail_list {
                bail!("GET /news failed (502 Bad Gateway)");
            }
            Ok((query.skip..query.skip + query.limit)
                .map(|n| Article {
                    link: format!("https://x/{n}"),
                    title: format!("t{n}"),
                    summary: String::new(),
                    source: "Profit".into(),
                    published: None,
                    category: None,
                    relevance_score: None,
                })
                .collect())
        }

        fn stats(&self) -> Result<NewsStats> {
            self.calls.lock().unwrap().push("stats".into());
            if self.fail_stats {
                bail!("stats down");
            }
            Ok(NewsStats::default())
        }

        fn trigger_fetch(&self) -> Result<String> {
            self.calls.lock().unwrap().push("fetch".into());
            if self.fail_fetch {
                bail!("feeds unreachable");
            }
            Ok("Fetched 3 new articles".into())
        }
    }

    fn reload(refresh_upstream: bool, stats: bool) -> Job {
        Job::Reload {
            seq: 4,
            query: NewsQuery::latest(0, 5, false),
            refresh_upstream,
            stats,
        }
    }

    #[test]
    fn refresh_runs_fetch_then_stats_then_list() {
        let backend = FakeBackend::default();
        let outcome = run_job(&backend, reload(true, true));

        assert_eq!(backend.calls(), vec!["fetch", "stats", "list 0 5"]);
        assert_eq!(outcome.seq, 4);
        assert!(outcome.stats.is_some());
        assert_eq!(outcome.articles.unwrap().len(), 5);
    }

    #[test]
    fn mode_switch_reload_skips_fetch_and_stats() {
        let backend = FakeBackend::default();
        let outcome = run_job(&backend, reload(false, false));

        assert_eq!(backend.calls(), vec!["list 0 5"]);
        assert!(outcome.stats.is_none());
    }

    #[test]
    fn upstream_and_stats_failures_do_not_abort_reload() {
        let backend = FakeBackend {
            fail_fetch: true,
            fail_stats: true,
            ..Default::default()
        };
        let outcome = run_job(&backend, reload(true, true));

        assert!(outcome.stats.is_none());
        assert!(outcome.articles.is_ok());
    }

    #[test]
    fn list_failure_is_the_outcome() {
        let backend = FakeBackend {
            fail_list: true,
            ..Default::default()
        };
        let outcome = run_job(&backend, reload(false, true));

        assert!(outcome.stats.is_some());
        let err = outcome.articles.unwrap_err();
        assert!(format!("{err:#}").contains("502"));
    }

    #[test]
    fn page_job_only_lists() {
        let backend = FakeBackend::default();
        let outcome = run_job(
            &backend,
            Job::Page {
                seq: 9,
                query: NewsQuery::latest(20, 10, false),
            },
        );

        assert_eq!(backend.calls(), vec!["list 20 10"]);
        assert_eq!(outcome.seq, 9);
        assert_eq!(outcome.articles.unwrap()[0].link, "https://x/20");
    }

    #[test]
    fn spawned_worker_answers_in_order() {
        let backend = FakeBackend::default();
        let (tx, rx) = spawn(Box::new(backend.clone())).unwrap();

        tx.send(reload(false, false)).unwrap();
        tx.send(Job::Page {
            seq: 5,
            query: NewsQuery::latest(5, 5, false),
        })
        .unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.seq, 4);
        assert_eq!(second.seq, 5);

        drop(tx);
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
    }
}
