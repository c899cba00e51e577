//! Feed pagination controller.
//!
//! Owns the articles the user is looking at and decides what network work
//! each user intent needs.  It does no I/O itself: operations return a
//! [`Job`] for the worker, and the worker's [`Outcome`] is fed back through
//! [`FeedController::apply`].
//!
//! ## Modes
//!
//! * **Random** — one large chronological batch is fetched and shuffled
//!   once.  Load-more widens the visible prefix of that permutation without
//!   touching the network, so the order stays stable until the next reload.
//! * **Latest** — the server's newest-first order, paged with a
//!   `skip`/`limit` cursor.  Pages are appended after dropping any article
//!   whose link is already visible.
//!
//! ## Phases
//!
//! ```text
//!            initial_load / set_mode                refresh
//!   Idle ─────────────────────────► Loading   Idle ────────► Refreshing
//!     ▲                                │        ▲                │
//!     └────────── apply(outcome) ◄─────┘        └── apply ◄──────┘
//!
//!   Idle ── load_more ──► LoadingMore ── apply (Latest) / immediately (Random) ──► Idle
//! ```
//!
//! Every operation except the source filter is ignored outside `Idle`.
//! Each job carries a sequence number and only the outcome of the most
//! recently issued job may change state.

use std::collections::HashSet;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::source::{Article, NewsQuery, NewsStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Random,
    Latest,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Random => Mode::Latest,
            Mode::Latest => Mode::Random,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Random => "Random",
            Mode::Latest => "Latest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Refreshing,
    LoadingMore,
}

/// Client-side narrowing of the visible list by publisher.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceFilter {
    #[default]
    All,
    Named(String),
}

impl SourceFilter {
    /// Case-insensitive substring match on the article's source.
    pub fn matches(&self, source: &str) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Named(name) => source.to_lowercase().contains(&name.to_lowercase()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SourceFilter::All => "All",
            SourceFilter::Named(name) => name,
        }
    }
}

/// Network work requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Replace the feed.  Optionally ask the server to ingest upstream first
    /// and refresh the stats.
    Reload {
        seq: u64,
        query: NewsQuery,
        refresh_upstream: bool,
        stats: bool,
    },
    /// Fetch one more server page (Latest mode only).
    Page { seq: u64, query: NewsQuery },
}

impl Job {
    pub fn seq(&self) -> u64 {
        match self {
            Job::Reload { seq, .. } | Job::Page { seq, .. } => *seq,
        }
    }
}

/// The worker's reply to one [`Job`].
#[derive(Debug)]
pub struct Outcome {
    pub seq: u64,
    /// Present when the job asked for stats and they were fetched.
    pub stats: Option<NewsStats>,
    pub articles: Result<Vec<Article>>,
}

#[derive(Debug, Clone, Copy)]
enum PendingKind {
    /// `had_more` is restored if the reload fails.
    Reload { mode: Mode, had_more: bool },
    Page { limit: usize },
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    seq: u64,
    kind: PendingKind,
}

/// Everything the view renders from.
#[derive(Debug, Clone)]
pub struct FeedState {
    /// The last full batch retrieved (the shuffled batch in Random mode).
    pub all_fetched: Vec<Article>,
    /// Articles currently shown, before source filtering.
    pub visible: Vec<Article>,
    /// Pages consumed so far in the current mode.
    pub page: usize,
    pub has_more: bool,
    pub mode: Mode,
    pub source_filter: SourceFilter,
    /// Links in `visible`.
    seen: HashSet<String>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            all_fetched: Vec::new(),
            visible: Vec::new(),
            page: 0,
            has_more: true,
            mode: Mode::Random,
            source_filter: SourceFilter::All,
            seen: HashSet::new(),
        }
    }
}

pub struct FeedController {
    state: FeedState,
    phase: Phase,
    settings: FeedConfig,
    stats: Option<NewsStats>,
    last_error: Option<String>,
    next_seq: u64,
    pending: Option<Pending>,
    rng: StdRng,
}

impl FeedController {
    pub fn new(settings: FeedConfig) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Construct with a caller-supplied RNG, for reproducible shuffles.
    pub fn with_rng(settings: FeedConfig, rng: StdRng) -> Self {
        Self {
            state: FeedState::default(),
            phase: Phase::Idle,
            settings,
            stats: None,
            last_error: None,
            next_seq: 0,
            pending: None,
            rng,
        }
    }

    // -- accessors -----------------------------------------------------------

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn stats(&self) -> Option<&NewsStats> {
        self.stats.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Visible articles that pass the source filter, in display order.
    pub fn filtered(&self) -> Vec<&Article> {
        self.state
            .visible
            .iter()
            .filter(|a| self.state.source_filter.matches(&a.source))
            .collect()
    }

    // -- user intents --------------------------------------------------------

    /// First load when the view opens.  Same full replace as a refresh but
    /// without asking the server to ingest upstream.
    pub fn initial_load(&mut self) -> Option<Job> {
        if self.is_busy() {
            return None;
        }
        self.phase = Phase::Loading;
        Some(self.reload_job(Mode::Random, false, true))
    }

    /// User-requested refresh: upstream ingestion, stats, then a fresh
    /// Random batch.  Ignored while anything is in flight.
    pub fn refresh(&mut self) -> Option<Job> {
        if self.is_busy() {
            debug!(phase = ?self.phase, "refresh ignored while busy");
            return None;
        }
        self.phase = Phase::Refreshing;
        self.state.source_filter = SourceFilter::All;
        Some(self.reload_job(Mode::Random, true, true))
    }

    /// Reveal the next page.  Random mode is served from the held batch and
    /// returns `None`; Latest mode returns a page job.
    pub fn load_more(&mut self) -> Option<Job> {
        if self.is_busy() || !self.state.has_more {
            return None;
        }
        self.phase = Phase::LoadingMore;

        match self.state.mode {
            Mode::Random => {
                self.widen_random_prefix();
                self.phase = Phase::Idle;
                None
            }
            Mode::Latest => {
                let limit = self.settings.page_size;
                let query =
                    NewsQuery::latest(self.state.page * limit, limit, self.settings.smart_filter);
                let seq = self.issue(PendingKind::Page { limit });
                Some(Job::Page { seq, query })
            }
        }
    }

    /// Switch ordering.  Reloads from scratch but does not trigger upstream
    /// ingestion.  The mode only changes once the reload succeeds.
    pub fn set_mode(&mut self, mode: Mode) -> Option<Job> {
        if self.is_busy() || mode == self.state.mode {
            return None;
        }
        self.phase = Phase::Loading;
        Some(self.reload_job(mode, false, false))
    }

    pub fn set_source_filter(&mut self, filter: SourceFilter) {
        self.state.source_filter = filter;
    }

    /// "All" followed by every publisher named in the stats.
    pub fn source_filter_options(&self) -> Vec<SourceFilter> {
        let mut options = vec![SourceFilter::All];
        if let Some(stats) = &self.stats {
            options.extend(stats.source_names().map(|s| SourceFilter::Named(s.to_string())));
        }
        options
    }

    /// Step to the next filter option, wrapping back to "All".
    pub fn cycle_source_filter(&mut self) {
        let options = self.source_filter_options();
        let next = options
            .iter()
            .position(|f| *f == self.state.source_filter)
            .map(|i| (i + 1) % options.len())
            .unwrap_or(0);
        self.state.source_filter = options[next].clone();
    }

    // -- completion ----------------------------------------------------------

    /// Apply a worker outcome.  Returns `false` when the outcome is stale
    /// (not the most recently issued job) and was discarded.
    pub fn apply(&mut self, outcome: Outcome) -> bool {
        let pending = match self.pending {
            Some(p) if p.seq == outcome.seq => p,
            _ => {
                debug!(seq = outcome.seq, "discarding stale outcome");
                return false;
            }
        };
        self.pending = None;

        if let Some(stats) = outcome.stats {
            self.stats = Some(stats);
        }

        match outcome.articles {
            Ok(articles) => {
                self.last_error = None;
                match pending.kind {
                    PendingKind::Reload { mode, .. } => self.replace(mode, articles),
                    PendingKind::Page { limit } => self.append_page(articles, limit),
                }
            }
            Err(e) => {
                warn!(seq = outcome.seq, error = %format!("{e:#}"), "news fetch failed");
                self.last_error = Some(format!("{e:#}"));
                if let PendingKind::Reload { had_more, .. } = pending.kind {
                    self.state.has_more = had_more;
                }
            }
        }

        self.phase = Phase::Idle;
        true
    }

    // -- internals -----------------------------------------------------------

    fn issue(&mut self, kind: PendingKind) -> u64 {
        self.next_seq += 1;
        self.pending = Some(Pending {
            seq: self.next_seq,
            kind,
        });
        self.next_seq
    }

    /// Issue a full reload.  `has_more` reads true while it is in flight.
    fn reload_job(&mut self, mode: Mode, refresh_upstream: bool, stats: bool) -> Job {
        let had_more = std::mem::replace(&mut self.state.has_more, true);
        let limit = match mode {
            Mode::Random => self.settings.random_batch_size,
            Mode::Latest => self.settings.page_size,
        };
        let query = NewsQuery::latest(0, limit, self.settings.smart_filter);
        let seq = self.issue(PendingKind::Reload { mode, had_more });
        Job::Reload {
            seq,
            query,
            refresh_upstream,
            stats,
        }
    }

    fn replace(&mut self, mode: Mode, articles: Vec<Article>) {
        let page_size = self.settings.page_size;
        let returned = articles.len();

        self.state.mode = mode;
        self.state.seen.clear();
        let mut batch: Vec<Article> = articles
            .into_iter()
            .filter(|a| self.state.seen.insert(a.link.clone()))
            .collect();

        match mode {
            Mode::Random => {
                batch.shuffle(&mut self.rng);
                let end = page_size.min(batch.len());
                self.state.visible = batch[..end].to_vec();
                self.state.seen = self.state.visible.iter().map(|a| a.link.clone()).collect();
                self.state.has_more = end < batch.len();
            }
            Mode::Latest => {
                self.state.visible = batch.clone();
                self.state.has_more = returned >= page_size;
            }
        }
        self.state.all_fetched = batch;
        self.state.page = 1;

        info!(
            mode = mode.label(),
            fetched = self.state.all_fetched.len(),
            visible = self.state.visible.len(),
            "feed reloaded"
        );
    }

    fn append_page(&mut self, articles: Vec<Article>, limit: usize) {
        let returned = articles.len();
        let fresh: Vec<Article> = articles
            .iter()
            .filter(|a| self.state.seen.insert(a.link.clone()))
            .cloned()
            .collect();

        debug!(returned, appended = fresh.len(), "latest page appended");
        self.state.visible.extend(fresh);
        self.state.all_fetched = articles;
        self.state.page += 1;
        self.state.has_more = returned >= limit;
    }

    fn widen_random_prefix(&mut self) {
        let start = self.state.visible.len();
        let end = (start + self.settings.page_size).min(self.state.all_fetched.len());
        for article in &self.state.all_fetched[start..end] {
            self.state.seen.insert(article.link.clone());
        }
        self.state
            .visible
            .extend_from_slice(&self.state.all_fetched[start..end]);
        self.state.page += 1;
        self.state.has_more = end < self.state.all_fetched.len();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
