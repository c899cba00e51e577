//! Application state for the terminal shell.
//!
//! Wraps the [`FeedController`] with everything that only exists because
//! there is a screen: list selection, the detail pane, the status line.

use ratatui::widgets::ListState;

use crate::feed::{FeedController, Job, Outcome, Phase, SourceFilter};
use crate::source::Article;

pub struct App {
    pub feed: FeedController,
    /// List selection state for scrolling.  Indexes the *filtered* list.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status message.
    pub status: String,
    /// Whether the detail pane for the selected article is open.
    pub show_detail: bool,
}

impl App {
    pub fn new(feed: FeedController) -> Self {
        Self {
            feed,
            list_state: ListState::default(),
            quit: false,
            status: "Starting…".into(),
            show_detail: false,
        }
    }

    /// Number of rows currently rendered.
    pub fn shown_len(&self) -> usize {
        self.feed.filtered().len()
    }

    pub fn selected_article(&self) -> Option<&Article> {
        let i = self.list_state.selected()?;
        self.feed.filtered().get(i).copied()
    }

    // -- feed intents --------------------------------------------------------

    pub fn initial_load(&mut self) -> Option<Job> {
        let job = self.feed.initial_load();
        if job.is_some() {
            self.status = "Loading…".into();
        }
        job
    }

    pub fn refresh(&mut self) -> Option<Job> {
        let job = self.feed.refresh();
        if job.is_some() {
            self.status = "Refreshing from upstream feeds…".into();
        }
        job
    }

    pub fn load_more(&mut self) -> Option<Job> {
        let before = self.feed.state().visible.len();
        let job = self.feed.load_more();
        if job.is_some() {
            self.status = "Loading more…".into();
        } else if self.feed.state().visible.len() > before {
            self.status = format!(
                "Showing {} of {}",
                self.feed.state().visible.len(),
                self.feed.state().all_fetched.len()
            );
        }
        job
    }

    pub fn toggle_mode(&mut self) -> Option<Job> {
        let target = self.feed.state().mode.toggled();
        let job = self.feed.set_mode(target);
        if job.is_some() {
            self.status = format!("Switching to {}…", target.label());
        }
        job
    }

    pub fn cycle_source_filter(&mut self) {
        self.feed.cycle_source_filter();
        self.reset_selection();
    }

    pub fn clear_source_filter(&mut self) {
        self.feed.set_source_filter(SourceFilter::All);
        self.reset_selection();
    }

    /// Feed a worker outcome to the controller and update the status line.
    pub fn handle_outcome(&mut self, outcome: Outcome) {
        let was_reload = matches!(self.feed.phase(), Phase::Loading | Phase::Refreshing);
        let fetched = outcome.articles.as_ref().map(Vec::len).ok();

        if !self.feed.apply(outcome) {
            return;
        }

        self.status = match (fetched, self.feed.last_error()) {
            (_, Some(err)) => format!("Error: {err}"),
            (Some(n), None) => format!("Fetched {n} articles"),
            (None, None) => String::new(),
        };

        if was_reload {
            self.reset_selection();
        } else {
            self.clamp_selection();
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail && self.selected_article().is_some();
    }

    // -- navigation ----------------------------------------------------------

    /// Move down.  Stepping past the last row asks for more (infinite
    /// scroll); the returned job, if any, must be dispatched.
    pub fn select_next(&mut self) -> Option<Job> {
        let len = self.shown_len();
        if len == 0 {
            return None;
        }
        match self.list_state.selected() {
            Some(i) if i + 1 >= len => {
                let job = self.load_more();
                if self.shown_len() > len {
                    self.list_state.select(Some(len));
                }
                job
            }
            Some(i) => {
                self.list_state.select(Some(i + 1));
                None
            }
            None => {
                self.list_state.select(Some(0));
                None
            }
        }
    }

    pub fn select_previous(&mut self) {
        if self.shown_len() == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if self.shown_len() > 0 {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        let len = self.shown_len();
        if len > 0 {
            self.list_state.select(Some(len - 1));
        }
    }

    fn reset_selection(&mut self) {
        let first = (self.shown_len() > 0).then_some(0);
        self.list_state.select(first);
        if first.is_none() {
            self.show_detail = false;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.shown_len();
        match self.list_state.selected() {
            _ if len == 0 => {
                self.list_state.select(None);
                self.show_detail = false;
            }
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            _ => {}
        }
    }
}
