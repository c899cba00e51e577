//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Actions that need the
//! network hand back a [`Job`] which the caller dispatches to the worker.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm in [`handle_key_event`] that calls it.
//! 3. Update the help text in the status bar (`ui::draw_status_bar`).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;
use crate::feed::Job;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Job> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => return app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('r') => return app.refresh(),
        KeyCode::Char('m') => return app.toggle_mode(),
        KeyCode::Char('n') | KeyCode::Char(' ') => return app.load_more(),
        KeyCode::Char('f') => app.cycle_source_filter(),
        KeyCode::Char('a') => app.clear_source_filter(),
        KeyCode::Enter => app.toggle_detail(),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use crate::feed::{FeedController, Mode, Phase};
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn idle_app() -> App {
        App::new(FeedController::new(FeedConfig::default()))
    }

    #[test]
    fn q_and_esc_quit() {
        let mut app = idle_app();
        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert!(app.quit);

        let mut app = idle_app();
        handle_key_event(&mut app, press(KeyCode::Esc));
        assert!(app.quit);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = idle_app();
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert!(handle_key_event(&mut app, release).is_none());
        assert!(!app.quit);
    }

    #[test]
    fn r_refreshes_once() {
        let mut app = idle_app();
        let job = handle_key_event(&mut app, press(KeyCode::Char('r'))).unwrap();
        assert!(matches!(
            job,
            Job::Reload {
                refresh_upstream: true,
                ..
            }
        ));
        assert_eq!(app.feed.phase(), Phase::Refreshing);
        assert!(handle_key_event(&mut app, press(KeyCode::Char('r'))).is_none());
    }

    #[test]
    fn m_switches_mode() {
        let mut app = idle_app();
        let job = handle_key_event(&mut app, press(KeyCode::Char('m'))).unwrap();
        match job {
            Job::Reload { query, .. } => assert_eq!(query.limit, FeedConfig::default().page_size),
            other => panic!("unexpected job {other:?}"),
        }
        assert_eq!(app.feed.state().mode, Mode::Random, "mode flips on success");
    }

    #[test]
    fn unknown_keys_do_nothing() {
        let mut app = idle_app();
        assert!(handle_key_event(&mut app, press(KeyCode::Char('z'))).is_none());
        assert!(!app.quit);
        assert!(!app.feed.is_busy());
    }
}
