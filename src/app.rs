use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::config::Config;
use crate::context::GameContext;
use crate::leaderboard::Submission;
use crate::platform::Platform;
use crate::session::{GameSession, RoundOutcome, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Front-end state: one session plus the collaborators it reports to
pub struct App<P: Platform> {
    pub session: GameSession,
    pub context: GameContext<P>,
    pub last_submission: Option<Submission>,
    pub shared: bool,
}

impl<P: Platform> App<P> {
    pub fn new(config: &Config, context: GameContext<P>) -> Self {
        Self {
            session: GameSession::new(config.session_config(), config.rank_table()),
            context,
            last_submission: None,
            shared: false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> AppAction {
        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if ctrl_c || key.code == KeyCode::Esc {
            return AppAction::Quit;
        }
        if !self.context.accepts_input() {
            return AppAction::Continue;
        }

        match self.session.status() {
            SessionStatus::Idle => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => self.start(now),
                KeyCode::Char('q') => return AppAction::Quit,
                _ => {}
            },
            SessionStatus::Running => match key.code {
                KeyCode::Backspace => self.session.reset(),
                KeyCode::Char(_) | KeyCode::Enter => {
                    self.session.register_tap_at(now);
                }
                _ => {}
            },
            SessionStatus::Finished => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => self.start(now),
                KeyCode::Char('s') => self.share(),
                KeyCode::Char('q') => return AppAction::Quit,
                KeyCode::Backspace => {
                    self.session.reset();
                    self.last_submission = None;
                }
                _ => {}
            },
        }

        // a late tap may be what observed the deadline
        if let Some(outcome) = self.session.take_finished() {
            self.on_finish(&outcome);
        }
        AppAction::Continue
    }

    pub fn on_tick(&mut self, now: Instant) {
        if let Some(outcome) = self.session.poll(now) {
            self.on_finish(&outcome);
        }
    }

    fn start(&mut self, now: Instant) {
        if let Err(e) = self.session.start_at(now) {
            warn!("could not start round: {}", e);
            return;
        }
        self.last_submission = None;
        self.shared = false;
    }

    fn share(&mut self) {
        if self.shared {
            return;
        }
        if let Some(outcome) = self.session.outcome().cloned() {
            self.context.share(&outcome);
            self.shared = true;
        }
    }

    fn on_finish(&mut self, outcome: &RoundOutcome) {
        self.last_submission = Some(self.context.record(outcome));
    }
}
