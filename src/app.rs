/// Front-end state machine around a `Session`.
///
///   Title ──confirm──▶ Playing ──outcome Won──▶ Won ──delay/confirm──▶ Title
///                        │  ▲
///                  Caught│  │restart (delay or key)
///                        ▼  │
///                       Caught
///
/// The session runs on a game clock that stops while paused, so mode
/// deadlines and power windows do not elapse behind the pause screen.

use tracing::{debug, info};

use crate::config::TimingConfig;
use crate::domain::entity::Direction;
use crate::sim::event::{GameEvent, Outcome};
use crate::sim::session::Session;
use crate::sim::step;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    Won,
    Caught,
}

pub struct App {
    pub phase: Phase,
    pub paused: bool,
    pub session: Session,
    pub best_score: u32,
    timing: TimingConfig,
    /// Wall time when the current phase began.
    phase_since_ms: u64,
    /// Total wall time spent paused.
    paused_total_ms: u64,
    paused_at_ms: Option<u64>,
    message: String,
    message_until_ms: u64,
}

impl App {
    pub fn new(session: Session, timing: TimingConfig) -> Self {
        App {
            phase: Phase::Title,
            paused: false,
            session,
            best_score: 0,
            timing,
            phase_since_ms: 0,
            paused_total_ms: 0,
            paused_at_ms: None,
            message: String::new(),
            message_until_ms: 0,
        }
    }

    /// Wall time minus time spent paused.
    pub fn game_now(&self, now_ms: u64) -> u64 {
        let paused_now = self.paused_at_ms.map_or(0, |at| now_ms.saturating_sub(at));
        now_ms.saturating_sub(self.paused_total_ms + paused_now)
    }

    fn enter(&mut self, phase: Phase, now_ms: u64) {
        debug!(from = ?self.phase, to = ?phase, "phase change");
        self.phase = phase;
        self.phase_since_ms = now_ms;
    }

    // ── Transitions ──

    /// Fresh session, straight into play.
    pub fn start(&mut self, now_ms: u64) {
        self.resume(now_ms);
        let game_now = self.game_now(now_ms);
        self.session.restart(game_now);
        self.message.clear();
        self.enter(Phase::Playing, now_ms);
    }

    pub fn back_to_title(&mut self, now_ms: u64) {
        self.resume(now_ms);
        self.message.clear();
        self.enter(Phase::Title, now_ms);
    }

    pub fn toggle_pause(&mut self, now_ms: u64) {
        if self.phase != Phase::Playing {
            return;
        }
        if self.paused {
            self.resume(now_ms);
        } else {
            self.paused = true;
            self.paused_at_ms = Some(now_ms);
            info!("paused");
        }
    }

    fn resume(&mut self, now_ms: u64) {
        if let Some(at) = self.paused_at_ms.take() {
            self.paused_total_ms += now_ms.saturating_sub(at);
            info!(paused_ms = now_ms.saturating_sub(at), "resumed");
        }
        self.paused = false;
    }

    /// Latch a heading for the next tick. Ignored outside live play.
    pub fn steer(&mut self, dir: Direction) {
        if self.phase == Phase::Playing && !self.paused {
            self.session.set_heading(dir);
        }
    }

    /// One frame of the state machine. Returns the tick's events, if a tick ran.
    pub fn advance(&mut self, now_ms: u64) -> Vec<GameEvent> {
        match self.phase {
            Phase::Playing if !self.paused => {
                let game_now = self.game_now(now_ms);
                let report = step::tick(&mut self.session, game_now);
                match report.outcome {
                    Outcome::Won => {
                        self.record_score();
                        self.set_message("Maze cleared!", now_ms, self.timing.win_delay_ms);
                        self.enter(Phase::Won, now_ms);
                    }
                    Outcome::Caught => {
                        self.record_score();
                        self.set_message("Caught!", now_ms, self.timing.restart_delay_ms);
                        self.enter(Phase::Caught, now_ms);
                    }
                    Outcome::Continue => {}
                }
                report.events
            }
            Phase::Caught if self.phase_elapsed(now_ms) >= self.timing.restart_delay_ms => {
                self.start(now_ms);
                Vec::new()
            }
            Phase::Won if self.phase_elapsed(now_ms) >= self.timing.win_delay_ms => {
                self.back_to_title(now_ms);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn phase_elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.phase_since_ms)
    }

    fn record_score(&mut self) {
        let score = self.session.score();
        if score > self.best_score {
            self.best_score = score;
        }
        info!(score, best = self.best_score, outcome = ?self.session.outcome(), "round over");
    }

    // ── Message bar ──

    pub fn set_message(&mut self, text: &str, now_ms: u64, duration_ms: u64) {
        self.message = text.to_string();
        self.message_until_ms = now_ms + duration_ms;
    }

    pub fn message(&self, now_ms: u64) -> Option<&str> {
        if self.message.is_empty() || now_ms >= self.message_until_ms {
            None
        } else {
            Some(&self.message)
        }
    }
}
