use std::time::Duration;

use engine::{Epoch, Scheduler};
use tracing::{debug, info};

use crate::color::Color;
use crate::presenter::{Presenter, TonePlayer};
use crate::rng::{ColorSource, SequenceRng};
use crate::state::{GameSnapshot, GameState};
use crate::timing::Timings;

pub const STATUS_WATCH: &str = "Watch the sequence...";
pub const STATUS_YOUR_TURN: &str = "Your turn!";
pub const STATUS_GAME_OVER: &str = "Game Over! Press Start to play again";
pub const LABEL_START: &str = "Start Game";
pub const LABEL_RESTART: &str = "Restart Game";

/// Deferred steps of the game, armed on the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    /// Append a color and begin a replay.
    Extend,
    /// Show `sequence[index]`.
    Flash { index: usize },
    /// Replay finished, hand the board to the player.
    EndReplay,
}

/// Owns a game of Simon and drives its collaborators.
///
/// Time is virtual: nothing happens between calls unless the owner moves the
/// clock with [`GameController::advance`]. Every deferred step is stamped with
/// the game epoch, and a restart bumps the epoch, so no continuation from an
/// abandoned game can touch the new one.
#[derive(Debug)]
pub struct GameController<P, T, R = SequenceRng> {
    presenter: P,
    tones: T,
    rng: R,
    timings: Timings,
    state: GameState,
    sequence: Vec<Color>,
    player_input: Vec<Color>,
    score: u32,
    scheduler: Scheduler<Continuation>,
}

impl<P, T, R> GameController<P, T, R>
where
    P: Presenter,
    T: TonePlayer,
    R: ColorSource,
{
    pub fn new(presenter: P, tones: T, rng: R) -> Self {
        Self::with_timings(presenter, tones, rng, Timings::default())
    }

    pub fn with_timings(mut presenter: P, tones: T, rng: R, timings: Timings) -> Self {
        presenter.set_score(0);
        presenter.set_start_label(LABEL_START);
        Self {
            presenter,
            tones,
            rng,
            timings,
            state: GameState::Idle,
            sequence: Vec::new(),
            player_input: Vec::new(),
            score: 0,
            scheduler: Scheduler::new(),
        }
    }

    /// Starts a fresh game from any state, abandoning whatever was in flight.
    pub fn on_start_requested(&mut self) {
        let epoch = self.scheduler.bump_epoch();
        info!(epoch = epoch.get(), previous = ?self.state, "starting game");

        self.sequence.clear();
        self.player_input.clear();
        self.score = 0;
        self.presenter.set_score(0);
        self.presenter.set_status("");
        self.presenter.set_start_label(LABEL_RESTART);
        self.extend_sequence();
    }

    /// Player pressed `color`. Silently ignored unless it is the player's turn.
    pub fn on_color_pressed(&mut self, color: Color) {
        if !self.state.accepts_input() {
            debug!(%color, state = ?self.state, "ignoring input");
            return;
        }

        self.player_input.push(color);
        // Feedback first, even for the press that loses the game.
        self.present(color);

        let index = self.player_input.len() - 1;
        if self.sequence.get(index) != Some(&color) {
            self.game_over(index);
            return;
        }

        if self.player_input.len() == self.sequence.len() {
            self.score += 1;
            self.presenter.set_score(self.score);
            self.player_input.clear();
            self.state = GameState::Presenting;
            info!(score = self.score, "round cleared");
            self.scheduler.schedule_after(self.timings.post_round_pause, Continuation::Extend);
        }
    }

    /// Moves the clock forward by `dt`, firing every continuation that falls
    /// due, including ones armed by earlier firings inside the same window.
    pub fn advance(&mut self, dt: Duration) {
        let until = self.scheduler.now().saturating_add(dt);
        while let Some(fired) = self.scheduler.pop_due(until) {
            self.run(fired.task);
        }
        self.scheduler.advance_to(until);
    }

    /// Virtual time of the next pending continuation, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        self.scheduler.time_until_next()
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn sequence(&self) -> &[Color] {
        &self.sequence
    }

    pub fn player_input(&self) -> &[Color] {
        &self.player_input
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn epoch(&self) -> Epoch {
        self.scheduler.epoch()
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn tones(&self) -> &T {
        &self.tones
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.state,
            sequence: self.sequence.clone(),
            player_input: self.player_input.clone(),
            score: self.score,
            epoch: self.epoch().get(),
        }
    }

    fn run(&mut self, task: Continuation) {
        match task {
            Continuation::Extend => self.extend_sequence(),
            Continuation::Flash { index } => self.flash_step(index),
            Continuation::EndReplay => {
                self.player_input.clear();
                self.state = GameState::AwaitingInput;
                self.presenter.set_status(STATUS_YOUR_TURN);
                debug!(len = self.sequence.len(), "awaiting input");
            }
        }
    }

    fn extend_sequence(&mut self) {
        let color = self.rng.next_color();
        self.sequence.push(color);
        self.state = GameState::Presenting;
        self.presenter.set_status(STATUS_WATCH);
        debug!(%color, len = self.sequence.len(), "sequence extended");
        self.scheduler.schedule_after(
            self.timings.inter_symbol_delay,
            Continuation::Flash { index: 0 },
        );
    }

    fn flash_step(&mut self, index: usize) {
        let Some(&color) = self.sequence.get(index) else {
            return;
        };
        self.present(color);

        // The next step starts only after this flash window and its gap.
        let window = self.timings.flash + self.timings.post_tone_gap;
        if index + 1 < self.sequence.len() {
            self.scheduler.schedule_after(
                window + self.timings.inter_symbol_delay,
                Continuation::Flash { index: index + 1 },
            );
        } else {
            self.scheduler.schedule_after(window, Continuation::EndReplay);
        }
    }

    fn present(&mut self, color: Color) {
        self.presenter.flash(color);
        self.tones.play(color);
    }

    fn game_over(&mut self, index: usize) {
        info!(
            index,
            expected = ?self.sequence.get(index),
            got = ?self.player_input.last(),
            score = self.score,
            "sequence mismatch"
        );
        self.state = GameState::GameOver;
        self.presenter.set_status(STATUS_GAME_OVER);
        self.presenter.set_start_label(LABEL_START);
    }
}
