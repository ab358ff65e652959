use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use simon::controller::{
    LABEL_RESTART, LABEL_START, STATUS_GAME_OVER, STATUS_WATCH, STATUS_YOUR_TURN,
};
use simon::presenter::{Presenter, TonePlayer};
use simon::rng::{ColorSource, SequenceRng};
use simon::{Color, GameController, GameState};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    Score(u32),
    Status(String),
    Flash(Color),
    StartLabel(String),
    Tone(Color),
}

#[derive(Debug, Clone, Default)]
struct Log(Rc<RefCell<Vec<Effect>>>);

impl Log {
    fn push(&self, effect: Effect) {
        self.0.borrow_mut().push(effect);
    }

    fn take(&self) -> Vec<Effect> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    fn flashes(&self) -> Vec<Color> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Effect::Flash(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    fn tones(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|e| matches!(e, Effect::Tone(_)))
            .count()
    }

    fn last_status(&self) -> Option<String> {
        self.0.borrow().iter().rev().find_map(|e| match e {
            Effect::Status(s) => Some(s.clone()),
            _ => None,
        })
    }
}

struct FakePresenter(Log);

impl Presenter for FakePresenter {
    fn set_score(&mut self, score: u32) {
        self.0.push(Effect::Score(score));
    }

    fn set_status(&mut self, text: &str) {
        self.0.push(Effect::Status(text.to_string()));
    }

    fn flash(&mut self, color: Color) {
        self.0.push(Effect::Flash(color));
    }

    fn set_start_label(&mut self, text: &str) {
        self.0.push(Effect::StartLabel(text.to_string()));
    }
}

struct FakeTones(Log);

impl TonePlayer for FakeTones {
    fn play(&mut self, color: Color) {
        self.0.push(Effect::Tone(color));
    }
}

/// Hands out a fixed script of colors, cycling when exhausted.
struct Scripted {
    colors: Vec<Color>,
    next: usize,
}

impl Scripted {
    fn new(colors: &[Color]) -> Self {
        Self {
            colors: colors.to_vec(),
            next: 0,
        }
    }
}

impl ColorSource for Scripted {
    fn next_color(&mut self) -> Color {
        let color = self.colors[self.next % self.colors.len()];
        self.next += 1;
        color
    }
}

type TestGame = GameController<FakePresenter, FakeTones, Scripted>;

fn game(colors: &[Color]) -> (TestGame, Log) {
    let log = Log::default();
    let game = GameController::new(
        FakePresenter(log.clone()),
        FakeTones(log.clone()),
        Scripted::new(colors),
    );
    (game, log)
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Runs pending work until the game waits on the player (or on nothing).
fn settle(game: &mut TestGame) {
    game.advance(Duration::from_secs(600));
}

fn play_back(game: &mut TestGame) {
    let expected = game.sequence().to_vec();
    for color in expected {
        game.on_color_pressed(color);
    }
}

use Color::{Blue, Green, Red, Yellow};

#[test]
fn construction_is_idle_with_start_label() {
    let (game, log) = game(&[Green]);
    assert_eq!(game.state(), GameState::Idle);
    assert!(game.sequence().is_empty());
    assert_eq!(game.score(), 0);
    assert_eq!(
        log.take(),
        vec![Effect::Score(0), Effect::StartLabel(LABEL_START.to_string())]
    );
}

#[test]
fn start_resets_and_presents_one_color() {
    let (mut game, log) = game(&[Red]);
    log.take();
    game.on_start_requested();

    assert_eq!(game.state(), GameState::Presenting);
    assert_eq!(game.sequence(), &[Red]);
    assert_eq!(
        log.take(),
        vec![
            Effect::Score(0),
            Effect::Status(String::new()),
            Effect::StartLabel(LABEL_RESTART.to_string()),
            Effect::Status(STATUS_WATCH.to_string()),
        ]
    );
}

#[test]
fn replay_follows_fixed_timing() {
    let (mut game, log) = game(&[Green]);
    game.on_start_requested();
    log.take();

    game.advance(ms(499));
    assert!(log.flashes().is_empty());

    game.advance(ms(1));
    assert_eq!(log.flashes(), vec![Green]);
    assert_eq!(log.tones(), 1);
    assert_eq!(game.state(), GameState::Presenting);

    // Flash window plus gap before the board is handed over.
    game.advance(ms(399));
    assert_eq!(game.state(), GameState::Presenting);
    game.advance(ms(1));
    assert_eq!(game.state(), GameState::AwaitingInput);
    assert_eq!(log.last_status().as_deref(), Some(STATUS_YOUR_TURN));
    assert_eq!(game.next_deadline(), None);
}

#[test]
fn longer_replays_never_overlap_flash_windows() {
    let (mut game, log) = game(&[Green, Red, Blue]);
    game.on_start_requested();
    settle(&mut game);
    play_back(&mut game);
    play_back_round(&mut game);
    log.take();

    // Third round: sequence of three, replay starts after the round pause.
    game.advance(ms(1_000));
    assert_eq!(game.sequence(), &[Green, Red, Blue]);

    let mut seen = Vec::new();
    for step in 0..2_700u64 {
        game.advance(ms(1));
        let flashes = log.flashes();
        if flashes.len() > seen.len() {
            seen.push((step + 1, *flashes.last().unwrap()));
        }
    }
    assert_eq!(seen, vec![(500, Green), (1_400, Red), (2_300, Blue)]);
    assert_eq!(game.state(), GameState::AwaitingInput);
}

fn play_back_round(game: &mut TestGame) {
    settle(game);
    play_back(game);
}

#[test]
fn clearing_a_round_scores_and_extends_after_pause() {
    let (mut game, log) = game(&[Green, Red]);
    game.on_start_requested();
    settle(&mut game);

    game.on_color_pressed(Green);
    assert_eq!(game.score(), 1);
    assert!(game.player_input().is_empty());
    assert_eq!(game.state(), GameState::Presenting);
    assert_eq!(game.sequence().len(), 1);
    assert!(log.take().contains(&Effect::Score(1)));

    game.advance(ms(999));
    assert_eq!(game.sequence().len(), 1);
    game.advance(ms(1));
    assert_eq!(game.state(), GameState::Presenting);
    assert_eq!(game.sequence(), &[Green, Red]);
}

#[test]
fn wrong_second_press_ends_game_immediately() {
    let (mut game, log) = game(&[Green, Red]);
    game.on_start_requested();
    settle(&mut game);
    game.on_color_pressed(Green);
    settle(&mut game);
    assert_eq!(game.sequence(), &[Green, Red]);
    let score_before = game.score();
    log.take();

    game.on_color_pressed(Green);
    assert_eq!(game.state(), GameState::AwaitingInput);
    game.on_color_pressed(Yellow);

    assert_eq!(game.state(), GameState::GameOver);
    assert_eq!(game.score(), score_before);
    // The losing press still flashes and sounds before the verdict.
    assert_eq!(log.flashes(), vec![Green, Yellow]);
    assert_eq!(log.tones(), 2);
    let effects = log.take();
    assert!(effects.contains(&Effect::Status(STATUS_GAME_OVER.to_string())));
    assert!(effects.contains(&Effect::StartLabel(LABEL_START.to_string())));
}

#[test]
fn mismatch_on_first_index_fails_fast() {
    let (mut game, _log) = game(&[Blue, Blue, Blue]);
    game.on_start_requested();
    settle(&mut game);
    play_back(&mut game);
    settle(&mut game);
    assert_eq!(game.sequence().len(), 2);

    game.on_color_pressed(Red);
    assert_eq!(game.state(), GameState::GameOver);
    assert_eq!(game.player_input(), &[Red]);
    assert_eq!(game.score(), 1);
}

#[test]
fn sequence_grows_by_one_per_cleared_round() {
    let (mut game, _log) = game(&[Yellow, Green, Green, Blue, Red, Yellow]);
    game.on_start_requested();

    for round in 1..=6u32 {
        settle(&mut game);
        assert_eq!(game.state(), GameState::AwaitingInput);
        let before = game.sequence().to_vec();
        play_back(&mut game);
        assert_eq!(game.score(), round);

        settle(&mut game);
        assert_eq!(game.sequence().len(), round as usize + 1);
        // Earlier rounds are a prefix of the grown sequence.
        assert_eq!(&game.sequence()[..before.len()], before.as_slice());
    }
}

#[test]
fn input_during_presenting_is_discarded() {
    let (mut game, log) = game(&[Green]);
    game.on_start_requested();
    log.take();

    game.advance(ms(200));
    game.on_color_pressed(Green);
    game.advance(ms(400));
    game.on_color_pressed(Red);

    assert_eq!(game.state(), GameState::Presenting);
    assert!(game.player_input().is_empty());
    assert_eq!(game.score(), 0);
    // Only the replay's own flash.
    assert_eq!(log.flashes(), vec![Green]);

    // Nothing was buffered for after the replay either.
    settle(&mut game);
    assert_eq!(game.state(), GameState::AwaitingInput);
    assert!(game.player_input().is_empty());
}

#[test]
fn input_during_round_pause_is_discarded() {
    let (mut game, log) = game(&[Green]);
    game.on_start_requested();
    settle(&mut game);
    game.on_color_pressed(Green);
    log.take();

    game.advance(ms(500));
    game.on_color_pressed(Green);
    assert!(log.flashes().is_empty());
    assert!(game.player_input().is_empty());
    assert_eq!(game.score(), 1);
}

#[test]
fn idle_and_game_over_ignore_input() {
    let (mut game, log) = game(&[Green]);
    log.take();
    game.on_color_pressed(Green);
    assert_eq!(game.state(), GameState::Idle);
    assert!(log.take().is_empty());

    game.on_start_requested();
    settle(&mut game);
    game.on_color_pressed(Red);
    assert_eq!(game.state(), GameState::GameOver);
    log.take();

    game.on_color_pressed(Green);
    settle(&mut game);
    assert_eq!(game.state(), GameState::GameOver);
    assert!(log.take().is_empty());
}

#[test]
fn repeated_start_always_yields_one_color_and_zero_score() {
    let (mut game, _log) = game(&[Green, Red, Yellow, Blue]);
    game.on_start_requested();
    settle(&mut game);
    play_back(&mut game);
    settle(&mut game);
    assert_eq!(game.score(), 1);

    for _ in 0..3 {
        game.on_start_requested();
        assert_eq!(game.sequence().len(), 1);
        assert_eq!(game.score(), 0);
        assert_eq!(game.state(), GameState::Presenting);
    }
}

#[test]
fn restart_mid_replay_drops_stale_flashes() {
    let (mut game, log) = game(&[Green, Red]);
    game.on_start_requested();
    let first_epoch = game.epoch();
    game.advance(ms(300));

    game.on_start_requested();
    assert_ne!(game.epoch(), first_epoch);
    assert_eq!(game.sequence(), &[Red]);
    log.take();

    // The abandoned game's flash was due at 500ms.
    game.advance(ms(250));
    assert!(log.flashes().is_empty());

    game.advance(ms(250));
    assert_eq!(log.flashes(), vec![Red]);
}

#[test]
fn restart_during_round_pause_cancels_extension() {
    let (mut game, _log) = game(&[Green, Blue]);
    game.on_start_requested();
    settle(&mut game);
    game.on_color_pressed(Green);

    game.advance(ms(400));
    game.on_start_requested();
    assert_eq!(game.sequence(), &[Blue]);

    settle(&mut game);
    assert_eq!(game.state(), GameState::AwaitingInput);
    assert_eq!(game.sequence(), &[Blue]);
}

#[test]
fn start_after_game_over_begins_fresh() {
    let (mut game, _log) = game(&[Green]);
    game.on_start_requested();
    settle(&mut game);
    game.on_color_pressed(Blue);
    assert_eq!(game.state(), GameState::GameOver);

    game.on_start_requested();
    assert_eq!(game.state(), GameState::Presenting);
    assert_eq!(game.sequence().len(), 1);
    assert!(game.player_input().is_empty());
}

#[test]
fn partial_input_waits_for_more() {
    let (mut game, _log) = game(&[Green, Red, Blue]);
    game.on_start_requested();
    settle(&mut game);
    play_back(&mut game);
    settle(&mut game);
    play_back(&mut game);
    settle(&mut game);
    assert_eq!(game.sequence(), &[Green, Red, Blue]);

    game.on_color_pressed(Green);
    game.on_color_pressed(Red);
    assert_eq!(game.state(), GameState::AwaitingInput);
    assert_eq!(game.player_input(), &[Green, Red]);
    assert!(game.player_input().len() <= game.sequence().len());
    assert_eq!(game.score(), 2);
}

#[test]
fn score_counts_cleared_rounds_with_seeded_rng() {
    let log = Log::default();
    let mut game = GameController::new(
        FakePresenter(log.clone()),
        FakeTones(log.clone()),
        SequenceRng::new(99),
    );
    game.on_start_requested();

    for cleared in 0..4u32 {
        game.advance(Duration::from_secs(600));
        assert_eq!(game.score(), cleared);
        let target = game.sequence().to_vec();
        for color in target {
            game.on_color_pressed(color);
        }
    }
    assert_eq!(game.score(), 4);

    game.advance(Duration::from_secs(600));
    let wrong = Color::ALL
        .into_iter()
        .find(|c| Some(c) != game.sequence().first())
        .unwrap();
    game.on_color_pressed(wrong);
    assert_eq!(game.state(), GameState::GameOver);
    assert_eq!(game.score(), 4);
    assert_eq!(game.snapshot().score, 4);
}
