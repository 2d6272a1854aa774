//! Game state machine.
//!
//! `GameState` is an immutable snapshot. [`GameState::step`] takes one input
//! (button, key, fired timer, settled report, modal dismissal) and returns the
//! next snapshot together with the effects the host must carry out, in order.
//! Nothing here touches the browser, so every rule is testable natively.
//!
//! Lifecycle: `Idle -> Playing` on start, `Playing -> GameOver` on a wrong key,
//! `GameOver -> Idle` on modal dismissal, `Playing -> Idle` on explicit stop.

use crate::config::GameConfig;
use crate::notes::{Note, note_for_key};
use crate::reporter::{GameResult, ReportStatus};
use crate::scheduler::{ScopeId, TimerEvent, TimerKind, playback_plan};
use crate::sequence::{NoteSource, generate};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Playing,
    GameOver,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Start,
    Stop,
    /// A `KeyboardEvent.key` value.
    Key(String),
    Timer(TimerEvent),
    ReportSettled(ReportStatus),
    DismissModal,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Schedule {
        scope: ScopeId,
        after_ms: u32,
        kind: TimerKind,
    },
    /// Cancel every pending timer of the scope.
    Revoke(ScopeId),
    PlayNote(Note),
    Report(GameResult),
    ShowModal {
        score: u32,
    },
    CloseModal,
    Navigate(String),
}

/// Result of one transition.
#[derive(Clone, Debug)]
pub struct Step {
    pub state: GameState,
    pub effects: Vec<Effect>,
}

/// What the presentation layer draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct View {
    pub phase: Phase,
    pub score: u32,
    pub elapsed_secs: u32,
    pub modal_open: bool,
    pub round_length: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    phase: Phase,
    sequence: Vec<Note>,
    position: usize,
    speed_ms: f64,
    score: u32,
    elapsed_secs: u32,
    modal_open: bool,
    // Round completed, waiting for the success delay before the next one.
    awaiting_round: bool,
    playback: Option<ScopeId>,
    ticker: Option<ScopeId>,
    next_scope: u32,
    user_id: Option<String>,
    last_report: Option<ReportStatus>,
}

impl GameState {
    pub fn new(user_id: Option<String>, config: &GameConfig) -> Self {
        Self {
            phase: Phase::Idle,
            sequence: Vec::new(),
            position: 0,
            speed_ms: config.base_speed_ms,
            score: 0,
            elapsed_secs: 0,
            modal_open: false,
            awaiting_round: false,
            playback: None,
            ticker: None,
            next_scope: 0,
            user_id,
            last_report: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sequence(&self) -> &[Note] {
        &self.sequence
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn speed_ms(&self) -> f64 {
        self.speed_ms
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn awaiting_round(&self) -> bool {
        self.awaiting_round
    }

    pub fn playback_scope(&self) -> Option<ScopeId> {
        self.playback
    }

    pub fn ticker_scope(&self) -> Option<ScopeId> {
        self.ticker
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn last_report(&self) -> Option<&ReportStatus> {
        self.last_report.as_ref()
    }

    pub fn view(&self) -> View {
        View {
            phase: self.phase,
            score: self.score,
            elapsed_secs: self.elapsed_secs,
            modal_open: self.modal_open,
            round_length: self.sequence.len(),
        }
    }

    pub fn step(&self, input: &Input, config: &GameConfig, notes: &mut impl NoteSource) -> Step {
        let mut next = self.clone();
        let mut effects = Vec::new();
        match input {
            Input::Start => next.start(config, notes, &mut effects),
            Input::Stop => next.stop(&mut effects),
            Input::Key(key) => next.key(key, config, &mut effects),
            Input::Timer(event) => next.timer(event, config, notes, &mut effects),
            Input::ReportSettled(status) => next.report_settled(status),
            Input::DismissModal => next.dismiss(config, &mut effects),
        }
        Step {
            state: next,
            effects,
        }
    }

    fn start(&mut self, config: &GameConfig, notes: &mut impl NoteSource, fx: &mut Vec<Effect>) {
        if self.phase == Phase::Playing {
            log::debug!("start ignored: a game is already running");
            return;
        }
        self.revoke_all(fx);
        self.close_modal(fx);

        self.score = 0;
        self.elapsed_secs = 0;
        self.position = 0;
        self.speed_ms = config.base_speed_ms;
        self.awaiting_round = false;
        self.last_report = None;
        self.sequence = generate(config.initial_length, notes);
        self.phase = Phase::Playing;

        let ticker = self.open_scope();
        self.ticker = Some(ticker);
        fx.push(Effect::Schedule {
            scope: ticker,
            after_ms: config.tick_ms,
            kind: TimerKind::Tick,
        });

        let playback = self.open_scope();
        self.playback = Some(playback);
        self.schedule_playback(playback, config.start_delay_ms, fx);
        log::info!("game started with {} notes", self.sequence.len());
    }

    fn stop(&mut self, fx: &mut Vec<Effect>) {
        if self.phase != Phase::Playing {
            log::debug!("stop ignored in {:?}", self.phase);
            return;
        }
        self.revoke_all(fx);
        self.sequence.clear();
        self.position = 0;
        self.score = 0;
        self.elapsed_secs = 0;
        self.awaiting_round = false;
        self.close_modal(fx);
        self.phase = Phase::Idle;
        log::info!("game stopped");
    }

    fn key(&mut self, key: &str, config: &GameConfig, fx: &mut Vec<Effect>) {
        if self.phase != Phase::Playing {
            return;
        }
        let Some(note) = note_for_key(key) else {
            return;
        };
        let Some(&expected) = self.sequence.get(self.position) else {
            return;
        };
        // Between rounds a wrong key still loses; repeating the last note must
        // not score again or schedule a second extension.
        if self.awaiting_round && note == expected {
            log::debug!("key {key:?} ignored between rounds");
            return;
        }

        if note != expected {
            log::info!(
                "wrong note {} (expected {}) at position {}",
                note.name(),
                expected.name(),
                self.position
            );
            self.game_over(config, fx);
            return;
        }

        self.score = self.score.saturating_add(config.reward);
        if self.position + 1 == self.sequence.len() {
            self.awaiting_round = true;
            let scope = self.current_playback();
            fx.push(Effect::Schedule {
                scope,
                after_ms: config.success_delay_ms,
                kind: TimerKind::ExtendSequence,
            });
        } else {
            self.position += 1;
        }
    }

    fn timer(
        &mut self,
        event: &TimerEvent,
        config: &GameConfig,
        notes: &mut impl NoteSource,
        fx: &mut Vec<Effect>,
    ) {
        let live = self.phase == Phase::Playing;
        match event.kind {
            TimerKind::Tick if live && self.ticker == Some(event.scope) => {
                self.elapsed_secs += 1;
                fx.push(Effect::Schedule {
                    scope: event.scope,
                    after_ms: config.tick_ms,
                    kind: TimerKind::Tick,
                });
            }
            TimerKind::PlayNote { index } if live && self.playback == Some(event.scope) => {
                if let Some(&note) = self.sequence.get(index) {
                    fx.push(Effect::PlayNote(note));
                }
            }
            TimerKind::ExtendSequence
                if live && self.awaiting_round && self.playback == Some(event.scope) =>
            {
                self.extend(config, notes, fx);
            }
            _ => log::debug!("stale timer {event:?} ignored"),
        }
    }

    fn extend(&mut self, config: &GameConfig, notes: &mut impl NoteSource, fx: &mut Vec<Effect>) {
        if let Some(old) = self.playback.take() {
            fx.push(Effect::Revoke(old));
        }
        self.sequence.push(notes.next_note());
        self.speed_ms = config.next_speed(self.speed_ms);
        self.position = 0;
        self.awaiting_round = false;

        let playback = self.open_scope();
        self.playback = Some(playback);
        self.schedule_playback(playback, 0, fx);
        log::info!(
            "round {}: {} notes at {:.0} ms",
            self.sequence.len() - config.initial_length + 1,
            self.sequence.len(),
            self.speed_ms
        );
    }

    fn game_over(&mut self, config: &GameConfig, fx: &mut Vec<Effect>) {
        self.revoke_all(fx);
        self.phase = Phase::GameOver;
        self.sequence.clear();
        self.position = 0;
        self.awaiting_round = false;

        // Report first, then show the result regardless of how the report ends.
        fx.push(Effect::Report(GameResult {
            score: self.score,
            user_id: self.user_id.clone(),
            game_id: config.game_id.clone(),
            time: self.elapsed_secs,
        }));
        self.modal_open = true;
        fx.push(Effect::ShowModal { score: self.score });
        log::info!(
            "game over: score {} after {}s",
            self.score,
            self.elapsed_secs
        );
    }

    fn report_settled(&mut self, status: &ReportStatus) {
        match status {
            ReportStatus::Delivered => log::info!("result delivered"),
            ReportStatus::Failed(reason) => log::warn!("result not delivered: {reason}"),
        }
        self.last_report = Some(status.clone());
    }

    fn dismiss(&mut self, config: &GameConfig, fx: &mut Vec<Effect>) {
        self.close_modal(fx);
        if self.phase == Phase::GameOver {
            self.phase = Phase::Idle;
        }
        fx.push(Effect::Navigate(config.exit_url.clone()));
    }

    fn schedule_playback(&self, scope: ScopeId, lead_in_ms: u32, fx: &mut Vec<Effect>) {
        for (after_ms, kind) in playback_plan(self.sequence.len(), self.speed_ms, lead_in_ms) {
            match kind {
                TimerKind::PlayNote { index } if after_ms == 0 => {
                    fx.push(Effect::PlayNote(self.sequence[index]));
                }
                _ => fx.push(Effect::Schedule {
                    scope,
                    after_ms,
                    kind,
                }),
            }
        }
    }

    fn open_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.next_scope);
        self.next_scope += 1;
        id
    }

    fn current_playback(&mut self) -> ScopeId {
        match self.playback {
            Some(scope) => scope,
            None => {
                let scope = self.open_scope();
                self.playback = Some(scope);
                scope
            }
        }
    }

    fn revoke_all(&mut self, fx: &mut Vec<Effect>) {
        if let Some(scope) = self.playback.take() {
            fx.push(Effect::Revoke(scope));
        }
        if let Some(scope) = self.ticker.take() {
            fx.push(Effect::Revoke(scope));
        }
    }

    fn close_modal(&mut self, fx: &mut Vec<Effect>) {
        if self.modal_open {
            self.modal_open = false;
            fx.push(Effect::CloseModal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TimerId;

    struct Cycle(Vec<Note>, usize);

    impl NoteSource for Cycle {
        fn next_note(&mut self) -> Note {
            let n = self.0[self.1 % self.0.len()];
            self.1 += 1;
            n
        }
    }

    fn abcd() -> Cycle {
        Cycle(vec![Note::C4, Note::D4, Note::E4, Note::F4, Note::G4], 0)
    }

    fn started() -> (GameState, GameConfig, Cycle) {
        let cfg = GameConfig::default();
        let mut notes = abcd();
        let step = GameState::new(Some("u1".into()), &cfg).step(&Input::Start, &cfg, &mut notes);
        (step.state, cfg, notes)
    }

    fn key(s: &GameState, k: &str, cfg: &GameConfig, notes: &mut Cycle) -> Step {
        s.step(&Input::Key(k.into()), cfg, notes)
    }

    #[test]
    fn start_resets_and_schedules() {
        let cfg = GameConfig::default();
        let mut notes = abcd();
        let step = GameState::new(None, &cfg).step(&Input::Start, &cfg, &mut notes);
        let s = &step.state;
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.sequence(), &[Note::C4, Note::D4, Note::E4, Note::F4]);
        assert_eq!((s.score(), s.elapsed_secs(), s.position()), (0, 0, 0));
        assert_eq!(s.speed_ms(), 1000.0);

        let ticker = s.ticker_scope().unwrap();
        let playback = s.playback_scope().unwrap();
        assert_ne!(ticker, playback);
        assert_eq!(
            step.effects[0],
            Effect::Schedule {
                scope: ticker,
                after_ms: 1000,
                kind: TimerKind::Tick
            }
        );
        let plays: Vec<u32> = step
            .effects
            .iter()
            .filter_map(|e| match e {
                Effect::Schedule {
                    scope,
                    after_ms,
                    kind: TimerKind::PlayNote { .. },
                } if *scope == playback => Some(*after_ms),
                _ => None,
            })
            .collect();
        assert_eq!(plays, vec![1500, 2500, 3500, 4500]);
    }

    #[test]
    fn start_while_playing_is_a_no_op() {
        let (s, cfg, mut notes) = started();
        let step = s.step(&Input::Start, &cfg, &mut notes);
        assert!(step.effects.is_empty());
        assert_eq!(step.state, s);
    }

    #[test]
    fn keys_ignored_outside_play() {
        let cfg = GameConfig::default();
        let s = GameState::new(None, &cfg);
        let step = key(&s, "a", &cfg, &mut abcd());
        assert!(step.effects.is_empty());
        assert_eq!(step.state, s);
    }

    #[test]
    fn unmapped_key_is_ignored() {
        let (s, cfg, mut notes) = started();
        let step = key(&s, "Enter", &cfg, &mut notes);
        assert!(step.effects.is_empty());
        assert_eq!(step.state, s);
    }

    #[test]
    fn correct_key_advances() {
        let (s, cfg, mut notes) = started();
        let step = key(&s, "A", &cfg, &mut notes);
        assert_eq!(step.state.score(), 10);
        assert_eq!(step.state.position(), 1);
        assert_eq!(step.state.sequence(), s.sequence());
        assert!(step.effects.is_empty());
    }

    #[test]
    fn repeated_last_key_between_rounds_is_ignored() {
        let (mut s, cfg, mut notes) = started();
        for k in ["a", "s", "d", "f"] {
            s = key(&s, k, &cfg, &mut notes).state;
        }
        assert!(s.awaiting_round());
        assert_eq!(s.score(), 40);
        let step = key(&s, "f", &cfg, &mut notes);
        assert!(step.effects.is_empty());
        assert_eq!(step.state.score(), 40);
    }

    #[test]
    fn wrong_key_between_rounds_ends_game() {
        let (mut s, cfg, mut notes) = started();
        for k in ["a", "s", "d", "f"] {
            s = key(&s, k, &cfg, &mut notes).state;
        }
        let playback = s.playback_scope().unwrap();
        let step = key(&s, "k", &cfg, &mut notes);
        assert_eq!(step.state.phase(), Phase::GameOver);
        assert!(!step.state.awaiting_round());
        assert!(step.effects.contains(&Effect::Revoke(playback)));
        assert!(step.effects.contains(&Effect::ShowModal { score: 40 }));
    }

    #[test]
    fn score_saturates_instead_of_overflowing() {
        let cfg = GameConfig {
            reward: u32::MAX,
            ..GameConfig::default()
        };
        let mut notes = abcd();
        let mut s = GameState::new(None, &cfg).step(&Input::Start, &cfg, &mut notes).state;
        for k in ["a", "s"] {
            s = key(&s, k, &cfg, &mut notes).state;
        }
        assert_eq!(s.score(), u32::MAX);
    }

    #[test]
    fn stale_scope_timer_is_ignored() {
        let (s, cfg, mut notes) = started();
        let stale = TimerEvent {
            scope: ScopeId(999),
            id: TimerId(1),
            kind: TimerKind::PlayNote { index: 0 },
        };
        let step = s.step(&Input::Timer(stale), &cfg, &mut notes);
        assert!(step.effects.is_empty());
    }

    #[test]
    fn tick_counts_and_rearms() {
        let (s, cfg, mut notes) = started();
        let ticker = s.ticker_scope().unwrap();
        let tick = TimerEvent {
            scope: ticker,
            id: TimerId(0),
            kind: TimerKind::Tick,
        };
        let step = s.step(&Input::Timer(tick), &cfg, &mut notes);
        assert_eq!(step.state.elapsed_secs(), 1);
        assert_eq!(
            step.effects,
            vec![Effect::Schedule {
                scope: ticker,
                after_ms: 1000,
                kind: TimerKind::Tick
            }]
        );
    }

    #[test]
    fn wrong_key_ends_game_with_report_then_modal() {
        let (s, cfg, mut notes) = started();
        let s = key(&s, "a", &cfg, &mut notes).state;
        let step = key(&s, "k", &cfg, &mut notes);
        assert_eq!(step.state.phase(), Phase::GameOver);
        assert!(step.state.modal_open());
        assert!(step.state.sequence().is_empty());
        assert_eq!(step.state.score(), 10);

        let n = step.effects.len();
        assert_eq!(
            step.effects[n - 2],
            Effect::Report(GameResult {
                score: 10,
                user_id: Some("u1".into()),
                game_id: "1".into(),
                time: 0,
            })
        );
        assert_eq!(step.effects[n - 1], Effect::ShowModal { score: 10 });
        assert!(step.effects.contains(&Effect::Revoke(s.playback_scope().unwrap())));
        assert!(step.effects.contains(&Effect::Revoke(s.ticker_scope().unwrap())));
    }

    #[test]
    fn failed_report_is_recorded_only() {
        let (s, cfg, mut notes) = started();
        let over = key(&s, "k", &cfg, &mut notes).state;
        let step = over.step(
            &Input::ReportSettled(ReportStatus::Failed("offline".into())),
            &cfg,
            &mut notes,
        );
        assert!(step.effects.is_empty());
        assert_eq!(step.state.phase(), Phase::GameOver);
        assert!(step.state.modal_open());
        assert_eq!(
            step.state.last_report(),
            Some(&ReportStatus::Failed("offline".into()))
        );
    }

    #[test]
    fn dismiss_navigates_and_returns_to_idle() {
        let (s, cfg, mut notes) = started();
        let over = key(&s, "k", &cfg, &mut notes).state;
        let step = over.step(&Input::DismissModal, &cfg, &mut notes);
        assert_eq!(step.state.phase(), Phase::Idle);
        assert!(!step.state.modal_open());
        assert_eq!(
            step.effects,
            vec![
                Effect::CloseModal,
                Effect::Navigate("http://127.0.0.1:8000/games".into())
            ]
        );
    }

    #[test]
    fn restart_after_game_over_closes_modal() {
        let (s, cfg, mut notes) = started();
        let over = key(&s, "k", &cfg, &mut notes).state;
        let step = over.step(&Input::Start, &cfg, &mut notes);
        assert_eq!(step.effects[0], Effect::CloseModal);
        assert_eq!(step.state.phase(), Phase::Playing);
        assert_eq!(step.state.score(), 0);
        assert_eq!(step.state.sequence().len(), 4);
    }
}
