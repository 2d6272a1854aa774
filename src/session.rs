//! Applies state machine effects to a host environment.

use crate::config::GameConfig;
use crate::game::{Effect, GameState, Input, View};
use crate::notes::Note;
use crate::reporter::GameResult;
use crate::scheduler::{ScopeRegistry, TimerEvent, TimerId};
use crate::sequence::NoteSource;

/// Side effects the game needs from its environment. The browser implementation
/// lives in `web`; tests provide a virtual clock.
pub trait Host {
    type TimerHandle;

    /// Arm a one-shot timer that later delivers `event` as `Input::Timer`.
    /// `None` when the timer could not be armed.
    fn set_timer(&mut self, after_ms: u32, event: TimerEvent) -> Option<Self::TimerHandle>;
    fn clear_timer(&mut self, handle: Self::TimerHandle);
    /// The timer behind `handle` has fired and will not be cleared.
    fn release_timer(&mut self, handle: Self::TimerHandle) {
        drop(handle);
    }
    fn play_note(&mut self, note: Note);
    /// Start submitting the result; the host feeds back `Input::ReportSettled`.
    fn submit_result(&mut self, result: GameResult);
    fn show_modal(&mut self, score: u32);
    fn close_modal(&mut self);
    fn navigate(&mut self, url: &str);
    fn render(&mut self, view: &View);
}

pub struct Session<H: Host, S: NoteSource> {
    state: GameState,
    config: GameConfig,
    notes: S,
    host: H,
    timers: ScopeRegistry<H::TimerHandle>,
    next_timer: u64,
}

impl<H: Host, S: NoteSource> Session<H, S> {
    pub fn new(config: GameConfig, user_id: Option<String>, notes: S, mut host: H) -> Self {
        let state = GameState::new(user_id, &config);
        host.render(&state.view());
        Self {
            state,
            config,
            notes,
            host,
            timers: ScopeRegistry::new(),
            next_timer: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Timers armed and not yet fired or revoked.
    pub fn pending_timers(&self) -> usize {
        self.timers.total_pending()
    }

    /// Run one transition and apply its effects.
    pub fn dispatch(&mut self, input: Input) {
        if let Input::Timer(event) = &input {
            if let Some(handle) = self.timers.fired(event.scope, event.id) {
                self.host.release_timer(handle);
            }
        }
        let step = self.state.step(&input, &self.config, &mut self.notes);
        self.state = step.state;
        for effect in step.effects {
            self.apply(effect);
        }
        self.host.render(&self.state.view());
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Schedule {
                scope,
                after_ms,
                kind,
            } => {
                let id = TimerId(self.next_timer);
                self.next_timer += 1;
                let event = TimerEvent { scope, id, kind };
                match self.host.set_timer(after_ms, event) {
                    Some(handle) => self.timers.track(scope, id, handle),
                    None => log::error!("could not arm {kind:?} timer"),
                }
            }
            Effect::Revoke(scope) => {
                for handle in self.timers.revoke(scope) {
                    self.host.clear_timer(handle);
                }
            }
            Effect::PlayNote(note) => self.host.play_note(note),
            Effect::Report(result) => self.host.submit_result(result),
            Effect::ShowModal { score } => self.host.show_modal(score),
            Effect::CloseModal => self.host.close_modal(),
            Effect::Navigate(url) => self.host.navigate(&url),
        }
    }
}
