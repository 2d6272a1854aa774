// Shared harness: a fake host with a virtual clock so whole games can be
// played natively without a browser.
#![allow(dead_code)]

use std::collections::BTreeMap;

use piano_says::scheduler::TimerEvent;
use piano_says::sequence::NoteSource;
use piano_says::{GameConfig, GameResult, Host, Input, Note, ReportStatus, Session, View};

/// Plays back a fixed list of notes, wrapping around.
pub struct Scripted {
    notes: Vec<Note>,
    next: usize,
}

impl Scripted {
    pub fn new(notes: &[Note]) -> Self {
        Self {
            notes: notes.to_vec(),
            next: 0,
        }
    }
}

impl NoteSource for Scripted {
    fn next_note(&mut self) -> Note {
        let n = self.notes[self.next % self.notes.len()];
        self.next += 1;
        n
    }
}

#[derive(Default)]
pub struct FakeHost {
    pub now: u64,
    seq: u64,
    /// (due, seq) -> event
    pub queue: BTreeMap<(u64, u64), TimerEvent>,
    pub armed: usize,
    pub cleared: usize,
    pub released: usize,
    pub played: Vec<(u64, Note)>,
    pub reports: Vec<GameResult>,
    pub modal_shows: Vec<u32>,
    pub modal_closes: usize,
    pub navigations: Vec<String>,
    pub renders: usize,
    pub last_view: Option<View>,
}

impl Host for FakeHost {
    type TimerHandle = (u64, u64);

    fn set_timer(&mut self, after_ms: u32, event: TimerEvent) -> Option<(u64, u64)> {
        let key = (self.now + after_ms as u64, self.seq);
        self.seq += 1;
        self.armed += 1;
        self.queue.insert(key, event);
        Some(key)
    }

    fn clear_timer(&mut self, handle: (u64, u64)) {
        if self.queue.remove(&handle).is_some() {
            self.cleared += 1;
        }
    }

    fn release_timer(&mut self, handle: (u64, u64)) {
        assert!(!self.queue.contains_key(&handle), "released a pending timer");
        self.released += 1;
    }

    fn play_note(&mut self, note: Note) {
        self.played.push((self.now, note));
    }

    fn submit_result(&mut self, result: GameResult) {
        self.reports.push(result);
    }

    fn show_modal(&mut self, score: u32) {
        self.modal_shows.push(score);
    }

    fn close_modal(&mut self) {
        self.modal_closes += 1;
    }

    fn navigate(&mut self, url: &str) {
        self.navigations.push(url.to_string());
    }

    fn render(&mut self, view: &View) {
        self.renders += 1;
        self.last_view = Some(*view);
    }
}

pub struct Table {
    pub session: Session<FakeHost, Scripted>,
}

impl Table {
    pub fn new(notes: &[Note]) -> Self {
        Self::with_config(GameConfig::default(), Some("u-42"), notes)
    }

    pub fn with_config(config: GameConfig, user_id: Option<&str>, notes: &[Note]) -> Self {
        let session = Session::new(
            config,
            user_id.map(str::to_string),
            Scripted::new(notes),
            FakeHost::default(),
        );
        Self { session }
    }

    pub fn host(&self) -> &FakeHost {
        self.session.host()
    }

    pub fn now(&self) -> u64 {
        self.session.host().now
    }

    pub fn send(&mut self, input: Input) {
        self.session.dispatch(input);
    }

    pub fn start(&mut self) {
        self.send(Input::Start);
    }

    pub fn stop(&mut self) {
        self.send(Input::Stop);
    }

    pub fn press(&mut self, key: &str) {
        self.send(Input::Key(key.to_string()));
    }

    pub fn settle(&mut self, status: ReportStatus) {
        self.send(Input::ReportSettled(status));
    }

    /// Fire every timer due within the next `ms`, in due order.
    pub fn advance(&mut self, ms: u64) {
        let target = self.now() + ms;
        loop {
            let next = self
                .session
                .host()
                .queue
                .first_key_value()
                .map(|(k, _)| *k)
                .filter(|(due, _)| *due <= target);
            let Some(key) = next else {
                break;
            };
            let host = self.session.host_mut();
            let event = host.queue.remove(&key).expect("queued timer");
            host.now = key.0;
            self.session.dispatch(Input::Timer(event));
        }
        self.session.host_mut().now = target;
    }

    pub fn played_since(&self, t: u64) -> Vec<Note> {
        self.host()
            .played
            .iter()
            .filter(|(at, _)| *at >= t)
            .map(|(_, n)| *n)
            .collect()
    }
}
