//! Browser host: DOM, Web Audio, `setTimeout` timers and `fetch` reporting.
//!
//! The session lives in a thread-local like any other wasm-bindgen game state.
//! Every browser callback (key, button, timer, settled report) funnels through
//! [`dispatch`], so the state machine only ever runs one transition at a time.

mod audio;
mod dom;

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Window, window};

use crate::config::{GameConfig, user_id_from_query};
use crate::error::{GameError, Result};
use crate::game::{Input, Phase, View};
use crate::notes::Note;
use crate::reporter::{GameResult, HttpReporter, ReportStatus};
use crate::scheduler::TimerEvent;
use crate::session::{Host, Session};
use crate::sequence::RandomNotes;

use audio::Synth;

struct WebHost {
    window: Window,
    document: Document,
    synth: Synth,
    reporter: HttpReporter,
    /// Fired timers whose callbacks may still be on the stack.
    spent: Vec<WebTimer>,
}

/// A pending `setTimeout` together with the callback it owns. Dropping it
/// frees the callback.
struct WebTimer {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Host for WebHost {
    type TimerHandle = WebTimer;

    fn set_timer(&mut self, after_ms: u32, event: TimerEvent) -> Option<WebTimer> {
        let callback = Closure::wrap(
            Box::new(move || dispatch_or_log(Input::Timer(event))) as Box<dyn FnMut()>
        );
        let delay = i32::try_from(after_ms).unwrap_or(i32::MAX);
        match self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay,
        ) {
            Ok(handle) => Some(WebTimer {
                handle,
                _callback: callback,
            }),
            Err(err) => {
                log::error!("{}", GameError::timer(err));
                None
            }
        }
    }

    fn clear_timer(&mut self, timer: WebTimer) {
        self.window.clear_timeout_with_handle(timer.handle);
    }

    fn release_timer(&mut self, timer: WebTimer) {
        // The callback releasing this timer is still running; free the ones
        // spent before it.
        self.spent.clear();
        self.spent.push(timer);
    }

    fn play_note(&mut self, note: Note) {
        if let Err(err) = self.synth.play(note) {
            log::warn!("note {} not played: {err}", note.name());
        }
        dom::flash_note(&self.window, &self.document, note);
    }

    fn submit_result(&mut self, result: GameResult) {
        let reporter = self.reporter.clone();
        spawn_local(async move {
            let status: ReportStatus = reporter.submit(&result).await.into();
            dispatch_or_log(Input::ReportSettled(status));
        });
    }

    fn show_modal(&mut self, score: u32) {
        dom::show_modal(&self.document, score);
    }

    fn close_modal(&mut self) {
        dom::close_modal(&self.document);
    }

    fn navigate(&mut self, url: &str) {
        if let Err(err) = self.window.location().set_href(url) {
            log::error!("navigation to {url} failed: {err:?}");
        }
    }

    fn render(&mut self, view: &View) {
        dom::render(&self.document, view);
    }
}

type WebSession = Session<WebHost, RandomNotes>;

thread_local! {
    static SESSION: RefCell<Option<WebSession>> = RefCell::new(None);
}

/// Build the UI, read `user_id` from the page URL and install listeners.
/// Mounting twice keeps the first session.
pub fn mount(config_json: Option<&str>) -> Result<()> {
    let config = match config_json {
        Some(json) => GameConfig::from_json(json)?,
        None => GameConfig::default(),
    };
    if SESSION.with(|cell| cell.borrow().is_some()) {
        log::warn!("game already mounted");
        return Ok(());
    }
    let win = window().ok_or_else(|| GameError::Dom("no window".into()))?;
    let doc = win
        .document()
        .ok_or_else(|| GameError::Dom("no document".into()))?;

    let user_id = user_id_from_query(&win.location().search()?);
    if user_id.is_none() {
        log::warn!("no user_id in page URL, results will be reported without one");
    }

    dom::build(&doc)?;
    let host = WebHost {
        window: win,
        document: doc.clone(),
        synth: Synth::new(),
        reporter: HttpReporter::new(config.report_url.clone()),
        spent: Vec::new(),
    };
    let session = Session::new(config, user_id, RandomNotes, host);
    SESSION.with(|cell| cell.replace(Some(session)));

    install_listeners(&doc)?;
    log::info!("piano game mounted");
    Ok(())
}

/// Feed one input to the mounted session.
pub fn dispatch(input: Input) -> Result<()> {
    SESSION.with(|cell| {
        let Ok(mut guard) = cell.try_borrow_mut() else {
            log::warn!("input {input:?} dropped: session busy");
            return Ok(());
        };
        let session = guard.as_mut().ok_or(GameError::NotMounted)?;
        session.dispatch(input);
        Ok(())
    })
}

fn dispatch_or_log(input: Input) {
    if let Err(err) = dispatch(input) {
        log::error!("{err}");
    }
}

fn phase() -> Result<Phase> {
    SESSION.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|s| s.state().phase())
            .ok_or(GameError::NotMounted)
    })
}

fn unlock_audio() {
    SESSION.with(|cell| {
        if let Some(session) = cell.borrow_mut().as_mut() {
            if let Err(err) = session.host_mut().synth.unlock() {
                log::warn!("audio stays locked: {err}");
            }
        }
    });
}

pub fn start() -> Result<()> {
    unlock_audio();
    dispatch(Input::Start)
}

pub fn stop() -> Result<()> {
    dispatch(Input::Stop)
}

/// Start/stop button behavior.
pub fn toggle() -> Result<()> {
    if phase()? == Phase::Playing {
        stop()
    } else {
        start()
    }
}

fn install_listeners(doc: &Document) -> Result<()> {
    // Keyboard: judge presses, highlight the pressed key until release
    {
        let key_doc = doc.clone();
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if evt.repeat() {
                return;
            }
            let key = evt.key();
            dom::set_key_active(&key_doc, &key, true);
            dispatch_or_log(Input::Key(key));
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let key_doc = doc.clone();
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            dom::set_key_active(&key_doc, &evt.key(), false);
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Start / stop toggle
    if let Some(button) = doc.get_element_by_id(dom::TOGGLE_ID) {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            if let Err(err) = toggle() {
                log::error!("{err}");
            }
        }) as Box<dyn FnMut(_)>);
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Completion modal: leave the game
    if let Some(button) = doc.get_element_by_id(dom::MODAL_CLOSE_ID) {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            dispatch_or_log(Input::DismissModal);
        }) as Box<dyn FnMut(_)>);
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}
