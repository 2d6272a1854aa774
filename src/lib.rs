//! Piano Says core crate.
//!
//! A "Simon Says" piano game: the computer plays a growing sequence of notes,
//! the player repeats it on the keyboard (home row `a`..`k`). Each completed
//! round adds a note and plays 5% faster; a wrong key ends the game and the
//! score is sent to the scoring service.
//!
//! The rules live in [`game`] as a pure state machine over snapshots; [`session`]
//! applies its effects to a [`session::Host`]. The browser host and the view are
//! in `web`, behind the wasm-bindgen exports below.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod game;
pub mod notes;
pub mod reporter;
pub mod scheduler;
pub mod sequence;
pub mod session;
mod web;

pub use config::GameConfig;
pub use error::GameError;
pub use game::{Effect, GameState, Input, Phase, View};
pub use notes::{KEYS, Note, note_for_key};
pub use reporter::{GameResult, ReportStatus};
pub use session::{Host, Session};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // Err only when a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Build the game UI into `document.body`. `config_json` overrides any
/// [`GameConfig`] field, e.g. `{"report_url": "/api/results"}`.
#[wasm_bindgen]
pub fn mount(config_json: Option<String>) -> Result<(), JsValue> {
    web::mount(config_json.as_deref()).map_err(Into::into)
}

#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    web::start().map_err(Into::into)
}

#[wasm_bindgen]
pub fn stop_game() -> Result<(), JsValue> {
    web::stop().map_err(Into::into)
}

#[wasm_bindgen]
pub fn toggle_game() -> Result<(), JsValue> {
    web::toggle().map_err(Into::into)
}
