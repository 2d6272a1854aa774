//! DOM construction and rendering. Pure view: reads a `View`, writes elements.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Window};

use crate::error::{GameError, Result};
use crate::game::{Phase, View};
use crate::notes::{KEYS, Note};

pub const ROOT_ID: &str = "ps-root";
pub const TOGGLE_ID: &str = "ps-toggle";
pub const MODAL_ID: &str = "ps-modal";
pub const MODAL_CLOSE_ID: &str = "ps-modal-close";
const TIME_ID: &str = "ps-time";
const SCORE_ID: &str = "ps-score";
const MODAL_SCORE_ID: &str = "ps-modal-score";

const KEY_FLASH_MS: i32 = 250;

const KEY_STYLE: &str = "display:flex; flex-direction:column; justify-content:flex-end; align-items:center; width:52px; height:180px; margin:0 2px; padding-bottom:10px; background:#fafafa; color:#333; border:1px solid #222; border-radius:0 0 8px 8px; font-family:'Fira Code', monospace; font-size:13px; transition:background 80ms;";
const KEY_ACTIVE_STYLE: &str = "display:flex; flex-direction:column; justify-content:flex-end; align-items:center; width:52px; height:180px; margin:0 2px; padding-bottom:10px; background:#facc15; color:#111; border:1px solid #222; border-radius:0 0 8px 8px; font-family:'Fira Code', monospace; font-size:13px; transition:background 80ms;";
const START_STYLE: &str = "margin-top:14px; padding:10px 24px; font-weight:600; border:none; border-radius:8px; cursor:pointer; background:#facc15; color:#111;";
const STOP_STYLE: &str = "margin-top:14px; padding:10px 24px; font-weight:600; border:none; border-radius:8px; cursor:pointer; background:#ef4444; color:#fff;";
const MODAL_HIDDEN: &str = "display:none;";
const MODAL_SHOWN: &str = "position:fixed; inset:0; display:flex; justify-content:center; align-items:center; background:rgba(0,0,0,0.5); backdrop-filter:blur(6px); z-index:50;";

fn key_id(key: &str) -> String {
    format!("ps-key-{key}")
}

fn set_style(e: &Element, style: &str) {
    if let Err(err) = e.set_attribute("style", style) {
        log::debug!("style of #{} not set: {err:?}", e.id());
    }
}

fn el(doc: &Document, tag: &str, id: Option<&str>, style: &str) -> Result<Element> {
    let e = doc.create_element(tag)?;
    if let Some(id) = id {
        e.set_id(id);
    }
    e.set_attribute("style", style)?;
    Ok(e)
}

/// Build the game panel and the hidden completion modal. Reuses an existing root.
pub fn build(doc: &Document) -> Result<()> {
    if doc.get_element_by_id(ROOT_ID).is_some() {
        return Ok(());
    }
    let body = doc
        .body()
        .ok_or_else(|| GameError::Dom("no body".into()))?;

    let root = el(
        doc,
        "section",
        Some(ROOT_ID),
        "position:relative; display:flex; flex-direction:column; align-items:center; width:720px; min-height:560px; margin:24px auto; padding:20px; border:1px solid #facc15; border-radius:24px; background:#1b1b2a; color:#fff; font-family:sans-serif;",
    )?;

    let instructions = el(
        doc,
        "article",
        None,
        "position:absolute; left:20px; top:20px; max-width:240px; padding:12px 16px; background:rgba(255,255,255,0.12); border-radius:12px; font-size:13px;",
    )?;
    instructions.set_inner_html(
        "<p style='font-weight:600;margin:0 0 8px 0;'>Instructions:</p>\
         <p style='margin:2px 0;'>• Get score by replicating the keys played by the computer</p>\
         <p style='margin:2px 0;'>• With each correct sequence, the game gets faster</p>\
         <p style='margin:2px 0;'>• If you press the wrong key the game is over</p>",
    );
    root.append_child(&instructions)?;

    let title = el(
        doc,
        "h1",
        None,
        "margin:28px 0 0 280px; font-size:30px; font-weight:500;",
    )?;
    title.set_text_content(Some("♪ Virtual Piano Game ♪"));
    root.append_child(&title)?;

    let piano = el(
        doc,
        "article",
        Some("ps-piano"),
        "display:flex; flex-grow:1; align-items:flex-end; justify-content:center; width:100%; padding-top:160px;",
    )?;
    for (key, note) in KEYS {
        let k = el(doc, "div", Some(&key_id(key)), KEY_STYLE)?;
        k.set_inner_html(&format!(
            "<span style='opacity:0.6;'>{}</span><strong>{}</strong>",
            note.name(),
            key.to_ascii_uppercase()
        ));
        piano.append_child(&k)?;
    }
    root.append_child(&piano)?;

    let toggle = el(doc, "button", Some(TOGGLE_ID), START_STYLE)?;
    toggle.set_text_content(Some("Start Game"));
    root.append_child(&toggle)?;

    let status = el(
        doc,
        "article",
        None,
        "position:absolute; right:16px; bottom:16px; display:flex; gap:18px; padding:8px 28px; background:rgba(255,255,255,0.12); border-radius:12px;",
    )?;
    status.set_inner_html(&format!(
        "<div><p style='margin:0;'>Time:</p><p id='{TIME_ID}' style='margin:0;color:#facc15;'>0 Sec</p></div>\
         <div><p style='margin:0;'>Score:</p><p id='{SCORE_ID}' style='margin:0;color:#facc15;'>0</p></div>"
    ));
    root.append_child(&status)?;
    body.append_child(&root)?;

    let modal = el(doc, "div", Some(MODAL_ID), MODAL_HIDDEN)?;
    modal.set_inner_html(&format!(
        "<div style='display:flex;flex-direction:column;align-items:center;gap:12px;padding:20px 40px;background:#fff;color:#111;border-radius:12px;'>\
           <p style='font-size:28px;font-weight:600;margin:0;'>¡ Game Over !</p>\
           <p style='font-size:18px;margin:0;'>Your score: <span id='{MODAL_SCORE_ID}' style='color:#ca8a04;'>0 Points</span></p>\
           <button id='{MODAL_CLOSE_ID}' style='padding:8px 16px;background:#ef4444;color:#fff;border:none;border-radius:4px;cursor:pointer;'>Back to the game</button>\
         </div>"
    ));
    body.append_child(&modal)?;
    Ok(())
}

pub fn render(doc: &Document, view: &View) {
    if let Some(e) = doc.get_element_by_id(TIME_ID) {
        e.set_text_content(Some(&format!("{} Sec", view.elapsed_secs)));
    }
    if let Some(e) = doc.get_element_by_id(SCORE_ID) {
        e.set_text_content(Some(&view.score.to_string()));
    }
    if let Some(e) = doc.get_element_by_id(TOGGLE_ID) {
        let playing = view.phase == Phase::Playing;
        e.set_text_content(Some(if playing { "Stop Game" } else { "Start Game" }));
        set_style(&e, if playing { STOP_STYLE } else { START_STYLE });
    }
}

pub fn show_modal(doc: &Document, score: u32) {
    if let Some(e) = doc.get_element_by_id(MODAL_SCORE_ID) {
        e.set_text_content(Some(&format!("{score} Points")));
    }
    if let Some(e) = doc.get_element_by_id(MODAL_ID) {
        set_style(&e, MODAL_SHOWN);
    }
}

pub fn close_modal(doc: &Document) {
    if let Some(e) = doc.get_element_by_id(MODAL_ID) {
        set_style(&e, MODAL_HIDDEN);
    }
}

/// Highlight (or release) the on-screen key bound to `key`.
pub fn set_key_active(doc: &Document, key: &str, active: bool) {
    let id = key_id(&key.to_ascii_lowercase());
    if let Some(e) = doc.get_element_by_id(&id) {
        set_style(&e, if active { KEY_ACTIVE_STYLE } else { KEY_STYLE });
    }
}

/// Briefly highlight the key of a note being played back.
pub fn flash_note(win: &Window, doc: &Document, note: Note) {
    let key = note.key();
    set_key_active(doc, key, true);
    let doc = doc.clone();
    let release = Closure::once_into_js(move || set_key_active(&doc, key, false));
    if let Err(err) = win
        .set_timeout_with_callback_and_timeout_and_arguments_0(release.unchecked_ref(), KEY_FLASH_MS)
    {
        log::debug!("key flash not released: {err:?}");
    }
}
