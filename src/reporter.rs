//! Final score submission.
//!
//! The result is POSTed as JSON to the scoring service. Whatever happens on the
//! wire, the game only learns a [`ReportStatus`] for its logs; the player sees the
//! completion modal either way.

use serde::Serialize;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// Payload sent when a game ends on a wrong key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameResult {
    pub score: u32,
    /// Raw `user_id` query parameter, forwarded unvalidated (`null` when absent).
    pub user_id: Option<String>,
    pub game_id: String,
    /// Elapsed play time in whole seconds.
    pub time: u32,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("could not encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Network(String),

    #[error("scoring service answered HTTP {0}")]
    Status(u16),
}

impl ReportError {
    fn js(value: JsValue) -> Self {
        ReportError::Network(format!("{value:?}"))
    }
}

/// How a submission settled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportStatus {
    Delivered,
    Failed(String),
}

impl From<Result<(), ReportError>> for ReportStatus {
    fn from(res: Result<(), ReportError>) -> Self {
        match res {
            Ok(()) => ReportStatus::Delivered,
            Err(err) => ReportStatus::Failed(err.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpReporter {
    endpoint: String,
}

impl HttpReporter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn submit(&self, result: &GameResult) -> Result<(), ReportError> {
        let body = serde_json::to_string(result)?;
        let window = web_sys::window().ok_or_else(|| ReportError::Network("no window".into()))?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::Cors);
        opts.set_body(&JsValue::from_str(&body));
        let request =
            Request::new_with_str_and_init(&self.endpoint, &opts).map_err(ReportError::js)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(ReportError::js)?;

        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(ReportError::js)?;
        let response: Response = value.dyn_into().map_err(ReportError::js)?;
        if !response.ok() {
            return Err(ReportError::Status(response.status()));
        }
        Ok(())
    }
}
