use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("browser API unavailable: {0}")]
    Dom(String),

    #[error("invalid config JSON: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("audio error: {0}")]
    Audio(String),

    #[error("timer error: {0}")]
    Timer(String),

    #[error("game is not mounted")]
    NotMounted,
}

impl GameError {
    pub fn audio(value: JsValue) -> Self {
        GameError::Audio(format!("{value:?}"))
    }

    pub fn timer(value: JsValue) -> Self {
        GameError::Timer(format!("{value:?}"))
    }
}

impl From<JsValue> for GameError {
    fn from(value: JsValue) -> Self {
        GameError::Dom(format!("{value:?}"))
    }
}

impl From<GameError> for JsValue {
    fn from(err: GameError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
