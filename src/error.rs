use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors surfaced by the browser client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no window")]
    NoWindow,
    #[error("no document")]
    NoDocument,
    #[error("missing element #{0}")]
    MissingElement(String),
    #[error("js error: {0}")]
    Js(String),
    #[error("request to {url} failed with status {status}")]
    Http { status: u16, url: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// A `dyn_into` that did not produce the expected DOM type.
    pub fn cast(what: &str) -> Self {
        ClientError::Js(format!("{what} has an unexpected type"))
    }
}

impl From<JsValue> for ClientError {
    fn from(value: JsValue) -> Self {
        let msg = value
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(&value, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{value:?}"));
        ClientError::Js(msg)
    }
}

impl From<ClientError> for JsValue {
    fn from(err: ClientError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
