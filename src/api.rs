//! backend contract: the transport seam plus the json bodies exchanged with
//! `/login`, `/chat` and `/metrics`.
//!
//! - bodies keep the backend's field names (`nombre`, `cedula`, ...).
//! - a response is a status plus a parsed json body; a body that is not json
//!   becomes `Value::Null`, so error extraction and decoding stay total.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// one completed http exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn from_text(status: u16, text: &str) -> Self {
        let body = serde_json::from_str(text).unwrap_or(Value::Null);
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// the `{error: "..."}` text of a failure body, if any.
    pub fn error_message(&self) -> Option<String> {
        self.body
            .get("error")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

/// how the controllers reach the backend. async so the browser can yield to
/// its event loop; implementations never retry.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait Transport {
    async fn get(&self, url: &str) -> Result<ApiResponse, TransportError>;
    async fn post_json(&self, url: &str, body: &Value) -> Result<ApiResponse, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginRequest {
    pub nombre: String,
    pub cedula: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginReply {
    pub user: WireUser,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireUser {
    pub nombre: String,
    #[serde(deserialize_with = "string_or_number")]
    pub cedula: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub cedula: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// id numbers come back as strings or as numbers depending on the column type.
pub(crate) fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(match Raw::deserialize(d)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

pub(crate) fn to_body<T: Serialize>(value: &T) -> Value {
    // plain string structs always serialize
    serde_json::to_value(value).unwrap_or(Value::Null)
}
