//! Gateway error type and failure-body decoding.
//!
//! All variants are `Clone` so a shared in-flight future can fan one failure
//! out to every attached waiter.

use serde::Deserialize;
use thiserror::Error;

/// Errors produced by gateway calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Non-2xx response, already decoded into a human-readable message.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Connection-level failure (DNS, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be deserialized.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Client misconfiguration (bad URL, invalid header value).
    #[error("Config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

/// Backend failure payload. FastAPI-style: `detail` is either a plain message
/// or a list of validation objects carrying `msg`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: DetailField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetailField {
    Message(String),
    Validation(Vec<ValidationItem>),
}

#[derive(Debug, Deserialize)]
struct ValidationItem {
    msg: String,
}

/// Decode a failure body into a message, falling back to
/// `"<status> <canonical reason>"` when the body carries no usable detail.
pub fn decode_error_message(status: u16, reason: Option<&str>, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => match parsed.detail {
            DetailField::Message(message) => message,
            DetailField::Validation(items) => items
                .into_iter()
                .map(|i| i.msg)
                .collect::<Vec<_>>()
                .join("; "),
        },
        Err(_) => format!("{} {}", status, reason.unwrap_or("Unknown")),
    }
}
