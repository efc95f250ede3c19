use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single streamed turn.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("stream was cancelled")]
    Cancelled,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The transport could not be opened or read.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("HTTP {status} response has no readable body")]
    NoBody { status: u16 },
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("read error: {0}")]
    Read(String),
    #[error(
        "retry exhausted after max attempts (status: {}, last_error: {last_error:?})",
        status_label(.status)
    )]
    RetryExhausted {
        status: Option<u16>,
        last_error: Option<String>,
    },
}

/// Bytes that cannot be turned into text even after carrying over a chunk boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid UTF-8 sequence at stream offset {offset}")]
    InvalidUtf8 { offset: usize },
    #[error("stream ended inside a multi-byte character ({pending} byte(s) pending)")]
    TruncatedUtf8 { pending: usize },
}

impl StreamError {
    /// Status code carried by a transport failure, when one was observed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(TransportError::Status { status, .. })
            | Self::Transport(TransportError::NoBody { status }) => Some(*status),
            Self::Transport(TransportError::RetryExhausted { status, .. }) => *status,
            Self::Transport(TransportError::Request(error)) => {
                error.status().map(|status| status.as_u16())
            }
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(TransportError::Request(error))
    }
}

fn status_label(status: &Option<u16>) -> String {
    status
        .map(|code| code.to_string())
        .unwrap_or_else(|| "n/a".to_owned())
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
    error: Option<ErrorBodyFields>,
}

#[derive(Debug, Deserialize)]
struct ErrorBodyFields {
    message: Option<String>,
}

/// Extract a human-readable message from an error response body.
///
/// Understands `{"detail": "..."}` (including validation lists of
/// `{"msg": "..."}` objects) and `{"error": {"message": "..."}}`. Anything else
/// falls back to the raw body, or the status reason when the body is empty.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.detail.as_ref().and_then(detail_message) {
            return message;
        }
        if let Some(message) = parsed
            .error
            .and_then(|error| error.message)
            .filter(|message| !message.trim().is_empty())
        {
            return message;
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.trim().to_string()
    }
}

fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(message) if !message.trim().is_empty() => Some(message.trim().to_owned()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}
