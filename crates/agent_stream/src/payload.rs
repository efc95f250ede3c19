use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// Body of one chat turn request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub input: String,
    pub session_id: String,
}

impl ChatRequest {
    pub fn new(input: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            session_id: session_id.into(),
        }
    }

    /// Reject requests the backend cannot route to a session.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.session_id.trim().is_empty() {
            return Err(StreamError::Config("session_id must not be blank".to_owned()));
        }
        if self.input.trim().is_empty() {
            return Err(StreamError::Config("input must not be blank".to_owned()));
        }
        Ok(())
    }
}

/// Response of the session bootstrap endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSessionResponse {
    pub session_id: String,
}
