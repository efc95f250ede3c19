//! Ordered chat transcript with per-turn assistant slots.
//!
//! A turn appends the user message and an empty assistant message together.
//! Fragments for that turn are appended to the assistant message through the
//! [`TurnHandle`] returned at that moment, so later insertions never redirect
//! them to another message.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

/// Content of the message appended when a turn fails.
pub const FAILURE_MESSAGE: &str = "\u{26a0}\u{fe0f} Something went wrong while streaming the response.";

pub type TurnId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Stable reference to the assistant message opened by [`Transcript::begin_turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TurnHandle {
    turn_id: TurnId,
}

impl TurnHandle {
    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    slots: HashMap<TurnId, usize>,
    next_turn_id: TurnId,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the user message and an empty assistant placeholder.
    pub fn begin_turn(&mut self, user_text: impl Into<String>) -> TurnHandle {
        self.next_turn_id += 1;
        let turn_id = self.next_turn_id;

        self.messages.push(Message::user(user_text));
        self.messages.push(Message::assistant(String::new()));
        self.slots.insert(turn_id, self.messages.len() - 1);

        TurnHandle { turn_id }
    }

    /// Append `text` to the turn's assistant message.
    ///
    /// Returns false when the handle no longer resolves, e.g. after [`Transcript::clear`].
    pub fn append_fragment(&mut self, handle: &TurnHandle, text: &str) -> bool {
        let Some(message) = self
            .slots
            .get(&handle.turn_id)
            .and_then(|&slot| self.messages.get_mut(slot))
        else {
            debug!(turn_id = handle.turn_id, "dropping fragment for stale turn");
            return false;
        };

        message.content.push_str(text);
        true
    }

    /// Append the fixed diagnostic message and return its position.
    ///
    /// The turn's placeholder is left as it is, so a failed turn shows both.
    pub fn fail_turn(&mut self, reason: &str) -> usize {
        debug!(%reason, "turn failed");
        self.messages.push(Message::assistant(FAILURE_MESSAGE));
        self.messages.len() - 1
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Position of the turn's assistant message.
    pub fn slot(&self, handle: &TurnHandle) -> Option<usize> {
        self.slots.get(&handle.turn_id).copied()
    }

    pub fn assistant_content(&self, handle: &TurnHandle) -> Option<&str> {
        self.slot(handle)
            .and_then(|slot| self.messages.get(slot))
            .map(|message| message.content.as_str())
    }

    /// Drop every message. Handles issued earlier stop resolving.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_turn_opens_empty_placeholder_after_user_message() {
        let mut transcript = Transcript::new();
        let handle = transcript.begin_turn("hello");

        assert_eq!(
            transcript.messages(),
            &[Message::user("hello"), Message::assistant("")]
        );
        assert_eq!(transcript.slot(&handle), Some(1));
    }

    #[test]
    fn handles_from_before_clear_are_inert() {
        let mut transcript = Transcript::new();
        let stale = transcript.begin_turn("first");
        transcript.clear();
        let fresh = transcript.begin_turn("second");

        assert!(!transcript.append_fragment(&stale, "lost"));
        assert!(transcript.append_fragment(&fresh, "kept"));
        assert_eq!(transcript.assistant_content(&fresh), Some("kept"));
        assert_ne!(stale, fresh);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
