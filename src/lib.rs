//! Terminal chat client for a streaming agent backend.
//!
//! A turn records the user's text and an empty assistant message in the
//! [`Transcript`], then streams the backend reply into that message fragment
//! by fragment. Decoding and transport live in [`agent_stream`].
//!
//! ## Configuration
//!
//! See [`config`] for the `TRIP_CHAT_*` environment variables and the
//! optional JSON file.

pub mod commands;
pub mod config;
pub mod logging;
pub mod session;
pub mod transcript;

pub use commands::{parse_slash_command, SlashCommand};
pub use config::{AppConfig, ConfigError};
pub use session::{new_session_id, ChatSession, StreamOpener, TranscriptObserver, TurnOutcome};
pub use transcript::{Message, Role, Transcript, TurnHandle, FAILURE_MESSAGE};
