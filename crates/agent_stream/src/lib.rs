//! Streaming transport and incremental decoder for chat agent replies.
//!
//! The backend answers a turn with newline-delimited text: `event:` control
//! lines, `data:` payload lines and bare payload lines. A payload that
//! normalizes to `done` (`DONE`, `[DONE]`, ...) ends the stream. This crate
//! turns that byte stream into ordered text fragments and owns nothing else:
//! no auth, no transcript state, no rendering.
//!
//! Entry points:
//! - [`decode`] drives any [`Transport`] and calls back once per fragment.
//! - [`fragments`] exposes the same sequence as a lazy, cancellable stream.
//! - [`ChatStreamClient::open_stream`] issues the HTTP request for one turn.

pub mod client;
pub mod config;
pub mod decoder;
pub mod error;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod stream;
pub mod transport;
pub mod url;

pub use client::ChatStreamClient;
pub use config::ChatApiConfig;
pub use decoder::{classify_line, is_sentinel, DecodeStep, LineDecoder, LineKind};
pub use error::{DecodeError, StreamError, TransportError};
pub use payload::ChatRequest;
pub use stream::{
    cancellation_signal, collect_fragments, decode, fragments, CancellationSignal,
};
pub use transport::{ChunkTransport, HttpTransport, Transport, TransportStatus};
pub use url::normalize_chat_url;
