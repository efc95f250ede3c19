//! Turn runner: records a turn in the transcript and streams the reply into it.

use std::future::Future;

use agent_stream::{
    decode, CancellationSignal, ChatStreamClient, HttpTransport, StreamError, Transport,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::transcript::{Transcript, TurnHandle};

/// Opens the byte stream carrying the reply to one turn.
pub trait StreamOpener {
    type Transport: Transport;

    fn open_stream(
        &self,
        user_text: &str,
        session_id: &str,
        auth_token: Option<&str>,
        cancellation: Option<&CancellationSignal>,
    ) -> impl Future<Output = Result<Self::Transport, StreamError>>;
}

impl StreamOpener for ChatStreamClient {
    type Transport = HttpTransport;

    async fn open_stream(
        &self,
        user_text: &str,
        session_id: &str,
        auth_token: Option<&str>,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<HttpTransport, StreamError> {
        ChatStreamClient::open_stream(self, user_text, session_id, auth_token, cancellation).await
    }
}

/// Notified after every transcript mutation made while a turn runs.
pub trait TranscriptObserver {
    fn on_fragment(&mut self, _transcript: &Transcript, _handle: &TurnHandle, _fragment: &str) {}

    fn on_failure(&mut self, _transcript: &Transcript, _error: &StreamError) {}
}

impl TranscriptObserver for () {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing was recorded or sent.
    Ignored,
    Completed(TurnHandle),
}

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug)]
pub struct ChatSession<O> {
    opener: O,
    transcript: Transcript,
    session_id: String,
    auth_token: Option<String>,
}

impl<O: StreamOpener> ChatSession<O> {
    /// Start a session, generating an id when none is supplied.
    pub fn new(opener: O, session_id: Option<String>) -> Self {
        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(new_session_id);
        Self {
            opener,
            transcript: Transcript::new(),
            session_id,
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, auth_token: Option<String>) -> Self {
        self.auth_token = auth_token;
        self
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Switch to a fresh session id and drop the transcript.
    pub fn reset_session(&mut self) -> &str {
        self.session_id = new_session_id();
        self.transcript.clear();
        debug!(session_id = %self.session_id, "session reset");
        &self.session_id
    }

    /// Record `user_text`, stream the reply into its assistant message and
    /// notify `observer` after each mutation.
    ///
    /// Transport and decode failures append the diagnostic message before the
    /// error is returned. A cancelled turn keeps whatever arrived and gets no
    /// diagnostic.
    pub async fn send_turn<B>(
        &mut self,
        user_text: &str,
        cancellation: Option<&CancellationSignal>,
        observer: &mut B,
    ) -> Result<TurnOutcome, StreamError>
    where
        B: TranscriptObserver + ?Sized,
    {
        if user_text.trim().is_empty() {
            return Ok(TurnOutcome::Ignored);
        }

        let handle = self.transcript.begin_turn(user_text);
        debug!(turn_id = handle.turn_id(), session_id = %self.session_id, "turn started");

        match self.stream_reply(&handle, user_text, cancellation, observer).await {
            Ok(()) => Ok(TurnOutcome::Completed(handle)),
            Err(error) if error.is_cancelled() => {
                debug!(turn_id = handle.turn_id(), "turn cancelled");
                Err(error)
            }
            Err(error) => {
                warn!(turn_id = handle.turn_id(), %error, "turn failed");
                self.transcript.fail_turn(&error.to_string());
                observer.on_failure(&self.transcript, &error);
                Err(error)
            }
        }
    }

    async fn stream_reply<B>(
        &mut self,
        handle: &TurnHandle,
        user_text: &str,
        cancellation: Option<&CancellationSignal>,
        observer: &mut B,
    ) -> Result<(), StreamError>
    where
        B: TranscriptObserver + ?Sized,
    {
        let transport = self
            .opener
            .open_stream(
                user_text,
                &self.session_id,
                self.auth_token.as_deref(),
                cancellation,
            )
            .await?;

        let transcript = &mut self.transcript;
        decode(transport, cancellation, |fragment| {
            transcript.append_fragment(handle, fragment);
            observer.on_fragment(transcript, handle, fragment);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_stream::ChunkTransport;

    struct Fixed(Vec<&'static str>);

    impl StreamOpener for Fixed {
        type Transport = ChunkTransport;

        async fn open_stream(
            &self,
            _user_text: &str,
            _session_id: &str,
            _auth_token: Option<&str>,
            _cancellation: Option<&CancellationSignal>,
        ) -> Result<ChunkTransport, StreamError> {
            Ok(ChunkTransport::new(self.0.clone()))
        }
    }

    #[test]
    fn blank_configured_session_id_is_replaced() {
        let session = ChatSession::new(Fixed(Vec::new()), Some("  ".to_string()));
        assert!(Uuid::parse_str(session.session_id()).is_ok());

        let session = ChatSession::new(Fixed(Vec::new()), Some("abc".to_string()));
        assert_eq!(session.session_id(), "abc");
    }

    #[test]
    fn reset_session_changes_id_and_clears() {
        let mut session = ChatSession::new(Fixed(Vec::new()), Some("abc".to_string()));
        session.transcript.begin_turn("hi");

        let next = session.reset_session().to_string();
        assert_ne!(next, "abc");
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let mut session = ChatSession::new(Fixed(vec!["data: x\n"]), None);
        let outcome = session.send_turn("  \n", None, &mut ()).await.unwrap();

        assert_eq!(outcome, TurnOutcome::Ignored);
        assert!(session.transcript().is_empty());
    }
}
