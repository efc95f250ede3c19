use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use crate::config::ChatApiConfig;
use crate::error::{parse_error_message, StreamError, TransportError};
use crate::headers::{build_headers, HEADER_ACCEPT, HEADER_CONTENT_TYPE};
use crate::payload::{ChatRequest, NewSessionResponse};
use crate::retry::{is_retryable_error_text, is_retryable_status, retry_delay};
use crate::stream::{await_or_cancel, decode, is_cancelled, CancellationSignal};
use crate::transport::HttpTransport;
use crate::url::{new_session_url, normalize_chat_url};

#[derive(Debug, Clone)]
pub struct ChatStreamClient {
    http: Client,
    config: ChatApiConfig,
}

impl ChatStreamClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, StreamError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_url(&self.config.base_url)
    }

    pub fn build_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, StreamError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config, auth_token) {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| StreamError::Config(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| StreamError::Config(format!("invalid header value for {key}")))?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &ChatRequest,
        auth_token: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, StreamError> {
        request.validate()?;

        let headers = self.build_headers(auth_token)?;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(request))
    }

    /// Send one turn and hand back the unread response as a transport.
    ///
    /// The status is not checked here; the decoder does that before reading.
    /// With `max_retries > 0`, connection failures and retryable statuses are
    /// retried with exponential backoff before any body byte is consumed.
    pub async fn open_stream(
        &self,
        user_text: &str,
        session_id: &str,
        auth_token: Option<&str>,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<HttpTransport, StreamError> {
        let request = ChatRequest::new(user_text, session_id);
        let max_retries = self.config.max_retries;
        let mut last_status: Option<u16> = None;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            if is_cancelled(cancellation) {
                return Err(StreamError::Cancelled);
            }

            debug!(attempt, session_id, "opening chat stream");
            let response = self.build_request(&request, auth_token)?.send();
            let response = await_or_cancel(response, cancellation).await?;

            match response {
                Ok(response) => {
                    let status = response.status();
                    let retry = attempt < max_retries && is_retryable_status(status.as_u16());
                    if !retry {
                        return Ok(HttpTransport::new(response));
                    }

                    last_status = Some(status.as_u16());
                    let message = read_error_message(response, cancellation).await?;
                    warn!(status = status.as_u16(), %message, attempt, "retrying chat stream");
                    last_error = Some(message);
                }
                Err(error) => {
                    let message = error_chain_text(&error);
                    let retryable = error.is_connect()
                        || error.is_timeout()
                        || error.is_request()
                        || is_retryable_error_text(&message);
                    if !retryable || max_retries == 0 {
                        return Err(TransportError::Request(error).into());
                    }
                    if attempt == max_retries {
                        return Err(TransportError::RetryExhausted {
                            status: last_status,
                            last_error: Some(message),
                        }
                        .into());
                    }
                    warn!(%message, attempt, "retrying chat stream");
                    last_error = Some(message);
                }
            }

            await_or_cancel(tokio::time::sleep(retry_delay(attempt)), cancellation).await?;
        }

        Err(TransportError::RetryExhausted {
            status: last_status,
            last_error,
        }
        .into())
    }

    /// Open a stream and decode it, forwarding each fragment to `on_fragment`.
    pub async fn stream_turn<F>(
        &self,
        user_text: &str,
        session_id: &str,
        auth_token: Option<&str>,
        cancellation: Option<&CancellationSignal>,
        on_fragment: F,
    ) -> Result<(), StreamError>
    where
        F: FnMut(&str),
    {
        let transport = self
            .open_stream(user_text, session_id, auth_token, cancellation)
            .await?;
        decode(transport, cancellation, on_fragment).await
    }

    /// `GET {base}/new-session` with the same headers as a chat request,
    /// except that it asks for JSON and carries no body.
    pub fn build_new_session_request(
        &self,
        auth_token: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, StreamError> {
        let mut headers = self.build_headers(auth_token)?;
        headers.remove(HEADER_CONTENT_TYPE);
        headers.insert(HEADER_ACCEPT, HeaderValue::from_static("application/json"));
        Ok(self
            .http
            .get(new_session_url(&self.config.base_url))
            .headers(headers))
    }

    /// Ask the backend for a fresh session id.
    pub async fn new_session(
        &self,
        auth_token: Option<&str>,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<String, StreamError> {
        let request = self.build_new_session_request(auth_token)?.send();
        let response = await_or_cancel(request, cancellation).await??;
        let status = response.status();
        if !status.is_success() {
            let message = read_error_message(response, cancellation).await?;
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body = await_or_cancel(response.text(), cancellation).await??;
        let parsed: NewSessionResponse = serde_json::from_str(&body)?;
        debug!(session_id = %parsed.session_id, "backend issued session");
        Ok(parsed.session_id)
    }
}

async fn read_error_message(
    response: Response,
    cancellation: Option<&CancellationSignal>,
) -> Result<String, StreamError> {
    let status = response.status();
    let body = await_or_cancel(response.text(), cancellation)
        .await?
        .unwrap_or_else(|_| fallback_reason(status));
    Ok(parse_error_message(status, &body))
}

fn error_chain_text(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn fallback_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}
