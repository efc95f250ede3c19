use std::collections::VecDeque;
use std::future::Future;

use reqwest::{Response, StatusCode};

use crate::error::{StreamError, TransportError};

/// Outcome of the one-time availability check performed before reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportStatus {
    pub code: u16,
    pub has_body: bool,
}

impl TransportStatus {
    pub fn ok() -> Self {
        Self {
            code: 200,
            has_body: true,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Map a failed check to the matching transport error.
    pub fn check(&self) -> Result<(), TransportError> {
        if !self.is_success() {
            let message = StatusCode::from_u16(self.code)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("request failed")
                .to_owned();
            return Err(TransportError::Status {
                status: self.code,
                message,
            });
        }
        if !self.has_body {
            return Err(TransportError::NoBody { status: self.code });
        }
        Ok(())
    }
}

/// Source of an asynchronous byte-chunk stream with a completion signal.
pub trait Transport {
    fn status(&self) -> TransportStatus;

    /// Next chunk of bytes, or `None` once the source is exhausted.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, StreamError>>;
}

/// Streaming HTTP response body.
#[derive(Debug)]
pub struct HttpTransport {
    response: Response,
}

impl HttpTransport {
    pub fn new(response: Response) -> Self {
        Self { response }
    }

    pub fn response(&self) -> &Response {
        &self.response
    }
}

impl Transport for HttpTransport {
    fn status(&self) -> TransportStatus {
        let status = self.response.status();
        TransportStatus {
            code: status.as_u16(),
            has_body: !matches!(
                status,
                StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
            ),
        }
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        let chunk = self
            .response
            .chunk()
            .await
            .map_err(|error| TransportError::Read(error.to_string()))?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

/// In-memory transport replaying a fixed list of chunks.
#[derive(Debug, Clone)]
pub struct ChunkTransport {
    status: TransportStatus,
    chunks: VecDeque<Vec<u8>>,
    fail_after: Option<(usize, String)>,
    reads: usize,
}

impl ChunkTransport {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            status: TransportStatus::ok(),
            chunks: chunks.into_iter().map(Into::into).collect(),
            fail_after: None,
            reads: 0,
        }
    }

    /// A transport whose availability check fails with `code`.
    pub fn with_status(code: u16) -> Self {
        Self::new(Vec::<Vec<u8>>::new()).status_code(code)
    }

    pub fn status_code(mut self, code: u16) -> Self {
        self.status.code = code;
        self
    }

    pub fn without_body(mut self) -> Self {
        self.status.has_body = false;
        self
    }

    /// Fail the read that follows `reads` successful reads.
    pub fn fail_after(mut self, reads: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((reads, message.into()));
        self
    }

    /// Number of read operations performed so far.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Transport for ChunkTransport {
    fn status(&self) -> TransportStatus {
        self.status
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        if let Some((limit, message)) = &self.fail_after {
            if self.reads >= *limit {
                return Err(TransportError::Read(message.clone()).into());
            }
        }
        self.reads += 1;
        Ok(self.chunks.pop_front())
    }
}

impl<T: Transport> Transport for &mut T {
    fn status(&self) -> TransportStatus {
        (**self).status()
    }

    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, StreamError>> {
        (**self).next_chunk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_check_maps_failures() {
        assert!(TransportStatus::ok().check().is_ok());

        let error = ChunkTransport::with_status(503).status().check().unwrap_err();
        assert!(matches!(
            error,
            TransportError::Status { status: 503, ref message } if message == "Service Unavailable"
        ));

        let error = ChunkTransport::new(["x"]).without_body().status().check().unwrap_err();
        assert!(matches!(error, TransportError::NoBody { status: 200 }));
    }
}
