use std::collections::VecDeque;
use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::{pin_mut, Stream, StreamExt};
use tracing::{debug, trace};

use crate::decoder::LineDecoder;
use crate::error::{DecodeError, StreamError};
use crate::transport::Transport;

/// Optional cancellation signal shared between a turn and its consumer.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Create a fresh, unset cancellation signal.
pub fn cancellation_signal() -> CancellationSignal {
    Arc::new(AtomicBool::new(false))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unchecked,
    Reading,
    Done,
}

struct FragmentState<T> {
    transport: T,
    decoder: LineDecoder,
    queued: VecDeque<String>,
    cancellation: Option<CancellationSignal>,
    phase: Phase,
    failure: Option<DecodeError>,
}

/// Lazily decode `transport` into a finite, non-restartable fragment sequence.
///
/// The availability check runs on first poll, before any read. The sequence
/// ends after the sentinel or when the transport is exhausted, and yields at
/// most one error, after which it ends. Dropping the stream stops reading.
pub fn fragments<T>(
    transport: T,
    cancellation: Option<CancellationSignal>,
) -> impl Stream<Item = Result<String, StreamError>>
where
    T: Transport,
{
    let state = FragmentState {
        transport,
        decoder: LineDecoder::new(),
        queued: VecDeque::new(),
        cancellation,
        phase: Phase::Unchecked,
        failure: None,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        match next_fragment(&mut state).await {
            Ok(Some(fragment)) => Some((Ok(fragment), state)),
            Ok(None) => None,
            Err(error) => {
                state.phase = Phase::Done;
                state.queued.clear();
                debug!(%error, "stream decode failed");
                Some((Err(error), state))
            }
        }
    })
}

async fn next_fragment<T: Transport>(
    state: &mut FragmentState<T>,
) -> Result<Option<String>, StreamError> {
    loop {
        if let Some(fragment) = state.queued.pop_front() {
            if is_cancelled(state.cancellation.as_ref()) {
                return Err(StreamError::Cancelled);
            }
            return Ok(Some(fragment));
        }
        if let Some(error) = state.failure.take() {
            return Err(error.into());
        }

        match state.phase {
            Phase::Done => return Ok(None),
            Phase::Unchecked => {
                let status = state.transport.status();
                status.check()?;
                debug!(status = status.code, "stream opened");
                state.phase = Phase::Reading;
            }
            Phase::Reading => {
                if is_cancelled(state.cancellation.as_ref()) {
                    return Err(StreamError::Cancelled);
                }

                let read = state.transport.next_chunk();
                let chunk = await_or_cancel(read, state.cancellation.as_ref()).await??;
                let step = match chunk {
                    Some(bytes) => {
                        trace!(len = bytes.len(), "stream chunk");
                        state.decoder.feed(&bytes)?
                    }
                    None => {
                        state.phase = Phase::Done;
                        debug!("stream ended without sentinel");
                        state.decoder.finish()?
                    }
                };

                if step.finished {
                    debug!("stream sentinel received");
                    state.phase = Phase::Done;
                }
                if let Some(error) = step.error {
                    state.phase = Phase::Done;
                    state.failure = Some(error);
                }
                state.queued.extend(step.fragments);
            }
        }
    }
}

/// Drive `transport` to completion, calling `on_fragment` once per payload line.
///
/// Resolves when the sentinel is seen or the transport signals completion.
/// The sentinel itself is never passed to `on_fragment`.
pub async fn decode<T, F>(
    transport: T,
    cancellation: Option<&CancellationSignal>,
    mut on_fragment: F,
) -> Result<(), StreamError>
where
    T: Transport,
    F: FnMut(&str),
{
    let stream = fragments(transport, cancellation.cloned());
    pin_mut!(stream);

    while let Some(fragment) = stream.next().await {
        on_fragment(&fragment?);
    }

    Ok(())
}

/// Collect every fragment of `transport` into a vector.
pub async fn collect_fragments<T: Transport>(
    transport: T,
    cancellation: Option<&CancellationSignal>,
) -> Result<Vec<String>, StreamError> {
    let mut collected = Vec::new();
    decode(transport, cancellation, |fragment| {
        collected.push(fragment.to_owned());
    })
    .await?;
    Ok(collected)
}

pub(crate) fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

pub(crate) async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, StreamError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(StreamError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(StreamError::Cancelled);
            }
            return Ok(output);
        }
    }
}
