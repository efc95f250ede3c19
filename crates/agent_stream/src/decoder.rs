use crate::error::DecodeError;

/// Prefix of a framing-only line that carries no payload.
pub const CONTROL_MARKER: &str = "event:";
/// Prefix of a payload line.
pub const DATA_MARKER: &str = "data:";
/// Normalized payload that ends the stream.
pub const SENTINEL: &str = "done";

/// Classification of one complete line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Control,
    Data(&'a str),
    Bare(&'a str),
}

impl<'a> LineKind<'a> {
    pub fn payload(self) -> Option<&'a str> {
        match self {
            Self::Data(payload) | Self::Bare(payload) => Some(payload),
            Self::Blank | Self::Control => None,
        }
    }
}

/// Classify a complete line, first match wins:
///
/// 1. all-whitespace lines are blank
/// 2. `event:` lines are control lines
/// 3. `data:` lines carry the rest of the line, leading whitespace removed
/// 4. anything else is bare payload; a `data:` marker inside it starts the payload
pub fn classify_line(line: &str) -> LineKind<'_> {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if line.trim_start().starts_with(CONTROL_MARKER) {
        return LineKind::Control;
    }
    if let Some(payload) = line.strip_prefix(DATA_MARKER) {
        return LineKind::Data(payload.trim_start());
    }

    let content = line.trim();
    match content.find(DATA_MARKER) {
        Some(index) => LineKind::Bare(content[index + DATA_MARKER.len()..].trim_start()),
        None => LineKind::Bare(content),
    }
}

/// Returns true when `payload` is the end-of-stream sentinel (`done`, `[DONE]`, ...).
pub fn is_sentinel(payload: &str) -> bool {
    let normalized: String = payload
        .to_lowercase()
        .chars()
        .filter(|ch| !matches!(ch, '[' | ']'))
        .collect();
    normalized.trim() == SENTINEL
}

/// Output of one decoder step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStep {
    /// Payload fragments in arrival order, each terminated by `\n`.
    pub fragments: Vec<String>,
    /// Set once the sentinel has been seen. Nothing is produced afterwards.
    pub finished: bool,
    /// Malformed bytes found after `fragments`. The decoder is failed from here on.
    pub error: Option<DecodeError>,
}

impl DecodeStep {
    fn new(finished: bool) -> Self {
        Self {
            fragments: Vec::new(),
            finished,
            error: None,
        }
    }
}

/// Incremental decoder turning arbitrarily split bytes into payload fragments.
#[derive(Debug, Default)]
pub struct LineDecoder {
    carry: Vec<u8>,
    pending: String,
    consumed: usize,
    finished: bool,
    drained: bool,
    failed: Option<DecodeError>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and drain every line it completes.
    ///
    /// Complete lines ahead of a malformed byte are still emitted; the error is
    /// reported in [`DecodeStep::error`] and every later call fails with it.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<DecodeStep, DecodeError> {
        if let Some(error) = &self.failed {
            return Err(error.clone());
        }
        let mut step = DecodeStep::new(self.finished);
        if self.finished || self.drained {
            return Ok(step);
        }

        let (text, error) = self.decode_utf8(bytes);
        let mut buffer = std::mem::take(&mut self.pending);
        buffer.push_str(&text);

        let mut start = 0;
        for (index, _) in buffer.match_indices('\n') {
            let line = &buffer[start..index];
            start = index + 1;
            if self.process_line(line, &mut step) {
                return Ok(step);
            }
        }

        if let Some(error) = error {
            self.failed = Some(error.clone());
            step.error = Some(error);
            return Ok(step);
        }

        buffer.drain(..start);
        self.pending = buffer;
        Ok(step)
    }

    /// Process the unterminated remainder once the transport is exhausted.
    pub fn finish(&mut self) -> Result<DecodeStep, DecodeError> {
        if let Some(error) = &self.failed {
            return Err(error.clone());
        }
        let mut step = DecodeStep::new(self.finished);
        if self.finished || self.drained {
            return Ok(step);
        }
        self.drained = true;

        if !self.carry.is_empty() {
            return Err(DecodeError::TruncatedUtf8 {
                pending: self.carry.len(),
            });
        }

        let line = std::mem::take(&mut self.pending);
        self.process_line(&line, &mut step);
        Ok(step)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns true when no partial line or partial character is buffered.
    pub fn is_empty_buffer(&self) -> bool {
        self.pending.is_empty() && self.carry.is_empty()
    }

    fn process_line(&mut self, line: &str, step: &mut DecodeStep) -> bool {
        let Some(payload) = classify_line(line).payload() else {
            return false;
        };

        if is_sentinel(payload) {
            self.finished = true;
            step.finished = true;
            return true;
        }

        let mut fragment = String::with_capacity(payload.len() + 1);
        fragment.push_str(payload);
        fragment.push('\n');
        step.fragments.push(fragment);
        false
    }

    /// Decode carry-over plus `bytes`, returning the valid text and, for a
    /// malformed sequence, the error that follows it.
    fn decode_utf8(&mut self, bytes: &[u8]) -> (String, Option<DecodeError>) {
        let mut buffered = std::mem::take(&mut self.carry);
        buffered.extend_from_slice(bytes);
        let base_offset = self.consumed;

        let error = match String::from_utf8(buffered) {
            Ok(text) => {
                self.consumed += text.len();
                return (text, None);
            }
            Err(error) => error,
        };

        let valid = error.utf8_error().valid_up_to();
        let malformed = error.utf8_error().error_len().is_some();
        let mut bytes = error.into_bytes();
        let tail = bytes.split_off(valid);
        self.consumed += valid;
        // `bytes` is the valid prefix, so nothing is replaced here.
        let text = String::from_utf8_lossy(&bytes).into_owned();

        if malformed {
            return (
                text,
                Some(DecodeError::InvalidUtf8 {
                    offset: base_offset + valid,
                }),
            );
        }

        // Incomplete trailing sequence: hold it for the next chunk.
        self.carry = tail;
        (text, None)
    }
}

/// Decode a complete payload in one shot, stopping at the sentinel.
pub fn decode_all(input: &[u8]) -> Result<Vec<String>, DecodeError> {
    let mut decoder = LineDecoder::new();
    let mut step = decoder.feed(input)?;
    if let Some(error) = step.error {
        return Err(error);
    }
    step.fragments.extend(decoder.finish()?.fragments);
    Ok(step.fragments)
}
