//! Incremental SSE framing.
//!
//! The wire format is a sequence of UTF-8 text blocks separated by a blank
//! line (`\n\n`). Network reads may split a block anywhere, including inside
//! the delimiter itself, so [`SseFrameBuffer`] keeps a single running buffer
//! and only releases blocks once their trailing delimiter has arrived.

/// One parsed unit from the SSE stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Optional event name (e.g. `content`, `complete`, `done`). Absence
    /// implies a default content event.
    pub name: Option<String>,
    /// The raw data payload, which may itself be JSON-encoded.
    pub data: String,
}

impl SseEvent {
    /// Whether this event carries incremental message content.
    pub fn is_content(&self) -> bool {
        match self.name.as_deref() {
            None | Some("content") => true,
            Some(_) => false,
        }
    }

    /// Whether this event carries the terminal structured result.
    pub fn is_terminal(&self) -> bool {
        matches!(self.name.as_deref(), Some("complete") | Some("done"))
    }
}

/// Reassembles SSE event blocks from arbitrarily-chunked byte reads.
///
/// Bytes are buffered undecoded and only turned into text once a complete
/// block is available, so a chunk boundary may fall anywhere — including
/// inside a multi-byte UTF-8 character — without corrupting the payload.
#[derive(Debug, Default)]
pub struct SseFrameBuffer {
    buffer: Vec<u8>,
}

impl SseFrameBuffer {
    /// Creates an empty frame buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw byte chunk to the running buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Removes and parses every complete event block currently buffered.
    ///
    /// Everything before the last `\n\n` delimiter leaves the buffer; the
    /// remainder (possibly a partial block) is retained for the next read.
    /// Blocks with no `data:` line are dropped and never surface as events.
    pub fn drain(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        while let Some(pos) = find_delimiter(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..pos + 2).take(pos).collect();
            if let Some(event) = parse_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }
        events
    }

    /// The currently-buffered partial bytes (for diagnostics).
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\n\n")
}

/// Parses one complete event block.
///
/// `event:` sets the name and `data:` sets the payload, each trimmed of
/// leading whitespace after the colon; any other line is ignored. When a
/// block carries several `data:` lines the last one wins — the upstream
/// producer emits at most one per block, and this matches its framing rather
/// than the multi-line concatenation some SSE implementations do.
fn parse_block(block: &str) -> Option<SseEvent> {
    let mut name = None;
    let mut data = None;

    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            name = Some(rest.trim_start().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data = Some(rest.trim_start().to_string());
        }
    }

    data.map(|data| SseEvent { name, data })
}
