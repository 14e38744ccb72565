//! Server-sent event framing for streaming chat responses
//!
//! Both supported providers stream `data: <json>` lines. The decoder buffers
//! raw bytes until a full line is available, so lines and multi-byte UTF-8
//! sequences split across network chunks decode correctly.

/// End-of-stream sentinel sent by OpenAI-style endpoints
pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded SSE line of interest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Payload of a `data:` line
    Data(String),
    /// The `data: [DONE]` sentinel
    Done,
}

/// Incremental line decoder for an SSE byte stream
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Creates an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of bytes and returns the frames completed by it
    ///
    /// # Arguments
    ///
    /// * `chunk` - Raw bytes as received from the transport
    ///
    /// # Returns
    ///
    /// Frames for every complete `data:` line in arrival order. Comments,
    /// blank lines and other SSE fields are dropped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = decode_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flushes a final line that was not newline terminated
    pub fn finish(&mut self) -> Option<SseFrame> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        decode_line(&line)
    }
}

fn decode_line(line: &[u8]) -> Option<SseFrame> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\n', '\r']);

    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == DONE_SENTINEL {
        return Some(SseFrame::Done);
    }
    Some(SseFrame::Data(payload.to_string()))
}
