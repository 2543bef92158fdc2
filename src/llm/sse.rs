//! Incremental decoder for `text/event-stream` bodies.
//!
//! Network chunks may split a line (or a multi-byte UTF-8 character)
//! anywhere, so lines are assembled from raw bytes and only decoded once
//! complete.

/// Collects `data:` payloads from a server-sent-events byte stream.
///
/// ```rust
/// use ec_voice_bot::llm::SseDecoder;
///
/// let mut dec = SseDecoder::new();
/// assert!(dec.push(b"data: {\"a\"").is_empty());
/// assert_eq!(dec.push(b":1}\n\n"), vec!["{\"a\":1}".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every complete `data:` payload.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(data) = data_payload(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Payload of a final line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buf);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim_end_matches(['\n', '\r']);
    let data = text.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    (!data.is_empty()).then(|| data.to_string())
}
