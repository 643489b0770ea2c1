//! Incremental decoder for `text/event-stream` bodies.
//!
//! Only `data:` lines matter to the monitor; `event:`, `id:` and `retry:`
//! fields and `:` comments are skipped. Multi-line data is joined with `\n`
//! and an event is dispatched on the blank line that ends it.

use tracing::warn;

/// Longest line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 1 << 20;
/// Largest event payload assembled from `data:` lines.
pub const MAX_EVENT_BYTES: usize = 4 << 20;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// Bytes of `buf` already known to hold no newline.
    scanned: usize,
    /// The rest of an over-long line is dropped up to its newline.
    skipping_line: bool,
    data: Vec<String>,
    data_len: usize,
    /// An oversized event is dropped up to the blank line that ends it.
    skipping_event: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk; returns the payloads of every event completed by it.
    /// Chunks may split lines and UTF-8 sequences anywhere.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        loop {
            let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') else {
                self.scanned = self.buf.len();
                if self.buf.len() > MAX_LINE_BYTES {
                    warn!(bytes = self.buf.len(), "event-stream line too long, dropping it");
                    self.buf.clear();
                    self.scanned = 0;
                    self.skipping_line = true;
                }
                break;
            };
            let pos = self.scanned + offset;
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            self.scanned = 0;
            if std::mem::take(&mut self.skipping_line) {
                continue;
            }
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if std::mem::take(&mut self.skipping_event) || self.data.is_empty() {
                return None;
            }
            let payload = self.data.join("\n");
            self.data.clear();
            self.data_len = 0;
            return Some(payload);
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field != "data" || self.skipping_event {
            return None;
        }
        if self.data_len + value.len() > MAX_EVENT_BYTES {
            warn!(bytes = self.data_len + value.len(), "event-stream event too large, dropping it");
            self.data.clear();
            self.data_len = 0;
            self.skipping_event = true;
            return None;
        }
        self.data_len += value.len();
        self.data.push(value.to_string());
        None
    }
}
