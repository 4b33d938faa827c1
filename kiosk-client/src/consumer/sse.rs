//! Incremental server-sent event frame parser
//!
//! Bytes arrive in arbitrary chunks; frames end at a blank line. Only the
//! `data` field matters here: comment lines and other fields are skipped, and
//! multi-line data is joined with `\n`.

use thiserror::Error;

use crate::error::ClientError;

/// Upper bound on an unfinished frame: the partial line plus data lines held so far
pub const MAX_PENDING_BYTES: usize = 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("event stream frame exceeds {limit} bytes without ending")]
pub struct FrameTooLarge {
    pub limit: usize,
}

impl From<FrameTooLarge> for ClientError {
    fn from(err: FrameTooLarge) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Accumulates stream bytes and yields complete frame payloads
#[derive(Debug)]
pub struct SseParser {
    buffer: Vec<u8>,
    data: Vec<String>,
    data_bytes: usize,
    limit: usize,
}

impl Default for SseParser {
    fn default() -> Self {
        Self::with_limit(MAX_PENDING_BYTES)
    }
}

impl SseParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            data: Vec::new(),
            data_bytes: 0,
            limit,
        }
    }

    /// Feed a chunk and return the data payloads of every frame it completed
    ///
    /// Fails once the unfinished frame outgrows the limit; the stream is then
    /// unusable and the parser must be [`reset`](Self::reset).
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, FrameTooLarge> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            if pos > self.limit {
                return Err(FrameTooLarge { limit: self.limit });
            }
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
            if self.data_bytes > self.limit {
                return Err(FrameTooLarge { limit: self.limit });
            }
        }

        if self.buffer.len() + self.data_bytes > self.limit {
            return Err(FrameTooLarge { limit: self.limit });
        }
        Ok(frames)
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let frame = self.data.join("\n");
            self.data.clear();
            self.data_bytes = 0;
            return Some(frame);
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        if field == "data" {
            let value = value.strip_prefix(' ').unwrap_or(value);
            self.data_bytes += value.len();
            self.data.push(value.to_string());
        }
        None
    }

    /// Drop any half-received frame, e.g. after a reconnect
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.data.clear();
        self.data_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"data: {\"type\":\"config_updated\"}\n\n").unwrap();
        assert_eq!(frames, vec![r#"{"type":"config_updated"}"#.to_string()]);
    }

    #[test]
    fn test_comments_and_other_fields_ignored() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b": ping\n\nevent: change\nid: 4\ndata: x\n\n").unwrap();
        assert_eq!(frames, vec!["x".to_string()]);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"da").unwrap().is_empty());
        assert!(parser.feed(b"ta: {\"type\":").unwrap().is_empty());
        assert!(parser.feed(b"\"menu_updated\"}\r\n").unwrap().is_empty());
        let frames = parser.feed(b"\r\n").unwrap();
        assert_eq!(frames, vec![r#"{"type":"menu_updated"}"#.to_string()]);
    }

    #[test]
    fn test_multi_line_data_and_multiple_frames() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"data: a\ndata:b\n\ndata: c\n\n").unwrap();
        assert_eq!(frames, vec!["a\nb".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: half").unwrap().is_empty());
        parser.reset();
        assert!(parser.feed(b"\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_unterminated_line_over_limit() {
        let mut parser = SseParser::with_limit(16);
        assert!(parser.feed(b"data: 0123456789").unwrap().is_empty());
        assert_eq!(parser.feed(b"abc"), Err(FrameTooLarge { limit: 16 }));

        parser.reset();
        assert_eq!(parser.feed(b"data: ok\n\n").unwrap(), ["ok"]);
    }

    #[test]
    fn test_data_lines_without_blank_line_over_limit() {
        let mut parser = SseParser::with_limit(16);
        assert!(parser.feed(b"data: 01234567\n").unwrap().is_empty());
        assert!(parser.feed(b"data: 89abcdef\n").unwrap().is_empty());
        assert!(parser.feed(b"data: x\n").is_err());
    }

    #[test]
    fn test_long_line_fails_even_when_complete() {
        let mut parser = SseParser::with_limit(16);
        assert!(parser.feed(b"data: 0123456789abcdef\n\ndata: x\n\n").is_err());
    }

    #[test]
    fn test_completed_frames_free_their_bytes() {
        let mut parser = SseParser::with_limit(16);
        for _ in 0..10 {
            assert_eq!(parser.feed(b"data: 0123456789\n\n").unwrap().len(), 1);
        }
    }
}
