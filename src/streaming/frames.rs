//! # Frame Decoder
//!
//! Turns arbitrarily split reads of the backend body into complete
//! `data:` frames. Bytes after the last newline of a read are carried over
//! to the next read, so a frame straddling a transport boundary is decoded
//! exactly as if it had arrived in one piece.

use crate::schemas::BackendEvent;
use bytes::BytesMut;
use tracing::{debug, warn};

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";
const LOG_PREVIEW_CHARS: usize = 120;

/// One decoded line of the backend stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(BackendEvent),
    /// The `data: [DONE]` sentinel.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    /// Accepting bytes; may hold a partial line.
    #[default]
    Buffering,
    /// `[DONE]` seen; all further input is ignored.
    Draining,
}

/// Longest line kept while waiting for its newline.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

#[derive(Debug)]
pub struct FrameDecoder {
    pending: BytesMut,
    /// Prefix of `pending` already known to hold no newline.
    scanned: usize,
    max_frame_bytes: usize,
    /// Inside an oversized line; bytes are dropped up to the next newline.
    discarding: bool,
    state: DecoderState,
    malformed: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_max_frame_bytes(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_frame_bytes(max_frame_bytes: usize) -> Self {
        Self {
            pending: BytesMut::new(),
            scanned: 0,
            max_frame_bytes,
            discarding: false,
            state: DecoderState::Buffering,
            malformed: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Frames dropped because their payload was not a valid event or the
    /// line exceeded the frame size limit.
    pub fn malformed_frames(&self) -> usize {
        self.malformed
    }

    /// Bytes held back waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feed one transport read; returns every frame it completed.
    pub fn push(&mut self, mut bytes: &[u8]) -> Vec<Frame> {
        if self.state == DecoderState::Draining {
            return Vec::new();
        }

        if self.discarding {
            match bytes.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    self.discarding = false;
                    bytes = &bytes[pos + 1..];
                }
                None => return Vec::new(),
            }
        }

        self.pending.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.next_newline() {
            let line = self.pending.split_to(pos + 1);
            self.scanned = 0;

            if pos > self.max_frame_bytes {
                self.reject_oversized(pos);
                continue;
            }

            if let Some(frame) = self.decode_line(&line[..pos]) {
                let done = frame == Frame::Done;
                frames.push(frame);
                if done {
                    self.enter_draining();
                    return frames;
                }
            }
        }

        self.scanned = self.pending.len();
        if self.pending.len() > self.max_frame_bytes {
            self.reject_oversized(self.pending.len());
            self.pending.clear();
            self.scanned = 0;
            self.discarding = true;
        }
        frames
    }

    /// End of data: decode whatever unterminated line is still pending.
    pub fn finish(&mut self) -> Vec<Frame> {
        if self.state == DecoderState::Draining || self.pending.is_empty() {
            return Vec::new();
        }

        let line = self.pending.split();
        self.scanned = 0;
        let frames: Vec<Frame> = self.decode_line(&line).into_iter().collect();
        if frames.contains(&Frame::Done) {
            self.enter_draining();
        }
        frames
    }

    fn next_newline(&self) -> Option<usize> {
        self.pending[self.scanned..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|pos| self.scanned + pos)
    }

    fn reject_oversized(&mut self, len: usize) {
        self.malformed += 1;
        warn!(
            "Dropping backend line of {} bytes (limit {})",
            len, self.max_frame_bytes
        );
    }

    fn enter_draining(&mut self) {
        debug!("Backend sent [DONE], draining");
        self.state = DecoderState::Draining;
        self.pending.clear();
        self.scanned = 0;
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<Frame> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                self.malformed += 1;
                warn!("Skipping non-UTF-8 backend frame: {}", e);
                return None;
            }
        };

        // Blank separators and SSE comments carry nothing.
        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        let payload = match line.strip_prefix(DATA_PREFIX) {
            Some(payload) => payload.trim(),
            None => {
                debug!("Ignoring non-data backend line: {}", preview(line));
                return None;
            }
        };

        if payload == DONE_SENTINEL {
            return Some(Frame::Done);
        }

        match serde_json::from_str::<BackendEvent>(payload) {
            Ok(event) => Some(Frame::Event(event)),
            Err(e) => {
                self.malformed += 1;
                warn!("Skipping malformed backend frame ({}): {}", e, preview(payload));
                None
            }
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= LOG_PREVIEW_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FRAMES: &str =
        "data: {\"text\":\"He\",\"done\":false}\n\ndata: {\"text\":\"llo\",\"done\":true}\n\n";

    fn event(text: &str, done: bool) -> Frame {
        Frame::Event(BackendEvent {
            text: Some(text.to_string()),
            done,
        })
    }

    #[test]
    fn test_decodes_complete_frames() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(TWO_FRAMES.as_bytes());
        assert_eq!(frames, vec![event("He", false), event("llo", true)]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_every_split_point_yields_same_frames() {
        let bytes = TWO_FRAMES.as_bytes();
        for split in 0..=bytes.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames = decoder.push(&bytes[..split]);
            frames.extend(decoder.push(&bytes[split..]));
            frames.extend(decoder.finish());
            assert_eq!(
                frames,
                vec![event("He", false), event("llo", true)],
                "split at byte {}",
                split
            );
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for b in TWO_FRAMES.as_bytes() {
            frames.extend(decoder.push(std::slice::from_ref(b)));
        }
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_multibyte_text_split_mid_character() {
        let frame = "data: {\"text\":\"héllo ✓\",\"done\":false}\n".as_bytes();
        let split = frame.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&frame[..split]).is_empty());
        assert_eq!(decoder.push(&frame[split..]), vec![event("héllo ✓", false)]);
        assert_eq!(decoder.malformed_frames(), 0);
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        let input = "data: {\"text\":\"A\",\"done\":false}\ndata: {not valid json}\ndata: {\"text\":\"B\",\"done\":true}\n";
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(input.as_bytes());
        assert_eq!(frames, vec![event("A", false), event("B", true)]);
        assert_eq!(decoder.malformed_frames(), 1);
    }

    #[test]
    fn test_oversized_line_is_dropped_and_decoding_resumes() {
        let mut decoder = FrameDecoder::with_max_frame_bytes(64);
        let junk = vec![b'x'; 50];

        for _ in 0..10 {
            assert!(decoder.push(&junk).is_empty());
            assert!(decoder.pending_len() <= 64);
        }
        assert_eq!(decoder.malformed_frames(), 1);

        let frames = decoder.push(b"xxxx\ndata: {\"text\":\"ok\",\"done\":true}\n");
        assert_eq!(frames, vec![event("ok", true)]);
        assert_eq!(decoder.malformed_frames(), 1);
    }

    #[test]
    fn test_oversized_line_within_one_read() {
        let mut decoder = FrameDecoder::with_max_frame_bytes(32);
        let mut input = format!("data: {{\"text\":\"{}\"}}\n", "y".repeat(100)).into_bytes();
        input.extend_from_slice(b"data: {\"text\":\"B\",\"done\":true}\n");

        assert_eq!(decoder.push(&input), vec![event("B", true)]);
        assert_eq!(decoder.malformed_frames(), 1);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_long_line_over_many_reads_within_limit() {
        let text = "z".repeat(4096);
        let frame = format!("data: {{\"text\":\"{}\"}}\n", text);
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for piece in frame.as_bytes().chunks(7) {
            frames.extend(decoder.push(piece));
        }
        assert_eq!(frames, vec![event(&text, false)]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_done_sentinel_drains() {
        let input = "data: {\"text\":\"A\",\"done\":false}\ndata: [DONE]\ndata: {\"text\":\"late\",\"done\":false}\n";
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(input.as_bytes());
        assert_eq!(frames, vec![event("A", false), Frame::Done]);
        assert_eq!(decoder.state(), DecoderState::Draining);
        assert!(decoder.push(b"data: {\"text\":\"later\"}\n").is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"text\":\"tail\",\"done\":true}").is_empty());
        assert_eq!(decoder.finish(), vec![event("tail", true)]);
    }

    #[test]
    fn test_crlf_comments_and_foreign_lines() {
        let input = ": keep-alive\r\nevent: message\r\ndata: {\"text\":\"x\"}\r\n\r\n";
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(input.as_bytes());
        assert_eq!(
            frames,
            vec![Frame::Event(BackendEvent {
                text: Some("x".to_string()),
                done: false
            })]
        );
        assert_eq!(decoder.malformed_frames(), 0);
    }

    #[test]
    fn test_data_prefix_without_space() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(b"data:[DONE]\n"), vec![Frame::Done]);
    }
}
