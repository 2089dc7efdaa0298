//! Decoder for Docker's multiplexed attach/exec/log stream.
//!
//! Non-tty sessions prefix every write with an 8 byte header:
//! `[stream type][0][0][0][payload length, u32 big endian]`. Tty sessions send
//! raw bytes. The first byte of the stream decides which one we are reading.

use bollard::container::LogOutput;
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const HEADER_LEN: usize = 8;

const STDOUT: u8 = 1;
const STDERR: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Undetermined,
    Multiplexed,
    Raw,
}

/// Incremental frame decoder.
///
/// Partial frames stay buffered across `push` calls, and so do incomplete
/// UTF-8 sequences, so output never depends on how the stream was chunked.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    mode: Mode,
    frames: usize,
    utf8_tail: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            mode: Mode::Undetermined,
            frames: 0,
            utf8_tail: Vec::new(),
        }
    }

    /// Number of complete frames decoded so far.
    pub fn frames_decoded(&self) -> usize {
        self.frames
    }

    /// Feed a chunk and return the text of every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        if chunk.is_empty() {
            return String::new();
        }
        if self.mode == Mode::Undetermined {
            self.mode = match chunk[0] {
                STDOUT | STDERR => Mode::Multiplexed,
                _ => Mode::Raw,
            };
        }

        match self.mode {
            Mode::Raw => self.decode_text(chunk),
            _ => {
                self.buffer.extend_from_slice(chunk);
                let mut payload = Vec::new();
                while self.buffer.len() >= HEADER_LEN {
                    let len = u32::from_be_bytes([
                        self.buffer[4],
                        self.buffer[5],
                        self.buffer[6],
                        self.buffer[7],
                    ]) as usize;
                    if self.buffer.len() < HEADER_LEN + len {
                        break;
                    }
                    self.buffer.advance(HEADER_LEN);
                    payload.extend_from_slice(&self.buffer.split_to(len));
                    self.frames += 1;
                }
                self.decode_text(&payload)
            }
        }
    }

    /// Flush at end of stream.
    ///
    /// A stream that never produced a complete frame is returned as plain
    /// text; a trailing partial frame after real frames is dropped.
    pub fn finish(mut self) -> String {
        let mut out = String::new();
        if !self.utf8_tail.is_empty() {
            out.push_str(&String::from_utf8_lossy(&self.utf8_tail));
            self.utf8_tail.clear();
        }
        if !self.buffer.is_empty() {
            if self.frames == 0 {
                out.push_str(&String::from_utf8_lossy(&self.buffer));
            } else {
                tracing::debug!(
                    "Dropping {} bytes of incomplete frame at end of stream",
                    self.buffer.len()
                );
            }
        }
        out
    }

    /// Decode a complete byte sequence in one go.
    pub fn decode_all(bytes: &[u8]) -> String {
        let mut decoder = Self::new();
        let mut out = decoder.push(bytes);
        out.push_str(&decoder.finish());
        out
    }

    fn decode_text(&mut self, bytes: &[u8]) -> String {
        let mut pending = std::mem::take(&mut self.utf8_tail);
        pending.extend_from_slice(bytes);

        let mut out = String::new();
        let mut rest: &[u8] = &pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // from_utf8 already validated this prefix
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            // incomplete sequence, wait for the next chunk
                            self.utf8_tail = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Put one bollard output record back on the wire format.
///
/// bollard splits frames itself; re-framing lets every transport feed the
/// same decoder. Console (tty) output stays raw.
pub fn encode_log_output(output: LogOutput) -> Bytes {
    let (kind, message) = match output {
        LogOutput::StdOut { message } => (STDOUT, message),
        LogOutput::StdErr { message } => (STDERR, message),
        LogOutput::StdIn { message } => (0, message),
        LogOutput::Console { message } => return message,
    };
    encode_frame(kind, &message)
}

pub fn encode_frame(kind: u8, payload: &[u8]) -> Bytes {
    let mut frame = BytesMut::with_capacity(HEADER_LEN + payload.len());
    frame.put_u8(kind);
    frame.put_bytes(0, 3);
    frame.put_u32(payload.len() as u32);
    frame.put_slice(payload);
    frame.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frames(parts: &[(u8, &str)]) -> Vec<u8> {
        parts
            .iter()
            .flat_map(|(kind, text)| encode_frame(*kind, text.as_bytes()).to_vec())
            .collect()
    }

    #[test]
    fn decodes_stdout_and_stderr_frames() {
        let bytes = frames(&[(1, "Server received, "), (2, "But no response!!\n")]);
        assert_eq!(FrameDecoder::decode_all(&bytes), "Server received, But no response!!\n");
    }

    #[test]
    fn empty_input_produces_nothing() {
        assert_eq!(FrameDecoder::decode_all(&[]), "");
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&[]), "");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn zero_length_payload_advances() {
        let bytes = frames(&[(1, ""), (1, "ok")]);
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&bytes), "ok");
        assert_eq!(decoder.frames_decoded(), 2);
    }

    #[test]
    fn short_payload_is_buffered_until_complete() {
        let bytes = frames(&[(1, "ListPlayers done")]);
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&bytes[..12]), "");
        assert_eq!(decoder.frames_decoded(), 0);
        assert_eq!(decoder.push(&bytes[12..]), "ListPlayers done");
        assert_eq!(decoder.frames_decoded(), 1);
    }

    #[test]
    fn unframed_stream_passes_through() {
        let text = "\x1b[32mServer started\x1b[0m\n";
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(text.as_bytes()), text);
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn stream_without_complete_frame_falls_back_to_text() {
        // looks like a header but the declared length never arrives
        let bytes = [1u8, 0, 0, 0, 0, 0, 0, 50, b'h', b'i'];
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&bytes), "");
        let out = decoder.finish();
        assert!(out.ends_with("hi"));
    }

    #[test]
    fn trailing_partial_frame_is_dropped_after_real_frames() {
        let mut bytes = frames(&[(1, "first")]);
        bytes.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 9, b'x']);
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&bytes), "first");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn multibyte_char_split_across_frames() {
        let word = "ラグナロク".as_bytes();
        let mut bytes = encode_frame(1, &word[..4]).to_vec();
        bytes.extend_from_slice(&encode_frame(1, &word[4..]));
        assert_eq!(FrameDecoder::decode_all(&bytes), "ラグナロク");
    }

    #[test]
    fn reencodes_bollard_output() {
        let out = encode_log_output(LogOutput::StdErr {
            message: Bytes::from_static(b"oops"),
        });
        assert_eq!(&out[..8], &[2, 0, 0, 0, 0, 0, 0, 4]);
        let console = encode_log_output(LogOutput::Console {
            message: Bytes::from_static(b"raw"),
        });
        assert_eq!(&console[..], b"raw");
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_output(
            payloads in proptest::collection::vec(("[a-zA-Z0-9 .,é漢]{0,40}", 1u8..=2), 0..12),
            cuts in proptest::collection::vec(0usize..400, 0..10),
        ) {
            let bytes: Vec<u8> = payloads
                .iter()
                .flat_map(|(text, kind)| encode_frame(*kind, text.as_bytes()).to_vec())
                .collect();
            let whole = FrameDecoder::decode_all(&bytes);

            let mut cuts: Vec<usize> = cuts.into_iter().filter(|c| *c <= bytes.len()).collect();
            cuts.sort_unstable();
            cuts.dedup();

            let mut decoder = FrameDecoder::new();
            let mut chunked = String::new();
            let mut start = 0;
            for cut in cuts {
                chunked.push_str(&decoder.push(&bytes[start..cut]));
                start = cut;
            }
            chunked.push_str(&decoder.push(&bytes[start..]));
            chunked.push_str(&decoder.finish());

            prop_assert_eq!(chunked, whole);
        }

        #[test]
        fn raw_chunking_does_not_change_output(text in "[a-z \n漢é]{1,80}", cut in 0usize..200) {
            let bytes = format!(">{}", text).into_bytes();
            let cut = cut.min(bytes.len());
            let mut decoder = FrameDecoder::new();
            let mut out = decoder.push(&bytes[..cut]);
            out.push_str(&decoder.push(&bytes[cut..]));
            out.push_str(&decoder.finish());
            prop_assert_eq!(out, FrameDecoder::decode_all(&bytes));
        }
    }
}
