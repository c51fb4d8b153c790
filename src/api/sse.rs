//! Server-Sent Events (SSE) parser for streaming chat-completion responses
//!
//! Frames look like `data: {"choices":[{"delta":{"content":"..."}}]}` and the
//! stream ends with `data: [DONE]`. Network chunks split lines arbitrarily, so
//! [`DeltaDecoder`] holds partial lines back until their newline arrives.

use serde_json::Value;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// A single `data:` line pulled out of the byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame<'a> {
    /// JSON payload (prefix stripped, whitespace trimmed)
    Data(&'a str),
    /// The `[DONE]` sentinel
    Done,
}

/// A frame whose payload could not be parsed. Never fatal to the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub line: String,
    pub reason: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Can not parse json ({}): {}", self.reason, self.line)
    }
}

/// What the decoder produces for each complete line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    Delta(String),
    Warning(ParseWarning),
    Done,
}

/// Parse a single SSE line into a frame.
/// Returns None for lines that carry no data (comments, `event:`, blanks).
pub fn parse_sse_line(line: &str) -> Option<SseFrame<'_>> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();

    if payload == DONE_SENTINEL {
        return Some(SseFrame::Done);
    }

    Some(SseFrame::Data(payload))
}

/// Pull the text delta out of one JSON payload.
///
/// `Ok(None)` means the frame was valid but had nothing to emit (role-only
/// chunks, `finish_reason` chunks, empty content).
pub fn extract_delta(payload: &str) -> Result<Option<String>, serde_json::Error> {
    let json: Value = serde_json::from_str(payload)?;

    Ok(json["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|content| !content.is_empty())
        .map(str::to_string))
}

/// Incremental decoder turning raw body chunks into ordered frames.
///
/// Buffers bytes rather than text so a UTF-8 sequence split across two
/// chunks decodes the same as if it had arrived whole.
#[derive(Debug, Default)]
pub struct DeltaDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl DeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Bytes held back waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Append a chunk and drain every complete line from the buffer.
    ///
    /// Once `Done` has been returned the rest of the buffer is discarded and
    /// later calls yield nothing.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DecodedFrame> {
        if self.done {
            return Vec::new();
        }

        // Only the new bytes can hold a newline not yet seen
        let mut scan_from = self.buffer.len();
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[scan_from..].iter().position(|&b| b == b'\n') {
            let newline_pos = scan_from + offset;
            let decoded = String::from_utf8_lossy(&self.buffer[consumed..newline_pos]);
            let line = decoded.strip_suffix('\r').unwrap_or(decoded.as_ref());
            consumed = newline_pos + 1;
            scan_from = consumed;

            match parse_sse_line(line) {
                Some(SseFrame::Done) => {
                    self.done = true;
                    frames.push(DecodedFrame::Done);
                    break;
                }
                Some(SseFrame::Data(payload)) => match extract_delta(payload) {
                    Ok(Some(text)) => frames.push(DecodedFrame::Delta(text)),
                    Ok(None) => {}
                    Err(e) => frames.push(DecodedFrame::Warning(ParseWarning {
                        line: line.to_string(),
                        reason: e.to_string(),
                    })),
                },
                None => {}
            }
        }

        if self.done {
            self.buffer.clear();
        } else {
            self.buffer.drain(..consumed);
        }

        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo, \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"wörld \u{1F30D}\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );

    fn deltas(frames: &[DecodedFrame]) -> String {
        frames
            .iter()
            .filter_map(|f| match f {
                DecodedFrame::Delta(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn decode_in_pieces(bytes: &[u8], cuts: &[usize]) -> Vec<DecodedFrame> {
        let mut decoder = DeltaDecoder::new();
        let mut frames = Vec::new();
        let mut start = 0;
        for &cut in cuts.iter().chain(std::iter::once(&bytes.len())) {
            frames.extend(decoder.feed(&bytes[start..cut]));
            start = cut;
        }
        frames
    }

    #[test]
    fn test_data_line() {
        assert_eq!(
            parse_sse_line(r#"data: {"a":1}"#),
            Some(SseFrame::Data(r#"{"a":1}"#))
        );
        assert_eq!(parse_sse_line("data:{}  "), Some(SseFrame::Data("{}")));
    }

    #[test]
    fn test_done_line() {
        assert_eq!(parse_sse_line("data: [DONE]"), Some(SseFrame::Done));
    }

    #[test]
    fn test_non_data_lines_skipped() {
        assert!(parse_sse_line("").is_none());
        assert!(parse_sse_line(": keep-alive").is_none());
        assert!(parse_sse_line("event: message").is_none());
    }

    #[test]
    fn test_extract_delta() {
        let payload = r#"{"choices":[{"delta":{"content":"Hello"},"index":0}]}"#;
        assert_eq!(extract_delta(payload).unwrap(), Some("Hello".to_string()));
        assert_eq!(extract_delta(r#"{"choices":[{"delta":{}}]}"#).unwrap(), None);
        assert_eq!(extract_delta(r#"{"choices":[]}"#).unwrap(), None);
        assert!(extract_delta("{not json").is_err());
    }

    #[test]
    fn test_end_to_end_example() {
        let chunks = [
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\ndata: [DONE]\n",
        ];
        let mut decoder = DeltaDecoder::new();
        let frames: Vec<_> = chunks
            .iter()
            .flat_map(|c| decoder.feed(c.as_bytes()))
            .collect();

        assert_eq!(
            frames,
            vec![
                DecodedFrame::Delta("Hel".into()),
                DecodedFrame::Delta("lo".into()),
                DecodedFrame::Done,
            ]
        );
        assert!(decoder.is_done());
    }

    #[test]
    fn test_partial_line_held_back() {
        let mut decoder = DeltaDecoder::new();
        assert!(decoder
            .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}")
            .is_empty());
        assert!(decoder.pending() > 0);

        let frames = decoder.feed(b"\n");
        assert_eq!(frames, vec![DecodedFrame::Delta("Hi".into())]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_every_two_way_split_is_equivalent() {
        let bytes = STREAM.as_bytes();
        let expected = deltas(&decode_in_pieces(bytes, &[]));
        assert_eq!(expected, "Hello, wörld \u{1F30D}");

        for cut in 0..=bytes.len() {
            let frames = decode_in_pieces(bytes, &[cut]);
            assert_eq!(deltas(&frames), expected, "split at byte {}", cut);
            assert_eq!(frames.last(), Some(&DecodedFrame::Done));
        }
    }

    #[test]
    fn test_byte_at_a_time_is_equivalent() {
        let bytes = STREAM.as_bytes();
        let cuts: Vec<usize> = (1..bytes.len()).collect();
        let frames = decode_in_pieces(bytes, &cuts);
        assert_eq!(deltas(&frames), "Hello, wörld \u{1F30D}");
    }

    #[test]
    fn test_malformed_line_does_not_stop_later_lines() {
        let mut decoder = DeltaDecoder::new();
        let mut frames = decoder.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\ndata: {broken\ndata: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n",
        );
        frames.extend(decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"c\"}}]}\n"));

        assert_eq!(deltas(&frames), "abc");
        let warnings: Vec<_> = frames
            .iter()
            .filter_map(|f| match f {
                DecodedFrame::Warning(w) => Some(w),
                _ => None,
            })
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, "data: {broken");
    }

    #[test]
    fn test_done_mid_buffer_discards_trailing_bytes() {
        let mut decoder = DeltaDecoder::new();
        let frames = decoder.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\ndata: [DONE]\ndata: {\"choices\":[{\"delta\":{\"content\":\"y\"}}]}\ngarbage",
        );

        assert_eq!(
            frames,
            vec![DecodedFrame::Delta("x".into()), DecodedFrame::Done]
        );
        assert_eq!(decoder.pending(), 0);
        assert!(decoder
            .feed(b"\ndata: {\"choices\":[{\"delta\":{\"content\":\"z\"}}]}\n")
            .is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        let mut decoder = DeltaDecoder::new();
        let frames = decoder.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\r\n\r\ndata: [DONE]\r\n",
        );
        assert_eq!(
            frames,
            vec![DecodedFrame::Delta("ok".into()), DecodedFrame::Done]
        );
    }

    #[test]
    fn test_many_lines_in_one_chunk() {
        let mut body = String::new();
        for i in 0..2000 {
            body.push_str(&format!(
                "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{}\"}}}}]}}\n",
                i % 10
            ));
        }
        body.push_str("data: {\"cho");

        let mut decoder = DeltaDecoder::new();
        let frames = decoder.feed(body.as_bytes());

        assert_eq!(frames.len(), 2000);
        assert_eq!(frames[1999], DecodedFrame::Delta("9".into()));
        assert_eq!(decoder.pending(), "data: {\"cho".len());

        let frames = decoder.feed(b"ices\":[{\"delta\":{\"content\":\"end\"}}]}\n");
        assert_eq!(frames, vec![DecodedFrame::Delta("end".into())]);
        assert_eq!(decoder.pending(), 0);
    }
}
