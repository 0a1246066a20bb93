//! Newline-delimited stream decoder
//!
//! Turns arbitrarily fragmented byte input into complete text lines. The
//! transport chunks the response body however it likes, so a fragment
//! boundary can fall anywhere: mid-line, or even inside a multi-byte UTF-8
//! character. The decoder buffers raw bytes across pushes and only converts
//! to text once a full line is available.
//!
//! The decoder is synchronous and transport-agnostic; the async driver feeds
//! it one fragment per read. It generalizes to any chunked newline-delimited
//! protocol.

use bytes::BytesMut;

/// Incremental line decoder with a pending-partial buffer
///
/// Each call to [`LineDecoder::push`] appends the fragment to the internal
/// buffer, yields every complete line in order, and retains the trailing
/// partial line for the next push. When the stream ends, a non-empty buffer
/// is an incomplete trailing record and is simply dropped with the decoder.
///
/// # Examples
///
/// ```
/// use foliochat::protocol::LineDecoder;
///
/// let mut decoder = LineDecoder::new();
/// assert!(decoder.push(b"hel").is_empty());
/// assert_eq!(decoder.push(b"lo\nwor"), vec!["hello".to_string()]);
/// assert_eq!(decoder.push(b"ld\n"), vec!["world".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: BytesMut,
}

impl LineDecoder {
    /// Create a decoder with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment and collect every line completed by it
    ///
    /// Lines are returned in arrival order with the trailing newline (and a
    /// preceding carriage return, if any) stripped. Invalid UTF-8 within a
    /// complete line is replaced rather than treated as an error.
    pub fn push(&mut self, fragment: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(fragment);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw = self.buffer.split_to(pos + 1);
            let mut line = &raw[..raw.len() - 1];
            if line.ends_with(b"\r") {
                line = &line[..line.len() - 1];
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
        }
        lines
    }

    /// Bytes of the retained partial line, if any
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }
}
