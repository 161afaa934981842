//! Newline-delimited line codec.
//!
//! Reassembles complete command lines out of a byte stream with no
//! alignment guarantees, via `tokio_util::codec`. Inbound lines may end in
//! `\n` or `\r\n`; outbound lines always get a single `\n`.

use std::io;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

/// Tokio codec for line encode/decode.
pub struct LineCodec {
    max_line_bytes: usize,
}

impl LineCodec {
    /// Create a codec with the default 64 KB line budget.
    pub fn new() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Create a codec with a custom line budget (in bytes, terminator
    /// included).
    pub fn with_max_line_bytes(max_bytes: usize) -> Self {
        Self {
            max_line_bytes: max_bytes,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        match src.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                if pos + 1 > self.max_line_bytes {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("line exceeds {} bytes", self.max_line_bytes),
                    ));
                }
                let mut line = src.split_to(pos + 1);
                line.truncate(pos);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }
                let text = std::str::from_utf8(&line)
                    .map_err(|_| {
                        io::Error::new(io::ErrorKind::InvalidData, "line is not valid UTF-8")
                    })?
                    .to_string();
                Ok(Some(text))
            }
            None => {
                if src.len() >= self.max_line_bytes {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("line exceeds {} bytes", self.max_line_bytes),
                    ));
                }
                // Not a full line yet -- reserve a bit more space.
                src.reserve(256);
                Ok(None)
            }
        }
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), io::Error> {
        let line = item.as_ref();
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
