use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::codec::{parse_body, FrameConfig, BEGIN, SEPARATOR};
use crate::error::{FrameError, Result};
use crate::message::Message;
use crate::text::TextCodec;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Bytes requested from the transport per read while draining.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Where the decoder is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// The next byte at the cursor must start a `@len:` header.
    Header,
    /// A header announced a body of this many bytes, starting at the cursor.
    Body(usize),
}

/// Outcome of draining a reader into the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fill {
    /// Bytes appended to the receive buffer.
    pub bytes: usize,
    /// A read returned 0 bytes: the stream has ended.
    pub eof: bool,
}

/// Incremental decoder for `@len:CAT:NUM:MSG` frames.
///
/// Bytes may arrive in any fragmentation: partial headers, partial bodies or
/// several frames at once. The decoder owns its receive buffer and keeps the
/// parse position across calls; bytes of fully consumed frames are dropped by
/// [`compact`](Self::compact).
///
/// A framing error leaves the decoder stuck on the offending bytes. There is
/// no resynchronization: the owner is expected to tear the stream down.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    cursor: usize,
    state: ParseState,
    config: FrameConfig,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            cursor: 0,
            state: ParseState::Header,
            config,
        }
    }

    /// Append raw bytes to the receive buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Drain everything `reader` has immediately available.
    ///
    /// Reads [`READ_CHUNK_SIZE`] bytes at a time and stops on the first short
    /// read, on `WouldBlock`/`TimedOut`, or at end-of-stream. `Interrupted`
    /// reads are retried. The reader must be non-blocking or readiness-gated:
    /// a blocking reader with nothing to deliver stalls here.
    pub fn fill_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<Fill> {
        let mut fill = Fill::default();
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let read = match reader.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    break
                }
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                fill.eof = true;
                break;
            }

            self.buf.extend_from_slice(&chunk[..read]);
            fill.bytes += read;

            if read < READ_CHUNK_SIZE {
                break;
            }
        }
        trace!(bytes = fill.bytes, eof = fill.eof, "drained transport");
        Ok(fill)
    }

    /// Decode the next complete message, if the buffer holds one.
    ///
    /// `Ok(None)` means more bytes are needed. Call [`compact`](Self::compact)
    /// once no further message can be decoded.
    pub fn decode(&mut self) -> Result<Option<Message>> {
        let len = match self.state {
            ParseState::Body(len) => len,
            ParseState::Header => match self.parse_header()? {
                Some(len) => {
                    self.state = ParseState::Body(len);
                    len
                }
                None => return Ok(None),
            },
        };

        if self.buf.len() - self.cursor < len {
            return Ok(None);
        }

        let text = if len == 0 {
            String::new()
        } else {
            self.config
                .codec
                .decode(&self.buf[self.cursor..self.cursor + len])?
        };
        self.cursor += len;
        self.state = ParseState::Header;

        let message = parse_body(&text)?;
        trace!(
            category = message.category(),
            serial = message.serial(),
            size = len,
            "decoded frame"
        );
        Ok(Some(message))
    }

    /// Decode every complete message in the buffer, then compact it.
    pub fn decode_all(&mut self) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        while let Some(message) = self.decode()? {
            messages.push(message);
        }
        self.compact();
        Ok(messages)
    }

    /// Drop consumed bytes and rebase the cursor to the buffer start.
    ///
    /// Only an in-flight partial header or partial body survives.
    pub fn compact(&mut self) {
        if self.cursor > 0 {
            self.buf.advance(self.cursor);
            self.cursor = 0;
        }
    }

    /// Parse `@digits:` at the cursor.
    ///
    /// The marker is checked as soon as one byte is buffered; only a missing
    /// separator counts as a partial header. The digit run may be no longer
    /// than `max_frame_len` written in decimal, so leading zeros cannot keep a
    /// header pending forever.
    fn parse_header(&mut self) -> Result<Option<usize>> {
        let Some(&first) = self.buf.get(self.cursor) else {
            return Ok(None);
        };
        if first != BEGIN {
            return Err(FrameError::malformed("missing begin marker"));
        }

        let max = self.config.max_frame_len;
        let max_digits = decimal_digits(max);
        let mut size = 0usize;
        for (i, &byte) in self.buf[self.cursor + 1..].iter().enumerate() {
            match byte {
                b'0'..=b'9' => {
                    if i >= max_digits {
                        return Err(FrameError::malformed("header too long"));
                    }
                    let digit = usize::from(byte - b'0');
                    size = match size.checked_mul(10).and_then(|s| s.checked_add(digit)) {
                        Some(next) if next <= max => next,
                        _ => {
                            return Err(FrameError::FrameTooLarge {
                                size: size.saturating_mul(10).saturating_add(digit),
                                max,
                            })
                        }
                    };
                }
                SEPARATOR => {
                    if i == 0 {
                        return Err(FrameError::malformed("no size specified"));
                    }
                    self.cursor += i + 2;
                    return Ok(Some(size));
                }
                _ => return Err(FrameError::malformed("expecting digits or separator")),
            }
        }
        Ok(None)
    }

    /// Current parse state.
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Bytes held in the receive buffer (not yet consumed by a frame).
    pub fn buffered_len(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// True when a frame has been started but not completed.
    pub fn has_partial_frame(&self) -> bool {
        self.buffered_len() > 0 || matches!(self.state, ParseState::Body(_))
    }

    /// Active text codec.
    pub fn codec(&self) -> TextCodec {
        self.config.codec
    }

    /// Change the text codec for bodies decoded from now on.
    pub fn set_codec(&mut self, codec: TextCodec) {
        self.config.codec = codec;
    }

    /// Update the maximum accepted body size.
    pub fn set_max_frame_len(&mut self, max_frame_len: usize) {
        self.config.max_frame_len = max_frame_len;
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

fn decimal_digits(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |log| log as usize + 1)
}
