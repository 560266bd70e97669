use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::message::Message;
use crate::text::TextCodec;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
///
/// The frame is fully encoded and checked before the first byte is written,
/// so a contract violation never leaves a partial frame on the wire. The
/// header and body go out as two writes followed by a flush.
#[derive(Debug)]
pub struct FrameEncoder {
    buf: BytesMut,
    config: FrameConfig,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameEncoder {
    /// Create an encoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create an encoder with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and send one frame, then flush.
    pub fn send<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        category: &str,
        serial: u64,
        payload: &str,
    ) -> Result<()> {
        self.buf.clear();
        let header = encode_frame(category, serial, payload, &self.config, &mut self.buf)?;

        write_all(out, &self.buf[..header])?;
        write_all(out, &self.buf[header..])?;
        flush(out)?;

        trace!(category, serial, size = self.buf.len() - header, "sent frame");
        Ok(())
    }

    /// Send a prebuilt [`Message`].
    pub fn send_message<W: Write + ?Sized>(&mut self, out: &mut W, message: &Message) -> Result<()> {
        self.send(
            out,
            message.category(),
            message.serial(),
            message.payload(),
        )
    }

    /// Active text codec.
    pub fn codec(&self) -> TextCodec {
        self.config.codec
    }

    /// Change the text codec for frames encoded from now on.
    pub fn set_codec(&mut self, codec: TextCodec) {
        self.config.codec = codec;
    }

    /// Update maximum body size for subsequent frames.
    pub fn set_max_frame_len(&mut self, max_frame_len: usize) {
        self.config.max_frame_len = max_frame_len;
    }

    /// Current encoder configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

fn write_all<W: Write + ?Sized>(out: &mut W, mut bytes: &[u8]) -> Result<()> {
    while !bytes.is_empty() {
        match out.write(bytes) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => bytes = &bytes[n..],
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            // An expired send timeout surfaces as WouldBlock; retrying would spin.
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}

fn flush<W: Write + ?Sized>(out: &mut W) -> Result<()> {
    loop {
        match out.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}
