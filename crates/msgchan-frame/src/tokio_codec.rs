//! `tokio_util::codec` adapter for async transports.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, FrameConfig};
use crate::decoder::FrameDecoder;
use crate::error::{FrameError, Result};
use crate::message::Message;
use crate::text::TextCodec;

/// Async counterpart of [`FrameEncoder`](crate::FrameEncoder) and
/// [`FrameDecoder`], for use with `tokio_util::codec::Framed`.
#[derive(Debug, Default)]
pub struct MessageCodec {
    decoder: FrameDecoder,
    config: FrameConfig,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            decoder: FrameDecoder::with_config(config.clone()),
            config,
        }
    }

    pub fn codec(&self) -> TextCodec {
        self.config.codec
    }

    /// Change the text codec in both directions.
    pub fn set_codec(&mut self, codec: TextCodec) {
        self.config.codec = codec;
        self.decoder.set_codec(codec);
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        if !src.is_empty() {
            let incoming = src.split();
            self.decoder.feed(&incoming);
        }
        let message = self.decoder.decode()?;
        if message.is_none() {
            self.decoder.compact();
        }
        Ok(message)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if self.decoder.has_partial_frame() => Err(FrameError::ConnectionClosed),
            None => Ok(None),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&Message>>::encode(self, &item, dst)
    }
}

impl Encoder<&Message> for MessageCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<()> {
        encode_frame(
            item.category(),
            item.serial(),
            item.payload(),
            &self.config,
            dst,
        )?;
        Ok(())
    }
}
