//! `@len:CAT:NUM:MSG` message framing.
//!
//! Every message travels as one frame:
//! - an ASCII header `@<decimal length>:`
//! - a body of exactly that many bytes, decoding under the active text codec
//!   to `<category>:<serial>:<payload>`
//!
//! [`FrameDecoder`] rebuilds messages from bytes delivered in any
//! fragmentation; [`FrameEncoder`] writes them; [`SerialAllocator`] issues the
//! correlation numbers for auto-numbered sends.

pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod message;
pub mod serial;
pub mod text;
#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{
    encode_frame, encode_message, parse_body, validate_category, FrameConfig,
    DEFAULT_MAX_FRAME_LEN,
};
pub use decoder::{Fill, FrameDecoder, ParseState, READ_CHUNK_SIZE};
pub use encoder::FrameEncoder;
pub use error::{FrameError, Result};
pub use message::{Message, COMMAND, ERROR, EVENT, RESULT};
pub use serial::SerialAllocator;
pub use text::TextCodec;
#[cfg(feature = "async")]
pub use tokio_codec::MessageCodec;
