/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte stream does not follow the `@len:CAT:NUM:MSG` grammar.
    #[error("bad message: {reason}")]
    Malformed { reason: &'static str },

    /// A frame header announces a body larger than the configured maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// Outbound arguments violate the send contract; nothing was written.
    #[error("invalid message: {reason}")]
    Contract { reason: String },

    /// The serial counter cannot issue another number.
    #[error("serial numbers exhausted")]
    SerialExhausted,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended (or stopped accepting bytes) mid-frame.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    pub(crate) fn malformed(reason: &'static str) -> Self {
        Self::Malformed { reason }
    }

    pub(crate) fn contract(reason: impl Into<String>) -> Self {
        Self::Contract {
            reason: reason.into(),
        }
    }

    /// True for violations of the wire grammar, which desynchronize the stream.
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::FrameTooLarge { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
