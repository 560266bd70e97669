use msgchan_frame::FrameError;
use msgchan_transport::TransportError;

/// Errors that can occur in channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error (framing violation, send contract, I/O).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The channel was closed, explicitly or after a fatal error.
    #[error("channel is closed")]
    Closed,

    /// The peer closed the stream.
    #[error("peer disconnected")]
    Disconnected,

    /// The job queue reached its configured bound.
    #[error("job queue full ({capacity} pending)")]
    QueueFull { capacity: usize },

    /// A processor reported a failure while handling a job.
    #[error("processor failed: {0}")]
    Processor(String),

    /// No reply arrived in time.
    #[error("no reply after {0:?}")]
    Timeout(std::time::Duration),
}

impl ChannelError {
    /// Wrap a processor-side failure.
    pub fn processor(reason: impl std::fmt::Display) -> Self {
        Self::Processor(reason.to_string())
    }

    /// True for wire-grammar violations from the peer.
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::Frame(err) if err.is_framing())
    }

    /// True for send-side contract violations (nothing was written).
    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Frame(FrameError::Contract { .. }))
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(err: std::io::Error) -> Self {
        Self::Frame(FrameError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
