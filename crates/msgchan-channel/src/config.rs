use std::time::Duration;

use msgchan_frame::FrameConfig;
use msgchan_transport::IpcStream;

use crate::error::Result;

/// Channel configuration.
#[derive(Debug, Clone, Default)]
pub struct ChannelConfig {
    /// Framing limits and text codec.
    pub frame: FrameConfig,
    /// Read timeout applied to socket transports. A timed-out read ends the
    /// receive drain like `WouldBlock`.
    pub read_timeout: Option<Duration>,
    /// Write timeout applied to socket transports.
    pub write_timeout: Option<Duration>,
    /// Bound on queued jobs; `None` keeps the queue unbounded.
    pub max_pending_jobs: Option<usize>,
}

impl ChannelConfig {
    /// Apply socket timeouts to a freshly connected stream.
    pub(crate) fn apply(&self, stream: &IpcStream) -> Result<()> {
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        Ok(())
    }
}
