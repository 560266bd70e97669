use msgchan_transport::{Endpoint, IpcStream, SocketListener};
use tracing::debug;

use crate::channel::Channel;
use crate::config::ChannelConfig;
use crate::error::Result;

/// Accepts connections and binds a channel to each.
pub struct ChannelListener {
    socket: SocketListener,
    config: ChannelConfig,
}

impl ChannelListener {
    /// Bind to `endpoint` with default channel configuration.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        Self::bind_with_config(endpoint, ChannelConfig::default())
    }

    /// Bind to `endpoint`; accepted channels use `config`.
    pub fn bind_with_config(endpoint: &Endpoint, config: ChannelConfig) -> Result<Self> {
        let socket = SocketListener::bind(endpoint)?;
        Ok(Self { socket, config })
    }

    /// Override the configuration for channels accepted from now on.
    pub fn with_config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    /// Block until the next connection and bind a channel to it.
    pub fn accept(&self) -> Result<Channel<IpcStream>> {
        let stream = self.socket.accept()?;
        self.config.apply(&stream)?;
        debug!(endpoint = %self.socket.local_endpoint(), "accepted connection");
        Ok(Channel::with_config(stream, self.config.clone()))
    }

    /// The bound endpoint (for TCP, with the actual port).
    pub fn local_endpoint(&self) -> &Endpoint {
        self.socket.local_endpoint()
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}
