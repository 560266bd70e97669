use msgchan_transport::{Endpoint, IpcStream};

use crate::channel::Channel;
use crate::config::ChannelConfig;
use crate::error::Result;

/// Connect to a listening endpoint with default configuration.
pub fn connect(endpoint: &Endpoint) -> Result<Channel<IpcStream>> {
    connect_with_config(endpoint, ChannelConfig::default())
}

/// Connect and bind a channel using `config`.
pub fn connect_with_config(
    endpoint: &Endpoint,
    config: ChannelConfig,
) -> Result<Channel<IpcStream>> {
    let stream = endpoint.connect()?;
    config.apply(&stream)?;
    Ok(Channel::with_config(stream, config))
}
