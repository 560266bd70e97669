//! Message channels over byte-stream transports.
//!
//! A [`Channel`] binds one [`Transport`](msgchan_transport::Transport) and
//! speaks the `@len:CAT:NUM:MSG` protocol on it: commands and events go out
//! with fresh serial numbers, results and errors echo the serial of the
//! command they answer. Inbound messages are decoded incrementally into a
//! FIFO job queue that the owner drains through the attached
//! [`ProcessorBinding`].

pub mod channel;
pub mod config;
pub mod connect;
pub mod error;
pub mod listener;
pub mod processor;
pub mod queue;

pub use channel::Channel;
pub use config::ChannelConfig;
pub use connect::{connect, connect_with_config};
pub use error::{ChannelError, Result};
pub use listener::ChannelListener;
pub use processor::{Processor, ProcessorBinding};
pub use queue::JobQueue;
