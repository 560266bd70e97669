//! Processing of dispatched jobs.
//!
//! A channel holds exactly one [`ProcessorBinding`]. The default,
//! [`ProcessorBinding::Diagnostic`], only reports what it was given; attach a
//! [`Processor`] to act on messages. Processors receive the channel itself so
//! they can reply (`send_result`, `send_error`) or rebind the channel's
//! processor from inside a call.

use std::fmt;

use msgchan_frame::Message;
use msgchan_transport::Transport;
use tracing::info;

use crate::channel::Channel;
use crate::error::Result;

/// Handles one dispatched job.
pub trait Processor<T: Transport> {
    fn process(&mut self, channel: &mut Channel<T>, message: Message) -> Result<()>;
}

impl<T, F> Processor<T> for F
where
    T: Transport,
    F: FnMut(&mut Channel<T>, Message) -> Result<()>,
{
    fn process(&mut self, channel: &mut Channel<T>, message: Message) -> Result<()> {
        self(channel, message)
    }
}

/// The processor currently attached to a channel.
pub enum ProcessorBinding<T: Transport> {
    /// Report each job through `tracing` and otherwise ignore it.
    Diagnostic,
    /// A caller-supplied processor.
    Custom(Box<dyn Processor<T> + Send>),
}

impl<T: Transport> ProcessorBinding<T> {
    /// Wrap a processor.
    pub fn custom(processor: impl Processor<T> + Send + 'static) -> Self {
        Self::Custom(Box::new(processor))
    }

    /// Wrap a closure.
    pub fn from_fn<F>(handler: F) -> Self
    where
        F: FnMut(&mut Channel<T>, Message) -> Result<()> + Send + 'static,
    {
        Self::Custom(Box::new(handler))
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Diagnostic)
    }

    pub(crate) fn process(&mut self, channel: &mut Channel<T>, message: Message) -> Result<()> {
        match self {
            Self::Diagnostic => {
                info!(
                    category = message.category(),
                    serial = message.serial(),
                    payload = message.payload(),
                    "unhandled job"
                );
                Ok(())
            }
            Self::Custom(processor) => processor.process(channel, message),
        }
    }
}

impl<T: Transport> Default for ProcessorBinding<T> {
    fn default() -> Self {
        Self::Diagnostic
    }
}

impl<T: Transport> fmt::Debug for ProcessorBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diagnostic => f.write_str("Diagnostic"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
