//! Byte-stream transports for msgchan channels.
//!
//! The message protocol only needs something it can read bytes from, write
//! bytes to, flush, and close. This crate provides that contract as the
//! [`Transport`] trait together with the concrete streams the rest of the
//! workspace uses:
//! - [`IpcStream`] over Unix domain sockets or TCP
//! - [`SocketListener`] for the accepting side
//! - [`MemoryStream`] for in-process loopback and paired streams

pub mod endpoint;
pub mod error;
pub mod listener;
pub mod memory;
pub mod traits;

pub use endpoint::Endpoint;
pub use error::{Result, TransportError};
pub use listener::SocketListener;
pub use memory::MemoryStream;
pub use traits::{IpcStream, Transport};
