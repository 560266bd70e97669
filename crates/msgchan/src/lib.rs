//! Command/event message channels over byte streams.
//!
//! Messages travel as `@<len>:<category>:<serial>:<payload>` frames. Commands
//! and events carry serial numbers allocated by the sender; results (`OK`)
//! and errors (`ERR`) echo the serial of the command they answer.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-stream transports (Unix sockets, TCP, in-memory)
//! - [`frame`]: incremental frame encoding and decoding
//! - [`channel`]: channels, job queue and processors

/// Re-export transport types.
pub mod transport {
    pub use msgchan_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use msgchan_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use msgchan_channel::*;
}
