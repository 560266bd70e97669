//! Messages and the built-in categories.
//!
//! Categories are free-form text tokens; the four below are the ones the
//! command/response and event patterns use. Anything else is caller-defined.

use std::fmt;

/// A command to be evaluated by the peer.
pub const COMMAND: &str = "CMD";

/// An event notification.
pub const EVENT: &str = "EVT";

/// Successful result of a previously received command.
pub const RESULT: &str = "OK";

/// Failure report for a previously received command.
pub const ERROR: &str = "ERR";

/// Returns true for the four built-in categories.
pub fn is_builtin(category: &str) -> bool {
    matches!(category, COMMAND | EVENT | RESULT | ERROR)
}

/// One decoded (or about to be encoded) message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    category: String,
    serial: u64,
    payload: String,
}

impl Message {
    /// Create a new message.
    pub fn new(category: impl Into<String>, serial: u64, payload: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            serial,
            payload: payload.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Whether this message carries one of the built-in categories.
    pub fn is_builtin(&self) -> bool {
        is_builtin(&self.category)
    }

    /// Split into `(category, serial, payload)`.
    pub fn into_parts(self) -> (String, u64, String) {
        (self.category, self.serial, self.payload)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.category, self.serial, self.payload)
    }
}

impl<C: Into<String>, P: Into<String>> From<(C, u64, P)> for Message {
    fn from((category, serial, payload): (C, u64, P)) -> Self {
        Self::new(category, serial, payload)
    }
}
