use crate::error::{FrameError, Result};

/// Issues outbound correlation numbers.
///
/// The first call to [`next`](Self::next) returns 1. Numbers are strictly
/// increasing; when the counter reaches `u64::MAX` allocation fails instead
/// of wrapping.
#[derive(Debug, Default, Clone)]
pub struct SerialAllocator {
    last: u64,
}

impl SerialAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting after `last` (the next serial issued is `last + 1`).
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Allocate the next serial number.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<u64> {
        let next = self.last.checked_add(1).ok_or(FrameError::SerialExhausted)?;
        self.last = next;
        Ok(next)
    }

    /// The serial [`next`](Self::next) would return, without consuming it.
    pub fn peek(&self) -> Result<u64> {
        self.last.checked_add(1).ok_or(FrameError::SerialExhausted)
    }

    /// Most recently issued serial, 0 before the first allocation.
    pub fn last(&self) -> u64 {
        self.last
    }
}
