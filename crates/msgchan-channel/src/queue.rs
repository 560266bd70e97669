use std::collections::VecDeque;

use msgchan_frame::{Message, ERROR, RESULT};

use crate::error::{ChannelError, Result};

/// FIFO of decoded messages awaiting dispatch.
///
/// Purely a buffer: pushing never triggers processing.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<Message>,
    capacity: Option<usize>,
}

impl JobQueue {
    /// Unbounded queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue refusing pushes beyond `capacity` pending jobs.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            jobs: VecDeque::new(),
            capacity: Some(capacity),
        }
    }

    /// Append a job.
    pub fn push(&mut self, message: Message) -> Result<()> {
        if let Some(capacity) = self.capacity {
            if self.jobs.len() >= capacity {
                return Err(ChannelError::QueueFull { capacity });
            }
        }
        self.jobs.push_back(message);
        Ok(())
    }

    /// Remove and return the oldest job.
    pub fn pop(&mut self) -> Option<Message> {
        self.jobs.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Oldest job, without removing it.
    pub fn peek(&self) -> Option<&Message> {
        self.jobs.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.jobs.iter()
    }

    /// Remove every job, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.jobs.drain(..)
    }

    /// Remove the first `OK`/`ERR` reply carrying `serial`, leaving every
    /// other job in place.
    pub fn take_reply(&mut self, serial: u64) -> Option<Message> {
        let index = self.jobs.iter().position(|job| {
            job.serial() == serial && matches!(job.category(), RESULT | ERROR)
        })?;
        self.jobs.remove(index)
    }
}
