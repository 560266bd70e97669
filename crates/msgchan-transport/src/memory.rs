//! In-process byte streams.
//!
//! A [`MemoryStream`] behaves like a non-blocking socket: reading an empty but
//! still-open stream fails with `WouldBlock`, and once the writing side is
//! closed a drained stream reads as end-of-stream (`Ok(0)`).

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::traits::Transport;

#[derive(Debug, Default)]
struct Pipe {
    data: VecDeque<u8>,
    writer_closed: bool,
}

/// An in-memory transport.
///
/// [`MemoryStream::loopback`] reads back whatever it writes;
/// [`MemoryStream::pair`] returns two connected ends.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    rx: Arc<Mutex<Pipe>>,
    tx: Arc<Mutex<Pipe>>,
    closed: bool,
    max_read: Option<usize>,
}

impl MemoryStream {
    /// A stream whose writes become its own readable input.
    pub fn loopback() -> Self {
        let pipe = Arc::new(Mutex::new(Pipe::default()));
        Self {
            rx: Arc::clone(&pipe),
            tx: pipe,
            closed: false,
            max_read: None,
        }
    }

    /// Two connected ends: bytes written to one are read from the other.
    pub fn pair() -> (Self, Self) {
        let a = Arc::new(Mutex::new(Pipe::default()));
        let b = Arc::new(Mutex::new(Pipe::default()));
        let left = Self {
            rx: Arc::clone(&a),
            tx: Arc::clone(&b),
            closed: false,
            max_read: None,
        };
        let right = Self {
            rx: b,
            tx: a,
            closed: false,
            max_read: None,
        };
        (left, right)
    }

    /// Cap every read at `limit` bytes, to exercise partial deliveries.
    pub fn with_max_read(mut self, limit: usize) -> Self {
        self.max_read = Some(limit.max(1));
        self
    }

    /// Number of bytes waiting to be read on this end.
    pub fn available(&self) -> usize {
        lock(&self.rx).data.len()
    }

    /// Whether [`Transport::close`] has been called on this end.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Take every byte currently readable on this end without consuming it
    /// through `Read`.
    pub fn take_pending(&self) -> Vec<u8> {
        lock(&self.rx).data.drain(..).collect()
    }

    /// Inject raw bytes as if the peer had written them.
    pub fn inject(&self, bytes: &[u8]) {
        lock(&self.rx).data.extend(bytes.iter().copied());
    }
}

fn lock(pipe: &Arc<Mutex<Pipe>>) -> MutexGuard<'_, Pipe> {
    // A poisoned pipe still holds consistent bytes; keep going.
    pipe.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(std::io::Error::new(
                ErrorKind::NotConnected,
                "memory stream closed",
            ));
        }
        let mut pipe = lock(&self.rx);
        if pipe.data.is_empty() {
            if pipe.writer_closed || buf.is_empty() {
                return Ok(0);
            }
            return Err(std::io::Error::from(ErrorKind::WouldBlock));
        }
        let limit = self.max_read.unwrap_or(usize::MAX);
        let n = buf.len().min(pipe.data.len()).min(limit);
        for (slot, byte) in buf.iter_mut().zip(pipe.data.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "memory stream closed",
            ));
        }
        lock(&self.tx).data.extend(buf.iter().copied());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Transport for MemoryStream {
    fn close(&mut self) -> std::io::Result<()> {
        if !self.closed {
            self.closed = true;
            lock(&self.tx).writer_closed = true;
        }
        Ok(())
    }
}
