use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A byte-stream collaborator a channel can be bound to.
///
/// Reads follow the usual `std::io` conventions: `Ok(0)` is end-of-stream,
/// `WouldBlock`/`TimedOut` mean nothing is available right now.
pub trait Transport: Read + Write {
    /// Close the stream. Closing twice is not an error.
    fn close(&mut self) -> std::io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn close(&mut self) -> std::io::Result<()> {
        (**self).close()
    }
}

/// A connected socket stream, Unix domain or TCP.
pub struct IpcStream {
    inner: IpcStreamInner,
}

enum IpcStreamInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
    Tcp(TcpStream),
}

impl Read for IpcStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.read(buf),
            IpcStreamInner::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for IpcStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.write(buf),
            IpcStreamInner::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.flush(),
            IpcStreamInner::Tcp(stream) => stream.flush(),
        }
    }
}

impl Transport for IpcStream {
    fn close(&mut self) -> std::io::Result<()> {
        let result = match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.shutdown(Shutdown::Both),
            IpcStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both),
        };
        match result {
            // Already torn down by the peer.
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

impl IpcStream {
    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: IpcStreamInner::Unix(stream),
        }
    }

    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: IpcStreamInner::Tcp(stream),
        }
    }

    /// Set read timeout on the underlying stream.
    ///
    /// A read that times out surfaces as `WouldBlock`/`TimedOut`, which the
    /// frame decoder treats as "no more data for now".
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            IpcStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            IpcStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Switch the stream between blocking and non-blocking mode.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.set_nonblocking(nonblocking).map_err(Into::into),
            IpcStreamInner::Tcp(stream) => stream.set_nonblocking(nonblocking).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
            IpcStreamInner::Tcp(stream) => Ok(Self::from_tcp(stream.try_clone()?)),
        }
    }

    /// Short transport name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(_) => "unix",
            IpcStreamInner::Tcp(_) => "tcp",
        }
    }

    /// Connected pair of Unix domain streams.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }
}

impl std::fmt::Debug for IpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcStream")
            .field("type", &self.kind())
            .finish()
    }
}
