use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::IpcStream;

/// Address of a socket transport.
///
/// Textual forms: `unix:<path>`, `tcp:<host>:<port>`, or a bare path which
/// is taken as a Unix socket path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl Endpoint {
    /// Parse an endpoint string.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TransportError::InvalidEndpoint {
                input: input.to_string(),
                reason: "endpoint must not be empty",
            });
        }

        if let Some(path) = trimmed.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(TransportError::InvalidEndpoint {
                    input: input.to_string(),
                    reason: "missing socket path",
                });
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        if let Some(addr) = trimmed.strip_prefix("tcp:") {
            match addr.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                    return Ok(Self::Tcp(addr.to_string()));
                }
                _ => {
                    return Err(TransportError::InvalidEndpoint {
                        input: input.to_string(),
                        reason: "expected tcp:<host>:<port>",
                    })
                }
            }
        }

        Ok(Self::Unix(PathBuf::from(trimmed)))
    }

    /// Unix socket endpoint for a filesystem path.
    pub fn unix(path: impl AsRef<Path>) -> Self {
        Self::Unix(path.as_ref().to_path_buf())
    }

    /// Connect to a listening endpoint (blocking).
    pub fn connect(&self) -> Result<IpcStream> {
        match self {
            #[cfg(unix)]
            Self::Unix(path) => {
                let stream = std::os::unix::net::UnixStream::connect(path).map_err(|source| {
                    TransportError::Connect {
                        endpoint: self.to_string(),
                        source,
                    }
                })?;
                debug!(endpoint = %self, "connected");
                Ok(IpcStream::from_unix(stream))
            }
            #[cfg(not(unix))]
            Self::Unix(_) => Err(TransportError::Unsupported(self.to_string())),
            Self::Tcp(addr) => {
                let stream = std::net::TcpStream::connect(addr.as_str()).map_err(|source| {
                    TransportError::Connect {
                        endpoint: self.to_string(),
                        source,
                    }
                })?;
                stream.set_nodelay(true)?;
                debug!(endpoint = %self, "connected");
                Ok(IpcStream::from_tcp(stream))
            }
        }
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix:{}", path.display()),
            Self::Tcp(addr) => write!(f, "tcp:{addr}"),
        }
    }
}
