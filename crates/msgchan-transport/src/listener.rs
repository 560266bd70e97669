use std::net::TcpListener;
#[cfg(unix)]
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
#[cfg(unix)]
use std::os::unix::net::UnixListener;
use std::path::Path;

use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::traits::IpcStream;

/// Accepting side of a socket transport.
///
/// Unix sockets get stale-socket cleanup on bind, a restrictive file mode,
/// and removal of the socket file on drop (only if it is still the file we
/// created).
pub struct SocketListener {
    inner: ListenerInner,
    endpoint: Endpoint,
}

enum ListenerInner {
    #[cfg(unix)]
    Unix {
        listener: UnixListener,
        created_inode: (u64, u64),
    },
    Tcp(TcpListener),
}

impl SocketListener {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// `sockaddr_un.sun_path` is 108 bytes on Linux, 104 elsewhere.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on an endpoint.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        match endpoint {
            #[cfg(unix)]
            Endpoint::Unix(path) => Self::bind_unix(path, Self::DEFAULT_SOCKET_MODE),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(TransportError::Unsupported(endpoint.to_string())),
            Endpoint::Tcp(addr) => {
                let listener =
                    TcpListener::bind(addr.as_str()).map_err(|source| TransportError::Bind {
                        endpoint: endpoint.to_string(),
                        source,
                    })?;
                // Report the real port when bound to port 0.
                let bound = match listener.local_addr() {
                    Ok(local) => Endpoint::Tcp(local.to_string()),
                    Err(_) => endpoint.clone(),
                };
                info!(endpoint = %bound, "listening on tcp socket");
                Ok(Self {
                    inner: ListenerInner::Tcp(listener),
                    endpoint: bound,
                })
            }
        }
    }

    /// Bind a Unix domain socket at `path` with an explicit file mode.
    ///
    /// An existing socket file at `path` is treated as stale and removed; any
    /// other kind of file is left alone and the bind fails.
    #[cfg(unix)]
    pub fn bind_unix(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let endpoint = Endpoint::Unix(path.clone());
        let bind_err = |source: std::io::Error| TransportError::Bind {
            endpoint: endpoint.to_string(),
            source,
        };

        let len = path.as_os_str().len();
        if len >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len,
                max: Self::MAX_PATH_LEN,
            });
        }

        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
            .map_err(bind_err)?;
        let created = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "listening on unix domain socket");

        Ok(Self {
            inner: ListenerInner::Unix {
                listener,
                created_inode: (created.dev(), created.ino()),
            },
            endpoint,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<IpcStream> {
        let stream = match &self.inner {
            #[cfg(unix)]
            ListenerInner::Unix { listener, .. } => {
                let (stream, _addr) = listener.accept().map_err(TransportError::Accept)?;
                IpcStream::from_unix(stream)
            }
            ListenerInner::Tcp(listener) => {
                let (stream, addr) = listener.accept().map_err(TransportError::Accept)?;
                stream.set_nodelay(true)?;
                debug!(%addr, "accepted tcp peer");
                IpcStream::from_tcp(stream)
            }
        };
        debug!(endpoint = %self.endpoint, "accepted connection");
        Ok(stream)
    }

    /// The endpoint this listener is bound to.
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Drop for SocketListener {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let (ListenerInner::Unix { created_inode, .. }, Endpoint::Unix(path)) =
            (&self.inner, &self.endpoint)
        {
            let Ok(metadata) = std::fs::symlink_metadata(path) else {
                return;
            };
            if metadata.file_type().is_socket() && (metadata.dev(), metadata.ino()) == *created_inode
            {
                debug!(?path, "cleaning up socket file");
                let _ = std::fs::remove_file(path);
            } else {
                debug!(?path, "socket path identity changed; skipping cleanup");
            }
        }
    }
}
