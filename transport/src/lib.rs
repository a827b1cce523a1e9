// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Unix-domain stream socket transport, grounded on
//! `original_source/trunk/lib/facund_connection.c`. A `Connection` wraps
//! exactly one listening (or connecting) socket plus, while a session is
//! active, one peer socket -- nothing about protocol framing or call
//! dispatch lives here, see `facund-proto` for that.

use std::fmt;
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use nix::sys::stat::{fchmod, Mode};
use nix::unistd::unlink;

/// Errors a transport operation can raise, shaped like the error enums
/// elsewhere in this workspace: one variant per failure domain plus a
/// blanket `Io` for anything that bubbles up from the standard library.
#[derive(Debug)]
pub enum Error {
    /// `bind`, `listen`, or `connect` failed.
    Setup(io::Error),

    /// `chmod` on the freshly-bound socket file failed.
    Chmod(nix::Error),

    /// Attempted to send or receive without an attached peer.
    NoPeer,

    /// The underlying socket was closed by the remote end (`recv` returned 0).
    PeerClosed,

    Io(io::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(e) => write!(f, "transport setup failed: {e}"),
            Self::Chmod(e) => write!(f, "chmod on socket path failed: {e}"),
            Self::NoPeer => write!(f, "no peer attached to connection"),
            Self::PeerClosed => write!(f, "peer closed the connection"),
            Self::Io(e) => write!(f, "transport I/O error: {e}"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// World read/write, matching spec §4.6's "chmoded to world read/write on
/// creation" requirement for the daemon's well-known socket path.
const SOCKET_MODE: Mode = Mode::from_bits_truncate(0o777);

enum Role {
    /// Listening socket plus, once a peer has connected, that peer.
    Server {
        listener: UnixListener,
        peer: Option<UnixStream>,
    },
    /// A single connected socket, used by clients.
    Client(UnixStream),
}

/// A stream-socket connection over a fixed filesystem path.
pub struct Connection {
    path: PathBuf,
    do_unlink: bool,
    role: Role,
}

impl Connection {
    /// Creates a stream socket of the local family, binds it to `path`,
    /// chmods it world read/write, and starts listening with backlog 1 --
    /// this daemon only ever talks to one peer at a time (spec §4.6).
    pub fn listen(path: impl AsRef<Path>) -> Result<Connection, Error> {
        let path = path.as_ref().to_path_buf();
        let listener = UnixListener::bind(&path).map_err(Error::Setup)?;

        fchmod(listener.as_raw_fd(), SOCKET_MODE).map_err(Error::Chmod)?;

        // backlog is fixed by UnixListener::bind; nothing further to configure.
        listener.set_nonblocking(false).map_err(Error::Setup)?;

        Ok(Connection {
            path,
            do_unlink: true,
            role: Role::Server {
                listener,
                peer: None,
            },
        })
    }

    /// Connects to an existing listening socket at `path`.
    pub fn connect(path: impl AsRef<Path>) -> Result<Connection, Error> {
        let path = path.as_ref().to_path_buf();
        let stream = UnixStream::connect(&path).map_err(Error::Setup)?;
        Ok(Connection {
            path,
            do_unlink: false,
            role: Role::Client(stream),
        })
    }

    /// Blocks until a peer connects. A no-op, not an error, if a peer is
    /// already attached -- mirrors `facund_accept`'s early return.
    pub fn accept(&mut self) -> Result<(), Error> {
        match &mut self.role {
            Role::Server { listener, peer } => {
                if peer.is_some() {
                    return Ok(());
                }
                let (stream, _addr) = listener.accept().map_err(Error::Setup)?;
                debug!("accepted connection on {}", self.path.display());
                *peer = Some(stream);
                Ok(())
            }
            Role::Client(_) => Ok(()),
        }
    }

    fn peer_mut(&mut self) -> Result<&mut UnixStream, Error> {
        match &mut self.role {
            Role::Server { peer, .. } => peer.as_mut().ok_or(Error::NoPeer),
            Role::Client(stream) => Ok(stream),
        }
    }

    /// Sends the full contents of `msg` to the attached peer.
    pub fn send(&mut self, msg: &[u8]) -> Result<(), Error> {
        self.peer_mut()?.write_all(msg)?;
        Ok(())
    }

    /// Reads up to `buf.len()` bytes from the attached peer. Returns the
    /// number of bytes read; `Ok(0)` means the peer has shut down its write
    /// side cleanly and the caller should treat the session as over.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        Ok(self.peer_mut()?.read(buf)?)
    }

    /// Closes the active peer socket but keeps the listening socket around
    /// so a later `accept` can serve the next client.
    pub fn close_peer(&mut self) {
        match &mut self.role {
            Role::Server { peer, .. } => {
                *peer = None;
            }
            Role::Client(_) => {}
        }
    }

    /// Whether a peer is currently attached.
    pub fn has_peer(&self) -> bool {
        match &self.role {
            Role::Server { peer, .. } => peer.is_some(),
            Role::Client(_) => true,
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.do_unlink {
            if let Err(e) = unlink(&self.path) {
                warn!("failed to unlink socket path {}: {e}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read as _, Write as _};

    #[test]
    fn server_accepts_and_echoes() {
        let dir = std::env::temp_dir().join(format!("facund-transport-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let sock_path = dir.join("sock");

        let mut server = Connection::listen(&sock_path).unwrap();
        assert!(sock_path.exists());

        let mut client = UnixStream::connect(&sock_path).unwrap();
        server.accept().unwrap();
        assert!(server.has_peer());

        client.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        let n = server.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");

        server.send(b"world").unwrap();
        let mut reply = [0u8; 5];
        client.read_exact(&mut reply).unwrap();
        assert_eq!(&reply, b"world");

        drop(server);
        assert!(!sock_path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn second_accept_is_a_noop_while_peer_attached() {
        let dir = std::env::temp_dir().join(format!("facund-transport-test2-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let sock_path = dir.join("sock");

        let mut server = Connection::listen(&sock_path).unwrap();
        let _client = UnixStream::connect(&sock_path).unwrap();
        server.accept().unwrap();
        // no second client waiting; this must return immediately, not block
        server.accept().unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn send_without_peer_fails() {
        let dir = std::env::temp_dir().join(format!("facund-transport-test3-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let sock_path = dir.join("sock");

        let mut server = Connection::listen(&sock_path).unwrap();
        assert!(matches!(server.send(b"x"), Err(Error::NoPeer)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
