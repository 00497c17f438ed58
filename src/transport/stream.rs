//! Plain or TLS-wrapped TCP stream.
//!
//! The connection needs a single [`Read`] + [`Write`] type whose underlying
//! socket is still reachable for read timeouts and shutdown.

// ============================================================================
// Imports
// ============================================================================

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// MaybeTlsStream
// ============================================================================

/// Socket carrying the WebSocket connection.
#[derive(Debug)]
pub enum MaybeTlsStream {
    /// Unencrypted `ws://` connection.
    Plain(TcpStream),
    /// `wss://` connection.
    #[cfg(feature = "tls")]
    Tls(Box<native_tls::TlsStream<TcpStream>>),
}

impl MaybeTlsStream {
    /// Opens a TCP connection, wrapping it in TLS when `secure` is set.
    ///
    /// Each resolved address is tried in turn; the whole attempt, TLS
    /// negotiation included, is bounded by `timeout`. A timeout too large to
    /// form a deadline means no overall deadline.
    ///
    /// # Errors
    ///
    /// - [`Error::HandshakeTimeout`] if the deadline passes
    /// - [`Error::Tls`] if TLS negotiation fails
    /// - [`Error::Io`] if no address accepts the connection
    pub fn connect(host: &str, port: u16, secure: bool, timeout: Duration) -> Result<Self> {
        let deadline = Instant::now().checked_add(timeout);
        let tcp = connect_tcp(host, port, deadline, timeout)?;

        if secure {
            Self::wrap_tls(host, tcp, timeout)
        } else {
            Ok(Self::Plain(tcp))
        }
    }

    #[cfg(feature = "tls")]
    fn wrap_tls(host: &str, tcp: TcpStream, timeout: Duration) -> Result<Self> {
        use native_tls::{HandshakeError, TlsConnector};

        tcp.set_read_timeout(Some(timeout))?;
        tcp.set_write_timeout(Some(timeout))?;

        let connector = TlsConnector::new().map_err(|e| Error::tls(e.to_string()))?;
        match connector.connect(host, tcp) {
            Ok(stream) => {
                debug!(host, "TLS session established");
                Ok(Self::Tls(Box::new(stream)))
            }
            Err(HandshakeError::WouldBlock(_)) => Err(Error::handshake_timeout(timeout)),
            Err(HandshakeError::Failure(e)) => Err(Error::tls(e.to_string())),
        }
    }

    #[cfg(not(feature = "tls"))]
    fn wrap_tls(_host: &str, _tcp: TcpStream, _timeout: Duration) -> Result<Self> {
        Err(Error::tls("wss:// requires the `tls` feature"))
    }

    /// Returns the underlying TCP socket.
    #[must_use]
    pub fn tcp(&self) -> &TcpStream {
        match self {
            Self::Plain(tcp) => tcp,
            #[cfg(feature = "tls")]
            Self::Tls(tls) => tls.get_ref(),
        }
    }

    /// Sets the read timeout of the underlying socket.
    ///
    /// `Some(Duration::ZERO)` is rejected by the OS; callers pass `None` to
    /// block or a positive duration.
    #[inline]
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.tcp().set_read_timeout(timeout)
    }

    /// Shuts down both directions, ignoring errors.
    pub fn shutdown(&mut self) {
        match self {
            Self::Plain(tcp) => {
                let _ = tcp.shutdown(Shutdown::Both);
            }
            #[cfg(feature = "tls")]
            Self::Tls(tls) => {
                let _ = tls.shutdown();
                let _ = tls.get_ref().shutdown(Shutdown::Both);
            }
        }
    }
}

/// Connects to the first reachable address for `host:port`.
fn connect_tcp(
    host: &str,
    port: u16,
    deadline: Option<Instant>,
    timeout: Duration,
) -> Result<TcpStream> {
    let mut last_err = None;

    for addr in (host, port).to_socket_addrs()? {
        let remaining = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => timeout,
        };
        if remaining.is_zero() {
            return Err(Error::handshake_timeout(timeout));
        }

        match TcpStream::connect_timeout(&addr, remaining) {
            Ok(tcp) => {
                tcp.set_nodelay(true)?;
                debug!(%addr, "TCP connection established");
                return Ok(tcp);
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                last_err = Some(Error::handshake_timeout(timeout));
            }
            Err(e) => last_err = Some(Error::Io(e)),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses resolved for {host}:{port}"),
        ))
    }))
}

// ============================================================================
// Read / Write
// ============================================================================

impl Read for MaybeTlsStream {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(tcp) => tcp.read(buf),
            #[cfg(feature = "tls")]
            Self::Tls(tls) => tls.read(buf),
        }
    }
}

impl Write for MaybeTlsStream {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(tcp) => tcp.write(buf),
            #[cfg(feature = "tls")]
            Self::Tls(tls) => tls.write(buf),
        }
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(tcp) => tcp.flush(),
            #[cfg(feature = "tls")]
            Self::Tls(tls) => tls.flush(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
