//! Blocking WebSocket client connection.
//!
//! Owns the socket, performs the upgrade handshake and turns the byte stream
//! into text messages and back.
//!
//! # Read-ahead Buffer
//!
//! Every byte read from the socket lands in one buffer first. The handshake
//! may read past the response header into the first frame, and a frame may
//! arrive across several reads; frames are only cut from the buffer once
//! complete, so a read that hits its deadline never loses bytes.
//!
//! # Control Frames
//!
//! | Opcode | Handling |
//! |--------|----------|
//! | ping | answered with a pong carrying the same payload |
//! | pong | ignored |
//! | close | `receive_text` returns `None`, connection stops reading |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::options::ClientOptions;

use super::frame::{self, Frame, NORMAL_CLOSURE, Opcode};
use super::handshake::{self, Endpoint, MAX_RESPONSE_HEADER};
use super::random::{RandomSource, ThreadRandom};
use super::stream::MaybeTlsStream;

// ============================================================================
// Constants
// ============================================================================

/// Bytes requested from the socket per read.
const READ_CHUNK: usize = 8 * 1024;

/// Bound on the best-effort close frame write.
const CLOSE_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle of a [`WebSocket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket open, handshake in progress.
    Connecting,
    /// Handshake complete, messages flow.
    Open,
    /// Peer sent a close frame.
    Closing,
    /// Socket released or peer hung up.
    Closed,
}

// ============================================================================
// WebSocket
// ============================================================================

/// Client side of a WebSocket connection.
///
/// All I/O is synchronous and bounded by the timeout passed to each call.
/// One owner at a time: every I/O method takes `&mut self`.
pub struct WebSocket {
    /// Socket, `None` once closed.
    stream: Option<MaybeTlsStream>,
    /// Bytes read but not yet consumed as frames.
    buffer: Vec<u8>,
    /// Lifecycle state.
    state: ConnectionState,
    /// Handshake keys and frame masks.
    rng: Box<dyn RandomSource>,
    /// Frames announcing a larger payload are rejected.
    max_frame_size: usize,
}

impl fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocket")
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .field("max_frame_size", &self.max_frame_size)
            .finish_non_exhaustive()
    }
}

impl WebSocket {
    /// Connects to `url` and completes the upgrade handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedScheme`] for schemes other than `ws`/`wss`
    /// - [`Error::HandshakeTimeout`] if the response header is not complete in time
    /// - [`Error::HandshakeRejected`] if the status is not `101`
    /// - [`Error::ConnectionClosed`] if the peer hangs up during the handshake
    pub fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let options = ClientOptions::new().with_connect_timeout(timeout);
        Self::connect_with(url, &options, Box::new(ThreadRandom))
    }

    /// Connects with explicit options and randomness source.
    ///
    /// # Errors
    ///
    /// See [`WebSocket::connect`].
    pub fn connect_with(
        url: &str,
        options: &ClientOptions,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        let endpoint = Endpoint::parse(url)?;
        let timeout = options.connect_timeout;
        let deadline = Instant::now().checked_add(timeout);

        debug!(
            host = %endpoint.host,
            port = endpoint.port,
            secure = endpoint.secure,
            "Connecting WebSocket"
        );

        let stream =
            MaybeTlsStream::connect(&endpoint.host, endpoint.port, endpoint.secure, timeout)?;

        let mut ws = Self {
            stream: Some(stream),
            buffer: Vec::new(),
            state: ConnectionState::Connecting,
            rng,
            max_frame_size: options.max_frame_size,
        };

        ws.handshake(&endpoint, deadline, timeout)?;
        Ok(ws)
    }

    /// Sends the upgrade request and waits for the response header block.
    fn handshake(
        &mut self,
        endpoint: &Endpoint,
        deadline: Option<Instant>,
        timeout: Duration,
    ) -> Result<()> {
        let key = self.rng.handshake_key();
        let request = handshake::build_request(endpoint, &key);

        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        stream.write_all(request.as_bytes())?;
        stream.flush()?;

        let header_len = loop {
            if let Some(end) = handshake::header_end(&self.buffer) {
                break end;
            }
            if self.buffer.len() > MAX_RESPONSE_HEADER {
                return Err(Error::protocol("handshake response header too large"));
            }
            if !self.fill_buffer(deadline)? {
                return Err(Error::handshake_timeout(timeout));
            }
        };

        // Anything after the header block is the start of the first frame.
        let header: Vec<u8> = self.buffer.drain(..header_len).collect();
        handshake::check_response(&header)?;

        self.state = ConnectionState::Open;
        debug!(
            resource = %endpoint.resource,
            leftover = self.buffer.len(),
            "WebSocket handshake completed"
        );

        Ok(())
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `true` while messages can be sent and received.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Returns the number of read-ahead bytes not yet consumed.
    #[inline]
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the remote address, if the socket is still held.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.tcp().peer_addr().ok())
    }

    /// Sends a text message as a single masked frame.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection is not open
    /// - [`Error::Io`] if the write fails
    pub fn send_text(&mut self, message: &str) -> Result<()> {
        self.ensure_open()?;
        self.send_frame(Opcode::Text, message.as_bytes())
    }

    /// Receives the next text message.
    ///
    /// Pings are answered and pongs skipped without returning. `None` means
    /// the peer sent a close frame. A `timeout` of `None`, or one too large
    /// to form a deadline, blocks indefinitely.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if no complete text frame arrives in time
    /// - [`Error::ConnectionClosed`] if the socket reaches EOF or the
    ///   connection is no longer open
    /// - [`Error::MalformedMessage`] if a text frame is not UTF-8
    /// - [`Error::Protocol`] if a frame exceeds the size limit
    pub fn receive_text(&mut self, timeout: Option<Duration>) -> Result<Option<String>> {
        self.ensure_open()?;
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        loop {
            let Some(frame) = self.read_frame(deadline)? else {
                return Err(Error::timeout(
                    "receive WebSocket frame",
                    timeout.unwrap_or_default(),
                ));
            };

            match frame.opcode {
                Opcode::Text => {
                    if !frame.fin {
                        warn!("Fragmented text frame received; fragments are not reassembled");
                    }
                    return String::from_utf8(frame.payload)
                        .map(Some)
                        .map_err(|e| Error::malformed(format!("text frame is not UTF-8: {e}")));
                }
                Opcode::Close => {
                    let code = frame
                        .payload
                        .get(..2)
                        .map(|b| u16::from_be_bytes([b[0], b[1]]));
                    debug!(?code, "Close frame received");
                    self.state = ConnectionState::Closing;
                    return Ok(None);
                }
                Opcode::Ping => {
                    trace!(len = frame.payload.len(), "Ping received, sending pong");
                    self.send_frame(Opcode::Pong, &frame.payload)?;
                }
                Opcode::Pong => {
                    trace!("Pong received");
                }
                other => {
                    warn!(opcode = ?other, len = frame.payload.len(), "Ignoring frame");
                }
            }
        }
    }

    /// Closes the connection.
    ///
    /// Sends a normal-closure frame when possible, then releases the socket.
    /// Failures are swallowed; calling it again does nothing.
    pub fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        if matches!(
            self.state,
            ConnectionState::Open | ConnectionState::Closing
        ) {
            let mask = self.rng.mask();
            let bytes = frame::encode(Opcode::Close, &frame::close_payload(NORMAL_CLOSURE), mask);
            let _ = stream.tcp().set_write_timeout(Some(CLOSE_WRITE_TIMEOUT));
            if let Err(e) = stream.write_all(&bytes).and_then(|()| stream.flush()) {
                debug!(error = %e, "Close frame not sent");
            }
        }

        stream.shutdown();
        self.buffer.clear();
        self.state = ConnectionState::Closed;

        debug!("WebSocket closed");
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::ConnectionClosed)
        }
    }

    fn send_frame(&mut self, opcode: Opcode, payload: &[u8]) -> Result<()> {
        let mask = self.rng.mask();
        let bytes = frame::encode(opcode, payload, mask);

        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        stream.write_all(&bytes)?;
        stream.flush()?;

        trace!(?opcode, len = payload.len(), "Frame sent");
        Ok(())
    }

    /// Cuts the next complete frame from the buffer, reading as needed.
    ///
    /// Returns `None` once the deadline passes without a complete frame.
    fn read_frame(&mut self, deadline: Option<Instant>) -> Result<Option<Frame>> {
        loop {
            if let Some(header) = frame::decode_header(&self.buffer) {
                if header.payload_len > self.max_frame_size as u64 {
                    return Err(Error::protocol(format!(
                        "frame payload of {} bytes exceeds limit of {}",
                        header.payload_len, self.max_frame_size
                    )));
                }
                if let Some((frame, consumed)) = frame::decode(&self.buffer) {
                    self.buffer.drain(..consumed);
                    trace!(opcode = ?frame.opcode, len = frame.payload.len(), "Frame received");
                    return Ok(Some(frame));
                }
            }

            if !self.fill_buffer(deadline)? {
                return Ok(None);
            }
        }
    }

    /// Reads one chunk from the socket into the buffer.
    ///
    /// Returns `false` if the deadline passes first.
    fn fill_buffer(&mut self, deadline: Option<Instant>) -> Result<bool> {
        let remaining = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Ok(false);
                }
                Some(remaining)
            }
            None => None,
        };

        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        stream.set_read_timeout(remaining)?;

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => {
                    debug!(state = ?self.state, "Peer closed the socket");
                    self.state = ConnectionState::Closed;
                    return Err(Error::ConnectionClosed);
                }
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for WebSocket {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Tests
// ============================================================================
