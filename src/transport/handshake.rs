//! Opening HTTP upgrade handshake.
//!
//! Builds the client upgrade request and validates the server response. The
//! socket side of the exchange lives in the connection; everything here is a
//! pure function over strings and bytes.

// ============================================================================
// Imports
// ============================================================================

use url::{Position, Url};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// End of the HTTP header block.
pub(crate) const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Upper bound on the size of the upgrade response header block.
pub(crate) const MAX_RESPONSE_HEADER: usize = 16 * 1024;

/// WebSocket protocol version sent in `Sec-WebSocket-Version`.
const WEBSOCKET_VERSION: u8 = 13;

// ============================================================================
// Endpoint
// ============================================================================

/// Connection target extracted from a `ws://` or `wss://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or address, without IPv6 brackets.
    pub host: String,
    /// TCP port (80/443 when the URL has none).
    pub port: u16,
    /// `true` for `wss`.
    pub secure: bool,
    /// Path plus query, `/` at minimum.
    pub resource: String,
}

impl Endpoint {
    /// Parses a WebSocket URL.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if the URL does not parse
    /// - [`Error::UnsupportedScheme`] for anything but `ws`/`wss`
    /// - [`Error::MissingHost`] if no host is present
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)?;

        let secure = match url.scheme() {
            "ws" => false,
            "wss" => true,
            other => return Err(Error::unsupported_scheme(other)),
        };

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| Error::missing_host(raw))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        let port = url.port().unwrap_or(if secure { 443 } else { 80 });

        let resource = match &url[Position::BeforePath..Position::AfterQuery] {
            "" => "/".to_string(),
            path => path.to_string(),
        };

        Ok(Self {
            host,
            port,
            secure,
            resource,
        })
    }

    /// Value of the `Host` header.
    #[must_use]
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

// ============================================================================
// Request / Response
// ============================================================================

/// Builds the HTTP/1.1 upgrade request.
#[must_use]
pub fn build_request(endpoint: &Endpoint, key: &str) -> String {
    format!(
        "GET {resource} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: {WEBSOCKET_VERSION}\r\n\r\n",
        resource = endpoint.resource,
        host = endpoint.authority(),
    )
}

/// Returns the offset just past the header terminator, if present.
#[must_use]
pub fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
        .map(|pos| pos + HEADER_TERMINATOR.len())
}

/// Checks that the response header block switches protocols.
///
/// # Errors
///
/// Returns [`Error::HandshakeRejected`] with the status line otherwise.
pub fn check_response(header: &[u8]) -> Result<()> {
    let text = String::from_utf8_lossy(header);
    let status_line = text.lines().next().unwrap_or_default().trim();

    if status_line.split_whitespace().nth(1) == Some("101") {
        Ok(())
    } else {
        Err(Error::handshake_rejected(status_line))
    }
}

// ============================================================================
// Tests
// ============================================================================
