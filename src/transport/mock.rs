//! Scripted WebSocket peer for tests.
//!
//! Binds a local listener, accepts one connection on a background thread and
//! hands it to a script that speaks raw server-side frames.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::Value;

use super::frame::{self, Frame, Opcode};
use super::handshake::header_end;

/// Response to a successful upgrade.
pub(crate) const SWITCHING_PROTOCOLS: &str = "HTTP/1.1 101 Switching Protocols\r\n\
    Upgrade: websocket\r\n\
    Connection: Upgrade\r\n\
    Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n";

/// Encodes an unmasked server-to-client frame.
pub(crate) fn server_frame(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x80 | opcode.bits()];
    let len = payload.len();
    if len < 126 {
        out.push(len as u8);
    } else if let Ok(len16) = u16::try_from(len) {
        out.push(126);
        out.extend_from_slice(&len16.to_be_bytes());
    } else {
        out.push(127);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }
    out.extend_from_slice(payload);
    out
}

pub(crate) struct MockPeer {
    listener: TcpListener,
}

impl MockPeer {
    pub(crate) fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock peer");
        Self { listener }
    }

    pub(crate) fn url(&self) -> String {
        let port = self.listener.local_addr().expect("local addr").port();
        format!("ws://127.0.0.1:{port}/devtools/page/mock")
    }

    /// Accepts one connection and runs `script` against it.
    pub(crate) fn spawn<F>(self, script: F) -> JoinHandle<()>
    where
        F: FnOnce(PeerConn) + Send + 'static,
    {
        thread::spawn(move || {
            let (stream, _) = self.listener.accept().expect("accept");
            stream
                .set_read_timeout(Some(Duration::from_secs(10)))
                .expect("peer read timeout");
            script(PeerConn {
                stream,
                buf: Vec::new(),
            });
        })
    }
}

pub(crate) struct PeerConn {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl PeerConn {
    fn fill(&mut self) -> usize {
        let mut chunk = [0u8; 4096];
        let n = self.stream.read(&mut chunk).expect("peer read");
        self.buf.extend_from_slice(&chunk[..n]);
        n
    }

    /// Reads the client's upgrade request header block.
    pub(crate) fn read_request(&mut self) -> String {
        loop {
            if let Some(end) = header_end(&self.buf) {
                let header: Vec<u8> = self.buf.drain(..end).collect();
                return String::from_utf8(header).expect("ascii request");
            }
            assert!(self.fill() > 0, "client closed during handshake");
        }
    }

    /// Reads the request and answers `101 Switching Protocols`.
    pub(crate) fn accept_upgrade(&mut self) -> String {
        let request = self.read_request();
        self.write_raw(SWITCHING_PROTOCOLS.as_bytes());
        request
    }

    pub(crate) fn write_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).expect("peer write");
        self.stream.flush().expect("peer flush");
    }

    pub(crate) fn send_frame(&mut self, opcode: Opcode, payload: &[u8]) {
        self.write_raw(&server_frame(opcode, payload));
    }

    pub(crate) fn send_text(&mut self, text: &str) {
        self.send_frame(Opcode::Text, text.as_bytes());
    }

    pub(crate) fn send_json(&mut self, value: &Value) {
        self.send_text(&value.to_string());
    }

    /// Reads one client frame, unmasked.
    pub(crate) fn read_frame(&mut self) -> Frame {
        loop {
            if let Some((frame, consumed)) = frame::decode(&self.buf) {
                self.buf.drain(..consumed);
                return frame;
            }
            assert!(self.fill() > 0, "client closed mid-frame");
        }
    }

    /// Reads one client text frame as JSON.
    pub(crate) fn read_json(&mut self) -> Value {
        let frame = self.read_frame();
        assert_eq!(frame.opcode, Opcode::Text);
        serde_json::from_slice(&frame.payload).expect("client JSON")
    }

    /// Blocks until the client closes its side.
    pub(crate) fn wait_eof(&mut self) {
        let mut chunk = [0u8; 1024];
        while matches!(self.stream.read(&mut chunk), Ok(n) if n > 0) {}
    }
}
