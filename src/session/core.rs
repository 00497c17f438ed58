//! Core Session struct: calls, correlation and the pending-event queue.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CallId, CallIdGenerator};
use crate::options::{ClientOptions, DEFAULT_POLL_INTERVAL};
use crate::protocol::{Event, Message, Request, Response};
use crate::transport::{ThreadRandom, WebSocket};

// ============================================================================
// Types
// ============================================================================

/// The call currently awaiting its response.
#[derive(Debug)]
struct PendingCall<'a> {
    id: CallId,
    method: &'a str,
    issued_at: Instant,
}

// ============================================================================
// Session
// ============================================================================

/// RPC session over a single WebSocket connection.
///
/// Requests are correlated with responses by id. Anything read while
/// waiting that is not the awaited response (events, stray responses) is kept
/// in arrival order for later [`Session::poll_event`] calls.
///
/// There is no background reader: each call drives the socket itself until
/// it finds what it needs.
///
/// # Example
///
/// ```ignore
/// use devtools_rpc::{ClientOptions, Session};
/// use serde_json::json;
///
/// let mut session = Session::connect(ws_url, &ClientOptions::default())?;
/// session.call("Page.enable", None)?;
/// session.call("Page.navigate", Some(json!({"url": "https://example.com"})))?;
/// let loaded = session.poll_event("Page.loadEventFired", Duration::from_secs(10))?;
/// ```
pub struct Session {
    /// Underlying connection.
    ws: WebSocket,
    /// Correlation id counter.
    ids: CallIdGenerator,
    /// Messages read but not yet consumed, in arrival order.
    pending: VecDeque<Message>,
    /// Deadline used by [`Session::call`].
    call_timeout: Duration,
    /// Pause between attempts in polling helpers.
    poll_interval: Duration,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("ws", &self.ws)
            .field("next_id", &self.ids.peek())
            .field("pending", &self.pending.len())
            .field("call_timeout", &self.call_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Session {
    /// Connects to a WebSocket debugger URL.
    ///
    /// # Errors
    ///
    /// Any error from [`WebSocket::connect_with`].
    pub fn connect(url: &str, options: &ClientOptions) -> Result<Self> {
        let ws = WebSocket::connect_with(url, options, Box::new(ThreadRandom))?;
        Ok(Self::new(ws, options.call_timeout).with_poll_interval(options.poll_interval))
    }

    /// Wraps an open connection.
    #[must_use]
    pub fn new(ws: WebSocket, call_timeout: Duration) -> Self {
        Self {
            ws,
            ids: CallIdGenerator::new(),
            pending: VecDeque::new(),
            call_timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the pause between attempts in polling helpers.
    #[inline]
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &WebSocket {
        &self.ws
    }

    /// Returns the default call timeout.
    #[inline]
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Returns the pause between attempts in polling helpers.
    #[inline]
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the number of queued, unconsumed messages.
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Iterates over queued messages in arrival order.
    pub fn pending(&self) -> impl Iterator<Item = &Message> {
        self.pending.iter()
    }

    /// Calls `method` with the default timeout.
    ///
    /// # Errors
    ///
    /// See [`Session::call_with_timeout`].
    pub fn call(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        self.call_with_timeout(method, params, self.call_timeout)
    }

    /// Calls `method` and waits for its response.
    ///
    /// The deadline covers the whole wait, not each read; a timeout too large
    /// to form a deadline waits indefinitely. Returns the `result` field, or
    /// an empty object if it is absent.
    ///
    /// # Errors
    ///
    /// - [`Error::RemoteError`] if the response carries `error`
    /// - [`Error::Timeout`] if no response arrives in time
    /// - [`Error::ConnectionClosed`] if the connection closes first
    /// - [`Error::MalformedMessage`] if the peer sends unusable text
    pub fn call_with_timeout(
        &mut self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        let call = PendingCall {
            id: self.ids.next_id(),
            method,
            issued_at: Instant::now(),
        };
        let deadline = call.issued_at.checked_add(timeout);

        let request = Request::new(call.id, method, params);
        self.ws.send_text(&request.to_json()?)?;
        trace!(id = %call.id, method, "Call sent");

        loop {
            if let Some(response) = self.take_response(call.id) {
                return Self::finish(&call, response);
            }

            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            let message = match self.receive(remaining) {
                Ok(Some(message)) => message,
                Ok(None) => {
                    debug!(id = %call.id, method, "Connection closed while awaiting response");
                    return Err(Error::ConnectionClosed);
                }
                Err(Error::Timeout { .. }) => {
                    debug!(id = %call.id, method, "Call timed out");
                    return Err(Error::timeout(
                        format!("waiting for response to {method}"),
                        timeout,
                    ));
                }
                Err(e) => return Err(e),
            };

            match message {
                Message::Response(response) if response.id == call.id => {
                    return Self::finish(&call, response);
                }
                other => self.enqueue(other, Some(call.id)),
            }
        }
    }

    /// Waits for an event named `method`.
    ///
    /// Queued events are checked first; the first match is removed and
    /// returned. Otherwise new messages are read until the deadline, queuing
    /// everything that does not match.
    ///
    /// Returns `None` on deadline or when the connection closes.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedMessage`] and I/O failures other than closure.
    pub fn poll_event(&mut self, method: &str, timeout: Duration) -> Result<Option<Event>> {
        if let Some(event) = self.take_event(method) {
            trace!(method, "Event found in queue");
            return Ok(Some(event));
        }

        let deadline = Instant::now().checked_add(timeout);
        loop {
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            if remaining.is_some_and(|r| r.is_zero()) {
                return Ok(None);
            }

            match self.receive(remaining) {
                Ok(Some(Message::Event(event))) if event.method == method => {
                    trace!(method, "Event received");
                    return Ok(Some(event));
                }
                Ok(Some(other)) => self.enqueue(other, None),
                Ok(None) | Err(Error::ConnectionClosed) => {
                    debug!(method, "Connection closed while polling for event");
                    return Ok(None);
                }
                Err(Error::Timeout { .. }) => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }

    /// Removes and returns every queued event named `method`, in order.
    pub fn drain_events(&mut self, method: &str) -> Vec<Event> {
        let mut drained = Vec::new();
        let mut kept = VecDeque::with_capacity(self.pending.len());

        for message in self.pending.drain(..) {
            match message {
                Message::Event(event) if event.method == method => drained.push(event),
                other => kept.push_back(other),
            }
        }

        self.pending = kept;
        drained
    }

    /// Closes the connection. Safe to call more than once.
    pub fn close(&mut self) {
        self.ws.close();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn finish(call: &PendingCall<'_>, response: Response) -> Result<Value> {
        trace!(
            id = %call.id,
            method = call.method,
            elapsed_ms = call.issued_at.elapsed().as_millis() as u64,
            error = response.is_error(),
            "Call completed"
        );
        response.into_result()
    }

    /// Reads and classifies one message. `None` waits without a deadline.
    fn receive(&mut self, timeout: Option<Duration>) -> Result<Option<Message>> {
        match self.ws.receive_text(timeout)? {
            Some(text) => Message::parse(&text).map(Some),
            None => Ok(None),
        }
    }

    fn enqueue(&mut self, message: Message, awaiting: Option<CallId>) {
        match &message {
            Message::Response(response) => {
                warn!(id = %response.id, ?awaiting, "Queuing response for another call");
            }
            Message::Event(event) => {
                trace!(method = %event.method, "Queuing event");
            }
        }
        self.pending.push_back(message);
    }

    fn take_response(&mut self, id: CallId) -> Option<Response> {
        let index = self.pending.iter().position(|m| m.id() == Some(id))?;
        match self.pending.remove(index)? {
            Message::Response(response) => Some(response),
            Message::Event(_) => None,
        }
    }

    fn take_event(&mut self, method: &str) -> Option<Event> {
        let index = self
            .pending
            .iter()
            .position(|m| m.method() == Some(method))?;
        match self.pending.remove(index)? {
            Message::Event(event) => Some(event),
            Message::Response(_) => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::transport::frame::{NORMAL_CLOSURE, Opcode};
    use crate::transport::mock::MockPeer;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn connect(url: &str) -> Session {
        Session::connect(url, &ClientOptions::with_timeout(TIMEOUT)).expect("connect")
    }

    #[test]
    fn test_call_skips_event_and_poll_finds_it() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            conn.send_json(&json!({"method": "Some.Event", "params": {}}));
            let request = conn.read_json();
            assert_eq!(request["method"], "Ping");
            conn.send_json(&json!({"id": request["id"], "result": {"ok": true}}));
            conn.wait_eof();
        });

        let mut session = connect(&url);
        let result = session
            .call_with_timeout("Ping", Some(json!({})), TIMEOUT)
            .expect("call");
        assert_eq!(result, json!({"ok": true}));

        let event = session
            .poll_event("Some.Event", Duration::ZERO)
            .expect("poll");
        assert_eq!(event.map(|e| e.method), Some("Some.Event".to_string()));
        assert_eq!(session.pending_len(), 0);

        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_unbounded_timeout_call_and_poll() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            let request = conn.read_json();
            assert_eq!(request["method"], "Ping");
            conn.send_json(&json!({"id": request["id"], "result": {"ok": true}}));
            std::thread::sleep(Duration::from_millis(50));
            conn.send_json(&json!({"method": "Page.loadEventFired", "params": {}}));
            conn.wait_eof();
        });

        let mut session =
            Session::connect(&url, &ClientOptions::with_timeout(Duration::MAX)).expect("connect");
        let result = session
            .call_with_timeout("Ping", None, Duration::MAX)
            .expect("call");
        assert_eq!(result, json!({"ok": true}));

        let event = session
            .poll_event("Page.loadEventFired", Duration::MAX)
            .expect("poll");
        assert!(event.is_some());

        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_poll_interval_taken_from_options() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            conn.wait_eof();
        });

        let interval = Duration::from_millis(75);
        let options = ClientOptions::with_timeout(TIMEOUT).with_poll_interval(interval);
        let mut session = Session::connect(&url, &options).expect("connect");
        assert_eq!(session.poll_interval(), interval);
        assert_eq!(session.call_timeout(), TIMEOUT);

        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_ids_increase_from_one() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            for expected in 1..=3u64 {
                let request = conn.read_json();
                assert_eq!(request["id"], expected);
                assert!(request.get("params").is_none());
                conn.send_json(&json!({"id": expected, "result": {}}));
            }
            conn.wait_eof();
        });

        let mut session = connect(&url);
        for _ in 0..3 {
            session.call("Runtime.enable", None).expect("call");
        }
        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_params_are_sent() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            let request = conn.read_json();
            assert_eq!(request["params"], json!({"url": "about:blank"}));
            conn.send_json(&json!({"id": request["id"], "result": {"frameId": "F"}}));
            conn.wait_eof();
        });

        let mut session = connect(&url);
        let result = session
            .call("Page.navigate", Some(json!({"url": "about:blank"})))
            .expect("call");
        assert_eq!(result["frameId"], "F");
        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_missing_result_is_empty_object() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            let request = conn.read_json();
            conn.send_json(&json!({"id": request["id"]}));
            conn.wait_eof();
        });

        let mut session = connect(&url);
        assert_eq!(session.call("Page.enable", None).expect("call"), json!({}));
        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_remote_error() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            let request = conn.read_json();
            conn.send_json(&json!({
                "id": request["id"],
                "error": {"code": -32601, "message": "'Nope.method' wasn't found"}
            }));
            conn.wait_eof();
        });

        let mut session = connect(&url);
        let err = session.call("Nope.method", None).unwrap_err();
        assert!(matches!(err, Error::RemoteError { ref payload } if payload["code"] == -32601));
        assert!(!err.is_timeout());
        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_call_timeout_spans_whole_loop() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            conn.read_json();
            // Keep the socket busy with events but never answer
            for _ in 0..3 {
                conn.send_json(&json!({"method": "Network.dataReceived", "params": {}}));
                std::thread::sleep(Duration::from_millis(40));
            }
            conn.wait_eof();
        });

        let mut session = connect(&url);
        let timeout = Duration::from_millis(200);
        let started = Instant::now();
        let err = session
            .call_with_timeout("Slow.method", None, timeout)
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, Error::Timeout { .. }));
        assert!(elapsed >= timeout);
        assert!(elapsed < Duration::from_secs(2));
        assert!(session.pending_len() >= 1);
        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_close_frame_during_call() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            conn.read_json();
            conn.send_frame(Opcode::Close, &NORMAL_CLOSURE.to_be_bytes());
            conn.wait_eof();
        });

        let mut session = connect(&url);
        assert!(matches!(
            session.call("Browser.close", None),
            Err(Error::ConnectionClosed)
        ));
        // No further reads once closing
        assert!(matches!(
            session.call("Browser.version", None),
            Err(Error::ConnectionClosed)
        ));
        assert_eq!(
            session.poll_event("Any.Event", Duration::from_millis(50)).expect("poll"),
            None
        );
        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_stray_response_is_queued() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            let request = conn.read_json();
            conn.send_json(&json!({"id": 999, "result": {"stray": true}}));
            conn.send_json(&json!({"id": request["id"], "result": {"mine": true}}));
            conn.wait_eof();
        });

        let mut session = connect(&url);
        let result = session.call("Target.getTargets", None).expect("call");
        assert_eq!(result, json!({"mine": true}));
        assert_eq!(session.pending_len(), 1);
        assert_eq!(session.pending().next().and_then(Message::id), Some(CallId::new(999)));
        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_poll_event_queues_non_matching() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            conn.send_json(&json!({"method": "Runtime.consoleAPICalled", "params": {"n": 1}}));
            conn.send_json(&json!({"method": "Runtime.consoleAPICalled", "params": {"n": 2}}));
            conn.send_json(&json!({"method": "Page.loadEventFired", "params": {"timestamp": 3}}));
            conn.wait_eof();
        });

        let mut session = connect(&url);
        let loaded = session
            .poll_event("Page.loadEventFired", TIMEOUT)
            .expect("poll")
            .expect("event");
        assert_eq!(loaded.params["timestamp"], 3);
        assert_eq!(session.pending_len(), 2);

        let first = session
            .poll_event("Runtime.consoleAPICalled", Duration::ZERO)
            .expect("poll")
            .expect("queued");
        assert_eq!(first.params["n"], 1);

        let rest = session.drain_events("Runtime.consoleAPICalled");
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].params["n"], 2);
        assert_eq!(session.pending_len(), 0);

        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_poll_event_times_out_with_none() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            conn.wait_eof();
        });

        let mut session = connect(&url);
        let started = Instant::now();
        let event = session
            .poll_event("Page.loadEventFired", Duration::from_millis(150))
            .expect("poll");
        assert!(event.is_none());
        assert!(started.elapsed() >= Duration::from_millis(150));
        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_malformed_message_fails_call() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            conn.read_json();
            conn.send_text("<html>not json</html>");
            conn.wait_eof();
        });

        let mut session = connect(&url);
        assert!(matches!(
            session.call("Page.enable", None),
            Err(Error::MalformedMessage { .. })
        ));
        session.close();
        handle.join().expect("peer");
    }

    #[test]
    fn test_ping_mid_call_is_invisible() {
        let peer = MockPeer::bind();
        let url = peer.url();
        let handle = peer.spawn(|mut conn| {
            conn.accept_upgrade();
            let request = conn.read_json();
            conn.send_frame(Opcode::Ping, b"keepalive");
            let pong = conn.read_frame();
            assert_eq!(pong.opcode, Opcode::Pong);
            assert_eq!(pong.payload, b"keepalive");
            conn.send_json(&json!({"id": request["id"], "result": {"v": 1}}));

            let close = conn.read_frame();
            assert_eq!(close.opcode, Opcode::Close);
        });

        let mut session = connect(&url);
        assert_eq!(session.call("Echo", None).expect("call"), json!({"v": 1}));
        assert_eq!(session.pending_len(), 0);
        session.close();
        handle.join().expect("peer");
    }
}
