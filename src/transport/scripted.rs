//! In-memory transport with scripted replies.
//!
//! [`ScriptedTransport`] stands in for a real driver in tests. Replies
//! are queued per command name; the last queued reply for a command is
//! repeated once the queue is down to it. Every envelope it receives is
//! recorded, and the peak number of concurrent sends is tracked so
//! callers can assert that the dispatcher never overlaps requests.
//!
//! # Example
//!
//! ```
//! use remote_webdriver::protocol::RawResponse;
//! use remote_webdriver::transport::ScriptedTransport;
//! use serde_json::json;
//!
//! let transport = ScriptedTransport::new();
//! transport
//!     .with_session("s-1")
//!     .respond("getTitle", RawResponse::success(json!("Example")));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use url::Url;

use crate::error::Result;
use crate::protocol::{Envelope, RawResponse};

use super::Transport;

// ============================================================================
// Scripted
// ============================================================================

/// One scripted reply.
#[derive(Debug, Clone)]
enum Scripted {
    /// Reply with this response.
    Reply(RawResponse),
    /// Never reply.
    Hang,
}

// ============================================================================
// ScriptedTransport
// ============================================================================

/// Test double for [`Transport`].
///
/// Cloning is cheap; clones share scripts and recordings, so a test can
/// keep one clone while the driver owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<ScriptedInner>,
}

#[derive(Debug, Default)]
struct ScriptedInner {
    scripts: Mutex<FxHashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<Envelope>>,
    endpoints: Mutex<Vec<Url>>,
    latency: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

// ============================================================================
// ScriptedTransport - Scripting
// ============================================================================

impl ScriptedTransport {
    /// Creates a transport with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for `command`.
    pub fn respond(&self, command: &str, response: RawResponse) -> &Self {
        self.push(command, Scripted::Reply(response));
        self
    }

    /// Queues a W3C success reply wrapping `value`.
    pub fn respond_value(&self, command: &str, value: Value) -> &Self {
        self.respond(command, RawResponse::success(value))
    }

    /// Queues a W3C error reply.
    pub fn respond_error(&self, command: &str, status: u16, code: &str, message: &str) -> &Self {
        self.respond(command, RawResponse::error(status, code, message))
    }

    /// Queues a reply that never arrives.
    pub fn respond_hang(&self, command: &str) -> &Self {
        self.push(command, Scripted::Hang);
        self
    }

    /// Scripts `newSession` to succeed with `session_id` and `quit` to succeed.
    pub fn with_session(&self, session_id: &str) -> &Self {
        self.respond_value(
            "newSession",
            json!({ "sessionId": session_id, "capabilities": { "browserName": "x" } }),
        )
        .respond_value("quit", Value::Null)
    }

    /// Delays every reply by `latency`.
    pub fn set_latency(&self, latency: Duration) -> &Self {
        *self.inner.latency.lock() = Some(latency);
        self
    }

    fn push(&self, command: &str, scripted: Scripted) {
        self.inner
            .scripts
            .lock()
            .entry(command.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Takes the next scripted reply, keeping the last one sticky.
    fn next(&self, command: &str) -> Option<Scripted> {
        let mut scripts = self.inner.scripts.lock();
        let queue = scripts.get_mut(command)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

// ============================================================================
// ScriptedTransport - Inspection
// ============================================================================

impl ScriptedTransport {
    /// Returns every envelope received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Envelope> {
        self.inner.requests.lock().clone()
    }

    /// Returns the envelopes received for `command`, in order.
    #[must_use]
    pub fn requests_for(&self, command: &str) -> Vec<Envelope> {
        self.inner
            .requests
            .lock()
            .iter()
            .filter(|e| e.command == command)
            .cloned()
            .collect()
    }

    /// Returns the command names received, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.inner
            .requests
            .lock()
            .iter()
            .map(|e| e.command.clone())
            .collect()
    }

    /// Returns the number of envelopes received.
    #[inline]
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.inner.requests.lock().len()
    }

    /// Returns the endpoints requests were sent to, in order.
    #[must_use]
    pub fn endpoints(&self) -> Vec<Url> {
        self.inner.endpoints.lock().clone()
    }

    /// Returns the peak number of concurrent sends observed.
    #[inline]
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Transport Implementation
// ============================================================================

/// Decrements the in-flight counter when a send finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, endpoint: &Url, envelope: &Envelope) -> Result<RawResponse> {
        let current = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(&self.inner.in_flight);
        self.inner.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.inner.requests.lock().push(envelope.clone());
        self.inner.endpoints.lock().push(endpoint.clone());

        let latency = *self.inner.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match self.next(&envelope.command) {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Ok(RawResponse::error(
                404,
                "unknown command",
                &format!("no scripted reply for {}", envelope.command),
            )),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;
    use crate::protocol::CommandRegistry;

    fn endpoint() -> Url {
        Url::parse("http://127.0.0.1:4444").unwrap()
    }

    fn envelope(command: &str) -> Envelope {
        CommandRegistry::standard()
            .encode(command, json!({"sessionId": "s1"}))
            .unwrap()
    }

    #[tokio::test]
    async fn test_last_reply_is_sticky() {
        let transport = ScriptedTransport::new();
        transport
            .respond_value("getTitle", json!("one"))
            .respond_value("getTitle", json!("two"));

        let mut titles = Vec::new();
        for _ in 0..3 {
            let raw = transport.send(&endpoint(), &envelope("getTitle")).await.unwrap();
            titles.push(raw.decode().unwrap());
        }
        assert_eq!(titles, vec![json!("one"), json!("two"), json!("two")]);
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_unscripted_command_is_unknown() {
        let transport = ScriptedTransport::new();
        let raw = transport.send(&endpoint(), &envelope("getTitle")).await.unwrap();
        assert_eq!(raw.status, 404);
        assert!(matches!(raw.decode(), Err(Error::Driver { .. })));
    }

    #[tokio::test]
    async fn test_records_requests_and_clones_share_state() {
        let transport = ScriptedTransport::new();
        let clone = transport.clone();
        clone.respond_value("refresh", Value::Null);

        transport.send(&endpoint(), &envelope("refresh")).await.unwrap();
        assert_eq!(clone.commands(), vec!["refresh".to_string()]);
        assert_eq!(clone.requests_for("refresh")[0].path, "/session/s1/refresh");
        assert_eq!(clone.endpoints(), vec![endpoint()]);
        assert_eq!(clone.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_sends_are_counted() {
        let transport = ScriptedTransport::new();
        transport
            .respond_value("getTitle", json!("t"))
            .set_latency(Duration::from_millis(50));

        let env = envelope("getTitle");
        let url = endpoint();
        let (a, b) = tokio::join!(transport.send(&url, &env), transport.send(&url, &env));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(transport.max_in_flight(), 2);
    }
}
