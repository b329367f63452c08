//! Command dispatcher.
//!
//! The [`Driver`] owns one remote session and funnels every command
//! through a single path:
//!
//! 1. local precondition check (session active, element handle usable)
//! 2. encode via the command registry
//! 3. send through the transport, bounded by the request timeout
//! 4. decode and classify the response
//! 5. update session and element state
//!
//! # Concurrency
//!
//! The protocol allows one in-flight command per session. Concurrent
//! callers are serialized by an async gate: a second command waits for
//! the first response before it is sent. The gate is held for the whole
//! round trip, so commands reach the driver in call order.
//!
//! # Example
//!
//! ```no_run
//! use remote_webdriver::{Capabilities, Driver};
//!
//! # async fn example() -> remote_webdriver::Result<()> {
//! let driver = Driver::builder()
//!     .endpoint("http://127.0.0.1:9515")
//!     .build()
//!     .await?;
//!
//! driver.start_session(Capabilities::chrome()).await?;
//! driver.get("https://example.com").await?;
//! driver.quit().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::browser::element::{Element, ElementHandle, ElementTable, element_params};
use crate::browser::wait::Wait;
use crate::error::{Error, Result};
use crate::identifiers::{ElementId, RequestId, SessionId};
use crate::protocol::command;
use crate::protocol::{Capabilities, CommandRegistry, Envelope, RawResponse, Reply};
use crate::service::Service;
use crate::session::{DriverState, Session, SessionRegistry, parse_new_session};
use crate::transport::Transport;

use super::builder::DriverBuilder;
use super::observer::{CommandEvent, CommandObserver};
use super::vendor::VendorConfig;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the driver.
pub(crate) struct DriverInner {
    /// Sends envelopes to the remote end.
    pub transport: Arc<dyn Transport>,

    /// Base URL of the remote end.
    pub endpoint: Url,

    /// Local driver process, if this driver launched one.
    pub service: Option<Arc<dyn Service>>,

    /// Vendor name, prefix and extra commands.
    pub vendor: VendorConfig,

    /// Standard plus vendor commands.
    pub commands: CommandRegistry,

    /// Client-side bound on one round trip.
    pub request_timeout: Option<Duration>,

    /// Session record and dispatcher state.
    pub sessions: SessionRegistry,

    /// Element handles of the current session.
    pub elements: ElementTable,

    /// Serializes round trips.
    pub gate: AsyncMutex<()>,

    /// Receives command events.
    pub observer: Option<CommandObserver>,
}

// ============================================================================
// Driver
// ============================================================================

/// Remote WebDriver client bound to one session.
///
/// Cloning is cheap; clones share the session.
#[derive(Clone)]
pub struct Driver {
    /// Shared inner state.
    pub(crate) inner: Arc<DriverInner>,
}

// ============================================================================
// Driver - Display
// ============================================================================

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("vendor", &self.inner.vendor.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Driver - Construction
// ============================================================================

impl Driver {
    /// Creates a configuration builder for the driver.
    #[inline]
    #[must_use]
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    /// Assembles a driver from validated parts.
    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        endpoint: Url,
        service: Option<Arc<dyn Service>>,
        vendor: VendorConfig,
        request_timeout: Option<Duration>,
        observer: Option<CommandObserver>,
    ) -> Self {
        let commands = vendor.registry();
        Self {
            inner: Arc::new(DriverInner {
                transport,
                endpoint,
                service,
                vendor,
                commands,
                request_timeout,
                sessions: SessionRegistry::new(),
                elements: ElementTable::new(),
                gate: AsyncMutex::new(()),
                observer,
            }),
        }
    }
}

// ============================================================================
// Driver - Accessors
// ============================================================================

impl Driver {
    /// Returns the remote endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Returns the vendor configuration.
    #[inline]
    #[must_use]
    pub fn vendor(&self) -> &VendorConfig {
        &self.inner.vendor
    }

    /// Returns the dispatcher state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.inner.sessions.state()
    }

    /// Returns a snapshot of the session, if one was created.
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner.sessions.session()
    }

    /// Returns the active session ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveSession`] outside the `Active` state.
    #[inline]
    pub fn session_id(&self) -> Result<SessionId> {
        self.inner.sessions.active()
    }

    /// Returns the number of live element handles.
    #[inline]
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.inner.elements.len()
    }

    /// Starts a wait on this driver.
    #[inline]
    #[must_use]
    pub fn wait(&self, timeout: Duration) -> Wait<Driver> {
        Wait::new(self.clone(), timeout)
    }
}

// ============================================================================
// Driver - Session Lifecycle
// ============================================================================

impl Driver {
    /// Creates the remote session.
    ///
    /// Sends both the W3C and the legacy capability forms. On failure
    /// the driver returns to `Idle` and may be retried.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if a session was already started
    /// - [`Error::SessionNotCreated`] if the driver rejects the capabilities
    /// - [`Error::MalformedResponse`] if the reply carries no session ID
    pub async fn start_session(&self, capabilities: Capabilities) -> Result<Session> {
        let _gate = self.inner.gate.lock().await;
        self.inner.sessions.begin_start()?;

        info!(
            browser = capabilities.browser_name().unwrap_or("any"),
            vendor = self.inner.vendor.name(),
            "Starting session"
        );

        let payload = capabilities.new_session_payload();
        let negotiated = self
            .dispatch(command::NEW_SESSION, None, payload)
            .await
            .and_then(parse_new_session);

        match negotiated {
            Ok((id, negotiated)) => {
                self.inner.elements.bind(id.clone());
                self.inner.sessions.activate(id, negotiated)
            }
            Err(e) => {
                self.inner.sessions.abort_start();
                warn!(error = %e, "Session not created");
                Err(e)
            }
        }
    }

    /// Ends the session and stops the local service, if any.
    ///
    /// Calling it again is a no-op. The driver ends up `Closed` even if
    /// the delete request fails; a driver that already forgot the
    /// session is not an error.
    ///
    /// # Errors
    ///
    /// Returns the delete request's error other than `invalid session id`.
    pub async fn quit(&self) -> Result<()> {
        let _gate = self.inner.gate.lock().await;

        let Some(session_id) = self.inner.sessions.begin_terminate() else {
            trace!(state = %self.state(), "Quit without live session");
            self.stop_service().await;
            return Ok(());
        };

        info!(session_id = %session_id, "Quitting session");
        let result = self
            .dispatch(command::QUIT, Some(&session_id), Value::Null)
            .await;

        self.inner.sessions.finish_terminate();
        self.inner.elements.invalidate(&session_id);
        self.stop_service().await;

        match result {
            Ok(_) | Err(Error::InvalidSessionId { .. }) => Ok(()),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Quit request failed");
                Err(e)
            }
        }
    }

    /// Stops the local service, logging failures.
    async fn stop_service(&self) {
        if let Some(service) = &self.inner.service
            && let Err(e) = service.stop().await
        {
            warn!(error = %e, "Failed to stop driver service");
        }
    }
}

// ============================================================================
// Driver - Command Execution
// ============================================================================

impl Driver {
    /// Executes a command by name, including vendor commands.
    ///
    /// `sessionId` is filled in; other path placeholders come from
    /// `params`. `quit` and `status` are routed to [`Driver::quit`] and
    /// [`Driver::status`].
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommand`] if `name` is not registered
    /// - [`Error::NoActiveSession`] outside the `Active` state
    /// - the classified driver error otherwise
    pub async fn execute(&self, name: &str, params: Value) -> Result<Value> {
        if !self.inner.commands.contains(name) {
            return Err(Error::unknown_command(name));
        }
        match name {
            command::NEW_SESSION => Err(Error::invalid_argument(
                "sessions are created with start_session",
            )),
            command::QUIT => self.quit().await.map(|()| Value::Null),
            command::STATUS => self.status().await,
            _ => self.command(name, params).await,
        }
    }

    /// Queries the remote end's readiness; needs no session.
    pub async fn status(&self) -> Result<Value> {
        let _gate = self.inner.gate.lock().await;
        self.dispatch(command::STATUS, None, Value::Null)
            .await
            .map(|reply| reply.value)
    }

    /// Sends a session-scoped command.
    pub(crate) async fn command(&self, name: &str, params: Value) -> Result<Value> {
        self.inner.sessions.active()?;
        let _gate = self.inner.gate.lock().await;
        let session_id = self.inner.sessions.active()?;
        self.dispatch(name, Some(&session_id), params)
            .await
            .map(|reply| reply.value)
    }

    /// Sends an element-scoped command.
    ///
    /// Stale element errors are tagged with the element's reference.
    pub(crate) async fn element_command(
        &self,
        name: &str,
        handle: &ElementHandle,
        params: Value,
    ) -> Result<Value> {
        let _gate = self.inner.gate.lock().await;
        let element_id = self.inner.elements.resolve(handle)?;
        let session_id = self.inner.sessions.active()?;
        let params = element_params(&element_id, params)?;
        self.dispatch(name, Some(&session_id), params)
            .await
            .map(|reply| reply.value)
            .map_err(|e| e.with_element(&element_id))
    }

    /// Resolves a handle against the element table.
    pub(crate) fn resolve_element(&self, handle: &ElementHandle) -> Result<ElementId> {
        self.inner.elements.resolve(handle)
    }

    /// Registers a raw element reference from the active session.
    pub(crate) fn register_element(&self, raw: ElementId) -> Result<Element> {
        let session_id = self.inner.sessions.active()?;
        let handle = self.inner.elements.register(&session_id, raw)?;
        Ok(Element::new(self.clone(), handle))
    }
}

// ============================================================================
// Driver - Dispatch
// ============================================================================

impl Driver {
    /// One round trip. Callers hold the gate.
    async fn dispatch(
        &self,
        name: &str,
        session_id: Option<&SessionId>,
        params: Value,
    ) -> Result<Reply> {
        let params = match session_id {
            Some(id) => with_session_id(params, id)?,
            None => params,
        };
        let envelope = self.inner.commands.encode(name, params)?;
        let request_id = RequestId::generate();

        debug!(
            %request_id,
            command = name,
            method = %envelope.method,
            path = %envelope.path,
            "Sending command"
        );
        self.notify(&CommandEvent::Sent {
            request_id,
            envelope: &envelope,
        });

        let started = Instant::now();
        let raw = self.send(request_id, &envelope).await?;
        let elapsed = started.elapsed();

        trace!(
            %request_id,
            status = raw.status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Received response"
        );
        self.notify(&CommandEvent::Received {
            request_id,
            command: name,
            status: raw.status,
            elapsed,
        });

        let reply = raw.decode_reply();
        if let Err(e) = &reply {
            debug!(%request_id, command = name, error = %e, "Command failed");
            if let (Error::InvalidSessionId { .. }, Some(id)) = (e, session_id)
                && self.inner.sessions.mark_lost(id)
            {
                self.inner.elements.invalidate(id);
            }
        }
        reply
    }

    /// Sends through the transport within the request timeout.
    async fn send(&self, request_id: RequestId, envelope: &Envelope) -> Result<RawResponse> {
        let timeout_ms = self
            .inner
            .request_timeout
            .map_or(0, |limit| limit.as_millis() as u64);
        let send = self.inner.transport.send(&self.inner.endpoint, envelope);

        let result = match self.inner.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, send).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%request_id, command = %envelope.command, timeout_ms, "Request timed out");
                    return Err(Error::request_timeout(
                        envelope.command.clone(),
                        request_id,
                        timeout_ms,
                    ));
                }
            },
            None => send.await,
        };

        result.map_err(|e| match e {
            Error::Http(ref http) if http.is_timeout() => {
                Error::request_timeout(envelope.command.clone(), request_id, timeout_ms)
            }
            other => other,
        })
    }

    fn notify(&self, event: &CommandEvent<'_>) {
        if let Some(observer) = &self.inner.observer {
            observer(event);
        }
    }
}

/// Adds `sessionId` to a parameter object.
fn with_session_id(params: Value, id: &SessionId) -> Result<Value> {
    let mut map = match params {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(Error::invalid_argument(format!(
                "command parameters must be an object, got {other}"
            )));
        }
    };
    map.insert("sessionId".into(), Value::String(id.as_str().to_string()));
    Ok(Value::Object(map))
}

// ============================================================================
// Tests
// ============================================================================
