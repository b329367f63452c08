//! Session record and lifecycle.
//!
//! A [`SessionRegistry`] owns the one session a driver may have and the
//! dispatcher state that gates every command:
//!
//! ```text
//! Idle ──start──► Starting ──ok──► Active ──quit──► Terminating ──► Closed
//!   ▲                │                │                               ▲
//!   └────failed──────┘                └──── invalid session id ───────┘
//! ```
//!
//! Commands are only dispatched in `Active`. `Idle` and `Closed` reject
//! them locally with [`Error::NoActiveSession`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::{Capabilities, Reply};

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle of the remote session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Not yet created.
    Uninitialized,
    /// Created and usable.
    Active,
    /// Quit, or reported gone by the driver.
    Terminated,
}

// ============================================================================
// DriverState
// ============================================================================

/// Dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DriverState {
    /// No session.
    #[default]
    Idle,
    /// New-session request in flight.
    Starting,
    /// Session established.
    Active,
    /// Quit request in flight.
    Terminating,
    /// Session ended; no further commands.
    Closed,
}

impl DriverState {
    /// Returns the lower-case state name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Terminating => "terminating",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Session
// ============================================================================

/// A remote session as negotiated with the driver.
///
/// The capability set is what the driver returned, not what was
/// requested, and is shared read-only.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    capabilities: Arc<Capabilities>,
    state: SessionState,
}

impl Session {
    /// Returns the driver-assigned session ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the negotiated capabilities.
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Returns the session state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` if the session is usable.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}

/// Extracts the session ID and capabilities from a new-session reply.
///
/// Accepts the W3C shape (`value.sessionId`, `value.capabilities`) and
/// the legacy shape (top-level `sessionId`, capabilities as `value`).
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if no session ID can be found.
pub fn parse_new_session(reply: Reply) -> Result<(SessionId, Capabilities)> {
    let Reply { value, session_id } = reply;

    if let Some(id) = value.get("sessionId").and_then(Value::as_str) {
        let capabilities = value
            .get("capabilities")
            .cloned()
            .map(Capabilities::from_value)
            .unwrap_or_default();
        return Ok((SessionId::new(id), capabilities));
    }

    match session_id {
        Some(id) => Ok((SessionId::new(id), Capabilities::from_value(value))),
        None => Err(Error::malformed_response(
            "new session response carries no session id",
        )),
    }
}

// ============================================================================
// SessionRegistry
// ============================================================================

#[derive(Debug, Default)]
struct RegistryState {
    state: DriverState,
    session: Option<Session>,
}

/// Tracks the single session of one driver and the dispatcher state.
///
/// All transitions are synchronous and short; callers serialize the
/// network round trips around them.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    inner: Mutex<RegistryState>,
}

// ============================================================================
// SessionRegistry - Accessors
// ============================================================================

impl SessionRegistry {
    /// Creates an idle registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dispatcher state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.inner.lock().state
    }

    /// Returns a snapshot of the session, if one was ever created.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner.lock().session.clone()
    }

    /// Returns the active session ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveSession`] unless the state is `Active`.
    pub fn active(&self) -> Result<SessionId> {
        let inner = self.inner.lock();
        match (&inner.state, &inner.session) {
            (DriverState::Active, Some(session)) => Ok(session.id.clone()),
            (state, _) => Err(Error::no_active_session(state)),
        }
    }

    /// Returns `true` if `id` is the current, still active session.
    #[must_use]
    pub fn is_current(&self, id: &SessionId) -> bool {
        let inner = self.inner.lock();
        inner.state == DriverState::Active
            && inner.session.as_ref().is_some_and(|s| &s.id == id)
    }
}

// ============================================================================
// SessionRegistry - Transitions
// ============================================================================

impl SessionRegistry {
    /// `Idle -> Starting`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] from any other state.
    pub fn begin_start(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state != DriverState::Idle {
            return Err(Error::invalid_argument(format!(
                "cannot start a session while the driver is {}",
                inner.state
            )));
        }
        inner.state = DriverState::Starting;
        Ok(())
    }

    /// `Starting -> Active` with the negotiated session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveSession`] if the start was abandoned.
    pub fn activate(&self, id: SessionId, capabilities: Capabilities) -> Result<Session> {
        let mut inner = self.inner.lock();
        if inner.state != DriverState::Starting {
            return Err(Error::no_active_session(inner.state));
        }
        let session = Session {
            id,
            capabilities: Arc::new(capabilities),
            state: SessionState::Active,
        };
        inner.state = DriverState::Active;
        inner.session = Some(session.clone());
        info!(session_id = %session.id, "Session active");
        Ok(session)
    }

    /// `Starting -> Idle` after a failed new-session request.
    pub fn abort_start(&self) {
        let mut inner = self.inner.lock();
        if inner.state == DriverState::Starting {
            inner.state = DriverState::Idle;
            debug!("Session start failed, back to idle");
        }
    }

    /// Begins termination.
    ///
    /// `Active -> Terminating` returns the session to delete remotely.
    /// `Idle -> Closed` returns `None`: there is nothing to delete.
    /// In `Terminating` or `Closed` this is a no-op returning `None`.
    pub fn begin_terminate(&self) -> Option<SessionId> {
        let mut inner = self.inner.lock();
        match inner.state {
            DriverState::Active => {
                inner.state = DriverState::Terminating;
                inner.session.as_ref().map(|s| s.id.clone())
            }
            DriverState::Idle | DriverState::Starting => {
                inner.state = DriverState::Closed;
                None
            }
            DriverState::Terminating | DriverState::Closed => None,
        }
    }

    /// Completes termination: state becomes `Closed`, session `Terminated`.
    pub fn finish_terminate(&self) {
        let mut inner = self.inner.lock();
        inner.state = DriverState::Closed;
        if let Some(session) = inner.session.as_mut() {
            session.state = SessionState::Terminated;
            info!(session_id = %session.id, "Session terminated");
        }
    }

    /// Records that the driver no longer knows session `id`.
    ///
    /// Returns `true` if this closed the current session.
    pub fn mark_lost(&self, id: &SessionId) -> bool {
        let mut inner = self.inner.lock();
        let RegistryState { state, session } = &mut *inner;
        match session {
            Some(session) if &session.id == id && session.state == SessionState::Active => {
                session.state = SessionState::Terminated;
                *state = DriverState::Closed;
                warn!(session_id = %id, "Driver reports session gone");
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
