//! Command observation hooks.
//!
//! An observer registered on the [`DriverBuilder`](super::DriverBuilder)
//! sees every envelope the driver sends and every status it receives.
//! Observers run synchronously on the dispatching task and must not block.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::identifiers::RequestId;
use crate::protocol::Envelope;

// ============================================================================
// CommandEvent
// ============================================================================

/// One observable step of a command round trip.
#[derive(Debug, Clone, Copy)]
pub enum CommandEvent<'a> {
    /// The envelope is about to be handed to the transport.
    Sent {
        /// Correlation ID of the command.
        request_id: RequestId,
        /// The encoded command.
        envelope: &'a Envelope,
    },
    /// The transport returned a response.
    Received {
        /// Correlation ID of the command.
        request_id: RequestId,
        /// Command name.
        command: &'a str,
        /// HTTP status of the response.
        status: u16,
        /// Round-trip time.
        elapsed: Duration,
    },
}

impl CommandEvent<'_> {
    /// Returns the correlation ID.
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Sent { request_id, .. } | Self::Received { request_id, .. } => *request_id,
        }
    }

    /// Returns the command name.
    #[inline]
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Sent { envelope, .. } => &envelope.command,
            Self::Received { command, .. } => command,
        }
    }
}

/// Callback invoked for every [`CommandEvent`].
pub type CommandObserver = Arc<dyn Fn(&CommandEvent<'_>) + Send + Sync>;
