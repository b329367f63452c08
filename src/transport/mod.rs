//! HTTP transport layer.
//!
//! The dispatcher hands a fully encoded [`Envelope`] to a [`Transport`]
//! and gets back the undecoded [`RawResponse`]. Transports know nothing
//! about sessions, element handles or error classification.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Driver (Rust)  │                              │  Remote driver  │
//! │                 │        HTTP + JSON           │  (chromedriver, │
//! │  Transport      │─────────────────────────────►│   geckodriver,  │
//! │  → RawResponse  │◄─────────────────────────────│   grid, ...)    │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `http` | `reqwest`-backed transport |
//! | `scripted` | In-memory transport with scripted replies |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use url::Url;

use crate::error::Result;
use crate::protocol::{Envelope, RawResponse};

// ============================================================================
// Submodules
// ============================================================================

/// `reqwest`-backed HTTP transport.
pub mod http;

/// In-memory transport with scripted replies.
pub mod scripted;

// ============================================================================
// Re-exports
// ============================================================================

pub use http::HttpTransport;
pub use scripted::ScriptedTransport;

// ============================================================================
// Transport
// ============================================================================

/// Sends one envelope and returns the raw reply.
///
/// Implementations must not retry and must not reorder: the dispatcher
/// guarantees at most one call per session is in flight.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends `envelope` to the driver at `endpoint`.
    ///
    /// Any HTTP status is a successful send; only failures to obtain a
    /// response at all are errors.
    async fn send(&self, endpoint: &Url, envelope: &Envelope) -> Result<RawResponse>;
}

/// Joins an endpoint and an envelope path.
///
/// The endpoint may carry a base path (`http://grid:4444/wd/hub`); a
/// trailing slash on it is ignored.
///
/// # Errors
///
/// Returns [`crate::Error::Url`] if the joined URL is invalid.
pub fn join_url(endpoint: &Url, path: &str) -> Result<Url> {
    let base = endpoint.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}{path}"))?)
}

// ============================================================================
// Tests
// ============================================================================
