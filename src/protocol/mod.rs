//! Remote WebDriver wire codec.
//!
//! Everything that touches the wire format lives here: the command
//! table, envelope encoding, response decoding and capability payloads.
//! Nothing in this module performs I/O.
//!
//! # Request Flow
//!
//! | Step | Type | Description |
//! |------|------|-------------|
//! | 1 | [`CommandRegistry`] | Command name to method and path template |
//! | 2 | [`Envelope`] | Concrete method, path and JSON body |
//! | 3 | [`RawResponse`] | HTTP status and body text from the transport |
//! | 4 | [`Reply`] | Decoded `value` or a typed error |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command names and the command registry |
//! | `request` | Envelope encoding and response decoding |
//! | `capabilities` | Capability sets and W3C translation |

// ============================================================================
// Submodules
// ============================================================================

/// Capability sets and W3C translation.
pub mod capabilities;

/// Command names and path templates.
pub mod command;

/// Envelope encoding and response decoding.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use capabilities::{Capabilities, PageLoadStrategy, new_session_payload, to_w3c};
pub use command::{CommandRegistry, CommandSpec, Method};
pub use request::{Envelope, RawResponse, Reply};
