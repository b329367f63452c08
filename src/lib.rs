//! Remote WebDriver - client for the WebDriver wire protocol.
//!
//! This library drives a browser through a remote WebDriver endpoint
//! (chromedriver, geckodriver, safaridriver, a Selenium grid, ...) over
//! HTTP + JSON.
//!
//! # Architecture
//!
//! The client follows the protocol's request/response model:
//!
//! - **Local End (Rust)**: encodes commands, sends one at a time per session
//! - **Remote End (driver)**: executes commands in the browser, replies once
//!
//! Key design principles:
//!
//! - Each [`Driver`] owns one session; commands outside the `Active` state
//!   fail locally without touching the network
//! - Commands are named (`findElement`, `getTitle`, ...) and mapped onto
//!   HTTP method + path templates by a registry, extended per vendor
//! - Element handles are scoped to their session and die with it
//! - Responses in both the W3C and the legacy shape are understood
//! - Waiting is explicit polling with a caller-supplied timeout
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use remote_webdriver::{By, Capabilities, Driver, Result, conditions};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Connect to a running driver and create a session
//!     let driver = Driver::builder()
//!         .endpoint("http://127.0.0.1:4444")
//!         .connect(Capabilities::firefox())
//!         .await?;
//!
//!     // Navigate and interact
//!     driver.get("https://example.com").await?;
//!     let heading = driver
//!         .wait(Duration::from_secs(10))
//!         .until(conditions::presence_of_element_located(By::tag("h1")))
//!         .await?;
//!     println!("Heading: {}", heading.text().await?);
//!
//!     driver.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | [`Element`], [`By`], [`Key`], [`Wait`] and conditions |
//! | [`driver`] | [`Driver`] dispatcher, builder and vendor configs |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Command registry, envelopes, capabilities |
//! | [`service`] | Local driver process launcher |
//! | [`session`] | Session record and lifecycle |
//! | [`transport`] | HTTP transport and scripted test transport |

#![warn(missing_docs)]

// ============================================================================
// Modules
// ============================================================================

/// Browser entities: Element, locators, keys, waits.
///
/// - [`Element`] - DOM element bound to its driver
/// - [`By`] - locator strategies
/// - [`Wait`] - wait/poll engine
pub mod browser;

/// Command dispatcher and configuration.
///
/// Use [`Driver::builder()`] to create a configured driver instance.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Wire codec: command table, envelopes, response decoding, capabilities.
pub mod protocol;

/// Local driver process launcher.
pub mod service;

/// Session record and dispatcher lifecycle.
pub mod session;

/// HTTP transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{
    By, Element, ElementHandle, ElementRect, Key, ProxyConfig, ProxyType, SearchContext, Wait,
    WaitDescriptor, conditions,
};

// Driver types
pub use driver::{
    CommandEvent, Cookie, Driver, DriverBuilder, FrameTarget, Timeouts, VendorConfig,
};

// Error types
pub use error::{Error, ErrorKind, Result};

// Identifier types
pub use identifiers::{ElementId, RequestId, SessionId};

// Protocol types
pub use protocol::{Capabilities, PageLoadStrategy};

// Service types
pub use service::{DriverService, PortAllocator, Service};

// Session types
pub use session::{DriverState, Session, SessionState};

// Transport types
pub use transport::{HttpTransport, ScriptedTransport, Transport};
