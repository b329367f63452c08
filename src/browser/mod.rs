//! Browser-side entities and waiting.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Element`] | DOM element bound to its driver |
//! | [`ElementHandle`] | Session-scoped element reference |
//! | [`ElementTable`] | Per-driver handle bookkeeping |
//! | [`By`] | Locator strategies |
//! | [`Key`] | Special keys for `send_keys` |
//! | [`ProxyConfig`] | Typed proxy capability |
//! | [`Wait`] | Wait/poll engine |
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use remote_webdriver::{By, Capabilities, Driver, Result, conditions};
//!
//! # async fn example() -> Result<()> {
//! let driver = Driver::builder()
//!     .endpoint("http://127.0.0.1:4444")
//!     .connect(Capabilities::firefox())
//!     .await?;
//!
//! driver.get("https://example.com").await?;
//! let heading = driver
//!     .wait(Duration::from_secs(5))
//!     .until(conditions::presence_of_element_located(By::tag("h1")))
//!     .await?;
//! let text = heading.text().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Ready-made wait conditions.
pub mod conditions;

/// Element handles and element interaction.
pub mod element;

/// Special keys.
pub mod keyboard;

/// Proxy capability types.
pub mod proxy;

/// Element locator strategies.
pub mod selector;

/// Wait/poll engine.
pub mod wait;

// ============================================================================
// Re-exports
// ============================================================================

pub use element::{Element, ElementHandle, ElementRect, ElementTable, SearchContext};
pub use keyboard::Key;
pub use proxy::{ProxyConfig, ProxyType};
pub use selector::By;
pub use wait::{ConditionFuture, DEFAULT_POLL_INTERVAL, Truthy, Wait, WaitDescriptor};
