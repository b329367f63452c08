//! Command dispatcher and the driver's command surface.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Driver`] | Session-bound client; dispatches every command |
//! | [`DriverBuilder`] | Fluent configuration builder |
//! | [`VendorConfig`] | Browser vendor name, prefix and extra commands |
//! | [`Timeouts`] | Driver-side session timeouts |
//! | [`Cookie`] | Browser cookie |
//! | [`FrameTarget`] | Frame to switch into |
//! | [`CommandEvent`] | Observer callback payload |
//!
//! # Example
//!
//! ```no_run
//! use remote_webdriver::{By, Capabilities, Driver, Result};
//!
//! # async fn example() -> Result<()> {
//! let driver = Driver::builder()
//!     .endpoint("http://127.0.0.1:4444")
//!     .connect(Capabilities::firefox())
//!     .await?;
//!
//! driver.get("https://example.com").await?;
//! let link = driver.find_element(By::link_text("More information...")).await?;
//! link.click().await?;
//! driver.quit().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for driver configuration.
pub mod builder;

/// Cookie commands.
pub mod cookies;

/// Core dispatcher implementation.
pub mod core;

/// Element lookup commands.
pub mod elements;

/// Navigation commands.
pub mod navigation;

/// Command observation hooks.
pub mod observer;

/// Driver-side timeouts.
pub mod options;

/// Script execution commands.
pub mod script;

/// Vendor configurations and vendor commands.
pub mod vendor;

/// Window, frame and screenshot commands.
pub mod window;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::DriverBuilder;
pub use cookies::Cookie;
pub use core::Driver;
pub use observer::{CommandEvent, CommandObserver};
pub use options::Timeouts;
pub use vendor::VendorConfig;
pub use window::FrameTarget;

pub(crate) use window::decode_png;
