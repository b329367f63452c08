//! Local driver process management.
//!
//! A [`Service`] produces the endpoint URL the driver talks to. The
//! crate ships [`DriverService`], which launches a driver executable
//! (chromedriver, geckodriver, ...) on a local port; tests substitute
//! their own implementation.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Service`] | Start/stop contract |
//! | [`DriverService`] | Child-process service |
//! | [`PortAllocator`] | Hands out distinct local ports |
//! | [`PortLease`] | RAII port reservation |
//!
//! # Example
//!
//! ```no_run
//! use remote_webdriver::{Capabilities, Driver, DriverService};
//!
//! # async fn example() -> remote_webdriver::Result<()> {
//! let service = DriverService::builder("/usr/local/bin/chromedriver")
//!     .arg("--verbose")
//!     .build()?;
//!
//! let driver = Driver::builder()
//!     .service(service)
//!     .connect(Capabilities::chrome())
//!     .await?;
//! driver.quit().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Child-process driver service.
pub mod driver_service;

/// Local port allocation.
pub mod port;

// ============================================================================
// Re-exports
// ============================================================================

pub use driver_service::{DriverService, DriverServiceBuilder};
pub use port::{PortAllocator, PortLease};

// ============================================================================
// Service
// ============================================================================

/// Start/stop contract of a local driver endpoint.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Starts the service and returns its endpoint once it accepts
    /// connections.
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceLaunch`](crate::Error::ServiceLaunch) if the process cannot start
    /// - [`Error::ServiceStartTimeout`](crate::Error::ServiceStartTimeout) if it is not reachable in time
    async fn start(&self) -> Result<Url>;

    /// Stops the service. Stopping twice is a no-op.
    async fn stop(&self) -> Result<()>;
}
