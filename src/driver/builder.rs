//! Builder pattern for driver configuration.
//!
//! A driver talks either to a remote endpoint given by URL or to a local
//! driver process started by a [`Service`]. Exactly one of the two must
//! be configured.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use remote_webdriver::{Capabilities, Driver, VendorConfig};
//!
//! # async fn example() -> remote_webdriver::Result<()> {
//! let driver = Driver::builder()
//!     .endpoint("http://127.0.0.1:9515")
//!     .vendor(VendorConfig::chrome())
//!     .request_timeout(Duration::from_secs(30))
//!     .connect(Capabilities::chrome())
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::Capabilities;
use crate::service::Service;
use crate::transport::{HttpTransport, Transport};

use super::core::Driver;
use super::observer::{CommandEvent, CommandObserver};
use super::vendor::VendorConfig;

// ============================================================================
// DriverBuilder
// ============================================================================

/// Builder for configuring a [`Driver`] instance.
///
/// Use [`Driver::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct DriverBuilder {
    /// Remote end URL.
    endpoint: Option<String>,
    /// Custom transport; HTTP by default.
    transport: Option<Arc<dyn Transport>>,
    /// Local driver process.
    service: Option<Arc<dyn Service>>,
    /// Vendor configuration.
    vendor: VendorConfig,
    /// Client-side bound on one round trip.
    request_timeout: Option<Duration>,
    /// Command observer.
    observer: Option<CommandObserver>,
}

impl fmt::Debug for DriverBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverBuilder")
            .field("endpoint", &self.endpoint)
            .field("transport", &self.transport.is_some())
            .field("service", &self.service.is_some())
            .field("vendor", &self.vendor.name())
            .field("request_timeout", &self.request_timeout)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

// ============================================================================
// DriverBuilder Implementation
// ============================================================================

impl DriverBuilder {
    /// Creates a new driver builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the remote end URL, e.g. `http://127.0.0.1:4444/wd/hub`.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Replaces the HTTP transport.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Launches a local driver process and connects to it.
    #[inline]
    #[must_use]
    pub fn service(mut self, service: impl Service) -> Self {
        self.service = Some(Arc::new(service));
        self
    }

    /// Sets the vendor configuration.
    #[inline]
    #[must_use]
    pub fn vendor(mut self, vendor: VendorConfig) -> Self {
        self.vendor = vendor;
        self
    }

    /// Bounds every round trip. Unbounded by default.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Registers a command observer.
    #[must_use]
    pub fn observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&CommandEvent<'_>) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Builds the driver with validation. No session is created.
    ///
    /// Starts the service first, if one is configured.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if neither or both of endpoint and service are set
    /// - [`Error::Config`] if the endpoint is not an `http(s)` URL
    /// - [`Error::Config`] if the request timeout is zero
    /// - the service's start error
    pub async fn build(self) -> Result<Driver> {
        self.validate_timeout()?;

        let endpoint = match (&self.endpoint, &self.service) {
            (Some(url), None) => parse_endpoint(url)?,
            (None, Some(service)) => {
                let url = service.start().await?;
                debug!(url = %url, "Driver service started");
                url
            }
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    "Both endpoint and service are set. Use one of .endpoint() or .service().",
                ));
            }
            (None, None) => {
                return Err(Error::config(
                    "Endpoint is required. Use .endpoint() or .service() to set it.\n\
                     Example: Driver::builder().endpoint(\"http://127.0.0.1:4444\")",
                ));
            }
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?) as Arc<dyn Transport>,
        };

        Ok(Driver::from_parts(
            transport,
            endpoint,
            self.service,
            self.vendor,
            self.request_timeout,
            self.observer,
        ))
    }

    /// Builds the driver and starts a session.
    ///
    /// Capabilities are merged over the vendor's defaults. If the session
    /// cannot be created the service is stopped.
    pub async fn connect(self, capabilities: Capabilities) -> Result<Driver> {
        let capabilities = merge_defaults(self.vendor.default_capabilities(), capabilities);
        let driver = self.build().await?;

        if let Err(e) = driver.start_session(capabilities).await {
            if let Err(stop) = driver.quit().await {
                warn!(error = %stop, "Cleanup after failed connect failed");
            }
            return Err(e);
        }
        Ok(driver)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl DriverBuilder {
    /// Validates the request timeout.
    fn validate_timeout(&self) -> Result<()> {
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(Error::config("Request timeout must be greater than zero."));
        }
        Ok(())
    }
}

/// Parses and checks the endpoint URL.
fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::config(format!("Invalid endpoint {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::config(format!(
            "Endpoint scheme must be http or https, got {scheme:?}"
        ))),
    }
}

/// Lays explicit capabilities over vendor defaults.
fn merge_defaults(defaults: Capabilities, explicit: Capabilities) -> Capabilities {
    let mut merged = defaults.into_map();
    merged.extend(explicit.into_map());
    Capabilities::from_map(merged)
}

// ============================================================================
// Tests
// ============================================================================
