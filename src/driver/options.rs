//! Session timeouts.
//!
//! Driver-side timeouts, as opposed to the client-side request timeout
//! configured on the [`DriverBuilder`](super::DriverBuilder).
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use remote_webdriver::Timeouts;
//!
//! driver
//!     .set_timeouts(
//!         Timeouts::new()
//!             .with_implicit(Duration::ZERO)
//!             .with_page_load(Duration::from_secs(60)),
//!     )
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::command;

use super::core::Driver;

// ============================================================================
// Timeouts
// ============================================================================

/// Driver-side session timeouts in milliseconds.
///
/// Unset fields are left unchanged by [`Driver::set_timeouts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeouts {
    /// Script evaluation timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<u64>,

    /// Page load timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_load: Option<u64>,

    /// Implicit element-location wait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit: Option<u64>,
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Timeouts {
    /// Creates an empty set (changes nothing).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            script: None,
            page_load: None,
            implicit: None,
        }
    }

    /// Sets the script timeout.
    #[inline]
    #[must_use]
    pub fn with_script(mut self, timeout: Duration) -> Self {
        self.script = Some(timeout.as_millis() as u64);
        self
    }

    /// Sets the page load timeout.
    #[inline]
    #[must_use]
    pub fn with_page_load(mut self, timeout: Duration) -> Self {
        self.page_load = Some(timeout.as_millis() as u64);
        self
    }

    /// Sets the implicit wait.
    #[inline]
    #[must_use]
    pub fn with_implicit(mut self, timeout: Duration) -> Self {
        self.implicit = Some(timeout.as_millis() as u64);
        self
    }

    /// Returns `true` if no timeout is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.script.is_none() && self.page_load.is_none() && self.implicit.is_none()
    }
}

// ============================================================================
// Driver - Timeouts
// ============================================================================

impl Driver {
    /// Updates driver-side timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `timeouts` is empty.
    pub async fn set_timeouts(&self, timeouts: Timeouts) -> Result<()> {
        if timeouts.is_empty() {
            return Err(Error::invalid_argument("no timeout given"));
        }
        debug!(?timeouts, "Setting timeouts");
        self.command(command::SET_TIMEOUTS, serde_json::to_value(timeouts)?)
            .await?;
        Ok(())
    }

    /// Returns the current driver-side timeouts.
    pub async fn timeouts(&self) -> Result<Timeouts> {
        let value = self.command(command::GET_TIMEOUTS, serde_json::Value::Null).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::malformed_response(format!("invalid timeouts: {e}")))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_new_is_empty() {
        assert!(Timeouts::new().is_empty());
        assert_eq!(Timeouts::new(), Timeouts::default());
    }

    #[test]
    fn test_serializes_set_fields_only() {
        let timeouts = Timeouts::new()
            .with_page_load(Duration::from_secs(60))
            .with_implicit(Duration::ZERO);
        assert_eq!(
            serde_json::to_value(timeouts).unwrap(),
            json!({"pageLoad": 60000, "implicit": 0})
        );
    }

    #[test]
    fn test_deserializes_driver_reply() {
        let timeouts: Timeouts =
            serde_json::from_value(json!({"script": 30000, "pageLoad": 300000, "implicit": 0}))
                .unwrap();
        assert_eq!(timeouts.script, Some(30_000));
        assert_eq!(timeouts.page_load, Some(300_000));
        assert_eq!(timeouts.implicit, Some(0));
    }

    #[test]
    fn test_null_script_timeout() {
        let timeouts: Timeouts =
            serde_json::from_value(json!({"script": null, "pageLoad": 1, "implicit": 2})).unwrap();
        assert_eq!(timeouts.script, None);
    }
}
