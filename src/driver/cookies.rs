//! Cookies of the current document.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::protocol::command;

use super::core::Driver;

// ============================================================================
// Cookie
// ============================================================================

/// Browser cookie with standard properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Secure flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// HttpOnly flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// Expiry in seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
    /// SameSite attribute: `Strict`, `Lax` or `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl Cookie {
    /// Creates a new cookie with name and value.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            secure: None,
            http_only: None,
            expiry: None,
            same_site: None,
        }
    }

    /// Sets the domain.
    #[inline]
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the path.
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the secure flag.
    #[inline]
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Sets the httpOnly flag.
    #[inline]
    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    /// Sets the expiry.
    #[inline]
    #[must_use]
    pub fn with_expiry(mut self, expiry: u64) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Sets the sameSite attribute.
    #[inline]
    #[must_use]
    pub fn with_same_site(mut self, same_site: impl Into<String>) -> Self {
        self.same_site = Some(same_site.into());
        self
    }
}

// ============================================================================
// Driver - Cookies
// ============================================================================

impl Driver {
    /// Returns every cookie visible to the current document.
    pub async fn cookies(&self) -> Result<Vec<Cookie>> {
        let value = self.command(command::GET_ALL_COOKIES, Value::Null).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::malformed_response(format!("invalid cookie list: {e}")))
    }

    /// Returns the named cookie, or `None` if it does not exist.
    pub async fn cookie(&self, name: &str) -> Result<Option<Cookie>> {
        match self.command(command::GET_COOKIE, json!({ "name": name })).await {
            Ok(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::malformed_response(format!("invalid cookie: {e}"))),
            Err(e) if e.kind() == ErrorKind::NoSuchCookie => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Adds a cookie to the current document.
    pub async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        debug!(name = %cookie.name, "Adding cookie");
        self.command(command::ADD_COOKIE, json!({ "cookie": cookie }))
            .await?;
        Ok(())
    }

    /// Deletes the named cookie.
    pub async fn delete_cookie(&self, name: &str) -> Result<()> {
        self.command(command::DELETE_COOKIE, json!({ "name": name }))
            .await?;
        Ok(())
    }

    /// Deletes every cookie of the current document.
    pub async fn delete_all_cookies(&self) -> Result<()> {
        self.command(command::DELETE_ALL_COOKIES, Value::Null).await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
