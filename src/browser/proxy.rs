//! Proxy capability types.
//!
//! Typed form of the W3C `proxy` capability. Serializes to the nested
//! object drivers expect, with a lower-case `proxyType`.
//!
//! # Example
//!
//! ```
//! use remote_webdriver::ProxyConfig;
//!
//! // HTTP and HTTPS through one proxy
//! let proxy = ProxyConfig::manual()
//!     .with_http_proxy("proxy.example.com:8080")
//!     .with_ssl_proxy("proxy.example.com:8080");
//!
//! // SOCKS5 with bypass list
//! let proxy = ProxyConfig::manual()
//!     .with_socks_proxy("proxy.example.com:1080", 5)
//!     .with_no_proxy(["localhost", "127.0.0.1"]);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

// ============================================================================
// ProxyType
// ============================================================================

/// How the browser reaches the network.
///
/// Parsing is case-insensitive; serialization is always lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProxyType {
    /// Direct connection (no proxy).
    #[default]
    Direct,

    /// Explicit per-protocol proxies.
    Manual,

    /// Proxy auto-configuration file.
    Pac,

    /// WPAD auto-detection.
    Autodetect,

    /// Operating-system settings.
    System,
}

// ============================================================================
// ProxyType - Implementation
// ============================================================================

impl ProxyType {
    /// Returns the W3C wire value.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Manual => "manual",
            Self::Pac => "pac",
            Self::Autodetect => "autodetect",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "manual" => Ok(Self::Manual),
            "pac" => Ok(Self::Pac),
            "autodetect" => Ok(Self::Autodetect),
            "system" => Ok(Self::System),
            other => Err(Error::invalid_argument(format!(
                "unknown proxy type: {other}"
            ))),
        }
    }
}

impl Serialize for ProxyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProxyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// ProxyConfig
// ============================================================================

/// W3C proxy capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Proxy type.
    pub proxy_type: ProxyType,

    /// PAC file URL (`pac` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_autoconfig_url: Option<String>,

    /// HTTP proxy `host[:port]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,

    /// HTTPS proxy `host[:port]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_proxy: Option<String>,

    /// FTP proxy `host[:port]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ftp_proxy: Option<String>,

    /// SOCKS proxy `host[:port]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socks_proxy: Option<String>,

    /// SOCKS protocol version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socks_version: Option<u8>,

    /// Hosts that bypass the proxy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub no_proxy: Vec<String>,
}

// ============================================================================
// ProxyConfig - Constructors
// ============================================================================

impl ProxyConfig {
    /// Creates a configuration of the given type.
    #[must_use]
    pub fn new(proxy_type: ProxyType) -> Self {
        Self {
            proxy_type,
            ..Self::default()
        }
    }

    /// Creates a manual configuration; add proxies with the `with_*` methods.
    #[inline]
    #[must_use]
    pub fn manual() -> Self {
        Self::new(ProxyType::Manual)
    }

    /// Creates a direct (no proxy) configuration.
    #[inline]
    #[must_use]
    pub fn direct() -> Self {
        Self::new(ProxyType::Direct)
    }

    /// Creates a system-settings configuration.
    #[inline]
    #[must_use]
    pub fn system() -> Self {
        Self::new(ProxyType::System)
    }

    /// Creates an auto-detect configuration.
    #[inline]
    #[must_use]
    pub fn autodetect() -> Self {
        Self::new(ProxyType::Autodetect)
    }

    /// Creates a PAC configuration.
    #[must_use]
    pub fn pac(url: impl Into<String>) -> Self {
        Self {
            proxy_autoconfig_url: Some(url.into()),
            ..Self::new(ProxyType::Pac)
        }
    }
}

// ============================================================================
// ProxyConfig - Builder Methods
// ============================================================================

impl ProxyConfig {
    /// Sets the HTTP proxy.
    #[must_use]
    pub fn with_http_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.http_proxy = Some(proxy.into());
        self
    }

    /// Sets the HTTPS proxy.
    #[must_use]
    pub fn with_ssl_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.ssl_proxy = Some(proxy.into());
        self
    }

    /// Sets the FTP proxy.
    #[must_use]
    pub fn with_ftp_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.ftp_proxy = Some(proxy.into());
        self
    }

    /// Sets the SOCKS proxy and protocol version.
    #[must_use]
    pub fn with_socks_proxy(mut self, proxy: impl Into<String>, version: u8) -> Self {
        self.socks_proxy = Some(proxy.into());
        self.socks_version = Some(version);
        self
    }

    /// Sets the hosts that bypass the proxy.
    #[must_use]
    pub fn with_no_proxy<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.no_proxy = hosts.into_iter().map(Into::into).collect();
        self
    }
}

// ============================================================================
// ProxyConfig - Predicates
// ============================================================================

impl ProxyConfig {
    /// Returns `true` if a SOCKS proxy is configured.
    #[inline]
    #[must_use]
    pub fn is_socks(&self) -> bool {
        self.socks_proxy.is_some()
    }

    /// Returns `true` if traffic goes through no proxy at all.
    #[inline]
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.proxy_type == ProxyType::Direct
    }
}

// ============================================================================
// Tests
// ============================================================================
