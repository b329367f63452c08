//! Capability sets and legacy-to-W3C translation.
//!
//! Callers describe the browser they want with a legacy-style flat
//! [`Capabilities`] map. The new-session payload carries that map
//! untouched under `desiredCapabilities` and a W3C translation of it
//! under `capabilities`, so drivers speaking either dialect can answer:
//!
//! ```json
//! {
//!   "capabilities": { "firstMatch": [ {} ], "alwaysMatch": { ... } },
//!   "desiredCapabilities": { ... }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::browser::proxy::ProxyConfig;
use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Capability names defined by W3C WebDriver.
pub const W3C_CAPABILITY_NAMES: &[&str] = &[
    "acceptInsecureCerts",
    "browserName",
    "browserVersion",
    "pageLoadStrategy",
    "platformName",
    "proxy",
    "setWindowRect",
    "strictFileInteractability",
    "timeouts",
    "unhandledPromptBehavior",
    "webSocketUrl",
];

/// Legacy names with a W3C equivalent.
const LEGACY_TO_W3C: &[(&str, &str)] = &[
    ("acceptSslCerts", "acceptInsecureCerts"),
    ("version", "browserVersion"),
    ("platform", "platformName"),
];

/// Flat legacy proxy keys folded into the nested `proxy` object.
const FLAT_PROXY_KEYS: &[&str] = &[
    "proxyType",
    "httpProxy",
    "sslProxy",
    "ftpProxy",
    "socksProxy",
    "socksVersion",
    "socksUsername",
    "socksPassword",
    "noProxy",
    "proxyAutoconfigUrl",
];

// ============================================================================
// PageLoadStrategy
// ============================================================================

/// When navigation commands return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageLoadStrategy {
    /// Wait for the `load` event.
    #[default]
    Normal,
    /// Wait for `DOMContentLoaded`.
    Eager,
    /// Return immediately.
    None,
}

// ============================================================================
// Capabilities
// ============================================================================

/// A legacy-style flat capability map.
///
/// Once a session is active, the driver's returned capabilities are
/// exposed through the same type and are never mutated by the client.
///
/// # Example
///
/// ```
/// use remote_webdriver::Capabilities;
///
/// let caps = Capabilities::chrome()
///     .with_browser_version("120")
///     .set("goog:chromeOptions", serde_json::json!({"args": ["--headless"]}));
/// assert_eq!(caps.browser_name(), Some("chrome"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(Map<String, Value>);

// ============================================================================
// Capabilities - Constructors
// ============================================================================

impl Capabilities {
    /// Creates an empty capability set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a capability set requesting the named browser.
    #[must_use]
    pub fn browser(name: impl Into<String>) -> Self {
        Self::new().set("browserName", name.into())
    }

    /// Chrome defaults.
    #[must_use]
    pub fn chrome() -> Self {
        Self::browser("chrome")
    }

    /// Firefox defaults.
    #[must_use]
    pub fn firefox() -> Self {
        Self::browser("firefox")
            .set("acceptInsecureCerts", true)
            .set("moz:debuggerAddress", true)
    }

    /// Edge defaults.
    #[must_use]
    pub fn edge() -> Self {
        Self::browser("MicrosoftEdge")
    }

    /// Safari defaults.
    #[must_use]
    pub fn safari() -> Self {
        Self::browser("safari").set("platformName", "mac")
    }

    /// Wraps an existing JSON map.
    #[inline]
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Parses a JSON value; non-object values yield an empty set.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

// ============================================================================
// Capabilities - Builder Methods
// ============================================================================

impl Capabilities {
    /// Sets an arbitrary capability.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Sets the legacy `version` capability.
    #[must_use]
    pub fn with_browser_version(self, version: impl Into<String>) -> Self {
        self.set("version", version.into())
    }

    /// Sets the legacy `platform` capability.
    #[must_use]
    pub fn with_platform(self, platform: impl Into<String>) -> Self {
        self.set("platform", platform.into())
    }

    /// Sets the `proxy` capability.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the proxy cannot be serialized.
    pub fn with_proxy(self, proxy: &ProxyConfig) -> Result<Self> {
        Ok(self.set("proxy", serde_json::to_value(proxy)?))
    }

    /// Sets the `pageLoadStrategy` capability.
    #[must_use]
    pub fn with_page_load_strategy(self, strategy: PageLoadStrategy) -> Self {
        let value = serde_json::to_value(strategy).unwrap_or(Value::Null);
        self.set("pageLoadStrategy", value)
    }

    /// Sets the legacy `acceptSslCerts` capability.
    #[must_use]
    pub fn accept_insecure_certs(self, accept: bool) -> Self {
        self.set("acceptSslCerts", accept)
    }
}

// ============================================================================
// Capabilities - Accessors
// ============================================================================

impl Capabilities {
    /// Returns a capability value.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns the requested or negotiated browser name.
    #[must_use]
    pub fn browser_name(&self) -> Option<&str> {
        self.get("browserName").and_then(Value::as_str)
    }

    /// Returns the browser version under either naming convention.
    #[must_use]
    pub fn browser_version(&self) -> Option<&str> {
        self.get("browserVersion")
            .or_else(|| self.get("version"))
            .and_then(Value::as_str)
    }

    /// Returns the platform under either naming convention.
    #[must_use]
    pub fn platform_name(&self) -> Option<&str> {
        self.get("platformName")
            .or_else(|| self.get("platform"))
            .and_then(Value::as_str)
    }

    /// Returns the underlying map.
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the set, returning the underlying map.
    #[inline]
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Returns the number of capabilities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Capabilities - Translation
// ============================================================================

impl Capabilities {
    /// Returns the W3C `alwaysMatch` translation of this set.
    #[must_use]
    pub fn to_w3c(&self) -> Map<String, Value> {
        to_w3c(&self.0)
    }

    /// Builds the dual-format new-session payload.
    #[must_use]
    pub fn new_session_payload(&self) -> Value {
        new_session_payload(&self.0)
    }
}

/// Translates legacy capabilities into the W3C `alwaysMatch` object.
///
/// The mapping is pure and deterministic:
///
/// - flat legacy proxy keys move into the nested `proxy` object and the
///   proxy type is lower-cased
/// - `acceptSslCerts`, `version`, `platform` are renamed (platform value
///   lower-cased); falsy legacy values are skipped
/// - W3C names and vendor-prefixed (`vendor:name`) keys are kept
/// - `firefox_profile` is folded into `moz:firefoxOptions.profile`
/// - every other key is dropped
///
/// Applying it again to its own output returns the output unchanged.
#[must_use]
pub fn to_w3c(legacy: &Map<String, Value>) -> Map<String, Value> {
    let caps = normalize_proxy(legacy);
    let mut always_match = Map::new();

    for (key, value) in &caps {
        if let Some((_, w3c_name)) = LEGACY_TO_W3C.iter().find(|(name, _)| name == key) {
            if is_truthy(value) {
                let mapped = match (key.as_str(), value) {
                    ("platform", Value::String(s)) => Value::String(s.to_lowercase()),
                    _ => value.clone(),
                };
                always_match.insert((*w3c_name).to_string(), mapped);
            }
        }
        if W3C_CAPABILITY_NAMES.contains(&key.as_str()) || key.contains(':') {
            always_match.insert(key.clone(), value.clone());
        }
    }

    if let Some(profile) = caps.get("firefox_profile").filter(|p| is_truthy(p)) {
        let mut moz_options = always_match
            .get("moz:firefoxOptions")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        if !moz_options.contains_key("profile") {
            moz_options.insert("profile".into(), profile.clone());
            always_match.insert("moz:firefoxOptions".into(), Value::Object(moz_options));
        }
    }

    always_match
}

/// Builds the W3C `capabilities` object: `{firstMatch: [{}], alwaysMatch}`.
#[must_use]
pub fn w3c_capabilities(legacy: &Map<String, Value>) -> Value {
    json!({
        "firstMatch": [{}],
        "alwaysMatch": to_w3c(legacy),
    })
}

/// Builds the new-session payload carrying both capability dialects.
#[must_use]
pub fn new_session_payload(legacy: &Map<String, Value>) -> Value {
    json!({
        "capabilities": w3c_capabilities(legacy),
        "desiredCapabilities": Value::Object(legacy.clone()),
    })
}

/// Folds flat legacy proxy keys into a nested `proxy` object.
///
/// Values already present in a nested `proxy` object win over flat keys.
/// The proxy type is lower-cased.
#[must_use]
pub fn normalize_proxy(caps: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    let mut flat = Map::new();

    for (key, value) in caps {
        if FLAT_PROXY_KEYS.contains(&key.as_str()) {
            flat.insert(key.clone(), value.clone());
        } else {
            out.insert(key.clone(), value.clone());
        }
    }

    let nested = out.get("proxy").and_then(Value::as_object).cloned();
    if flat.is_empty() && nested.is_none() {
        return out;
    }

    let mut proxy = flat;
    if let Some(nested) = nested {
        proxy.extend(nested);
    }
    if let Some(Value::String(kind)) = proxy.get_mut("proxyType") {
        *kind = kind.to_lowercase();
    }
    out.insert("proxy".into(), Value::Object(proxy));
    out
}

/// Truthiness of a JSON value.
///
/// `null`, `false`, zero, and empty strings, arrays and objects are falsy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn test_proxy_type_is_lower_cased() {
        let caps = map(json!({"proxy": {"proxyType": "MANUAL", "httpProxy": "x"}}));
        assert_eq!(
            Value::Object(to_w3c(&caps)),
            json!({"proxy": {"proxyType": "manual", "httpProxy": "x"}})
        );
    }

    #[test]
    fn test_flat_and_nested_proxy_normalize_identically() {
        let flat = map(json!({"proxyType": "MANUAL", "httpProxy": "x"}));
        let nested = map(json!({"proxy": {"proxyType": "manual", "httpProxy": "x"}}));
        assert_eq!(to_w3c(&flat), to_w3c(&nested));
    }

    #[test]
    fn test_legacy_names_are_renamed() {
        let caps = map(json!({
            "browserName": "firefox",
            "version": "120",
            "platform": "WINDOWS",
            "acceptSslCerts": true,
        }));
        assert_eq!(
            Value::Object(to_w3c(&caps)),
            json!({
                "browserName": "firefox",
                "browserVersion": "120",
                "platformName": "windows",
                "acceptInsecureCerts": true,
            })
        );
    }

    #[test]
    fn test_falsy_legacy_values_are_skipped() {
        let caps = map(json!({"browserName": "x", "version": "", "acceptSslCerts": false}));
        assert_eq!(Value::Object(to_w3c(&caps)), json!({"browserName": "x"}));
    }

    #[test]
    fn test_unknown_keys_dropped_vendor_keys_kept() {
        let caps = map(json!({
            "browserName": "chrome",
            "javascriptEnabled": true,
            "goog:chromeOptions": {"args": ["--headless"]},
        }));
        let w3c = to_w3c(&caps);
        assert!(!w3c.contains_key("javascriptEnabled"));
        assert_eq!(w3c["goog:chromeOptions"], json!({"args": ["--headless"]}));
    }

    #[test]
    fn test_firefox_profile_folds_into_options() {
        let caps = map(json!({
            "browserName": "firefox",
            "firefox_profile": "UEsDB",
            "moz:firefoxOptions": {"args": ["-headless"]},
        }));
        let w3c = to_w3c(&caps);
        assert_eq!(
            w3c["moz:firefoxOptions"],
            json!({"args": ["-headless"], "profile": "UEsDB"})
        );
        assert!(!w3c.contains_key("firefox_profile"));
    }

    #[test]
    fn test_new_session_payload_shape() {
        let caps = Capabilities::browser("x").with_platform("ANY");
        let payload = caps.new_session_payload();
        assert_eq!(
            payload,
            json!({
                "capabilities": {
                    "firstMatch": [{}],
                    "alwaysMatch": {"browserName": "x", "platformName": "any"},
                },
                "desiredCapabilities": {"browserName": "x", "platform": "ANY"},
            })
        );
    }

    #[test]
    fn test_presets() {
        assert_eq!(Capabilities::chrome().browser_name(), Some("chrome"));
        assert_eq!(Capabilities::edge().browser_name(), Some("MicrosoftEdge"));
        assert_eq!(Capabilities::safari().platform_name(), Some("mac"));
        assert_eq!(
            Capabilities::firefox().get("acceptInsecureCerts"),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_with_proxy_uses_nested_object() {
        let proxy = ProxyConfig::manual().with_http_proxy("proxy:8080");
        let caps = Capabilities::chrome().with_proxy(&proxy).expect("proxy");
        let w3c = caps.to_w3c();
        assert_eq!(w3c["proxy"]["proxyType"], json!("manual"));
        assert_eq!(w3c["proxy"]["httpProxy"], json!("proxy:8080"));
    }

    #[test]
    fn test_page_load_strategy_serializes_lowercase() {
        let caps = Capabilities::new().with_page_load_strategy(PageLoadStrategy::Eager);
        assert_eq!(caps.get("pageLoadStrategy"), Some(&json!("eager")));
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!("a")));
        assert!(is_truthy(&json!(1.5)));
        assert!(is_truthy(&json!([0])));
    }

    fn legacy_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(Value::from),
            "[a-zA-Z]{0,8}".prop_map(Value::from),
        ]
    }

    fn legacy_key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("browserName".to_string()),
            Just("version".to_string()),
            Just("platform".to_string()),
            Just("acceptSslCerts".to_string()),
            Just("pageLoadStrategy".to_string()),
            Just("httpProxy".to_string()),
            Just("proxyType".to_string()),
            Just("goog:chromeOptions".to_string()),
            "[a-z]{1,6}",
        ]
    }

    proptest! {
        #[test]
        fn prop_to_w3c_is_deterministic_and_idempotent(
            entries in proptest::collection::vec((legacy_key(), legacy_value()), 0..8)
        ) {
            let caps: Map<String, Value> = entries.into_iter().collect();
            let first = to_w3c(&caps);
            prop_assert_eq!(&first, &to_w3c(&caps));
            prop_assert_eq!(&to_w3c(&first), &first);
        }
    }
}
