//! Element locator strategies.
//!
//! Provides Selenium-like `By` selectors. Each one maps onto a W3C
//! `using`/`value` pair; strategies the W3C protocol lacks (`id`, `name`,
//! `class name`) are rewritten as CSS selectors.
//!
//! # Example
//!
//! ```ignore
//! use remote_webdriver::By;
//!
//! // CSS selector (default)
//! let btn = driver.find_element(By::css("#submit")).await?;
//!
//! // By ID (rewritten to CSS `[id="login-form"]`)
//! let form = driver.find_element(By::id("login-form")).await?;
//!
//! // By XPath
//! let btn = driver.find_element(By::xpath("//button[@type='submit']")).await?;
//!
//! // By tag name
//! let inputs = driver.find_elements(By::tag("input")).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};

// ============================================================================
// By Enum
// ============================================================================

/// Element locator strategy (like Selenium's `By`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum By {
    /// CSS selector (most common).
    Css(String),

    /// XPath expression.
    XPath(String),

    /// Element ID, sent as `[id="..."]`.
    Id(String),

    /// Name attribute, sent as `[name="..."]`.
    Name(String),

    /// Single class name, sent as `.class`.
    Class(String),

    /// Tag name.
    Tag(String),

    /// Exact link text (for `<a>` elements).
    LinkText(String),

    /// Partial link text (for `<a>` elements).
    PartialLinkText(String),
}

impl By {
    /// Creates a CSS selector.
    #[inline]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Creates an XPath selector.
    #[inline]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Creates an ID selector.
    #[inline]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Creates a name attribute selector.
    #[inline]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Creates a class name selector.
    #[inline]
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    /// Creates a tag name selector.
    #[inline]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    /// Creates a link text selector.
    #[inline]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// Creates a partial link text selector.
    #[inline]
    pub fn partial_link_text(text: impl Into<String>) -> Self {
        Self::PartialLinkText(text.into())
    }

    /// Returns the W3C `using` value.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) | Self::Id(_) | Self::Name(_) | Self::Class(_) => "css selector",
            Self::XPath(_) => "xpath",
            Self::Tag(_) => "tag name",
            Self::LinkText(_) => "link text",
            Self::PartialLinkText(_) => "partial link text",
        }
    }

    /// Returns the W3C `value` for this locator.
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Self::Id(id) => format!("[id=\"{}\"]", escape_css_string(id)),
            Self::Name(name) => format!("[name=\"{}\"]", escape_css_string(name)),
            Self::Class(class) => format!(".{}", escape_css_ident(class)),
            Self::Css(v)
            | Self::XPath(v)
            | Self::Tag(v)
            | Self::LinkText(v)
            | Self::PartialLinkText(v) => v.clone(),
        }
    }

    /// Returns the raw selector text as supplied by the caller.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Css(v)
            | Self::XPath(v)
            | Self::Id(v)
            | Self::Name(v)
            | Self::Class(v)
            | Self::Tag(v)
            | Self::LinkText(v)
            | Self::PartialLinkText(v) => v,
        }
    }

    /// Returns the find-element parameters `{"using", "value"}`.
    #[must_use]
    pub fn to_params(&self) -> Value {
        json!({ "using": self.strategy(), "value": self.value() })
    }
}

impl std::fmt::Display for By {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

// ============================================================================
// From implementations for ergonomics
// ============================================================================

impl From<&str> for By {
    /// Converts a string to CSS selector (default).
    fn from(s: &str) -> Self {
        Self::Css(s.to_string())
    }
}

impl From<String> for By {
    /// Converts a string to CSS selector (default).
    fn from(s: String) -> Self {
        Self::Css(s)
    }
}

// ============================================================================
// CSS Escaping
// ============================================================================

/// Escapes a value for use inside a double-quoted CSS attribute string.
fn escape_css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes a value for use as a CSS identifier.
fn escape_css_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.chars().enumerate() {
        let leading_digit = i == 0 && ch.is_ascii_digit();
        if leading_digit {
            out.push_str(&format!("\\{:x} ", u32::from(ch)));
        } else if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_css() {
        let by = By::css("#login");
        assert_eq!(by.strategy(), "css selector");
        assert_eq!(by.value(), "#login");
    }

    #[test]
    fn test_by_id_becomes_css() {
        let by = By::id("user\"name");
        assert_eq!(by.strategy(), "css selector");
        assert_eq!(by.value(), r#"[id="user\"name"]"#);
        assert_eq!(by.raw(), "user\"name");
    }

    #[test]
    fn test_by_name_and_class() {
        assert_eq!(By::name("email").value(), r#"[name="email"]"#);
        assert_eq!(By::class("btn.primary").value(), r".btn\.primary");
        assert_eq!(By::class("1col").value(), r".\31 col");
    }

    #[test]
    fn test_native_strategies() {
        assert_eq!(By::xpath("//a").strategy(), "xpath");
        assert_eq!(By::tag("input").strategy(), "tag name");
        assert_eq!(By::link_text("Home").strategy(), "link text");
        assert_eq!(By::partial_link_text("Ho").strategy(), "partial link text");
    }

    #[test]
    fn test_to_params() {
        assert_eq!(
            By::xpath("//button").to_params(),
            json!({"using": "xpath", "value": "//button"})
        );
    }

    #[test]
    fn test_from_str() {
        let by: By = "#login".into();
        assert!(matches!(by, By::Css(_)));
        assert_eq!(by.to_string(), "css selector=#login");
    }
}
