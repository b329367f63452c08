//! Command names and the command registry.
//!
//! A command is addressed by name and resolves to an HTTP method plus a
//! URL path template. Templates contain `$name` placeholders (most often
//! `$sessionId` and `$elementId`) that are filled from the command's
//! parameter object at encode time.
//!
//! # Standard Commands
//!
//! | Group | Commands |
//! |-------|----------|
//! | Session | `newSession`, `quit`, `status` |
//! | Navigation | `get`, `getCurrentUrl`, `goBack`, `goForward`, `refresh`, `getTitle`, `getPageSource` |
//! | Elements | `findElement(s)`, `findChildElement(s)`, `getActiveElement`, element state and actions |
//! | Script | `executeScript`, `executeAsyncScript` |
//! | Window | handles, switching, frames, screenshots, timeouts |
//! | Cookies | `getAllCookies`, `getCookie`, `addCookie`, `deleteCookie`, `deleteAllCookies` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::{Error, Result};

use super::request::Envelope;

// ============================================================================
// Command Names
// ============================================================================

/// Create a session.
pub const NEW_SESSION: &str = "newSession";
/// End the session.
pub const QUIT: &str = "quit";
/// Query remote end readiness.
pub const STATUS: &str = "status";

/// Navigate to a URL.
pub const GET: &str = "get";
/// Read the current URL.
pub const GET_CURRENT_URL: &str = "getCurrentUrl";
/// Step back in history.
pub const GO_BACK: &str = "goBack";
/// Step forward in history.
pub const GO_FORWARD: &str = "goForward";
/// Reload the page.
pub const REFRESH: &str = "refresh";
/// Read the document title.
pub const GET_TITLE: &str = "getTitle";
/// Read the serialized DOM.
pub const GET_PAGE_SOURCE: &str = "getPageSource";

/// Find the first element from the document root.
pub const FIND_ELEMENT: &str = "findElement";
/// Find all elements from the document root.
pub const FIND_ELEMENTS: &str = "findElements";
/// Find the first element below another element.
pub const FIND_CHILD_ELEMENT: &str = "findChildElement";
/// Find all elements below another element.
pub const FIND_CHILD_ELEMENTS: &str = "findChildElements";
/// Return the focused element.
pub const GET_ACTIVE_ELEMENT: &str = "getActiveElement";

/// Click an element.
pub const CLICK_ELEMENT: &str = "clickElement";
/// Clear an editable element.
pub const CLEAR_ELEMENT: &str = "clearElement";
/// Type into an element.
pub const SEND_KEYS_TO_ELEMENT: &str = "sendKeysToElement";
/// Read rendered element text.
pub const GET_ELEMENT_TEXT: &str = "getElementText";
/// Read an element's tag name.
pub const GET_ELEMENT_TAG_NAME: &str = "getElementTagName";
/// Read an element attribute.
pub const GET_ELEMENT_ATTRIBUTE: &str = "getElementAttribute";
/// Read a DOM property of an element.
pub const GET_ELEMENT_PROPERTY: &str = "getElementProperty";
/// Read element position and size.
pub const GET_ELEMENT_RECT: &str = "getElementRect";
/// Check whether an element is selected.
pub const IS_ELEMENT_SELECTED: &str = "isElementSelected";
/// Check whether an element is enabled.
pub const IS_ELEMENT_ENABLED: &str = "isElementEnabled";
/// Capture a PNG of one element.
pub const ELEMENT_SCREENSHOT: &str = "elementScreenshot";

/// Run synchronous JavaScript.
pub const EXECUTE_SCRIPT: &str = "executeScript";
/// Run callback-style JavaScript.
pub const EXECUTE_ASYNC_SCRIPT: &str = "executeAsyncScript";

/// Capture a PNG of the viewport.
pub const SCREENSHOT: &str = "screenshot";
/// Set session timeouts.
pub const SET_TIMEOUTS: &str = "setTimeouts";
/// Read session timeouts.
pub const GET_TIMEOUTS: &str = "getTimeouts";
/// Read the current window handle.
pub const GET_WINDOW_HANDLE: &str = "getWindowHandle";
/// List all window handles.
pub const GET_WINDOW_HANDLES: &str = "getWindowHandles";
/// Switch to a window by handle.
pub const SWITCH_TO_WINDOW: &str = "switchToWindow";
/// Close the current window.
pub const CLOSE_WINDOW: &str = "closeWindow";
/// Switch into a frame.
pub const SWITCH_TO_FRAME: &str = "switchToFrame";
/// Switch to the parent frame.
pub const SWITCH_TO_PARENT_FRAME: &str = "switchToParentFrame";

/// List all cookies.
pub const GET_ALL_COOKIES: &str = "getAllCookies";
/// Read one cookie by name.
pub const GET_COOKIE: &str = "getCookie";
/// Add a cookie.
pub const ADD_COOKIE: &str = "addCookie";
/// Delete one cookie by name.
pub const DELETE_COOKIE: &str = "deleteCookie";
/// Delete every cookie.
pub const DELETE_ALL_COOKIES: &str = "deleteAllCookies";

/// Standard command table: name, method, path template.
const STANDARD_COMMANDS: &[(&str, Method, &str)] = &[
    (NEW_SESSION, Method::Post, "/session"),
    (QUIT, Method::Delete, "/session/$sessionId"),
    (STATUS, Method::Get, "/status"),
    (GET, Method::Post, "/session/$sessionId/url"),
    (GET_CURRENT_URL, Method::Get, "/session/$sessionId/url"),
    (GO_BACK, Method::Post, "/session/$sessionId/back"),
    (GO_FORWARD, Method::Post, "/session/$sessionId/forward"),
    (REFRESH, Method::Post, "/session/$sessionId/refresh"),
    (GET_TITLE, Method::Get, "/session/$sessionId/title"),
    (GET_PAGE_SOURCE, Method::Get, "/session/$sessionId/source"),
    (FIND_ELEMENT, Method::Post, "/session/$sessionId/element"),
    (FIND_ELEMENTS, Method::Post, "/session/$sessionId/elements"),
    (FIND_CHILD_ELEMENT, Method::Post, "/session/$sessionId/element/$elementId/element"),
    (FIND_CHILD_ELEMENTS, Method::Post, "/session/$sessionId/element/$elementId/elements"),
    (GET_ACTIVE_ELEMENT, Method::Get, "/session/$sessionId/element/active"),
    (CLICK_ELEMENT, Method::Post, "/session/$sessionId/element/$elementId/click"),
    (CLEAR_ELEMENT, Method::Post, "/session/$sessionId/element/$elementId/clear"),
    (SEND_KEYS_TO_ELEMENT, Method::Post, "/session/$sessionId/element/$elementId/value"),
    (GET_ELEMENT_TEXT, Method::Get, "/session/$sessionId/element/$elementId/text"),
    (GET_ELEMENT_TAG_NAME, Method::Get, "/session/$sessionId/element/$elementId/name"),
    (GET_ELEMENT_ATTRIBUTE, Method::Get, "/session/$sessionId/element/$elementId/attribute/$name"),
    (GET_ELEMENT_PROPERTY, Method::Get, "/session/$sessionId/element/$elementId/property/$name"),
    (GET_ELEMENT_RECT, Method::Get, "/session/$sessionId/element/$elementId/rect"),
    (IS_ELEMENT_SELECTED, Method::Get, "/session/$sessionId/element/$elementId/selected"),
    (IS_ELEMENT_ENABLED, Method::Get, "/session/$sessionId/element/$elementId/enabled"),
    (ELEMENT_SCREENSHOT, Method::Get, "/session/$sessionId/element/$elementId/screenshot"),
    (EXECUTE_SCRIPT, Method::Post, "/session/$sessionId/execute/sync"),
    (EXECUTE_ASYNC_SCRIPT, Method::Post, "/session/$sessionId/execute/async"),
    (SCREENSHOT, Method::Get, "/session/$sessionId/screenshot"),
    (SET_TIMEOUTS, Method::Post, "/session/$sessionId/timeouts"),
    (GET_TIMEOUTS, Method::Get, "/session/$sessionId/timeouts"),
    (GET_WINDOW_HANDLE, Method::Get, "/session/$sessionId/window"),
    (GET_WINDOW_HANDLES, Method::Get, "/session/$sessionId/window/handles"),
    (SWITCH_TO_WINDOW, Method::Post, "/session/$sessionId/window"),
    (CLOSE_WINDOW, Method::Delete, "/session/$sessionId/window"),
    (SWITCH_TO_FRAME, Method::Post, "/session/$sessionId/frame"),
    (SWITCH_TO_PARENT_FRAME, Method::Post, "/session/$sessionId/frame/parent"),
    (GET_ALL_COOKIES, Method::Get, "/session/$sessionId/cookie"),
    (GET_COOKIE, Method::Get, "/session/$sessionId/cookie/$name"),
    (ADD_COOKIE, Method::Post, "/session/$sessionId/cookie"),
    (DELETE_COOKIE, Method::Delete, "/session/$sessionId/cookie/$name"),
    (DELETE_ALL_COOKIES, Method::Delete, "/session/$sessionId/cookie"),
];

// ============================================================================
// Method
// ============================================================================

/// HTTP method of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`, no body.
    Get,
    /// `POST`, JSON object body.
    Post,
    /// `DELETE`, no body.
    Delete,
}

impl Method {
    /// Returns the method name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` if requests with this method carry a JSON body.
    #[inline]
    #[must_use]
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CommandSpec
// ============================================================================

/// Wire shape of a registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// HTTP method.
    pub method: Method,
    /// Path template with `$name` placeholders.
    pub path: String,
}

// ============================================================================
// CommandRegistry
// ============================================================================

/// Table of known commands.
///
/// Starts from the standard table; vendor configurations register
/// additional entries on top.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: FxHashMap<String, CommandSpec>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CommandRegistry {
    /// Creates a registry holding only the standard commands.
    #[must_use]
    pub fn standard() -> Self {
        let commands = STANDARD_COMMANDS
            .iter()
            .map(|(name, method, path)| {
                (
                    (*name).to_string(),
                    CommandSpec {
                        method: *method,
                        path: (*path).to_string(),
                    },
                )
            })
            .collect();
        Self { commands }
    }

    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            commands: FxHashMap::default(),
        }
    }

    /// Registers (or replaces) a command.
    pub fn register(&mut self, name: impl Into<String>, method: Method, path: impl Into<String>) {
        self.commands.insert(
            name.into(),
            CommandSpec {
                method,
                path: path.into(),
            },
        );
    }

    /// Looks up a command by name.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    /// Returns `true` if the command is registered.
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Returns the number of registered commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no command is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Encodes a command into a wire envelope.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommand`] if `name` is not registered
    /// - [`Error::InvalidArgument`] if `params` is not an object or a
    ///   path placeholder has no value
    pub fn encode(&self, name: &str, params: Value) -> Result<Envelope> {
        let spec = self
            .get(name)
            .ok_or_else(|| Error::unknown_command(name))?;
        Envelope::build(name, spec, params)
    }
}

// ============================================================================
// Tests
// ============================================================================
