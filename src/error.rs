//! Error types for the remote WebDriver client.
//!
//! Every fallible operation returns [`Result<T>`], which uses [`Error`].
//! Driver-reported failures are classified by their machine-readable
//! error code (W3C string or legacy numeric status) into [`ErrorKind`]
//! and surfaced with the driver's own message and diagnostics.
//!
//! # Usage
//!
//! ```ignore
//! use remote_webdriver::{By, Error, Result};
//!
//! async fn example(driver: &Driver) -> Result<()> {
//!     match driver.find_element(By::css("#submit")).await {
//!         Ok(element) => element.click().await,
//!         Err(Error::NoSuchElement { .. }) => Ok(()),
//!         Err(e) => Err(e),
//!     }
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::DriverNotFound`] |
//! | Service | [`Error::ServiceLaunch`], [`Error::ServiceStartTimeout`] |
//! | Session | [`Error::NoActiveSession`], [`Error::SessionNotCreated`], [`Error::InvalidSessionId`] |
//! | Protocol | [`Error::UnknownCommand`], [`Error::InvalidArgument`], [`Error::MalformedResponse`] |
//! | Element | [`Error::NoSuchElement`], [`Error::StaleElementReference`] |
//! | Execution | [`Error::RequestTimeout`], [`Error::Timeout`], [`Error::Driver`] |
//! | External | [`Error::Connection`], [`Error::Io`], [`Error::Json`], [`Error::Http`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;

use crate::identifiers::{ElementId, RequestId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// ErrorKind
// ============================================================================

/// Machine-readable classification of a failure.
///
/// Driver-side kinds correspond one-to-one with the W3C error codes.
/// The remaining kinds classify failures detected locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `element click intercepted`
    ElementClickIntercepted,
    /// `element not interactable`
    ElementNotInteractable,
    /// `insecure certificate`
    InsecureCertificate,
    /// `invalid argument`
    InvalidArgument,
    /// `invalid cookie domain`
    InvalidCookieDomain,
    /// `invalid element state`
    InvalidElementState,
    /// `invalid selector`
    InvalidSelector,
    /// `invalid session id`
    InvalidSessionId,
    /// `javascript error`
    JavascriptError,
    /// `move target out of bounds`
    MoveTargetOutOfBounds,
    /// `no such alert`
    NoSuchAlert,
    /// `no such cookie`
    NoSuchCookie,
    /// `no such element`
    NoSuchElement,
    /// `no such frame`
    NoSuchFrame,
    /// `no such window`
    NoSuchWindow,
    /// `no such shadow root`
    NoSuchShadowRoot,
    /// `detached shadow root`
    DetachedShadowRoot,
    /// `script timeout`
    ScriptTimeout,
    /// `session not created`
    SessionNotCreated,
    /// `stale element reference`
    StaleElementReference,
    /// `timeout` reported by the driver.
    Timeout,
    /// `unable to set cookie`
    UnableToSetCookie,
    /// `unable to capture screen`
    UnableToCaptureScreen,
    /// `unexpected alert open`
    UnexpectedAlertOpen,
    /// `unknown command`
    UnknownCommand,
    /// `unknown error`, also used for unrecognised codes.
    UnknownError,
    /// `unknown method`
    UnknownMethod,
    /// `unsupported operation`
    UnsupportedOperation,

    /// Command issued outside the `Active` state.
    NoActiveSession,
    /// Response lacked the expected envelope shape.
    MalformedResponse,
    /// Transport-level timeout on a single command.
    RequestTimeout,
    /// Wait engine exhausted its timeout.
    WaitTimeout,
    /// Driver process failed to launch or exited during start-up.
    ServiceLaunch,
    /// Driver service did not become reachable in time.
    ServiceStartTimeout,
    /// Invalid client or service configuration.
    Config,
    /// Connection, I/O or serialization failure.
    Transport,
}

/// W3C error code table.
const W3C_CODES: &[(&str, ErrorKind)] = &[
    ("element click intercepted", ErrorKind::ElementClickIntercepted),
    ("element not interactable", ErrorKind::ElementNotInteractable),
    ("insecure certificate", ErrorKind::InsecureCertificate),
    ("invalid argument", ErrorKind::InvalidArgument),
    ("invalid cookie domain", ErrorKind::InvalidCookieDomain),
    ("invalid element state", ErrorKind::InvalidElementState),
    ("invalid selector", ErrorKind::InvalidSelector),
    ("invalid session id", ErrorKind::InvalidSessionId),
    ("javascript error", ErrorKind::JavascriptError),
    ("move target out of bounds", ErrorKind::MoveTargetOutOfBounds),
    ("no such alert", ErrorKind::NoSuchAlert),
    ("no such cookie", ErrorKind::NoSuchCookie),
    ("no such element", ErrorKind::NoSuchElement),
    ("no such frame", ErrorKind::NoSuchFrame),
    ("no such window", ErrorKind::NoSuchWindow),
    ("no such shadow root", ErrorKind::NoSuchShadowRoot),
    ("detached shadow root", ErrorKind::DetachedShadowRoot),
    ("script timeout", ErrorKind::ScriptTimeout),
    ("session not created", ErrorKind::SessionNotCreated),
    ("stale element reference", ErrorKind::StaleElementReference),
    ("timeout", ErrorKind::Timeout),
    ("unable to set cookie", ErrorKind::UnableToSetCookie),
    ("unable to capture screen", ErrorKind::UnableToCaptureScreen),
    ("unexpected alert open", ErrorKind::UnexpectedAlertOpen),
    ("unknown command", ErrorKind::UnknownCommand),
    ("unknown error", ErrorKind::UnknownError),
    ("unknown method", ErrorKind::UnknownMethod),
    ("unsupported operation", ErrorKind::UnsupportedOperation),
];

impl ErrorKind {
    /// Classifies a W3C error code string.
    ///
    /// Unrecognised codes map to [`ErrorKind::UnknownError`].
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        W3C_CODES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(code))
            .map_or(Self::UnknownError, |(_, kind)| *kind)
    }

    /// Classifies a legacy numeric status code.
    ///
    /// Returns `None` for status `0` (success).
    #[must_use]
    pub fn from_legacy_status(status: i64) -> Option<Self> {
        let kind = match status {
            0 => return None,
            6 => Self::InvalidSessionId,
            7 => Self::NoSuchElement,
            8 => Self::NoSuchFrame,
            9 => Self::UnknownCommand,
            10 => Self::StaleElementReference,
            11 | 60 => Self::ElementNotInteractable,
            12 | 15 => Self::InvalidElementState,
            17 => Self::JavascriptError,
            19 | 32 | 51 | 52 => Self::InvalidSelector,
            21 => Self::Timeout,
            23 => Self::NoSuchWindow,
            24 => Self::InvalidCookieDomain,
            25 => Self::UnableToSetCookie,
            26 => Self::UnexpectedAlertOpen,
            27 => Self::NoSuchAlert,
            28 => Self::ScriptTimeout,
            29 | 61 => Self::InvalidArgument,
            33 => Self::SessionNotCreated,
            34 => Self::MoveTargetOutOfBounds,
            62 => Self::NoSuchCookie,
            63 => Self::UnableToCaptureScreen,
            64 => Self::ElementClickIntercepted,
            405 => Self::UnknownMethod,
            _ => Self::UnknownError,
        };
        Some(kind)
    }

    /// Returns the W3C code string for driver-side kinds.
    ///
    /// Locally detected kinds have no wire code and return `None`.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        W3C_CODES
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| *name)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => f.write_str(code),
            None => write!(f, "{self:?}"),
        }
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Optional diagnostic fields attached to a driver error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Base64-encoded screenshot captured by the driver.
    pub screen: Option<String>,
    /// Remote stack trace.
    pub stacktrace: Option<String>,
    /// Additional vendor data.
    pub data: Option<Value>,
}

impl Diagnostics {
    /// Returns `true` if no diagnostic field is present.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.screen.is_none() && self.stacktrace.is_none() && self.data.is_none()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.screen.is_some() {
            f.write_str("\nScreenshot: available via diagnostics")?;
        }
        if let Some(stacktrace) = self.stacktrace.as_deref().filter(|s| !s.is_empty()) {
            write!(f, "\nStacktrace:\n{stacktrace}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when builder configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Driver executable not found at path.
    #[error("Driver executable not found at: {path}")]
    DriverNotFound {
        /// Path where the executable was expected.
        path: PathBuf,
    },

    // ========================================================================
    // Service Errors
    // ========================================================================
    /// Driver process failed to launch or exited during start-up.
    #[error("Failed to launch driver service: {message}")]
    ServiceLaunch {
        /// Description of the launch failure.
        message: String,
    },

    /// Driver service did not accept connections in time.
    #[error("Driver service at {url} not reachable after {timeout_ms}ms")]
    ServiceStartTimeout {
        /// Endpoint that never became reachable.
        url: String,
        /// Milliseconds waited.
        timeout_ms: u64,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Command issued while no session is active.
    ///
    /// Local precondition failure, never reaches the network.
    #[error("No active session (driver is {state})")]
    NoActiveSession {
        /// Dispatcher state at the time of the call.
        state: String,
    },

    /// Driver rejected session negotiation.
    #[error("Session not created: {message}{diagnostics}")]
    SessionNotCreated {
        /// Driver message.
        message: String,
        /// Driver diagnostics.
        diagnostics: Diagnostics,
    },

    /// Driver reports that the session no longer exists.
    #[error("Invalid session id: {message}{diagnostics}")]
    InvalidSessionId {
        /// Driver or local message.
        message: String,
        /// Driver diagnostics.
        diagnostics: Diagnostics,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Command name is not registered.
    #[error("Unknown command: {command}")]
    UnknownCommand {
        /// The unrecognised command name.
        command: String,
    },

    /// Invalid argument supplied to a command.
    #[error("Invalid argument: {message}{diagnostics}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
        /// Driver diagnostics, empty for local failures.
        diagnostics: Diagnostics,
    },

    /// Response payload lacked the expected envelope shape.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// Description of the shape mismatch.
        message: String,
    },

    // ========================================================================
    // Element Errors
    // ========================================================================
    /// Element could not be located.
    #[error("No such element: {message}{diagnostics}")]
    NoSuchElement {
        /// Driver message.
        message: String,
        /// Driver diagnostics.
        diagnostics: Diagnostics,
    },

    /// Element handle refers to a node no longer attached to the document.
    #[error("Stale element reference{}: {message}{diagnostics}", .element_id.as_ref().map(|id| format!(" ({id})")).unwrap_or_default())]
    StaleElementReference {
        /// Handle that went stale, when known.
        element_id: Option<ElementId>,
        /// Driver message.
        message: String,
        /// Driver diagnostics.
        diagnostics: Diagnostics,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Transport-level timeout on a single command.
    #[error("Command {command} ({request_id}) timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// Command name.
        command: String,
        /// Request that timed out.
        request_id: RequestId,
        /// Milliseconds waited.
        timeout_ms: u64,
    },

    /// Wait engine timeout.
    #[error("Timed out after {timeout_ms}ms: {message}{}", .last_error.as_ref().map(|e| format!(" (last error: {e})")).unwrap_or_default())]
    Timeout {
        /// Description of the awaited condition.
        message: String,
        /// Milliseconds waited.
        timeout_ms: u64,
        /// Last swallowed transient error, diagnostics included.
        last_error: Option<Box<Error>>,
    },

    /// Any other error reported by the driver.
    #[error("{kind}: {message}{diagnostics}")]
    Driver {
        /// Classified kind.
        kind: ErrorKind,
        /// Raw code as sent by the driver.
        code: String,
        /// Driver message.
        message: String,
        /// Driver diagnostics.
        diagnostics: Diagnostics,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// Connection to the driver endpoint failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a driver not found error.
    #[inline]
    pub fn driver_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DriverNotFound { path: path.into() }
    }

    /// Creates a service launch error.
    #[inline]
    pub fn service_launch(message: impl Into<String>) -> Self {
        Self::ServiceLaunch {
            message: message.into(),
        }
    }

    /// Creates a service start timeout error.
    #[inline]
    pub fn service_start_timeout(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self::ServiceStartTimeout {
            url: url.into(),
            timeout_ms,
        }
    }

    /// Creates a no active session error.
    #[inline]
    pub fn no_active_session(state: impl fmt::Display) -> Self {
        Self::NoActiveSession {
            state: state.to_string(),
        }
    }

    /// Creates a local invalid session id error.
    #[inline]
    pub fn invalid_session_id(message: impl Into<String>) -> Self {
        Self::InvalidSessionId {
            message: message.into(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Creates an unknown command error.
    #[inline]
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates a local invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Creates a malformed response error.
    #[inline]
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Creates a local no such element error.
    #[inline]
    pub fn no_such_element(message: impl Into<String>) -> Self {
        Self::NoSuchElement {
            message: message.into(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(
        command: impl Into<String>,
        request_id: RequestId,
        timeout_ms: u64,
    ) -> Self {
        Self::RequestTimeout {
            command: command.into(),
            request_id,
            timeout_ms,
        }
    }

    /// Creates a wait timeout error.
    #[inline]
    pub fn timeout(message: impl Into<String>, timeout_ms: u64, last_error: Option<Error>) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms,
            last_error: last_error.map(Box::new),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Builds the typed error for a decoded driver error object.
    ///
    /// `code` is the raw code as sent on the wire (string or stringified
    /// legacy status); `kind` is its classification.
    pub fn from_driver(
        kind: ErrorKind,
        code: impl Into<String>,
        message: impl Into<String>,
        diagnostics: Diagnostics,
    ) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::SessionNotCreated => Self::SessionNotCreated {
                message,
                diagnostics,
            },
            ErrorKind::InvalidSessionId => Self::InvalidSessionId {
                message,
                diagnostics,
            },
            ErrorKind::NoSuchElement => Self::NoSuchElement {
                message,
                diagnostics,
            },
            ErrorKind::StaleElementReference => Self::StaleElementReference {
                element_id: None,
                message,
                diagnostics,
            },
            ErrorKind::InvalidArgument => Self::InvalidArgument {
                message,
                diagnostics,
            },
            _ => Self::Driver {
                kind,
                code: code.into(),
                message,
                diagnostics,
            },
        }
    }

    /// Attaches the element handle a stale reference error refers to.
    ///
    /// Other errors are returned unchanged.
    #[must_use]
    pub fn with_element(self, id: &ElementId) -> Self {
        match self {
            Self::StaleElementReference {
                element_id: None,
                message,
                diagnostics,
            } => Self::StaleElementReference {
                element_id: Some(id.clone()),
                message,
                diagnostics,
            },
            other => other,
        }
    }
}

// ============================================================================
// Error Accessors
// ============================================================================

impl Error {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } | Self::DriverNotFound { .. } => ErrorKind::Config,
            Self::ServiceLaunch { .. } => ErrorKind::ServiceLaunch,
            Self::ServiceStartTimeout { .. } => ErrorKind::ServiceStartTimeout,
            Self::NoActiveSession { .. } => ErrorKind::NoActiveSession,
            Self::SessionNotCreated { .. } => ErrorKind::SessionNotCreated,
            Self::InvalidSessionId { .. } => ErrorKind::InvalidSessionId,
            Self::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::NoSuchElement { .. } => ErrorKind::NoSuchElement,
            Self::StaleElementReference { .. } => ErrorKind::StaleElementReference,
            Self::RequestTimeout { .. } => ErrorKind::RequestTimeout,
            Self::Timeout { .. } => ErrorKind::WaitTimeout,
            Self::Driver { kind, .. } => *kind,
            Self::Connection { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Http(_)
            | Self::Url(_) => ErrorKind::Transport,
        }
    }

    /// Returns the driver message, if this error came from the driver.
    #[must_use]
    pub fn driver_message(&self) -> Option<&str> {
        match self {
            Self::SessionNotCreated { message, .. }
            | Self::InvalidSessionId { message, .. }
            | Self::InvalidArgument { message, .. }
            | Self::NoSuchElement { message, .. }
            | Self::StaleElementReference { message, .. }
            | Self::Driver { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Returns the driver diagnostics, if any were attached.
    ///
    /// A wait timeout reports the diagnostics of its last ignored error.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Timeout { last_error, .. } => last_error.as_deref().and_then(Self::diagnostics),
            Self::SessionNotCreated { diagnostics, .. }
            | Self::InvalidSessionId { diagnostics, .. }
            | Self::InvalidArgument { diagnostics, .. }
            | Self::NoSuchElement { diagnostics, .. }
            | Self::StaleElementReference { diagnostics, .. }
            | Self::Driver { diagnostics, .. } => Some(diagnostics).filter(|d| !d.is_empty()),
            _ => None,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error of any origin.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RequestTimeout
                | ErrorKind::WaitTimeout
                | ErrorKind::ServiceStartTimeout
                | ErrorKind::Timeout
                | ErrorKind::ScriptTimeout
        )
    }

    /// Returns `true` if this is an element resolution error.
    #[inline]
    #[must_use]
    pub fn is_element_error(&self) -> bool {
        matches!(
            self,
            Self::NoSuchElement { .. } | Self::StaleElementReference { .. }
        )
    }

    /// Returns `true` if the session is gone or was never established.
    #[inline]
    #[must_use]
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            Self::NoActiveSession { .. }
                | Self::InvalidSessionId { .. }
                | Self::SessionNotCreated { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Http(e) => e.is_connect(),
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind as IoErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("missing endpoint");
        assert_eq!(err.to_string(), "Configuration error: missing endpoint");
    }

    #[test]
    fn test_from_code_known_and_unknown() {
        assert_eq!(ErrorKind::from_code("no such element"), ErrorKind::NoSuchElement);
        assert_eq!(
            ErrorKind::from_code("stale element reference"),
            ErrorKind::StaleElementReference
        );
        assert_eq!(ErrorKind::from_code("Invalid Session Id"), ErrorKind::InvalidSessionId);
        assert_eq!(ErrorKind::from_code("made up"), ErrorKind::UnknownError);
    }

    #[test]
    fn test_from_legacy_status() {
        assert_eq!(ErrorKind::from_legacy_status(0), None);
        assert_eq!(ErrorKind::from_legacy_status(7), Some(ErrorKind::NoSuchElement));
        assert_eq!(
            ErrorKind::from_legacy_status(10),
            Some(ErrorKind::StaleElementReference)
        );
        assert_eq!(ErrorKind::from_legacy_status(6), Some(ErrorKind::InvalidSessionId));
        assert_eq!(ErrorKind::from_legacy_status(33), Some(ErrorKind::SessionNotCreated));
        assert_eq!(ErrorKind::from_legacy_status(999), Some(ErrorKind::UnknownError));
    }

    #[test]
    fn test_code_round_trip_for_driver_kinds() {
        for (code, kind) in W3C_CODES {
            assert_eq!(kind.code(), Some(*code));
        }
        assert_eq!(ErrorKind::NoActiveSession.code(), None);
    }

    #[test]
    fn test_from_driver_classifies_taxonomy() {
        let err = Error::from_driver(
            ErrorKind::StaleElementReference,
            "stale element reference",
            "node detached",
            Diagnostics::default(),
        );
        assert!(matches!(err, Error::StaleElementReference { .. }));

        let err = Error::from_driver(
            ErrorKind::JavascriptError,
            "javascript error",
            "boom",
            Diagnostics::default(),
        );
        assert!(matches!(
            err,
            Error::Driver {
                kind: ErrorKind::JavascriptError,
                ..
            }
        ));
        assert_eq!(err.driver_message(), Some("boom"));
    }

    #[test]
    fn test_display_includes_stacktrace() {
        let diagnostics = Diagnostics {
            screen: Some("iVBOR".into()),
            stacktrace: Some("at foo (bar.js:1)".into()),
            data: None,
        };
        let err = Error::from_driver(
            ErrorKind::NoSuchElement,
            "no such element",
            "Unable to locate #x",
            diagnostics,
        );
        let text = err.to_string();
        assert!(text.contains("Unable to locate #x"));
        assert!(text.contains("Screenshot"));
        assert!(text.contains("at foo (bar.js:1)"));
        assert!(err.diagnostics().is_some());
    }

    #[test]
    fn test_with_element_only_touches_stale() {
        let id = ElementId::new("abc");
        let stale = Error::from_driver(
            ErrorKind::StaleElementReference,
            "stale element reference",
            "gone",
            Diagnostics::default(),
        )
        .with_element(&id);
        assert!(matches!(
            stale,
            Error::StaleElementReference { element_id: Some(ref e), .. } if *e == id
        ));
        assert!(stale.to_string().contains("abc"));

        let other = Error::config("x").with_element(&id);
        assert!(matches!(other, Error::Config { .. }));
    }

    #[test]
    fn test_is_timeout() {
        let wait = Error::timeout("title", 1000, None);
        let request = Error::request_timeout("get", RequestId::generate(), 500);
        let other = Error::connection("test");

        assert!(wait.is_timeout());
        assert!(request.is_timeout());
        assert!(!other.is_timeout());
        assert_eq!(wait.kind(), ErrorKind::WaitTimeout);
        assert_eq!(request.kind(), ErrorKind::RequestTimeout);
    }

    #[test]
    fn test_timeout_display_carries_last_error() {
        let err = Error::timeout("element visible", 250, Some(Error::connection("refused")));
        assert_eq!(
            err.to_string(),
            "Timed out after 250ms: element visible (last error: Connection failed: refused)"
        );
    }

    #[test]
    fn test_timeout_exposes_last_error_diagnostics() {
        let diagnostics = Diagnostics {
            screen: Some("iVBOR".into()),
            stacktrace: Some("at find".into()),
            data: None,
        };
        let last = Error::from_driver(
            ErrorKind::NoSuchElement,
            "no such element",
            "missing",
            diagnostics.clone(),
        );
        let err = Error::timeout("element present", 500, Some(last));
        assert_eq!(err.diagnostics(), Some(&diagnostics));
        assert_eq!(err.kind(), ErrorKind::WaitTimeout);

        assert!(Error::timeout("title", 500, None).diagnostics().is_none());
    }

    #[test]
    fn test_service_launch_has_own_kind() {
        let err = Error::service_launch("exited with status 3");
        assert_eq!(err.kind(), ErrorKind::ServiceLaunch);
        assert_ne!(err.kind(), ErrorKind::Config);
        assert!(err.kind().code().is_none());
        assert_eq!(err.kind().to_string(), "ServiceLaunch");
    }

    #[test]
    fn test_is_session_error() {
        assert!(Error::no_active_session("Idle").is_session_error());
        assert!(Error::invalid_session_id("gone").is_session_error());
        assert!(!Error::config("x").is_session_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(IoErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
