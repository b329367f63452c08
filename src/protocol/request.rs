//! Command and response envelopes.
//!
//! An [`Envelope`] is what goes on the wire for one command: method,
//! concrete path, optional JSON body. A [`RawResponse`] is what comes
//! back; decoding it yields either the success value or a typed error.
//!
//! # Response Shapes
//!
//! W3C success:
//! ```json
//! { "value": { ... } }
//! ```
//!
//! W3C error (HTTP status >= 400):
//! ```json
//! { "value": { "error": "no such element", "message": "...", "stacktrace": "..." } }
//! ```
//!
//! Legacy (OSS) response, success when `status` is `0`:
//! ```json
//! { "sessionId": "...", "status": 7, "value": { "message": "..." } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Diagnostics, Error, ErrorKind, Result};

use super::command::{CommandSpec, Method};

// ============================================================================
// Constants
// ============================================================================

/// Matches `$name` placeholders in path templates.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid")
});

// ============================================================================
// Envelope
// ============================================================================

/// One encoded command.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Command name the envelope was built from.
    pub command: String,
    /// HTTP method.
    pub method: Method,
    /// Concrete path with all placeholders substituted.
    pub path: String,
    /// JSON body; always an object for `POST`, absent otherwise.
    pub body: Option<Value>,
}

impl Envelope {
    /// Builds an envelope by filling the command's path template from `params`.
    ///
    /// Every placeholder value is percent-encoded and removed from the
    /// body. `Null` params are treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `params` is not an object or
    /// a placeholder is missing or not a string/number.
    pub fn build(name: &str, spec: &CommandSpec, params: Value) -> Result<Self> {
        let mut params = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(Error::invalid_argument(format!(
                    "parameters for {name} must be an object, got {other}"
                )));
            }
        };

        let mut path = String::with_capacity(spec.path.len());
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(&spec.path) {
            let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let value = params.remove(key.as_str()).ok_or_else(|| {
                Error::invalid_argument(format!(
                    "missing path parameter `{}` for {name}",
                    key.as_str()
                ))
            })?;
            let segment = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(Error::invalid_argument(format!(
                        "path parameter `{}` for {name} must be a string, got {other}",
                        key.as_str()
                    )));
                }
            };
            path.push_str(&spec.path[last..whole.start()]);
            path.push_str(&urlencoding::encode(&segment));
            last = whole.end();
        }
        path.push_str(&spec.path[last..]);

        let body = spec.method.has_body().then(|| Value::Object(params));

        Ok(Self {
            command: name.to_string(),
            method: spec.method,
            path,
            body,
        })
    }

    /// Serializes the body, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn body_json(&self) -> Result<Option<String>> {
        self.body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(Error::from)
    }
}

// ============================================================================
// RawResponse
// ============================================================================

/// An undecoded response: HTTP status and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body text, usually JSON.
    pub body: String,
}

/// A decoded success response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// The `value` payload.
    pub value: Value,
    /// Top-level `sessionId`, present in legacy responses.
    pub session_id: Option<String>,
}

impl RawResponse {
    /// Creates a raw response.
    #[inline]
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a W3C success response wrapping `value`.
    #[must_use]
    pub fn success(value: Value) -> Self {
        Self::new(200, serde_json::json!({ "value": value }).to_string())
    }

    /// Creates a W3C error response.
    #[must_use]
    pub fn error(status: u16, code: &str, message: &str) -> Self {
        Self::new(
            status,
            serde_json::json!({
                "value": { "error": code, "message": message, "stacktrace": "" }
            })
            .to_string(),
        )
    }

    /// Creates a legacy (OSS) response with a numeric status.
    #[must_use]
    pub fn legacy(status: i64, session_id: Option<&str>, value: Value) -> Self {
        let mut body = Map::new();
        body.insert("status".into(), status.into());
        if let Some(id) = session_id {
            body.insert("sessionId".into(), id.into());
        }
        body.insert("value".into(), value);
        Self::new(200, Value::Object(body).to_string())
    }

    /// Returns `true` if the HTTP status signals an error.
    #[inline]
    #[must_use]
    pub fn is_error_status(&self) -> bool {
        self.status >= 400
    }

    /// Decodes the response and returns its `value`.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedResponse`] if the payload lacks the envelope shape
    /// - the classified driver error if the response is an error
    pub fn decode(&self) -> Result<Value> {
        self.decode_reply().map(|reply| reply.value)
    }

    /// Decodes the response, keeping the legacy top-level session ID.
    ///
    /// # Errors
    ///
    /// See [`RawResponse::decode`].
    pub fn decode_reply(&self) -> Result<Reply> {
        let parsed: Value = match serde_json::from_str(&self.body) {
            Ok(value) => value,
            Err(_) if self.is_error_status() => {
                return Err(Error::from_driver(
                    ErrorKind::UnknownError,
                    "unknown error",
                    self.body.trim(),
                    Diagnostics::default(),
                ));
            }
            Err(_) if self.body.trim().is_empty() => {
                return Ok(Reply {
                    value: Value::Null,
                    session_id: None,
                });
            }
            Err(e) => {
                return Err(Error::malformed_response(format!(
                    "body is not JSON ({e}): {}",
                    truncate(&self.body)
                )));
            }
        };

        let Value::Object(mut envelope) = parsed else {
            return Err(Error::malformed_response(format!(
                "expected a JSON object, got {}",
                truncate(&self.body)
            )));
        };

        let session_id = envelope
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(status) = envelope.get("status").and_then(Value::as_i64) {
            let value = envelope.remove("value").unwrap_or(Value::Null);
            return match ErrorKind::from_legacy_status(status) {
                None => Ok(Reply { value, session_id }),
                Some(kind) => Err(legacy_error(kind, status, &value)),
            };
        }

        let value = envelope.remove("value").ok_or_else(|| {
            Error::malformed_response(format!(
                "missing `value` key: {}",
                truncate(&self.body)
            ))
        })?;

        if self.is_error_status() {
            return Err(w3c_error(&value));
        }

        Ok(Reply { value, session_id })
    }
}

// ============================================================================
// Error Decoding
// ============================================================================

/// Builds the typed error for a W3C error value.
fn w3c_error(value: &Value) -> Error {
    let code = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| value.to_string(), str::to_string);
    Error::from_driver(ErrorKind::from_code(code), code, message, diagnostics(value))
}

/// Builds the typed error for a legacy status and value.
fn legacy_error(kind: ErrorKind, status: i64, value: &Value) -> Error {
    let message = match value {
        Value::String(s) => s.clone(),
        Value::Object(_) => value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Error::from_driver(kind, status.to_string(), message, diagnostics(value))
}

/// Extracts screen, stacktrace and data fields from an error value.
fn diagnostics(value: &Value) -> Diagnostics {
    let screen = value
        .get("screen")
        .and_then(Value::as_str)
        .map(str::to_string);
    let stacktrace = value
        .get("stacktrace")
        .or_else(|| value.get("stackTrace"))
        .and_then(format_stacktrace);
    let data = value.get("data").filter(|d| !d.is_null()).cloned();
    Diagnostics {
        screen,
        stacktrace,
        data,
    }
}

/// Renders a stacktrace given either as text or as a list of frames.
fn format_stacktrace(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(frames) if !frames.is_empty() => {
            let lines: Vec<String> = frames
                .iter()
                .map(|frame| {
                    let method = frame
                        .get("methodName")
                        .and_then(Value::as_str)
                        .unwrap_or("<anonymous>");
                    let file = frame
                        .get("fileName")
                        .and_then(Value::as_str)
                        .unwrap_or("<anonymous>");
                    match frame.get("lineNumber").and_then(Value::as_i64) {
                        Some(line) => format!("    at {method} ({file}:{line})"),
                        None => format!("    at {method} ({file})"),
                    }
                })
                .collect();
            Some(lines.join("\n"))
        }
        _ => None,
    }
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.len() <= LIMIT {
        return body.to_string();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn spec(method: Method, path: &str) -> CommandSpec {
        CommandSpec {
            method,
            path: path.to_string(),
        }
    }

    #[test]
    fn test_build_substitutes_and_strips_placeholders() {
        let spec = spec(Method::Post, "/session/$sessionId/element/$elementId/value");
        let envelope = Envelope::build(
            "sendKeysToElement",
            &spec,
            json!({"sessionId": "s1", "elementId": "e/1", "text": "hi"}),
        )
        .expect("build");

        assert_eq!(envelope.path, "/session/s1/element/e%2F1/value");
        assert_eq!(envelope.body, Some(json!({"text": "hi"})));
        assert_eq!(envelope.command, "sendKeysToElement");
    }

    #[test]
    fn test_build_get_has_no_body() {
        let spec = spec(Method::Get, "/session/$sessionId/title");
        let envelope =
            Envelope::build("getTitle", &spec, json!({"sessionId": "s1"})).expect("build");
        assert_eq!(envelope.body, None);
        assert_eq!(envelope.body_json().expect("json"), None);
    }

    #[test]
    fn test_build_post_without_params_sends_empty_object() {
        let spec = spec(Method::Post, "/session/$sessionId/refresh");
        let envelope =
            Envelope::build("refresh", &spec, json!({"sessionId": "s1"})).expect("build");
        assert_eq!(envelope.body_json().expect("json").as_deref(), Some("{}"));
    }

    #[test]
    fn test_build_missing_placeholder() {
        let spec = spec(Method::Get, "/session/$sessionId/title");
        let err = Envelope::build("getTitle", &spec, Value::Null).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_build_rejects_non_object_params() {
        let spec = spec(Method::Post, "/session");
        let err = Envelope::build("newSession", &spec, json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_decode_w3c_success() {
        let response = RawResponse::success(json!({"title": "Example"}));
        assert_eq!(response.decode().expect("decode"), json!({"title": "Example"}));
    }

    #[test]
    fn test_decode_w3c_error_classified() {
        let response = RawResponse::error(404, "no such element", "Unable to locate #x");
        let err = response.decode().unwrap_err();
        assert!(matches!(err, Error::NoSuchElement { ref message, .. } if message == "Unable to locate #x"));
    }

    #[test]
    fn test_decode_w3c_error_catch_all_keeps_code() {
        let response = RawResponse::new(
            500,
            json!({"value": {"error": "javascript error", "message": "x is undefined",
                "stacktrace": "at <anonymous>:1"}})
            .to_string(),
        );
        let err = response.decode().unwrap_err();
        match err {
            Error::Driver {
                kind,
                code,
                message,
                diagnostics,
            } => {
                assert_eq!(kind, ErrorKind::JavascriptError);
                assert_eq!(code, "javascript error");
                assert_eq!(message, "x is undefined");
                assert_eq!(diagnostics.stacktrace.as_deref(), Some("at <anonymous>:1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_legacy_success_keeps_session_id() {
        let response = RawResponse::legacy(0, Some("abc"), json!({"browserName": "x"}));
        let reply = response.decode_reply().expect("decode");
        assert_eq!(reply.session_id.as_deref(), Some("abc"));
        assert_eq!(reply.value, json!({"browserName": "x"}));
    }

    #[test]
    fn test_decode_legacy_error_with_stack_frames() {
        let response = RawResponse::legacy(
            10,
            Some("abc"),
            json!({
                "message": "element is stale",
                "stackTrace": [{"methodName": "click", "fileName": "a.js", "lineNumber": 3}]
            }),
        );
        let err = response.decode().unwrap_err();
        match err {
            Error::StaleElementReference {
                message,
                diagnostics,
                ..
            } => {
                assert_eq!(message, "element is stale");
                assert_eq!(diagnostics.stacktrace.as_deref(), Some("    at click (a.js:3)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_value_is_malformed() {
        let response = RawResponse::new(200, r#"{"sessionId": "x"}"#);
        assert!(matches!(
            response.decode().unwrap_err(),
            Error::MalformedResponse { .. }
        ));
    }

    #[test]
    fn test_decode_non_object_is_malformed() {
        let response = RawResponse::new(200, "[1,2,3]");
        assert!(matches!(
            response.decode().unwrap_err(),
            Error::MalformedResponse { .. }
        ));
    }

    #[test]
    fn test_decode_non_json_success_is_malformed() {
        let response = RawResponse::new(200, "<html>proxy</html>");
        assert!(matches!(
            response.decode().unwrap_err(),
            Error::MalformedResponse { .. }
        ));
    }

    #[test]
    fn test_decode_non_json_error_keeps_body_text() {
        let response = RawResponse::new(502, "Bad Gateway");
        let err = response.decode().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownError);
        assert_eq!(err.driver_message(), Some("Bad Gateway"));
    }

    #[test]
    fn test_decode_empty_success_body_is_null() {
        let response = RawResponse::new(200, "");
        assert_eq!(response.decode().expect("decode"), Value::Null);
    }

    #[test]
    fn test_success_value_with_error_key_is_not_an_error() {
        let response = RawResponse::success(json!({"error": "user data"}));
        assert_eq!(response.decode().expect("decode"), json!({"error": "user data"}));
    }
}
