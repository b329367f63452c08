//! Element handles and element interaction.
//!
//! The driver assigns every element an opaque reference. Client-side,
//! that reference is wrapped in an [`ElementHandle`] scoped to the
//! session that produced it, and tracked by the per-driver
//! [`ElementTable`]. The high-level [`Element`] pairs a handle with the
//! driver it belongs to.
//!
//! Staleness is never tracked locally: a handle stays resolvable until
//! its session ends, and only the driver can report that the node it
//! refers to is gone.
//!
//! # Example
//!
//! ```ignore
//! use remote_webdriver::{By, Key};
//!
//! let element = driver.find_element(By::css("input[name='q']")).await?;
//!
//! element.send_keys("rust").await?;
//! element.press(Key::Enter).await?;
//! let text = element.text().await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, trace};

use crate::driver::Driver;
use crate::driver::navigation::expect_string;
use crate::error::{Error, Result};
use crate::identifiers::{ElementId, SessionId};
use crate::protocol::command;

use super::keyboard::Key;
use super::selector::By;

// ============================================================================
// Constants
// ============================================================================

/// W3C element reference key.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Legacy (OSS) element reference key.
pub const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Script deciding whether `arguments[0]` is displayed.
const IS_DISPLAYED_SCRIPT: &str = r"
const e = arguments[0];
if (!e || !e.isConnected || e.hidden) { return false; }
const style = window.getComputedStyle(e);
if (style.display === 'none' || style.visibility === 'hidden') { return false; }
return e.offsetParent !== null || style.position === 'fixed' || e === document.body;
";

// ============================================================================
// Element References
// ============================================================================

/// Encodes an element reference under both the W3C and legacy keys.
#[must_use]
pub fn element_reference(id: &ElementId) -> Value {
    json!({ ELEMENT_KEY: id.as_str(), LEGACY_ELEMENT_KEY: id.as_str() })
}

/// Decodes an element reference, accepting either key.
#[must_use]
pub fn parse_element_reference(value: &Value) -> Option<ElementId> {
    let object = value.as_object()?;
    object
        .get(ELEMENT_KEY)
        .or_else(|| object.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(ElementId::new)
}

// ============================================================================
// ElementHandle
// ============================================================================

/// Client-side reference to a driver-side DOM element.
///
/// Equality and hashing are defined by `(session, element id)` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    session_id: SessionId,
    id: ElementId,
}

impl ElementHandle {
    /// Returns the session this handle belongs to.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Returns the driver-assigned element reference.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.id
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.session_id, self.id)
    }
}

// ============================================================================
// ElementTable
// ============================================================================

#[derive(Debug, Default)]
struct TableState {
    /// Session handles are currently issued for.
    session: Option<SessionId>,
    /// Raw references issued in the current session.
    handles: FxHashSet<ElementId>,
    /// Sessions that have ended, with the number of handles they held.
    ended: FxHashMap<SessionId, usize>,
}

/// Maps driver element references to handles for one driver.
///
/// Owned by exactly one driver; never shared across sessions.
#[derive(Debug, Default)]
pub struct ElementTable {
    inner: Mutex<TableState>,
}

impl ElementTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts issuing handles for `session_id`.
    pub fn bind(&self, session_id: SessionId) {
        let mut inner = self.inner.lock();
        inner.handles.clear();
        inner.session = Some(session_id);
    }

    /// Registers a raw reference and returns its handle.
    ///
    /// Registering the same reference twice returns equal handles.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSessionId`] if `session_id` has ended
    /// - [`Error::InvalidArgument`] if the table is bound to another session
    pub fn register(&self, session_id: &SessionId, raw: ElementId) -> Result<ElementHandle> {
        let mut inner = self.inner.lock();
        if inner.ended.contains_key(session_id) {
            return Err(Error::invalid_session_id(format!(
                "session {session_id} has ended"
            )));
        }
        if inner.session.as_ref() != Some(session_id) {
            return Err(Error::invalid_argument(format!(
                "element table is not bound to session {session_id}"
            )));
        }
        if inner.handles.insert(raw.clone()) {
            trace!(session_id = %session_id, element_id = %raw, "Registered element");
        }
        Ok(ElementHandle {
            session_id: session_id.clone(),
            id: raw,
        })
    }

    /// Resolves a handle back to its raw reference.
    ///
    /// Liveness is not checked here; the driver reports stale elements.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSessionId`] if the handle's session has ended
    /// - [`Error::InvalidArgument`] if the handle belongs to another session
    pub fn resolve(&self, handle: &ElementHandle) -> Result<ElementId> {
        let inner = self.inner.lock();
        if inner.ended.contains_key(&handle.session_id) {
            return Err(Error::invalid_session_id(format!(
                "element {} belongs to ended session {}",
                handle.id, handle.session_id
            )));
        }
        if inner.session.as_ref() != Some(&handle.session_id) {
            return Err(Error::invalid_argument(format!(
                "element {} belongs to a different session",
                handle.id
            )));
        }
        Ok(handle.id.clone())
    }

    /// Invalidates every handle of `session_id`.
    ///
    /// Returns the number of handles that were live.
    pub fn invalidate(&self, session_id: &SessionId) -> usize {
        let mut inner = self.inner.lock();
        if inner.ended.contains_key(session_id) {
            return 0;
        }
        let count = if inner.session.as_ref() == Some(session_id) {
            std::mem::take(&mut inner.handles).len()
        } else {
            0
        };
        inner.ended.insert(session_id.clone(), count);
        debug!(session_id = %session_id, count, "Invalidated element handles");
        count
    }

    /// Returns `true` if `raw` was issued in the current session.
    #[inline]
    #[must_use]
    pub fn contains(&self, raw: &ElementId) -> bool {
        self.inner.lock().handles.contains(raw)
    }

    /// Returns the number of handles issued in the current session.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().handles.len()
    }

    /// Returns `true` if no handle is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().handles.is_empty()
    }
}

// ============================================================================
// ElementRect
// ============================================================================

/// Element position and size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementRect {
    /// Left edge relative to the document.
    pub x: f64,
    /// Top edge relative to the document.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

// ============================================================================
// SearchContext
// ============================================================================

/// Anything elements can be searched from: the document or an element.
#[async_trait]
pub trait SearchContext: Send + Sync {
    /// Finds the first element matching `by`.
    async fn find_element(&self, by: By) -> Result<Element>;

    /// Finds every element matching `by`; an empty list is not an error.
    async fn find_elements(&self, by: By) -> Result<Vec<Element>>;
}

// ============================================================================
// Element
// ============================================================================

/// A DOM element in the session's current browsing context.
///
/// Two elements are equal when their handles are equal.
#[derive(Clone)]
pub struct Element {
    driver: Driver,
    handle: ElementHandle,
}

// ============================================================================
// Element - Display
// ============================================================================

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("session_id", &self.handle.session_id)
            .field("id", &self.handle.id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Element {}

// ============================================================================
// Element - Constructor
// ============================================================================

impl Element {
    /// Creates an element from a registered handle.
    pub(crate) fn new(driver: Driver, handle: ElementHandle) -> Self {
        Self { driver, handle }
    }
}

// ============================================================================
// Element - Accessors
// ============================================================================

impl Element {
    /// Returns the driver-assigned reference.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.handle.id
    }

    /// Returns the handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &ElementHandle {
        &self.handle
    }

    /// Returns the driver this element belongs to.
    #[inline]
    #[must_use]
    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Encodes this element as a script argument.
    ///
    /// # Errors
    ///
    /// Fails like [`ElementTable::resolve`] if the handle is unusable.
    pub fn to_reference(&self) -> Result<Value> {
        let id = self.driver.resolve_element(&self.handle)?;
        Ok(element_reference(&id))
    }
}

// ============================================================================
// Element - Actions
// ============================================================================

impl Element {
    /// Clicks the element.
    pub async fn click(&self) -> Result<()> {
        debug!(element_id = %self.handle.id, "Clicking element");
        self.command(command::CLICK_ELEMENT, Value::Null).await?;
        Ok(())
    }

    /// Clears the element's value.
    pub async fn clear(&self) -> Result<()> {
        debug!(element_id = %self.handle.id, "Clearing element");
        self.command(command::CLEAR_ELEMENT, Value::Null).await?;
        Ok(())
    }

    /// Types `text` into the element.
    ///
    /// [`Key`] characters may be embedded in `text`.
    pub async fn send_keys(&self, text: &str) -> Result<()> {
        debug!(element_id = %self.handle.id, text_len = text.len(), "Sending keys");
        let chars: Vec<String> = text.chars().map(String::from).collect();
        self.command(
            command::SEND_KEYS_TO_ELEMENT,
            json!({ "text": text, "value": chars }),
        )
        .await?;
        Ok(())
    }

    /// Presses a single key.
    pub async fn press(&self, key: Key) -> Result<()> {
        self.send_keys(&key.to_string()).await
    }
}

// ============================================================================
// Element - Properties
// ============================================================================

impl Element {
    /// Returns the rendered text.
    pub async fn text(&self) -> Result<String> {
        let value = self.command(command::GET_ELEMENT_TEXT, Value::Null).await?;
        expect_string(value, "element text")
    }

    /// Returns the lower-case tag name.
    pub async fn tag_name(&self) -> Result<String> {
        let value = self.command(command::GET_ELEMENT_TAG_NAME, Value::Null).await?;
        expect_string(value, "tag name")
    }

    /// Returns an attribute value, or `None` if absent.
    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        let value = self
            .command(command::GET_ELEMENT_ATTRIBUTE, json!({ "name": name }))
            .await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    /// Returns a DOM property value.
    pub async fn property(&self, name: &str) -> Result<Value> {
        self.command(command::GET_ELEMENT_PROPERTY, json!({ "name": name }))
            .await
    }

    /// Returns position and size.
    pub async fn rect(&self) -> Result<ElementRect> {
        let value = self.command(command::GET_ELEMENT_RECT, Value::Null).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::malformed_response(format!("invalid element rect: {e}")))
    }

    /// Returns `true` if a checkbox, radio or option is selected.
    pub async fn is_selected(&self) -> Result<bool> {
        let value = self.command(command::IS_ELEMENT_SELECTED, Value::Null).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Returns `true` if the element is enabled.
    pub async fn is_enabled(&self) -> Result<bool> {
        let value = self.command(command::IS_ELEMENT_ENABLED, Value::Null).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Returns `true` if the element is displayed.
    ///
    /// Checks `hidden`, computed `display`/`visibility` and `offsetParent`.
    pub async fn is_displayed(&self) -> Result<bool> {
        let value = self
            .driver
            .execute_script(IS_DISPLAYED_SCRIPT, vec![self.to_reference()?])
            .await
            .map_err(|e| e.with_element(&self.handle.id))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Captures a PNG screenshot of the element.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let value = self.command(command::ELEMENT_SCREENSHOT, Value::Null).await?;
        crate::driver::decode_png(&value)
    }
}

// ============================================================================
// Element - Search
// ============================================================================

impl Element {
    /// Finds the first descendant matching `by`.
    pub async fn find_element(&self, by: impl Into<By>) -> Result<Element> {
        self.driver.find_from(Some(&self.handle), by.into()).await
    }

    /// Finds every descendant matching `by`.
    pub async fn find_elements(&self, by: impl Into<By>) -> Result<Vec<Element>> {
        self.driver.find_all_from(Some(&self.handle), by.into()).await
    }
}

#[async_trait]
impl SearchContext for Element {
    async fn find_element(&self, by: By) -> Result<Element> {
        Element::find_element(self, by).await
    }

    async fn find_elements(&self, by: By) -> Result<Vec<Element>> {
        Element::find_elements(self, by).await
    }
}

// ============================================================================
// Element - Internal
// ============================================================================

impl Element {
    /// Sends an element-scoped command.
    async fn command(&self, name: &str, params: Value) -> Result<Value> {
        self.driver.element_command(name, &self.handle, params).await
    }
}

/// Builds element-scoped parameters: `params` plus `elementId`.
pub(crate) fn element_params(id: &ElementId, params: Value) -> Result<Value> {
    let mut map = match params {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(Error::invalid_argument(format!(
                "element command parameters must be an object, got {other}"
            )));
        }
    };
    map.insert("elementId".into(), Value::String(id.as_str().to_string()));
    Ok(Value::Object(map))
}

// ============================================================================
// Tests
// ============================================================================
