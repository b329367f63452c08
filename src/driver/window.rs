//! Windows, frames and screenshots.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::{Value, json};
use tracing::debug;

use crate::browser::element::Element;
use crate::error::{Error, Result};
use crate::protocol::command;

use super::core::Driver;
use super::navigation::expect_string;

// ============================================================================
// FrameTarget
// ============================================================================

/// Frame to switch into.
#[derive(Debug, Clone)]
pub enum FrameTarget {
    /// Frame by index among the current document's frames.
    Index(u16),
    /// Frame by its `<iframe>` or `<frame>` element.
    Element(Element),
    /// The top-level document.
    Default,
}

impl FrameTarget {
    /// Builds the `id` parameter.
    fn to_id(&self) -> Result<Value> {
        match self {
            Self::Index(index) => Ok(json!(index)),
            Self::Element(element) => element.to_reference(),
            Self::Default => Ok(Value::Null),
        }
    }
}

impl From<u16> for FrameTarget {
    fn from(index: u16) -> Self {
        Self::Index(index)
    }
}

impl From<Element> for FrameTarget {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

// ============================================================================
// Driver - Windows
// ============================================================================

impl Driver {
    /// Returns the current window handle.
    pub async fn window_handle(&self) -> Result<String> {
        let value = self.command(command::GET_WINDOW_HANDLE, Value::Null).await?;
        expect_string(value, "window handle")
    }

    /// Returns every window handle of the session.
    pub async fn window_handles(&self) -> Result<Vec<String>> {
        let value = self.command(command::GET_WINDOW_HANDLES, Value::Null).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::malformed_response(format!("invalid window handles: {e}")))
    }

    /// Switches to the window with `handle`.
    pub async fn switch_to_window(&self, handle: &str) -> Result<()> {
        debug!(handle, "Switching window");
        self.command(
            command::SWITCH_TO_WINDOW,
            json!({ "handle": handle, "name": handle }),
        )
        .await?;
        Ok(())
    }

    /// Closes the current window and returns the remaining handles.
    pub async fn close_window(&self) -> Result<Vec<String>> {
        let value = self.command(command::CLOSE_WINDOW, Value::Null).await?;
        match value {
            Value::Null => Ok(Vec::new()),
            other => serde_json::from_value(other)
                .map_err(|e| Error::malformed_response(format!("invalid window handles: {e}"))),
        }
    }
}

// ============================================================================
// Driver - Frames
// ============================================================================

impl Driver {
    /// Switches into a frame.
    pub async fn switch_to_frame(&self, target: impl Into<FrameTarget>) -> Result<()> {
        let target = target.into();
        let id = target.to_id()?;
        debug!(frame = %id, "Switching frame");
        self.command(command::SWITCH_TO_FRAME, json!({ "id": id }))
            .await?;
        Ok(())
    }

    /// Switches to the parent of the current frame.
    pub async fn switch_to_parent_frame(&self) -> Result<()> {
        self.command(command::SWITCH_TO_PARENT_FRAME, json!({}))
            .await?;
        Ok(())
    }

    /// Switches back to the top-level document.
    pub async fn switch_to_default_content(&self) -> Result<()> {
        self.switch_to_frame(FrameTarget::Default).await
    }
}

// ============================================================================
// Driver - Screenshots
// ============================================================================

impl Driver {
    /// Captures a PNG screenshot of the current window.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let value = self.command(command::SCREENSHOT, Value::Null).await?;
        decode_png(&value)
    }
}

/// Decodes a base64 PNG reply.
pub(crate) fn decode_png(value: &Value) -> Result<Vec<u8>> {
    let data = value
        .as_str()
        .ok_or_else(|| Error::malformed_response(format!("expected base64 string, got {value}")))?;
    Base64Standard
        .decode(data)
        .map_err(|e| Error::malformed_response(format!("invalid base64 screenshot: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
