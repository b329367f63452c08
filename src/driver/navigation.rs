//! Navigation and page state.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::command;

use super::core::Driver;

// ============================================================================
// Driver - Navigation
// ============================================================================

impl Driver {
    /// Navigates the current browsing context to `url`.
    pub async fn get(&self, url: &str) -> Result<()> {
        debug!(url, "Navigating");
        self.command(command::GET, json!({ "url": url })).await?;
        Ok(())
    }

    /// Returns the current page URL.
    pub async fn current_url(&self) -> Result<String> {
        let value = self.command(command::GET_CURRENT_URL, Value::Null).await?;
        expect_string(value, "url")
    }

    /// Returns the document title.
    pub async fn title(&self) -> Result<String> {
        let value = self.command(command::GET_TITLE, Value::Null).await?;
        expect_string(value, "title")
    }

    /// Returns the serialized DOM.
    pub async fn page_source(&self) -> Result<String> {
        let value = self.command(command::GET_PAGE_SOURCE, Value::Null).await?;
        expect_string(value, "page source")
    }

    /// Goes back in history.
    pub async fn back(&self) -> Result<()> {
        self.command(command::GO_BACK, json!({})).await?;
        Ok(())
    }

    /// Goes forward in history.
    pub async fn forward(&self) -> Result<()> {
        self.command(command::GO_FORWARD, json!({})).await?;
        Ok(())
    }

    /// Reloads the page.
    pub async fn refresh(&self) -> Result<()> {
        self.command(command::REFRESH, json!({})).await?;
        Ok(())
    }
}

/// Takes a string reply apart.
pub(crate) fn expect_string(value: Value, what: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(Error::malformed_response(format!(
            "expected {what} string, got {other}"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
