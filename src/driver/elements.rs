//! Element lookup.
//!
//! Every element reference in a response is registered in the driver's
//! element table before an [`Element`] is handed out.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::browser::element::{Element, ElementHandle, SearchContext, parse_element_reference};
use crate::browser::selector::By;
use crate::error::{Error, Result};
use crate::protocol::command;

use super::core::Driver;

// ============================================================================
// Driver - Element Lookup
// ============================================================================

impl Driver {
    /// Finds the first element matching `by`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchElement`] if nothing matches.
    pub async fn find_element(&self, by: impl Into<By>) -> Result<Element> {
        self.find_from(None, by.into()).await
    }

    /// Finds every element matching `by`. An empty list is not an error.
    pub async fn find_elements(&self, by: impl Into<By>) -> Result<Vec<Element>> {
        self.find_all_from(None, by.into()).await
    }

    /// Returns the focused element.
    pub async fn active_element(&self) -> Result<Element> {
        let value = self.command(command::GET_ACTIVE_ELEMENT, Value::Null).await?;
        self.element_from_value(&value)
    }

    /// Wraps an element reference found in a reply, e.g. a script result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if `value` is not a reference.
    pub fn element_from_value(&self, value: &Value) -> Result<Element> {
        let raw = parse_element_reference(value).ok_or_else(|| {
            Error::malformed_response(format!("expected element reference, got {value}"))
        })?;
        self.register_element(raw)
    }

    /// Wraps a list of element references.
    pub fn elements_from_value(&self, value: &Value) -> Result<Vec<Element>> {
        let items = value.as_array().ok_or_else(|| {
            Error::malformed_response(format!("expected element list, got {value}"))
        })?;
        items.iter().map(|item| self.element_from_value(item)).collect()
    }

    /// Single lookup from the document or from `parent`.
    pub(crate) async fn find_from(
        &self,
        parent: Option<&ElementHandle>,
        by: By,
    ) -> Result<Element> {
        trace!(locator = %by, "Finding element");
        let value = match parent {
            None => self.command(command::FIND_ELEMENT, by.to_params()).await?,
            Some(handle) => {
                self.element_command(command::FIND_CHILD_ELEMENT, handle, by.to_params())
                    .await?
            }
        };
        self.element_from_value(&value)
    }

    /// List lookup from the document or from `parent`.
    pub(crate) async fn find_all_from(
        &self,
        parent: Option<&ElementHandle>,
        by: By,
    ) -> Result<Vec<Element>> {
        trace!(locator = %by, "Finding elements");
        let value = match parent {
            None => self.command(command::FIND_ELEMENTS, by.to_params()).await?,
            Some(handle) => {
                self.element_command(command::FIND_CHILD_ELEMENTS, handle, by.to_params())
                    .await?
            }
        };
        self.elements_from_value(&value)
    }
}

#[async_trait]
impl SearchContext for Driver {
    async fn find_element(&self, by: By) -> Result<Element> {
        self.find_from(None, by).await
    }

    async fn find_elements(&self, by: By) -> Result<Vec<Element>> {
        self.find_all_from(None, by).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::browser::element::ELEMENT_KEY;
    use crate::protocol::Capabilities;
    use crate::transport::ScriptedTransport;

    async fn active(transport: &ScriptedTransport) -> Driver {
        transport.with_session("s-1");
        let driver = Driver::builder()
            .endpoint("http://127.0.0.1:4444")
            .transport(transport.clone())
            .build()
            .await
            .unwrap();
        driver.start_session(Capabilities::new()).await.unwrap();
        driver
    }

    #[tokio::test]
    async fn test_find_element_registers_handle() {
        let transport = ScriptedTransport::new();
        transport.respond_value("findElement", json!({ELEMENT_KEY: "e-1"}));
        let driver = active(&transport).await;

        let element = driver.find_element(By::css("#login")).await.unwrap();
        assert_eq!(element.id().as_str(), "e-1");
        assert_eq!(element.handle().session_id().as_str(), "s-1");
        assert_eq!(driver.element_count(), 1);

        let sent = &transport.requests_for("findElement")[0];
        assert_eq!(
            sent.body,
            Some(json!({"using": "css selector", "value": "#login"}))
        );
    }

    #[tokio::test]
    async fn test_find_elements_empty_is_ok() {
        let transport = ScriptedTransport::new();
        transport.respond_value("findElements", json!([]));
        let driver = active(&transport).await;

        let found = driver.find_elements(By::tag("li")).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_find_element_not_found() {
        let transport = ScriptedTransport::new();
        transport.respond_error("findElement", 404, "no such element", "nope");
        let driver = active(&transport).await;

        let err = driver.find_element(By::id("missing")).await.unwrap_err();
        assert!(matches!(err, Error::NoSuchElement { .. }));
    }

    #[tokio::test]
    async fn test_child_lookup_uses_parent_id() {
        let transport = ScriptedTransport::new();
        transport
            .respond_value("findElement", json!({ELEMENT_KEY: "parent"}))
            .respond_value("findChildElements", json!([{"ELEMENT": "c1"}, {ELEMENT_KEY: "c2"}]));
        let driver = active(&transport).await;

        let parent = driver.find_element(By::css("ul")).await.unwrap();
        let children = parent.find_elements(By::tag("li")).await.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(
            transport.requests_for("findChildElements")[0].path,
            "/session/s-1/element/parent/elements"
        );
    }

    #[tokio::test]
    async fn test_malformed_reference() {
        let transport = ScriptedTransport::new();
        transport.respond_value("findElement", json!({"id": "x"}));
        let driver = active(&transport).await;

        let err = driver.find_element(By::css("a")).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }
}
