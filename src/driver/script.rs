//! Script execution.
//!
//! Arguments may contain element references built with
//! [`Element::to_reference`](crate::Element::to_reference); element
//! references in results are left as JSON and can be wrapped with
//! [`Driver::element_from_value`].

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};
use tracing::debug;

use crate::error::Result;
use crate::protocol::command;

use super::core::Driver;

// ============================================================================
// Driver - Script
// ============================================================================

impl Driver {
    /// Runs `script` synchronously in the page and returns its result.
    pub async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        debug!(script_len = script.len(), args = args.len(), "Executing script");
        self.command(
            command::EXECUTE_SCRIPT,
            json!({ "script": script, "args": args }),
        )
        .await
    }

    /// Runs `script` asynchronously; the script signals completion by
    /// calling its last argument.
    pub async fn execute_async_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        debug!(script_len = script.len(), args = args.len(), "Executing async script");
        self.command(
            command::EXECUTE_ASYNC_SCRIPT,
            json!({ "script": script, "args": args }),
        )
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
