//! Per-vendor command tables.
//!
//! Browsers differ only in a handful of vendor-prefixed endpoints. A
//! [`VendorConfig`] names the vendor, supplies its default capabilities,
//! and adds its extra commands on top of the standard table.
//!
//! | Preset | Prefix | Extra commands |
//! |--------|--------|----------------|
//! | [`VendorConfig::chrome`] | `goog` | CDP, network conditions, cast, launch app |
//! | [`VendorConfig::edge`] | `ms` | same as Chrome |
//! | [`VendorConfig::firefox`] | `moz` | context, add-ons, full-page screenshot |
//! | [`VendorConfig::safari`] | `apple` | permissions, debugger |
//! | [`VendorConfig::generic`] | none | none |

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};
use tracing::debug;

use crate::error::Result;
use crate::protocol::{Capabilities, CommandRegistry, Method};

use super::core::Driver;
use super::navigation::expect_string;

// ============================================================================
// Vendor Command Names
// ============================================================================

/// Chromium: launch a Chrome app.
pub const LAUNCH_APP: &str = "launchApp";
/// Chromium: read emulated network conditions.
pub const GET_NETWORK_CONDITIONS: &str = "getNetworkConditions";
/// Chromium: set emulated network conditions.
pub const SET_NETWORK_CONDITIONS: &str = "setNetworkConditions";
/// Chromium: clear emulated network conditions.
pub const DELETE_NETWORK_CONDITIONS: &str = "deleteNetworkConditions";
/// Chromium: run a DevTools protocol command.
pub const EXECUTE_CDP_COMMAND: &str = "executeCdpCommand";
/// Chromium: list cast sinks.
pub const GET_SINKS: &str = "getSinks";
/// Chromium: select a cast sink.
pub const SET_SINK_TO_USE: &str = "setSinkToUse";
/// Chromium: mirror the tab to a sink.
pub const START_TAB_MIRRORING: &str = "startTabMirroring";
/// Chromium: stop casting to a sink.
pub const STOP_CASTING: &str = "stopCasting";
/// Chromium: read the cast issue message.
pub const GET_ISSUE_MESSAGE: &str = "getIssueMessage";

/// Firefox: read the command context (`content` or `chrome`).
pub const GET_CONTEXT: &str = "getContext";
/// Firefox: set the command context.
pub const SET_CONTEXT: &str = "setContext";
/// Firefox: install an add-on.
pub const INSTALL_ADDON: &str = "installAddon";
/// Firefox: uninstall an add-on.
pub const UNINSTALL_ADDON: &str = "uninstallAddon";
/// Firefox: screenshot of the whole page.
pub const FULL_PAGE_SCREENSHOT: &str = "fullPageScreenshot";

/// Safari: read permissions.
pub const GET_PERMISSIONS: &str = "getPermissions";
/// Safari: set permissions.
pub const SET_PERMISSIONS: &str = "setPermissions";
/// Safari: attach the Web Inspector.
pub const ATTACH_DEBUGGER: &str = "attachDebugger";

// ============================================================================
// VendorConfig
// ============================================================================

/// Vendor name, prefix and extra commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorConfig {
    name: String,
    prefix: Option<String>,
    commands: Vec<(String, Method, String)>,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self::generic()
    }
}

// ============================================================================
// VendorConfig - Presets
// ============================================================================

impl VendorConfig {
    /// A driver with no vendor commands.
    #[must_use]
    pub fn generic() -> Self {
        Self {
            name: "generic".to_string(),
            prefix: None,
            commands: Vec::new(),
        }
    }

    /// A Chromium-family driver using `prefix` for its vendor endpoints.
    #[must_use]
    pub fn chromium(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let cast = format!("/session/$sessionId/{prefix}/cast");
        Self {
            name: name.into(),
            prefix: Some(prefix.clone()),
            commands: Vec::new(),
        }
        .with_command(LAUNCH_APP, Method::Post, "/session/$sessionId/chromium/launch_app")
        .with_command(
            GET_NETWORK_CONDITIONS,
            Method::Get,
            "/session/$sessionId/chromium/network_conditions",
        )
        .with_command(
            SET_NETWORK_CONDITIONS,
            Method::Post,
            "/session/$sessionId/chromium/network_conditions",
        )
        .with_command(
            DELETE_NETWORK_CONDITIONS,
            Method::Delete,
            "/session/$sessionId/chromium/network_conditions",
        )
        .with_command(
            EXECUTE_CDP_COMMAND,
            Method::Post,
            format!("/session/$sessionId/{prefix}/cdp/execute"),
        )
        .with_command(GET_SINKS, Method::Get, format!("{cast}/get_sinks"))
        .with_command(SET_SINK_TO_USE, Method::Post, format!("{cast}/set_sink_to_use"))
        .with_command(
            START_TAB_MIRRORING,
            Method::Post,
            format!("{cast}/start_tab_mirroring"),
        )
        .with_command(STOP_CASTING, Method::Post, format!("{cast}/stop_casting"))
        .with_command(
            GET_ISSUE_MESSAGE,
            Method::Get,
            format!("{cast}/get_issue_message"),
        )
    }

    /// Chrome (`goog` prefix).
    #[must_use]
    pub fn chrome() -> Self {
        Self::chromium("chrome", "goog")
    }

    /// Edge (`ms` prefix).
    #[must_use]
    pub fn edge() -> Self {
        Self::chromium("MicrosoftEdge", "ms")
    }

    /// Firefox (`moz` prefix).
    #[must_use]
    pub fn firefox() -> Self {
        Self {
            name: "firefox".to_string(),
            prefix: Some("moz".to_string()),
            commands: Vec::new(),
        }
        .with_command(GET_CONTEXT, Method::Get, "/session/$sessionId/moz/context")
        .with_command(SET_CONTEXT, Method::Post, "/session/$sessionId/moz/context")
        .with_command(INSTALL_ADDON, Method::Post, "/session/$sessionId/moz/addon/install")
        .with_command(
            UNINSTALL_ADDON,
            Method::Post,
            "/session/$sessionId/moz/addon/uninstall",
        )
        .with_command(
            FULL_PAGE_SCREENSHOT,
            Method::Get,
            "/session/$sessionId/moz/screenshot/full",
        )
    }

    /// Safari (`apple` prefix).
    #[must_use]
    pub fn safari() -> Self {
        Self {
            name: "safari".to_string(),
            prefix: Some("apple".to_string()),
            commands: Vec::new(),
        }
        .with_command(GET_PERMISSIONS, Method::Get, "/session/$sessionId/apple/permissions")
        .with_command(SET_PERMISSIONS, Method::Post, "/session/$sessionId/apple/permissions")
        .with_command(
            ATTACH_DEBUGGER,
            Method::Post,
            "/session/$sessionId/apple/attach_debugger",
        )
    }
}

// ============================================================================
// VendorConfig - Builder Methods
// ============================================================================

impl VendorConfig {
    /// Adds (or replaces) a vendor command.
    #[must_use]
    pub fn with_command(
        mut self,
        name: impl Into<String>,
        method: Method,
        path: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.commands.retain(|(existing, _, _)| *existing != name);
        self.commands.push((name, method, path.into()));
        self
    }
}

// ============================================================================
// VendorConfig - Accessors
// ============================================================================

impl VendorConfig {
    /// Returns the vendor name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the vendor prefix, if any.
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the vendor commands as `(name, method, path)`.
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[(String, Method, String)] {
        &self.commands
    }

    /// Builds the full command table: standard commands plus vendor ones.
    #[must_use]
    pub fn registry(&self) -> CommandRegistry {
        let mut registry = CommandRegistry::standard();
        for (name, method, path) in &self.commands {
            registry.register(name.clone(), *method, path.clone());
        }
        registry
    }

    /// Returns the capabilities a session for this vendor starts from.
    #[must_use]
    pub fn default_capabilities(&self) -> Capabilities {
        match self.name.as_str() {
            "chrome" => Capabilities::chrome(),
            "MicrosoftEdge" => Capabilities::edge(),
            "firefox" => Capabilities::firefox(),
            "safari" => Capabilities::safari(),
            _ => Capabilities::new(),
        }
    }
}

// ============================================================================
// Driver - Chromium Commands
// ============================================================================

impl Driver {
    /// Runs a Chrome DevTools protocol command.
    pub async fn execute_cdp_command(&self, cmd: &str, args: Value) -> Result<Value> {
        debug!(cmd, "Executing CDP command");
        self.command(EXECUTE_CDP_COMMAND, json!({ "cmd": cmd, "params": args }))
            .await
    }

    /// Returns the emulated network conditions.
    pub async fn network_conditions(&self) -> Result<Value> {
        self.command(GET_NETWORK_CONDITIONS, Value::Null).await
    }

    /// Sets emulated network conditions.
    pub async fn set_network_conditions(&self, conditions: Value) -> Result<()> {
        self.command(
            SET_NETWORK_CONDITIONS,
            json!({ "network_conditions": conditions }),
        )
        .await?;
        Ok(())
    }

    /// Clears emulated network conditions.
    pub async fn delete_network_conditions(&self) -> Result<()> {
        self.command(DELETE_NETWORK_CONDITIONS, Value::Null).await?;
        Ok(())
    }

    /// Launches a Chrome app by ID.
    pub async fn launch_app(&self, id: &str) -> Result<()> {
        self.command(LAUNCH_APP, json!({ "id": id })).await?;
        Ok(())
    }

    /// Lists available cast sinks.
    pub async fn cast_sinks(&self) -> Result<Value> {
        self.command(GET_SINKS, Value::Null).await
    }

    /// Selects the cast sink to use.
    pub async fn set_sink_to_use(&self, sink_name: &str) -> Result<()> {
        self.command(SET_SINK_TO_USE, json!({ "sinkName": sink_name }))
            .await?;
        Ok(())
    }

    /// Starts mirroring the tab to a sink.
    pub async fn start_tab_mirroring(&self, sink_name: &str) -> Result<()> {
        self.command(START_TAB_MIRRORING, json!({ "sinkName": sink_name }))
            .await?;
        Ok(())
    }

    /// Stops casting to a sink.
    pub async fn stop_casting(&self, sink_name: &str) -> Result<()> {
        self.command(STOP_CASTING, json!({ "sinkName": sink_name }))
            .await?;
        Ok(())
    }

    /// Returns the cast issue message.
    pub async fn cast_issue_message(&self) -> Result<Value> {
        self.command(GET_ISSUE_MESSAGE, Value::Null).await
    }
}

// ============================================================================
// Driver - Firefox Commands
// ============================================================================

impl Driver {
    /// Returns the command context (`content` or `chrome`).
    pub async fn context(&self) -> Result<String> {
        let value = self.command(GET_CONTEXT, Value::Null).await?;
        expect_string(value, "context")
    }

    /// Sets the command context.
    pub async fn set_context(&self, context: &str) -> Result<()> {
        self.command(SET_CONTEXT, json!({ "context": context }))
            .await?;
        Ok(())
    }

    /// Installs an add-on from a path on the driver's machine.
    ///
    /// Returns the add-on ID.
    pub async fn install_addon(&self, path: &str, temporary: bool) -> Result<String> {
        let value = self
            .command(INSTALL_ADDON, json!({ "path": path, "temporary": temporary }))
            .await?;
        expect_string(value, "add-on id")
    }

    /// Uninstalls an add-on by ID.
    pub async fn uninstall_addon(&self, id: &str) -> Result<()> {
        self.command(UNINSTALL_ADDON, json!({ "id": id })).await?;
        Ok(())
    }

    /// Captures a PNG of the whole page, not just the viewport.
    pub async fn full_page_screenshot(&self) -> Result<Vec<u8>> {
        let value = self.command(FULL_PAGE_SCREENSHOT, Value::Null).await?;
        super::window::decode_png(&value)
    }
}

// ============================================================================
// Driver - Safari Commands
// ============================================================================

impl Driver {
    /// Returns the granted permissions.
    pub async fn permissions(&self) -> Result<Value> {
        let value = self.command(GET_PERMISSIONS, Value::Null).await?;
        Ok(value.get("permissions").cloned().unwrap_or(value))
    }

    /// Grants or revokes a permission.
    pub async fn set_permission(&self, name: &str, granted: bool) -> Result<()> {
        self.command(
            SET_PERMISSIONS,
            json!({ "permissions": { name: granted } }),
        )
        .await?;
        Ok(())
    }

    /// Attaches the Web Inspector.
    pub async fn attach_debugger(&self) -> Result<()> {
        self.command(ATTACH_DEBUGGER, Value::Null).await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ErrorKind;
    use crate::transport::ScriptedTransport;

    async fn firefox(transport: &ScriptedTransport) -> Driver {
        transport.with_session("s-1");
        let driver = Driver::builder()
            .endpoint("http://127.0.0.1:4444")
            .transport(transport.clone())
            .vendor(VendorConfig::firefox())
            .build()
            .await
            .unwrap();
        driver.start_session(Capabilities::new()).await.unwrap();
        driver
    }

    #[test]
    fn test_generic_has_only_standard_commands() {
        let vendor = VendorConfig::generic();
        assert!(vendor.prefix().is_none());
        assert_eq!(vendor.registry().len(), CommandRegistry::standard().len());
    }

    #[test]
    fn test_chromium_prefix_in_paths() {
        let edge = VendorConfig::edge();
        assert_eq!(edge.prefix(), Some("ms"));
        let registry = edge.registry();
        assert_eq!(
            registry.get(EXECUTE_CDP_COMMAND).unwrap().path,
            "/session/$sessionId/ms/cdp/execute"
        );
        assert_eq!(
            registry.get(GET_SINKS).unwrap().path,
            "/session/$sessionId/ms/cast/get_sinks"
        );

        let chrome = VendorConfig::chrome().registry();
        assert_eq!(
            chrome.get(EXECUTE_CDP_COMMAND).unwrap().path,
            "/session/$sessionId/goog/cdp/execute"
        );
    }

    #[test]
    fn test_firefox_commands() {
        let registry = VendorConfig::firefox().registry();
        let spec = registry.get(INSTALL_ADDON).unwrap();
        assert_eq!(spec.method, Method::Post);
        assert!(registry.contains(GET_CONTEXT));
        assert!(!registry.contains(EXECUTE_CDP_COMMAND));
    }

    #[test]
    fn test_safari_commands() {
        let registry = VendorConfig::safari().registry();
        assert!(registry.contains(GET_PERMISSIONS));
        assert!(registry.contains(ATTACH_DEBUGGER));
    }

    #[test]
    fn test_with_command_replaces() {
        let vendor = VendorConfig::generic()
            .with_command("ping", Method::Get, "/a")
            .with_command("ping", Method::Post, "/b");
        assert_eq!(vendor.commands().len(), 1);
        assert_eq!(vendor.registry().get("ping").unwrap().path, "/b");
    }

    #[test]
    fn test_default_capabilities_follow_vendor() {
        assert_eq!(
            VendorConfig::edge().default_capabilities().browser_name(),
            Some("MicrosoftEdge")
        );
        assert!(VendorConfig::generic().default_capabilities().is_empty());
    }

    #[tokio::test]
    async fn test_context_and_addon_id() {
        let transport = ScriptedTransport::new();
        transport
            .respond_value(GET_CONTEXT, json!("chrome"))
            .respond_value(INSTALL_ADDON, json!("addon@example.com"));
        let driver = firefox(&transport).await;

        assert_eq!(driver.context().await.unwrap(), "chrome");
        assert_eq!(
            driver.install_addon("/tmp/a.xpi", true).await.unwrap(),
            "addon@example.com"
        );
    }

    #[tokio::test]
    async fn test_non_string_context_is_malformed() {
        let transport = ScriptedTransport::new();
        transport
            .respond_value(GET_CONTEXT, json!(5))
            .respond_value(INSTALL_ADDON, json!({"id": "x"}));
        let driver = firefox(&transport).await;

        let err = driver.context().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);

        let err = driver.install_addon("/tmp/a.xpi", false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert!(err.to_string().contains("add-on id"), "{err}");
    }
}
