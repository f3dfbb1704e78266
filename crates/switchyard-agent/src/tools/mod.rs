// ABOUTME: Tool trait and registry: named callables the router can invoke on behalf of an agent.
// ABOUTME: Tools receive parsed JSON arguments plus the session's mutable domain context.

mod add_to_inventory;
mod agent_tool;
mod generate_event;
mod roll_dice;
mod travel;

pub use add_to_inventory::AddToInventoryTool;
pub use agent_tool::AgentTool;
pub use generate_event::GenerateEventTool;
pub use roll_dice::{RollDiceTool, roll_d6};
pub use travel::{GetFlightsTool, SuggestHotelsTool};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use switchyard_core::SessionContext;

use crate::runtime::{AgentError, ToolSpec};

/// Output of a tool call, sent back to the model as the tool message content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// A failure the tool handled itself; the run continues with this as output.
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn schema(&self) -> Value;

    async fn execute(
        &self,
        params: Value,
        context: &mut SessionContext,
    ) -> Result<ToolResult, anyhow::Error>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema(),
        }
    }
}

/// Name to tool mapping, built once per app and shared read-only across sessions.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name. A later registration with the same name wins.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), Arc::new(tool)).is_some() {
            tracing::warn!(tool = %name, "tool registered twice; keeping the latest");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Specs for the given tool names, in the order given. Unknown names are skipped.
    pub fn specs_for(&self, names: &[String]) -> Vec<ToolSpec> {
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    /// Parse `arguments` and run the named tool. Errors from the tool body are
    /// not caught here; they become `AgentError::ToolFailed`.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: &str,
        context: &mut SessionContext,
    ) -> Result<ToolResult, AgentError> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))?;

        let params = parse_arguments(arguments).map_err(|e| AgentError::ToolFailed {
            tool: name.to_string(),
            message: format!("invalid arguments: {}", e),
        })?;

        tracing::debug!(tool = %name, "invoking tool");

        tool.execute(params, context)
            .await
            .map_err(|e| AgentError::ToolFailed {
                tool: name.to_string(),
                message: e.to_string(),
            })
    }
}

/// Empty or whitespace-only argument strings mean "no arguments".
fn parse_arguments(arguments: &str) -> Result<Value, serde_json::Error> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(arguments)
}

/// Read a required string argument.
pub(crate) fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, anyhow::Error> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("missing required parameter: {}", key))
}

/// Read an optional string argument, treating blank values as absent.
pub(crate) fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
