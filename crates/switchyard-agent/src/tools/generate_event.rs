// ABOUTME: Implements the generate_event tool, a canned fantasy event for the item agent.
// ABOUTME: Output text is deterministic so the narrative stays under the model's control.

use async_trait::async_trait;
use serde_json::{Value, json};

use switchyard_core::SessionContext;

use super::{Tool, ToolResult, required_str};

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateEventTool;

pub fn event_for(scenario: &str) -> String {
    format!(
        "As you {}, a mysterious figure appears from the shadows...",
        scenario
    )
}

#[async_trait]
impl Tool for GenerateEventTool {
    fn name(&self) -> &str {
        "generate_event"
    }

    fn description(&self) -> &str {
        "Generates a fantasy event based on the given scenario."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "scenario": {
                    "type": "string",
                    "description": "What the player is doing, e.g. 'open the old chest'."
                }
            },
            "required": ["scenario"]
        })
    }

    async fn execute(
        &self,
        params: Value,
        _context: &mut SessionContext,
    ) -> Result<ToolResult, anyhow::Error> {
        let scenario = required_str(&params, "scenario")?;
        Ok(ToolResult::text(event_for(scenario.trim())))
    }
}
