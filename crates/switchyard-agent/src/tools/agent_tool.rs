// ABOUTME: Exposes an agent as a tool: a nested single-agent completion whose text becomes the tool output.
// ABOUTME: The nested agent sees only its own instructions and the input, never the caller's transcript.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use switchyard_core::{AgentDefinition, ChatMessage, SessionContext};

use super::{Tool, ToolResult, required_str};
use crate::runtime::{CompletionRequest, ModelClient};

pub struct AgentTool {
    name: String,
    description: String,
    agent: Arc<AgentDefinition>,
    client: Arc<dyn ModelClient>,
}

impl AgentTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        agent: Arc<AgentDefinition>,
        client: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent,
            client,
        }
    }

    pub fn agent(&self) -> &AgentDefinition {
        &self.agent
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": format!("The request to pass to the {} agent.", self.agent.name)
                }
            },
            "required": ["input"]
        })
    }

    async fn execute(
        &self,
        params: Value,
        _context: &mut SessionContext,
    ) -> Result<ToolResult, anyhow::Error> {
        let input = required_str(&params, "input")?;

        let mut request = CompletionRequest::new(vec![
            ChatMessage::system(self.agent.instructions.clone()),
            ChatMessage::user(input),
        ]);
        request.model = self.agent.model.clone();

        tracing::debug!(tool = %self.name, agent = %self.agent.name, "running agent as tool");
        let reply = self.client.complete(&request).await?;
        Ok(ToolResult::text(reply.content_or_empty()))
    }
}
