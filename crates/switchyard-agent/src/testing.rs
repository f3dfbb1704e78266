// ABOUTME: Test utilities for switchyard-agent: scripted and echoing model clients plus a scripted router.
// ABOUTME: Used by unit, server, and end-to-end tests to drive runs without real API calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use switchyard_core::{AgentRegistry, ChatMessage, Role, ToolCall, handoff_tool_name};

use crate::router::{Decision, RoutingStep, RoutingStrategy};
use crate::runtime::{AgentError, CompletionRequest, ModelClient, ModelReply};

/// A model client that returns queued replies in order and records every request.
/// Once the queue is empty every call fails.
#[derive(Debug, Default)]
pub struct ScriptedModelClient {
    replies: Mutex<VecDeque<Result<ModelReply, AgentError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModelClient {
    pub fn new(replies: Vec<Result<ModelReply, AgentError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Append another reply to the queue.
    pub fn push(&self, reply: Result<ModelReply, AgentError>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<ModelReply, AgentError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| {
                Err(AgentError::InvalidResponse(
                    "scripted client has no replies left".to_string(),
                ))
            })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// A model client that answers as whichever agent is asking: the reply is
/// `[<agent name>] <latest user message>`. Keyword routes make it call a handoff
/// pseudo-tool instead, when the asking agent advertises that handoff.
pub struct EchoModelClient {
    registry: Arc<AgentRegistry>,
    routes: Vec<(String, String)>,
}

impl EchoModelClient {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            routes: Vec::new(),
        }
    }

    /// When the user message contains `keyword`, hand off to `agent`.
    pub fn with_route(mut self, keyword: &str, agent: &str) -> Self {
        self.routes
            .push((keyword.to_lowercase(), agent.to_string()));
        self
    }

    /// The registered agent whose instructions open the system prompt.
    fn agent_for(&self, request: &CompletionRequest) -> String {
        let system = request
            .messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or("");

        self.registry
            .names()
            .into_iter()
            .filter_map(|name| self.registry.get(&name))
            .filter(|agent| !agent.instructions.is_empty() && system.starts_with(&agent.instructions))
            .max_by_key(|agent| agent.instructions.len())
            .map(|agent| agent.name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn latest_user(messages: &[ChatMessage]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

#[async_trait]
impl ModelClient for EchoModelClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<ModelReply, AgentError> {
        let user = latest_user(&request.messages);
        let fresh_turn = request.messages.last().map(|m| m.role) == Some(Role::User);

        if fresh_turn {
            let lowered = user.to_lowercase();
            for (keyword, target) in &self.routes {
                let tool = handoff_tool_name(target);
                if lowered.contains(keyword.as_str()) && request.tools.iter().any(|t| t.name == tool)
                {
                    return Ok(ModelReply::tool_calls(vec![ToolCall::new(
                        "call_echo",
                        tool,
                        "{}",
                    )]));
                }
            }
        }

        Ok(ModelReply::text(format!("[{}] {}", self.agent_for(request), user)))
    }

    fn provider_name(&self) -> &str {
        "echo"
    }

    fn model_name(&self) -> &str {
        "echo-model"
    }
}

/// A routing strategy that returns queued decisions in order.
#[derive(Debug, Default)]
pub struct ScriptedRouter {
    decisions: Mutex<VecDeque<Result<Decision, AgentError>>>,
}

impl ScriptedRouter {
    pub fn new(decisions: Vec<Result<Decision, AgentError>>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
        }
    }
}

#[async_trait]
impl RoutingStrategy for ScriptedRouter {
    async fn decide(
        &self,
        _step: &RoutingStep<'_>,
        _on_delta: Option<&(dyn for<'s> Fn(&'s str) + Send + Sync)>,
    ) -> Result<Decision, AgentError> {
        self.decisions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| {
                Err(AgentError::InvalidResponse(
                    "scripted router has no decisions left".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ToolSpec;
    use switchyard_core::AgentDefinition;

    #[tokio::test]
    async fn scripted_client_replays_then_fails() {
        let client = ScriptedModelClient::new(vec![Ok(ModelReply::text("one"))]);
        let request = CompletionRequest::prompt("hi");

        assert_eq!(client.complete(&request).await.unwrap().content_or_empty(), "one");
        assert!(client.complete(&request).await.is_err());
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn echo_client_names_the_agent_and_routes() {
        let mut registry = AgentRegistry::new();
        registry.define(AgentDefinition::new("MonsterAgent", "You control monster battles."));
        let registry = Arc::new(registry);
        let client = EchoModelClient::new(registry).with_route("danger", "MonsterAgent");

        let mut request = CompletionRequest::new(vec![
            ChatMessage::system("You control monster battles.\n\nCurrent context: x"),
            ChatMessage::user("Danger ahead"),
        ]);
        let reply = client.complete(&request).await.unwrap();
        assert_eq!(reply.content_or_empty(), "[MonsterAgent] Danger ahead");

        request.tools.push(ToolSpec {
            name: "transfer_to_monsteragent".to_string(),
            description: String::new(),
            parameters: serde_json::json!({}),
        });
        let reply = client.complete(&request).await.unwrap();
        assert_eq!(reply.tool_calls[0].name, "transfer_to_monsteragent");
    }
}
