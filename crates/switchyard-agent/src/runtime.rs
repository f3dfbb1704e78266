// ABOUTME: Defines the ModelClient trait that hosted-model adapters implement, plus request/reply types.
// ABOUTME: Also defines AgentError, the single error type a turn can fail with.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use switchyard_core::{ChatMessage, RegistryError, ToolCall};

/// A tool advertised to the model: name, description, and JSON-schema parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One chat-completions call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Overrides the client's configured model when set.
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSpec>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            model: None,
            messages,
            tools: Vec::new(),
        }
    }

    /// A single user prompt with no tools, as used by tools that re-call the model.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(text)])
    }
}

/// What the model sent back for one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: Some("stop".to_string()),
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls: calls,
            finish_reason: Some("tool_calls".to_string()),
        }
    }

    /// Text content, or an empty string when the model sent none.
    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Errors that can occur while running a turn.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Context too large")]
    ContextTooLarge,

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("agent '{agent}' is not allowed to call tool '{tool}'")]
    ToolNotAllowed { agent: String, tool: String },

    #[error("agent '{from}' cannot hand off to '{to}'")]
    HandoffNotAllowed { from: String, to: String },

    #[error("tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("max turns ({0}) exceeded")]
    MaxTurnsExceeded(usize),
}

impl From<RegistryError> for AgentError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownAgent(name) => AgentError::UnknownAgent(name),
        }
    }
}

/// Trait that hosted-model adapters implement. The adapter translates a
/// CompletionRequest into an API call and parses the reply.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<ModelReply, AgentError>;

    /// Like `complete`, but reports answer text to `on_delta` as it arrives.
    /// Adapters without streaming support deliver the whole text as one delta.
    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
        on_delta: &(dyn for<'s> Fn(&'s str) + Send + Sync),
    ) -> Result<ModelReply, AgentError> {
        let reply = self.complete(request).await?;
        if let Some(text) = reply.content.as_deref()
            && !text.is_empty()
        {
            on_delta(text);
        }
        Ok(reply)
    }

    /// Provider name for logging and display (e.g. "gemini", "openai").
    fn provider_name(&self) -> &str;

    /// Default model identifier (e.g. "gemini-2.0-flash").
    fn model_name(&self) -> &str;
}
