// ABOUTME: OpenAI-compatible Chat Completions adapter implementing the ModelClient trait.
// ABOUTME: Serves both OpenAI and Gemini's OpenAI-compatible endpoint, with and without streaming.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Value, json};

use switchyard_core::{ChatMessage, Role, ToolCall};

use crate::providers::sse::{LineBuffer, SseLine, StreamAccumulator, parse_sse_line};
use crate::runtime::{AgentError, CompletionRequest, ModelClient, ModelReply};

/// Adapter for any endpoint that speaks the OpenAI Chat Completions wire format.
pub struct OpenAICompatClient {
    client: reqwest::Client,
    provider: String,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAICompatClient {
    /// `base_url` is everything before `/chat/completions`,
    /// e.g. `https://api.openai.com/v1`.
    pub fn new(
        provider: impl Into<String>,
        api_key: String,
        base_url: String,
        model: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider: provider.into(),
            api_key,
            base_url,
            model,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Build the JSON request body for the Chat Completions API.
    pub fn build_request_body(&self, request: &CompletionRequest, stream: bool) -> Value {
        let messages: Vec<Value> = request.messages.iter().map(message_to_json).collect();

        let mut body = json!({
            "model": request.model.as_deref().unwrap_or(&self.model),
            "messages": messages,
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = json!("auto");
        }

        if stream {
            body["stream"] = json!(true);
        }

        body
    }

    /// Parse a non-streamed Chat Completions response.
    pub fn parse_response(response_body: &Value) -> Result<ModelReply, AgentError> {
        let choices = response_body
            .get("choices")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                AgentError::InvalidResponse("missing choices array in response".to_string())
            })?;

        let choice = choices
            .first()
            .ok_or_else(|| AgentError::InvalidResponse("empty choices array".to_string()))?;

        let message = choice.get("message").ok_or_else(|| {
            AgentError::InvalidResponse("missing message in choice".to_string())
        })?;

        let tool_calls = match message.get("tool_calls").and_then(|t| t.as_array()) {
            Some(calls) => calls
                .iter()
                .enumerate()
                .map(|(i, call)| parse_tool_call(i, call))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let content = message
            .get("content")
            .and_then(|c| c.as_str())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let finish_reason = choice
            .get("finish_reason")
            .and_then(|f| f.as_str())
            .map(String::from);

        if content.is_none() && tool_calls.is_empty() && finish_reason.as_deref() != Some("stop") {
            return Err(AgentError::InvalidResponse(
                "no actionable content in response".to_string(),
            ));
        }

        Ok(ModelReply {
            content,
            tool_calls,
            finish_reason,
        })
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response, AgentError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::ProviderError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentError::RateLimited);
        }

        if status == reqwest::StatusCode::PAYLOAD_TOO_LARGE {
            return Err(AgentError::ContextTooLarge);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AgentError::ProviderError(format!(
                "Unauthorized: check the {} API key",
                self.provider
            )));
        }

        if status.is_server_error() {
            return Err(AgentError::ProviderError(format!(
                "Server error: {}",
                status
            )));
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AgentError::ProviderError(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        Ok(response)
    }
}

/// Convert one chat message to the wire format. Developer notes are sent as
/// system messages since not every compatible endpoint accepts "developer".
fn message_to_json(message: &ChatMessage) -> Value {
    match message.role {
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": message.tool_call_id.as_deref().unwrap_or_default(),
            "content": message.content,
        }),
        Role::Assistant if !message.tool_calls.is_empty() => {
            let calls: Vec<Value> = message
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments,
                        }
                    })
                })
                .collect();
            let content = if message.content.is_empty() {
                Value::Null
            } else {
                Value::String(message.content.clone())
            };
            json!({
                "role": "assistant",
                "content": content,
                "tool_calls": calls,
            })
        }
        Role::Developer => json!({
            "role": "system",
            "content": message.content,
        }),
        role => json!({
            "role": role.as_str(),
            "content": message.content,
        }),
    }
}

/// Parse a single tool_call object from a response message.
fn parse_tool_call(index: usize, tool_call: &Value) -> Result<ToolCall, AgentError> {
    let function = tool_call.get("function").ok_or_else(|| {
        AgentError::InvalidResponse("tool_call missing function".to_string())
    })?;

    let name = function
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| AgentError::InvalidResponse("function missing name".to_string()))?;

    // Some compatible endpoints send arguments as an object rather than a string.
    let arguments = match function.get("arguments") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "{}".to_string(),
        Some(other) => other.to_string(),
    };

    let id = tool_call
        .get("id")
        .and_then(|i| i.as_str())
        .map(String::from)
        .unwrap_or_else(|| format!("call_{}", index));

    Ok(ToolCall::new(id, name, arguments))
}

#[async_trait]
impl ModelClient for OpenAICompatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<ModelReply, AgentError> {
        let body = self.build_request_body(request, false);
        let response = self.send(&body).await?;

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(format!("failed to parse JSON: {}", e)))?;

        Self::parse_response(&response_body)
    }

    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
        on_delta: &(dyn for<'s> Fn(&'s str) + Send + Sync),
    ) -> Result<ModelReply, AgentError> {
        let body = self.build_request_body(request, true);
        let response = self.send(&body).await?;

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut acc = StreamAccumulator::new();

        'read: while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AgentError::ProviderError(format!("stream read failed: {}", e)))?;
            for line in lines.push(&chunk) {
                match parse_sse_line(&line)? {
                    Some(SseLine::Done) => break 'read,
                    Some(SseLine::Data(value)) => {
                        if let Some(delta) = acc.apply(&value)? {
                            on_delta(&delta);
                        }
                    }
                    None => {}
                }
            }
        }

        if let Some(rest) = lines.finish()
            && let Some(SseLine::Data(value)) = parse_sse_line(&rest)?
            && let Some(delta) = acc.apply(&value)?
        {
            on_delta(&delta);
        }

        Ok(acc.finish())
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ToolSpec;

    fn client() -> OpenAICompatClient {
        OpenAICompatClient::new(
            "gemini",
            "test-key".to_string(),
            "https://generativelanguage.googleapis.com/v1beta/openai/".to_string(),
            "gemini-2.0-flash".to_string(),
        )
    }

    #[test]
    fn client_creation() {
        let client = client();
        assert_eq!(client.provider_name(), "gemini");
        assert_eq!(client.model_name(), "gemini-2.0-flash");
        assert_eq!(client.api_key, "test-key");
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
        );
    }

    #[test]
    fn builds_request_body_with_tools() {
        let mut request = CompletionRequest::new(vec![
            ChatMessage::system("You are the game master."),
            ChatMessage::user("I open the chest"),
        ]);
        request.tools.push(ToolSpec {
            name: "roll_dice".to_string(),
            description: "Rolls a 6-sided dice.".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        });

        let body = client().build_request_body(&request, false);

        assert_eq!(body["model"], "gemini-2.0-flash");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "I open the chest");

        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "roll_dice");
        assert_eq!(body["tool_choice"], "auto");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn omits_tools_when_none_and_sets_stream_flag() {
        let mut request = CompletionRequest::prompt("hello");
        request.model = Some("gpt-4o-mini".to_string());
        let body = client().build_request_body(&request, true);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn serializes_tool_round_trip_messages() {
        let call = ToolCall::new("call_1", "roll_dice", "{}");
        let assistant = message_to_json(&ChatMessage::assistant_tool_calls("", vec![call]));
        assert_eq!(assistant["role"], "assistant");
        assert!(assistant["content"].is_null());
        assert_eq!(assistant["tool_calls"][0]["id"], "call_1");
        assert_eq!(assistant["tool_calls"][0]["function"]["arguments"], "{}");

        let result = message_to_json(&ChatMessage::tool_result("call_1", "5"));
        assert_eq!(result["role"], "tool");
        assert_eq!(result["tool_call_id"], "call_1");
        assert_eq!(result["content"], "5");

        let developer = message_to_json(&ChatMessage::developer("note"));
        assert_eq!(developer["role"], "system");
    }

    #[test]
    fn parses_text_response() {
        let response = json!({
            "id": "chatcmpl-456",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "  The path forks ahead.\n"
                    },
                    "finish_reason": "stop"
                }
            ]
        });

        let reply = OpenAICompatClient::parse_response(&response).unwrap();
        assert_eq!(reply.content.as_deref(), Some("The path forks ahead."));
        assert!(reply.tool_calls.is_empty());
    }

    #[test]
    fn parses_tool_call_response() {
        let response = json!({
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [
                            {
                                "id": "call_abc",
                                "type": "function",
                                "function": {
                                    "name": "transfer_to_monsteragent",
                                    "arguments": "{}"
                                }
                            },
                            {
                                "type": "function",
                                "function": {
                                    "name": "roll_dice",
                                    "arguments": {"sides": 6}
                                }
                            }
                        ]
                    },
                    "finish_reason": "tool_calls"
                }
            ]
        });

        let reply = OpenAICompatClient::parse_response(&response).unwrap();
        assert!(reply.content.is_none());
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].id, "call_abc");
        assert_eq!(reply.tool_calls[0].name, "transfer_to_monsteragent");
        assert_eq!(reply.tool_calls[1].id, "call_1");
        assert_eq!(reply.tool_calls[1].arguments, "{\"sides\":6}");
    }

    #[test]
    fn empty_stop_is_an_empty_answer() {
        let response = json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": ""}, "finish_reason": "stop"}]
        });
        let reply = OpenAICompatClient::parse_response(&response).unwrap();
        assert!(reply.content.is_none());
        assert_eq!(reply.content_or_empty(), "");
    }

    #[test]
    fn rejects_malformed_responses() {
        assert!(OpenAICompatClient::parse_response(&json!({})).is_err());
        assert!(OpenAICompatClient::parse_response(&json!({"choices": []})).is_err());

        let no_content = json!({
            "choices": [{"index": 0, "message": {"role": "assistant"}, "finish_reason": "length"}]
        });
        let err = OpenAICompatClient::parse_response(&no_content).unwrap_err();
        assert!(err.to_string().contains("no actionable content"));
    }

    #[tokio::test]
    #[cfg(feature = "live-test")]
    async fn gemini_adapter_basic() {
        let api_key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set");
        let client = OpenAICompatClient::new(
            "gemini",
            api_key,
            crate::providers::GEMINI_BASE_URL.to_string(),
            crate::providers::GEMINI_DEFAULT_MODEL.to_string(),
        );

        let result = client
            .complete(&CompletionRequest::prompt("Say hello in one word."))
            .await;
        assert!(result.is_ok(), "live test failed: {:?}", result.err());
    }
}
