// ABOUTME: Incremental parser for OpenAI-style streamed chat completions (SSE "data:" lines).
// ABOUTME: Reassembles text deltas and fragmented tool-call arguments into a single ModelReply.

use std::collections::BTreeMap;

use serde_json::Value;

use switchyard_core::ToolCall;

use crate::runtime::{AgentError, ModelReply};

/// Splits a byte stream into complete lines, holding back any partial tail.
/// Works on raw bytes so multi-byte characters split across chunks survive.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Feed a chunk and return every complete line it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
        lines
    }

    /// Whatever is left once the stream ends.
    pub fn finish(self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.pending).trim().to_string();
        (!rest.is_empty()).then_some(rest)
    }
}

/// One meaningful SSE line.
#[derive(Debug, PartialEq)]
pub enum SseLine {
    Data(Value),
    Done,
}

/// Parse a single SSE line. Comments, blank lines, and non-data fields yield None.
pub fn parse_sse_line(line: &str) -> Result<Option<SseLine>, AgentError> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(None);
    }
    if payload == "[DONE]" {
        return Ok(Some(SseLine::Done));
    }
    serde_json::from_str(payload)
        .map(|v| Some(SseLine::Data(v)))
        .map_err(|e| AgentError::InvalidResponse(format!("bad stream chunk: {}", e)))
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Accumulates streamed chunks into a final reply.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    content: String,
    tool_calls: BTreeMap<u64, PartialToolCall>,
    finish_reason: Option<String>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one `chat.completion.chunk`. Returns the text delta it carried, if any.
    pub fn apply(&mut self, chunk: &Value) -> Result<Option<String>, AgentError> {
        if let Some(error) = chunk.get("error") {
            return Err(AgentError::ProviderError(format!("stream error: {}", error)));
        }

        let Some(choice) = chunk
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
        else {
            // Usage-only chunks have an empty choices array.
            return Ok(None);
        };

        if let Some(reason) = choice.get("finish_reason").and_then(|f| f.as_str()) {
            self.finish_reason = Some(reason.to_string());
        }

        let Some(delta) = choice.get("delta") else {
            return Ok(None);
        };

        if let Some(calls) = delta.get("tool_calls").and_then(|t| t.as_array()) {
            for (position, call) in calls.iter().enumerate() {
                let index = call
                    .get("index")
                    .and_then(|i| i.as_u64())
                    .unwrap_or(position as u64);
                let entry = self.tool_calls.entry(index).or_default();
                if let Some(id) = call.get("id").and_then(|v| v.as_str()) {
                    entry.id = id.to_string();
                }
                if let Some(function) = call.get("function") {
                    if let Some(name) = function.get("name").and_then(|v| v.as_str()) {
                        entry.name.push_str(name);
                    }
                    if let Some(args) = function.get("arguments").and_then(|v| v.as_str()) {
                        entry.arguments.push_str(args);
                    }
                }
            }
        }

        match delta.get("content").and_then(|c| c.as_str()) {
            Some(text) if !text.is_empty() => {
                self.content.push_str(text);
                Ok(Some(text.to_string()))
            }
            _ => Ok(None),
        }
    }

    pub fn finish(self) -> ModelReply {
        let tool_calls = self
            .tool_calls
            .into_iter()
            .map(|(index, partial)| {
                let id = if partial.id.is_empty() {
                    format!("call_{}", index)
                } else {
                    partial.id
                };
                ToolCall::new(id, partial.name, partial.arguments)
            })
            .collect();

        ModelReply {
            content: (!self.content.is_empty()).then_some(self.content),
            tool_calls,
            finish_reason: self.finish_reason,
        }
    }
}
