// ABOUTME: Chat message, role, and tool-call types shared by the router, providers, and UI.
// ABOUTME: ConversationHistory is the append-only chronological record owned by one session.

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Developer => "developer",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function call requested by the model. `arguments` is the raw JSON
/// string exactly as the model produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// A single message in a conversation. Tool-related fields are only populated
/// for items produced inside a run (assistant tool calls and tool results).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn developer(content: impl Into<String>) -> Self {
        Self::plain(Role::Developer, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// An assistant message that carries tool calls (content may be empty).
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// The result of a tool call, linked back by call id.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// Ordered, append-only record of a session's conversation.
///
/// There is no API to edit or remove entries. Role alternation is not
/// enforced: consecutive user messages (e.g. after a failed turn) are legal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// The most recent `limit` messages, or all of them when `limit` is None.
    /// Only affects what is sent to the model; stored history is untouched.
    pub fn window(&self, limit: Option<usize>) -> &[ChatMessage] {
        match limit {
            Some(n) => &self.messages[self.messages.len().saturating_sub(n)..],
            None => &self.messages,
        }
    }

    /// Content of the most recent user message, if any.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_appends_in_order() {
        let mut history = ConversationHistory::new();
        history.push(ChatMessage::user("hello"));
        history.push(ChatMessage::assistant("hi there"));
        history.push(ChatMessage::user("again"));

        assert_eq!(history.len(), 3);
        assert_eq!(history.messages()[0].content, "hello");
        assert_eq!(history.messages()[1].role, Role::Assistant);
        assert_eq!(history.last().unwrap().content, "again");
        assert_eq!(history.latest_user_message(), Some("again"));
    }

    #[test]
    fn window_returns_tail_without_truncating() {
        let mut history = ConversationHistory::new();
        for i in 0..10 {
            history.push(ChatMessage::user(format!("m{}", i)));
        }

        let window = history.window(Some(3));
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].content, "m7");
        assert_eq!(history.len(), 10);

        assert_eq!(history.window(None).len(), 10);
        assert_eq!(history.window(Some(50)).len(), 10);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::developer("note")).unwrap();
        assert!(json.contains("\"role\":\"developer\""));
        // Plain messages omit tool fields entirely.
        assert!(!json.contains("tool_calls"));
        assert!(!json.contains("tool_call_id"));
    }

    #[test]
    fn tool_result_links_call_id() {
        let msg = ChatMessage::tool_result("call_1", "4");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }
}
