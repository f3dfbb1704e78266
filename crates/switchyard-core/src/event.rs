// ABOUTME: Observable steps of a single turn, streamed to the UI as the router works.
// ABOUTME: Serialized with a "type" tag; kind() gives the snake_case name used for SSE events.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// An agent took control of the turn (the entry agent, or after a handoff).
    AgentStarted { agent: String },
    ToolCalled {
        agent: String,
        tool: String,
        arguments: String,
    },
    /// `is_error` is set when the tool reported a failure as its output.
    ToolFinished {
        tool: String,
        output: String,
        #[serde(default)]
        is_error: bool,
    },
    Handoff { from: String, to: String },
    /// Incremental answer text from the model.
    TextDelta { delta: String },
    TurnCompleted { agent: String, reply: String },
    /// The turn failed; `message` already carries the `Error: ` prefix.
    TurnFailed { message: String },
}

impl RunEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::AgentStarted { .. } => "agent_started",
            RunEvent::ToolCalled { .. } => "tool_called",
            RunEvent::ToolFinished { .. } => "tool_finished",
            RunEvent::Handoff { .. } => "handoff",
            RunEvent::TextDelta { .. } => "text_delta",
            RunEvent::TurnCompleted { .. } => "turn_completed",
            RunEvent::TurnFailed { .. } => "turn_failed",
        }
    }

    /// True for the events that end a turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::TurnCompleted { .. } | RunEvent::TurnFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_serde_tag() {
        let events = vec![
            RunEvent::AgentStarted { agent: "a".into() },
            RunEvent::ToolCalled {
                agent: "a".into(),
                tool: "roll_dice".into(),
                arguments: "{}".into(),
            },
            RunEvent::ToolFinished {
                tool: "roll_dice".into(),
                output: "4".into(),
                is_error: false,
            },
            RunEvent::Handoff {
                from: "a".into(),
                to: "b".into(),
            },
            RunEvent::TextDelta { delta: "hi".into() },
            RunEvent::TurnCompleted {
                agent: "b".into(),
                reply: "done".into(),
            },
            RunEvent::TurnFailed {
                message: "Error: boom".into(),
            },
        ];

        for event in &events {
            let value = serde_json::to_value(event).unwrap();
            assert_eq!(value["type"], event.kind());
        }
    }

    #[test]
    fn only_completion_and_failure_are_terminal() {
        assert!(RunEvent::TurnFailed { message: "Error: x".into() }.is_terminal());
        assert!(!RunEvent::TextDelta { delta: "x".into() }.is_terminal());
    }
}
