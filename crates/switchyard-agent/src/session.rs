// ABOUTME: ChatSession ties one Session to its app's runner and implements the per-message turn.
// ABOUTME: A turn appends the user message, runs the router, and appends the answer or reports "Error: ...".

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use ulid::Ulid;

use switchyard_core::{
    AppKind, ChatMessage, ConversationHistory, RunEvent, Session, SessionContext, SessionPhase,
};

use crate::apps::AppBlueprint;
use crate::router::Runner;
use crate::runtime::AgentError;

/// What the user sees at the end of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    Answered { reply: String, agent: String },
    /// `message` is the literal `Error: <cause>` text shown to the user.
    Failed { message: String },
}

impl TurnOutcome {
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Answered { reply, .. } => reply,
            TurnOutcome::Failed { message } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TurnOutcome::Answered { .. })
    }

    pub fn agent(&self) -> Option<&str> {
        match self {
            TurnOutcome::Answered { agent, .. } => Some(agent),
            TurnOutcome::Failed { .. } => None,
        }
    }
}

/// Folds a turn's streamed events into the answer a chat front end shows.
///
/// Text streamed by a step that ended in tool calls or a handoff is not part of
/// the answer; it is dropped when that step's `tool_called` or `handoff` event
/// arrives. Once the turn is over, `unshown` gives whatever the user has not
/// seen yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamedAnswer {
    text: String,
}

impl StreamedAnswer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. Returns true when previously streamed text was dropped.
    pub fn apply(&mut self, event: &RunEvent) -> bool {
        match event {
            RunEvent::TextDelta { delta } => {
                self.text.push_str(delta);
                false
            }
            RunEvent::ToolCalled { .. } | RunEvent::Handoff { .. } => {
                let dropped = !self.text.is_empty();
                self.text.clear();
                dropped
            }
            _ => false,
        }
    }

    /// Answer text streamed so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// What still has to be shown after the turn: the error of a failed turn,
    /// or the reply when it did not arrive in full as streamed text.
    pub fn unshown<'a>(&self, outcome: &'a TurnOutcome) -> Option<&'a str> {
        match outcome {
            TurnOutcome::Failed { message } => Some(message.as_str()),
            TurnOutcome::Answered { reply, .. } if *reply != self.text => Some(reply.as_str()),
            TurnOutcome::Answered { .. } => None,
        }
    }
}

/// One live conversation with an app.
pub struct ChatSession {
    session: Session,
    runner: Arc<Runner>,
    entry_agent: String,
}

impl ChatSession {
    /// Start a session for `blueprint`, ready for the first user message.
    pub fn start(blueprint: &AppBlueprint, runner: Arc<Runner>) -> Self {
        let mut session = Session::new(blueprint.kind, blueprint.initial_context());
        session.phase = SessionPhase::AwaitingUserInput;
        tracing::info!(session_id = %session.session_id, app = %blueprint.kind, "session started");
        Self {
            session,
            runner,
            entry_agent: blueprint.entry_agent.clone(),
        }
    }

    pub fn id(&self) -> Ulid {
        self.session.session_id
    }

    pub fn app(&self) -> AppKind {
        self.session.app
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.session.history
    }

    pub fn context(&self) -> &SessionContext {
        &self.session.context
    }

    /// Handle one user message. Never fails: errors are logged and returned as
    /// `Failed`, with only the user message added to history.
    pub async fn handle_message(
        &mut self,
        content: &str,
        events: Option<&mpsc::UnboundedSender<RunEvent>>,
    ) -> TurnOutcome {
        let session_id = self.session.session_id;

        self.session.context.begin_turn();
        self.session.history.push(ChatMessage::user(content));

        let result = match self.session.transition(SessionPhase::Routing) {
            Ok(()) => {
                self.runner
                    .run_session(&self.entry_agent, &mut self.session, events)
                    .await
            }
            Err(e) => Err(AgentError::InvalidResponse(e.to_string())),
        };

        let outcome = match result {
            Ok(result) => {
                tracing::info!(
                    %session_id,
                    agent = %result.last_agent,
                    turns = result.turns_used,
                    "turn answered"
                );
                self.session
                    .history
                    .push(ChatMessage::assistant(result.final_output.clone()));
                TurnOutcome::Answered {
                    reply: result.final_output,
                    agent: result.last_agent,
                }
            }
            Err(e) => {
                tracing::error!(%session_id, error = %e, "turn failed");
                TurnOutcome::Failed {
                    message: format!("Error: {}", e),
                }
            }
        };

        self.session.phase = SessionPhase::AwaitingUserInput;

        if let Some(tx) = events {
            let event = match &outcome {
                TurnOutcome::Answered { reply, agent } => RunEvent::TurnCompleted {
                    agent: agent.clone(),
                    reply: reply.clone(),
                },
                TurnOutcome::Failed { message } => RunEvent::TurnFailed {
                    message: message.clone(),
                },
            };
            let _ = tx.send(event);
        }

        outcome
    }
}
