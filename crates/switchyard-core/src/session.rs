// ABOUTME: Per-connection session state: history, domain context, turn phase, and a small attribute map.
// ABOUTME: Created on connection start and dropped on disconnect; nothing here is persisted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

use crate::app::AppKind;
use crate::context::SessionContext;
use crate::message::ConversationHistory;

#[derive(Debug, Error)]
#[error("invalid session phase transition: {from:?} -> {to:?}")]
pub struct PhaseError {
    pub from: SessionPhase,
    pub to: SessionPhase,
}

/// Where a session is within its turn cycle:
/// `Idle -> AwaitingUserInput -> Routing -> (ToolCall | Handoff)* -> AnswerReady -> AwaitingUserInput`.
/// A failed turn returns straight from any in-turn phase to AwaitingUserInput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    AwaitingUserInput,
    Routing,
    ToolCall,
    Handoff,
    AnswerReady,
}

impl SessionPhase {
    fn in_turn(&self) -> bool {
        matches!(
            self,
            SessionPhase::Routing | SessionPhase::ToolCall | SessionPhase::Handoff
        )
    }

    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        match (self, next) {
            (Idle, AwaitingUserInput) => true,
            (AwaitingUserInput, Routing) => true,
            (from, ToolCall | Handoff | AnswerReady) if from.in_turn() => true,
            (from, Routing) if from.in_turn() => true,
            (AnswerReady, AwaitingUserInput) => true,
            (from, AwaitingUserInput) if from.in_turn() => true,
            _ => false,
        }
    }
}

/// State for one live chat connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Ulid,
    pub app: AppKind,
    pub history: ConversationHistory,
    pub context: SessionContext,
    pub phase: SessionPhase,
    pub created_at: DateTime<Utc>,
    attributes: HashMap<String, serde_json::Value>,
}

impl Session {
    pub fn new(app: AppKind, context: SessionContext) -> Self {
        Self {
            session_id: Ulid::new(),
            app,
            history: ConversationHistory::new(),
            context,
            phase: SessionPhase::Idle,
            created_at: Utc::now(),
            attributes: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
    }

    /// Move to `next`, rejecting transitions the turn cycle does not allow.
    pub fn transition(&mut self, next: SessionPhase) -> Result<(), PhaseError> {
        if !self.phase.can_transition_to(next) {
            return Err(PhaseError {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{GameContext, SessionContext};
    use serde_json::json;

    #[test]
    fn new_session_is_idle_and_empty() {
        let session = Session::new(AppKind::GameMaster, SessionContext::Game(GameContext::new("Hero")));
        assert_eq!(session.phase, SessionPhase::Idle);
        assert!(session.history.is_empty());
    }

    #[test]
    fn attributes_get_and_set() {
        let mut session = Session::new(AppKind::CareerMentor, SessionContext::None);
        assert!(session.get("agent").is_none());

        session.set("agent", json!("Career Agent"));
        session.set("agent", json!("Skill Agent"));
        assert_eq!(session.get("agent"), Some(&json!("Skill Agent")));
    }

    #[test]
    fn full_turn_cycle_is_valid() {
        let mut session = Session::new(AppKind::TravelDesigner, SessionContext::None);
        for phase in [
            SessionPhase::AwaitingUserInput,
            SessionPhase::Routing,
            SessionPhase::Handoff,
            SessionPhase::ToolCall,
            SessionPhase::ToolCall,
            SessionPhase::AnswerReady,
            SessionPhase::AwaitingUserInput,
        ] {
            session.transition(phase).unwrap();
        }
        assert_eq!(session.phase, SessionPhase::AwaitingUserInput);
    }

    #[test]
    fn failed_turn_returns_to_awaiting_input() {
        let mut session = Session::new(AppKind::GameMaster, SessionContext::None);
        session.transition(SessionPhase::AwaitingUserInput).unwrap();
        session.transition(SessionPhase::Routing).unwrap();
        session.transition(SessionPhase::ToolCall).unwrap();
        session.transition(SessionPhase::AwaitingUserInput).unwrap();
    }

    #[test]
    fn rejects_skipping_routing() {
        let mut session = Session::new(AppKind::GameMaster, SessionContext::None);
        let err = session.transition(SessionPhase::AnswerReady).unwrap_err();
        assert_eq!(err.from, SessionPhase::Idle);
        assert_eq!(session.phase, SessionPhase::Idle);

        session.transition(SessionPhase::AwaitingUserInput).unwrap();
        assert!(session.transition(SessionPhase::ToolCall).is_err());
    }
}
