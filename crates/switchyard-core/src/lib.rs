// ABOUTME: Core library for switchyard, containing conversation, agent, and session types.
// ABOUTME: This crate defines the shared data model used by the router and the chat front ends.

pub mod agent;
pub mod app;
pub mod context;
pub mod event;
pub mod message;
pub mod session;

pub use agent::{AgentDefinition, AgentRegistry, RegistryError, handoff_tool_name};
pub use app::{AppKind, UnknownApp};
pub use context::{GameContext, SessionContext, TravelContext};
pub use event::RunEvent;
pub use message::{ChatMessage, ConversationHistory, Role, ToolCall};
pub use session::{PhaseError, Session, SessionPhase};
