// ABOUTME: Agent runtime for switchyard: model clients, tools, the router/dispatcher, and chat sessions.
// ABOUTME: Also ships the three app blueprints (game master, travel designer, career mentor).

pub mod apps;
pub mod providers;
pub mod router;
pub mod runtime;
pub mod session;
pub mod testing;
pub mod tools;

pub use apps::{AppBlueprint, blueprint};
pub use providers::create_model_client;
pub use router::{
    Decision, ModelRouter, RoutingStep, RoutingStrategy, RunConfig, RunResult, Runner,
    classify_reply,
};
pub use runtime::{AgentError, CompletionRequest, ModelClient, ModelReply, ToolSpec};
pub use session::{ChatSession, StreamedAnswer, TurnOutcome};
pub use tools::{Tool, ToolRegistry, ToolResult};
