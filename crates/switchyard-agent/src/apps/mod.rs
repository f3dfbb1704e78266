// ABOUTME: App blueprints: the agent registry, tool registry, entry agent, and greeting for each chat app.
// ABOUTME: Blueprints are built once at startup and shared read-only by every session of that app.

mod career_mentor;
mod game_master;
mod travel_designer;

use std::sync::Arc;

use switchyard_core::{AgentRegistry, AppKind, SessionContext};

use crate::router::{ModelRouter, RunConfig, Runner};
use crate::runtime::ModelClient;
use crate::tools::ToolRegistry;

/// Everything needed to start sessions of one app.
pub struct AppBlueprint {
    pub kind: AppKind,
    pub registry: Arc<AgentRegistry>,
    pub tools: Arc<ToolRegistry>,
    /// Agent that receives every user message first.
    pub entry_agent: String,
    /// Sent to the user when a session starts.
    pub welcome: &'static str,
    /// Shown while a reply is being produced.
    pub placeholder: &'static str,
    context: SessionContext,
}

impl AppBlueprint {
    /// A fresh copy of the context every new session starts with.
    pub fn initial_context(&self) -> SessionContext {
        self.context.clone()
    }

    /// A runner that routes through the hosted model.
    pub fn runner(&self, client: Arc<dyn ModelClient>, config: RunConfig) -> Runner {
        let strategy = ModelRouter::new(client, Arc::clone(&self.registry), Arc::clone(&self.tools));
        Runner::new(
            Arc::new(strategy),
            Arc::clone(&self.registry),
            Arc::clone(&self.tools),
            config,
        )
    }
}

/// Build the blueprint for `kind`. Tools that call the model themselves get `client`.
pub fn blueprint(kind: AppKind, client: Arc<dyn ModelClient>) -> AppBlueprint {
    let blueprint = match kind {
        AppKind::GameMaster => game_master::build(),
        AppKind::TravelDesigner => travel_designer::build(client),
        AppKind::CareerMentor => career_mentor::build(client),
    };
    tracing::debug!(
        app = %kind,
        agents = blueprint.registry.len(),
        tools = blueprint.tools.count(),
        "app blueprint built"
    );
    blueprint
}
