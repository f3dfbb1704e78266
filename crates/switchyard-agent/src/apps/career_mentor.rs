// ABOUTME: Career Mentor app: a career agent with a roadmap tool and handoffs to skill and job agents.
// ABOUTME: The roadmap is itself an agent, exposed as a tool rather than registered for handoff.

use std::sync::Arc;

use switchyard_core::{AgentDefinition, AgentRegistry, AppKind, SessionContext};

use super::AppBlueprint;
use crate::runtime::ModelClient;
use crate::tools::{AgentTool, ToolRegistry};

pub const CAREER: &str = "Career Agent";
pub const SKILL: &str = "Skill Agent";
pub const JOB: &str = "Job Agent";
pub const ROADMAP_TOOL: &str = "get_career_roadmap";

pub(super) fn build(client: Arc<dyn ModelClient>) -> AppBlueprint {
    // Shares the top agent's name but only ever runs nested inside the tool.
    let roadmap_agent = Arc::new(AgentDefinition::new(
        CAREER,
        "You will tell about skills needed for a career in a given field. \
         Answer by just telling the name of the skills needed.",
    ));

    let mut tools = ToolRegistry::new();
    tools.register(AgentTool::new(
        ROADMAP_TOOL,
        "Give relevant skill set for the required field",
        roadmap_agent,
        client,
    ));

    let mut registry = AgentRegistry::new();
    registry.define(AgentDefinition::new(
        SKILL,
        "You will help people learn about the given skills.",
    ));
    registry.define(AgentDefinition::new(
        JOB,
        "You tell people about the job roles according to their relevant skills.",
    ));
    registry.define(
        AgentDefinition::new(
            CAREER,
            "You will guide students through career. \
             If they ask about learning a skill, handoff to skill agent. \
             If they ask about jobs, handoff to job agent.",
        )
        .with_tools([ROADMAP_TOOL])
        .with_handoffs([SKILL, JOB]),
    );

    AppBlueprint {
        kind: AppKind::CareerMentor,
        registry: Arc::new(registry),
        tools: Arc::new(tools),
        entry_agent: CAREER.to_string(),
        welcome: "Welcome to the Career Assistant! How can I help you today?",
        placeholder: "Thinking...",
        context: SessionContext::None,
    }
}
