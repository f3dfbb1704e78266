// ABOUTME: AgentDefinition and AgentRegistry: named roles with instructions, tools, and handoff targets.
// ABOUTME: Definitions are immutable once registered and shared read-only across sessions via Arc.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from registry lookups.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
}

/// A named agent: its instructions, the tools it may call, and the agents
/// it may hand off to. Tools and handoffs are referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub instructions: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub handoffs: Vec<String>,
    /// Shown to other agents when this agent is offered as a handoff target.
    #[serde(default)]
    pub handoff_description: Option<String>,
    /// Per-agent model override; the client's default model is used otherwise.
    #[serde(default)]
    pub model: Option<String>,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            tools: Vec::new(),
            handoffs: Vec::new(),
            handoff_description: None,
            model: None,
        }
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools.extend(tools.into_iter().map(Into::into));
        self
    }

    pub fn with_handoffs<I, S>(mut self, handoffs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handoffs.extend(handoffs.into_iter().map(Into::into));
        self
    }

    pub fn with_handoff_description(mut self, description: impl Into<String>) -> Self {
        self.handoff_description = Some(description.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn allows_tool(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }

    pub fn allows_handoff(&self, agent: &str) -> bool {
        self.handoffs.iter().any(|h| h == agent)
    }

    /// Name of the pseudo-tool other agents call to hand off to this agent.
    pub fn handoff_tool_name(&self) -> String {
        handoff_tool_name(&self.name)
    }

    /// Description attached to this agent's handoff pseudo-tool.
    pub fn handoff_tool_description(&self) -> String {
        let mut desc = format!(
            "Handoff to the {} agent to handle the request.",
            self.name
        );
        if let Some(extra) = &self.handoff_description {
            desc.push(' ');
            desc.push_str(extra);
        }
        desc
    }
}

/// `transfer_to_<name>`, with the agent name lowercased and every
/// non-alphanumeric character replaced by `_`.
pub fn handoff_tool_name(agent_name: &str) -> String {
    let slug: String = agent_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("transfer_to_{}", slug)
}

/// Mapping from agent name to definition.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<AgentDefinition>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. A second definition with the same name
    /// replaces the first.
    pub fn define(&mut self, definition: AgentDefinition) -> Arc<AgentDefinition> {
        let definition = Arc::new(definition);
        if self
            .agents
            .insert(definition.name.clone(), Arc::clone(&definition))
            .is_some()
        {
            tracing::warn!(agent = %definition.name, "agent redefined, previous definition replaced");
        }
        definition
    }

    pub fn get(&self, name: &str) -> Option<Arc<AgentDefinition>> {
        self.agents.get(name).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<AgentDefinition>, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::UnknownAgent(name.to_string()))
    }

    /// Resolve a handoff pseudo-tool name called by `agent` to the target
    /// definition. Returns None if the name does not belong to any of the
    /// agent's declared handoff targets.
    pub fn handoff_target(&self, agent: &AgentDefinition, tool_name: &str) -> Option<Arc<AgentDefinition>> {
        agent
            .handoffs
            .iter()
            .find(|target| handoff_tool_name(target) == tool_name)
            .and_then(|target| self.get(target))
    }

    /// Any registered agent whose handoff pseudo-tool is `tool_name`,
    /// whether or not the caller declared it.
    pub fn find_by_handoff_tool(&self, tool_name: &str) -> Option<Arc<AgentDefinition>> {
        self.agents
            .values()
            .find(|agent| agent.handoff_tool_name() == tool_name)
            .cloned()
    }

    /// Sorted agent names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
