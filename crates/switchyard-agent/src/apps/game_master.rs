// ABOUTME: Game Master app: a game master routes player actions to narrator, monster, and item agents.
// ABOUTME: Sessions carry a GameContext whose turn counter advances on every message.

use std::sync::Arc;

use switchyard_core::{AgentDefinition, AgentRegistry, AppKind, GameContext, SessionContext};

use super::AppBlueprint;
use crate::tools::{AddToInventoryTool, GenerateEventTool, RollDiceTool, ToolRegistry};

pub const GAME_MASTER: &str = "GameMasterAgent";
pub const NARRATOR: &str = "NarratorAgent";
pub const MONSTER: &str = "MonsterAgent";
pub const ITEM: &str = "ItemAgent";

pub(super) fn build() -> AppBlueprint {
    let mut tools = ToolRegistry::new();
    tools.register(RollDiceTool);
    tools.register(GenerateEventTool);
    tools.register(AddToInventoryTool);

    let mut registry = AgentRegistry::new();
    registry.define(
        AgentDefinition::new(
            NARRATOR,
            "Continue the fantasy story based on the player's input. Keep it immersive.",
        )
        .with_handoff_description("Continues the story when nothing special happens."),
    );
    registry.define(
        AgentDefinition::new(
            MONSTER,
            "You control monster battles. Use roll_dice tool to simulate attacks. \
             Report outcome and remaining health.",
        )
        .with_tools(["roll_dice"])
        .with_handoff_description("Runs fights when the player meets danger."),
    );
    registry.define(
        AgentDefinition::new(
            ITEM,
            "You manage loot and rewards. Add items to inventory and describe them.",
        )
        .with_tools(["generate_event", "add_to_inventory"])
        .with_handoff_description("Handles loot when the player finds something."),
    );
    registry.define(
        AgentDefinition::new(
            GAME_MASTER,
            "You are the game master of a text-based adventure game. \
             If the player encounters danger, hand off to MonsterAgent. \
             If the player finds something, hand off to ItemAgent. \
             Otherwise, continue the story using NarratorAgent.",
        )
        .with_handoffs([NARRATOR, MONSTER, ITEM]),
    );

    AppBlueprint {
        kind: AppKind::GameMaster,
        registry: Arc::new(registry),
        tools: Arc::new(tools),
        entry_agent: GAME_MASTER.to_string(),
        welcome: "Welcome to the Fantasy Adventure Game! What will you do first?",
        placeholder: " ",
        context: SessionContext::Game(GameContext::new("Hero")),
    }
}
