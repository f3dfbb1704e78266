// ABOUTME: Implements the add_to_inventory tool, which records loot in the player's game context.
// ABOUTME: Fails when the session has no game context, since there is no inventory to add to.

use async_trait::async_trait;
use serde_json::{Value, json};

use switchyard_core::SessionContext;

use super::{Tool, ToolResult, optional_str, required_str};

#[derive(Debug, Clone, Copy, Default)]
pub struct AddToInventoryTool;

#[async_trait]
impl Tool for AddToInventoryTool {
    fn name(&self) -> &str {
        "add_to_inventory"
    }

    fn description(&self) -> &str {
        "Adds an item to the player's inventory and returns the updated inventory."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "item": {
                    "type": "string",
                    "description": "Short name of the item, e.g. 'Silver Dagger'."
                },
                "description": {
                    "type": "string",
                    "description": "Optional one-line description of the item."
                }
            },
            "required": ["item"]
        })
    }

    async fn execute(
        &self,
        params: Value,
        context: &mut SessionContext,
    ) -> Result<ToolResult, anyhow::Error> {
        let item = required_str(&params, "item")?.trim();
        if item.is_empty() {
            anyhow::bail!("item name must not be empty");
        }

        let game = context
            .as_game_mut()
            .ok_or_else(|| anyhow::anyhow!("no game in progress for this session"))?;
        game.inventory.push(item.to_string());

        let mut text = format!("{} added to {}'s inventory.", item, game.player_name);
        if let Some(description) = optional_str(&params, "description") {
            text.push_str(&format!(" {}", description));
        }
        text.push_str(&format!(" Inventory: {}.", game.inventory.join(", ")));

        Ok(ToolResult::text(text))
    }
}
