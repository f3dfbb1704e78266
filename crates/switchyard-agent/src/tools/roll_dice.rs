// ABOUTME: Implements the roll_dice tool: a fair six-sided die for monster battles.
// ABOUTME: roll_d6 takes any Rng so tests can check the distribution with a seeded generator.

use async_trait::async_trait;
use rand::Rng;
use serde_json::{Value, json};

use switchyard_core::SessionContext;

use super::{Tool, ToolResult};

/// Roll one six-sided die.
pub fn roll_d6<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(1..=6)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RollDiceTool;

#[async_trait]
impl Tool for RollDiceTool {
    fn name(&self) -> &str {
        "roll_dice"
    }

    fn description(&self) -> &str {
        "Rolls a 6-sided dice and returns a number from 1 to 6."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(
        &self,
        _params: Value,
        _context: &mut SessionContext,
    ) -> Result<ToolResult, anyhow::Error> {
        let roll = roll_d6(&mut rand::thread_rng());
        tracing::debug!(roll, "dice rolled");
        Ok(ToolResult::text(roll.to_string()))
    }
}
