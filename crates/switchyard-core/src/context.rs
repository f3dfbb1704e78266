// ABOUTME: Per-session mutable domain context (game state, travel preferences) visible to tools.
// ABOUTME: SessionContext is a tagged union so each app carries only the record it needs.

use serde::{Deserialize, Serialize};

/// Starting health for a new player.
pub const DEFAULT_HEALTH: i32 = 100;

/// Tracks the player through a text adventure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    pub player_name: String,
    pub inventory: Vec<String>,
    pub health: i32,
    pub turn: u32,
}

impl GameContext {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            inventory: Vec::new(),
            health: DEFAULT_HEALTH,
            turn: 0,
        }
    }
}

/// What the travel agents have learned about the traveller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelContext {
    pub user_id: String,
    pub mood: String,
    pub destination: String,
}

impl TravelContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionContext {
    #[default]
    None,
    Game(GameContext),
    Travel(TravelContext),
}

impl SessionContext {
    pub fn as_game_mut(&mut self) -> Option<&mut GameContext> {
        match self {
            SessionContext::Game(game) => Some(game),
            _ => None,
        }
    }

    pub fn as_travel_mut(&mut self) -> Option<&mut TravelContext> {
        match self {
            SessionContext::Travel(travel) => Some(travel),
            _ => None,
        }
    }

    /// Called once at the start of every user turn.
    pub fn begin_turn(&mut self) {
        if let SessionContext::Game(game) = self {
            game.turn += 1;
        }
    }

    /// One-line summary appended to agent instructions so the model can see
    /// the current state. None when there is nothing worth saying.
    pub fn describe(&self) -> Option<String> {
        match self {
            SessionContext::None => None,
            SessionContext::Game(game) => {
                let inventory = if game.inventory.is_empty() {
                    "empty".to_string()
                } else {
                    game.inventory.join(", ")
                };
                Some(format!(
                    "Player: {}. Health: {}. Inventory: {}. Turn: {}.",
                    game.player_name, game.health, inventory, game.turn
                ))
            }
            SessionContext::Travel(travel) => {
                if travel.mood.is_empty() && travel.destination.is_empty() {
                    return None;
                }
                let mut parts = Vec::new();
                if !travel.mood.is_empty() {
                    parts.push(format!("Mood: {}.", travel.mood));
                }
                if !travel.destination.is_empty() {
                    parts.push(format!("Destination: {}.", travel.destination));
                }
                Some(parts.join(" "))
            }
        }
    }
}
