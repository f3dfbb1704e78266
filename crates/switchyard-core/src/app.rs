// ABOUTME: Identifies which chat app a session runs (game master, travel designer, career mentor).
// ABOUTME: Parsing accepts both kebab-case and snake_case so CLI flags and JSON bodies agree.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown app: {0} (expected one of: game-master, travel-designer, career-mentor)")]
pub struct UnknownApp(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppKind {
    GameMaster,
    TravelDesigner,
    CareerMentor,
}

impl AppKind {
    pub const ALL: [AppKind; 3] = [
        AppKind::GameMaster,
        AppKind::TravelDesigner,
        AppKind::CareerMentor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AppKind::GameMaster => "game_master",
            AppKind::TravelDesigner => "travel_designer",
            AppKind::CareerMentor => "career_mentor",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AppKind::GameMaster => "Fantasy Adventure Game",
            AppKind::TravelDesigner => "AI Travel Designer",
            AppKind::CareerMentor => "Career Assistant",
        }
    }
}

impl std::fmt::Display for AppKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AppKind {
    type Err = UnknownApp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "game_master" | "game" => Ok(AppKind::GameMaster),
            "travel_designer" | "travel" => Ok(AppKind::TravelDesigner),
            "career_mentor" | "career" => Ok(AppKind::CareerMentor),
            _ => Err(UnknownApp(s.to_string())),
        }
    }
}
