// ABOUTME: Travel Designer app: a travel agent routes to destination, booking, and explore agents.
// ABOUTME: Booking tools re-call the hosted model, so this blueprint needs the shared model client.

use std::sync::Arc;

use switchyard_core::{AgentDefinition, AgentRegistry, AppKind, SessionContext, TravelContext};

use super::AppBlueprint;
use crate::runtime::ModelClient;
use crate::tools::{GetFlightsTool, SuggestHotelsTool, ToolRegistry};

pub const TRAVEL: &str = "TravelAgent";
pub const DESTINATION: &str = "DestinationAgent";
pub const BOOKING: &str = "BookingAgent";
pub const EXPLORE: &str = "ExploreAgent";

pub(super) fn build(client: Arc<dyn ModelClient>) -> AppBlueprint {
    let mut tools = ToolRegistry::new();
    tools.register(GetFlightsTool::new(Arc::clone(&client)));
    tools.register(SuggestHotelsTool::new(client));

    let mut registry = AgentRegistry::new();
    registry.define(AgentDefinition::new(
        DESTINATION,
        "Ask the user about their mood or interests and suggest a matching travel destination. \
         Always store the destination in context.",
    ));
    registry.define(
        AgentDefinition::new(
            BOOKING,
            "Use get_flights and suggest_hotels tools to simulate booking a trip for the \
             selected destination. Show flights and hotels.",
        )
        .with_tools(["get_flights", "suggest_hotels"]),
    );
    registry.define(AgentDefinition::new(
        EXPLORE,
        "Recommend top attractions, foods, and experiences for the destination in context.",
    ));
    registry.define(
        AgentDefinition::new(
            TRAVEL,
            "You are a helpful travel assistant. Use DestinationAgent to suggest destinations \
             based on mood, BookingAgent to book flights and hotels, and ExploreAgent to \
             suggest attractions and food.",
        )
        .with_handoffs([DESTINATION, BOOKING, EXPLORE]),
    );

    AppBlueprint {
        kind: AppKind::TravelDesigner,
        registry: Arc::new(registry),
        tools: Arc::new(tools),
        entry_agent: TRAVEL.to_string(),
        welcome: "Welcome to the AI Travel Designer! Where would you like to go today?",
        placeholder: "Planning your travel experience...",
        context: SessionContext::Travel(TravelContext::new("Ahmed")),
    }
}
