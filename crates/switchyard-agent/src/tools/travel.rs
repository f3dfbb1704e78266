// ABOUTME: Implements get_flights and suggest_hotels, travel tools that re-call the hosted model.
// ABOUTME: They record destination and mood in the travel context; model failures become "Error: ..." output.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use switchyard_core::SessionContext;

use super::{Tool, ToolResult, optional_str};
use crate::runtime::{CompletionRequest, ModelClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Flights,
    Hotels,
}

impl Lookup {
    fn prompt(&self, destination: &str, mood: &str) -> String {
        let (verb, noun) = match self {
            Lookup::Flights => ("Get flights", "flights"),
            Lookup::Hotels => ("Suggest hotels", "hotels"),
        };
        format!(
            "{verb} for {destination} based on the user's mood: {mood}. \
             Do not hallucinate. If you dont know about any {noun} just create some random {noun}. \
             Format the output clearly as a list of {noun}."
        )
    }
}

fn lookup_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "destination": {
                "type": "string",
                "description": "Where the user wants to go. Defaults to the destination already chosen."
            },
            "mood": {
                "type": "string",
                "description": "The user's mood or interests, e.g. 'relaxed', 'adventurous'."
            }
        },
        "required": []
    })
}

/// Shared body of both travel tools. Arguments override what the context already
/// knows and are written back to it before the nested call.
async fn run_lookup(
    client: &dyn ModelClient,
    lookup: Lookup,
    params: &Value,
    context: &mut SessionContext,
) -> Result<ToolResult, anyhow::Error> {
    let travel = context
        .as_travel_mut()
        .ok_or_else(|| anyhow::anyhow!("no travel plan in progress for this session"))?;

    if let Some(destination) = optional_str(params, "destination") {
        travel.destination = destination.to_string();
    }
    if let Some(mood) = optional_str(params, "mood") {
        travel.mood = mood.to_string();
    }
    if travel.destination.is_empty() {
        anyhow::bail!("no destination chosen yet");
    }

    let mood = if travel.mood.is_empty() {
        "unspecified"
    } else {
        travel.mood.as_str()
    };
    let request = CompletionRequest::prompt(lookup.prompt(&travel.destination, mood));

    match client.complete(&request).await {
        Ok(reply) => Ok(ToolResult::text(reply.content_or_empty())),
        Err(e) => {
            tracing::warn!(lookup = ?lookup, error = %e, "travel lookup failed");
            Ok(ToolResult::error(format!("Error: {}", e)))
        }
    }
}

/// Lists flights for the chosen destination.
#[derive(Clone)]
pub struct GetFlightsTool {
    pub(crate) client: Arc<dyn ModelClient>,
}

impl GetFlightsTool {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetFlightsTool {
    fn name(&self) -> &str {
        "get_flights"
    }

    fn description(&self) -> &str {
        "Get flights for the specified destination."
    }

    fn schema(&self) -> Value {
        lookup_schema()
    }

    async fn execute(
        &self,
        params: Value,
        context: &mut SessionContext,
    ) -> Result<ToolResult, anyhow::Error> {
        run_lookup(self.client.as_ref(), Lookup::Flights, &params, context).await
    }
}

/// Lists hotels for the chosen destination.
#[derive(Clone)]
pub struct SuggestHotelsTool {
    pub(crate) client: Arc<dyn ModelClient>,
}

impl SuggestHotelsTool {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SuggestHotelsTool {
    fn name(&self) -> &str {
        "suggest_hotels"
    }

    fn description(&self) -> &str {
        "Suggest hotels for the specified destination."
    }

    fn schema(&self) -> Value {
        lookup_schema()
    }

    async fn execute(
        &self,
        params: Value,
        context: &mut SessionContext,
    ) -> Result<ToolResult, anyhow::Error> {
        run_lookup(self.client.as_ref(), Lookup::Hotels, &params, context).await
    }
}
