// ABOUTME: Router/dispatcher: picks the next step for the active agent and drives the run loop.
// ABOUTME: RoutingStrategy is the pluggable decision point; Runner executes tools and handoffs until an answer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use switchyard_core::{
    AgentDefinition, AgentRegistry, ChatMessage, ConversationHistory, RunEvent, Session,
    SessionContext, SessionPhase, ToolCall,
};

use crate::runtime::{AgentError, CompletionRequest, ModelClient, ModelReply, ToolSpec};
use crate::tools::ToolRegistry;

/// Default bound on routing steps per user turn.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Default number of stored history messages sent to the model.
pub const DEFAULT_HISTORY_WINDOW: usize = 50;

/// What the active agent does next.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// A terminal text answer.
    Answer(String),
    /// Run these tools, then ask the same agent again. `text` is whatever the
    /// model said alongside the calls.
    CallTools { text: String, calls: Vec<ToolCall> },
    /// Switch control to `target`. `call` is the pseudo-tool call that requested it.
    Handoff {
        target: String,
        call: ToolCall,
        text: String,
    },
}

impl Decision {
    /// Tool calls with no accompanying text.
    pub fn call_tools(calls: Vec<ToolCall>) -> Self {
        Decision::CallTools {
            text: String::new(),
            calls,
        }
    }

    /// A handoff with no accompanying text.
    pub fn handoff(target: impl Into<String>, call: ToolCall) -> Self {
        Decision::Handoff {
            target: target.into(),
            call,
            text: String::new(),
        }
    }
}

/// Everything a strategy may look at when deciding.
pub struct RoutingStep<'a> {
    pub agent: &'a AgentDefinition,
    /// Stored history, already cut to the configured window.
    pub history: &'a [ChatMessage],
    /// Tool-call and tool-result items produced earlier in this run.
    pub items: &'a [ChatMessage],
    pub context: &'a SessionContext,
    /// 1-based step number within the run.
    pub turn: usize,
}

#[async_trait]
pub trait RoutingStrategy: Send + Sync {
    /// Decide the next step. When `on_delta` is set, answer text is reported as it arrives.
    async fn decide(
        &self,
        step: &RoutingStep<'_>,
        on_delta: Option<&(dyn for<'s> Fn(&'s str) + Send + Sync)>,
    ) -> Result<Decision, AgentError>;
}

/// Classify a model reply for `agent`. No tool calls is an answer. A call to any
/// agent's handoff pseudo-tool is a handoff; the first one wins and the rest of
/// that reply's calls are dropped. Anything else is a batch of tool calls.
pub fn classify_reply(
    reply: ModelReply,
    agent: &AgentDefinition,
    registry: &AgentRegistry,
) -> Decision {
    if reply.tool_calls.is_empty() {
        return Decision::Answer(reply.content.unwrap_or_default());
    }

    let handoff = reply.tool_calls.iter().enumerate().find_map(|(index, call)| {
        registry
            .handoff_target(agent, &call.name)
            .or_else(|| registry.find_by_handoff_tool(&call.name))
            .map(|target| (index, target.name.clone()))
    });

    let text = reply.content.unwrap_or_default();
    match handoff {
        Some((index, target)) => {
            let total = reply.tool_calls.len();
            let call = reply.tool_calls[index].clone();
            if total > 1 {
                tracing::warn!(
                    agent = %agent.name,
                    handoff = %call.name,
                    dropped = total - 1,
                    "handoff requested alongside other tool calls; dropping the others"
                );
            }
            Decision::Handoff { target, call, text }
        }
        None => Decision::CallTools {
            text,
            calls: reply.tool_calls,
        },
    }
}

/// Production strategy: ask the hosted model, advertising the agent's tools and
/// handoff pseudo-tools, then classify what comes back.
pub struct ModelRouter {
    client: Arc<dyn ModelClient>,
    registry: Arc<AgentRegistry>,
    tools: Arc<ToolRegistry>,
}

impl ModelRouter {
    pub fn new(
        client: Arc<dyn ModelClient>,
        registry: Arc<AgentRegistry>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            client,
            registry,
            tools,
        }
    }

    /// The completion request for one routing step.
    pub fn build_request(&self, step: &RoutingStep<'_>) -> CompletionRequest {
        let mut system = step.agent.instructions.clone();
        if let Some(note) = step.context.describe() {
            system.push_str("\n\nCurrent context: ");
            system.push_str(&note);
        }

        let mut messages = Vec::with_capacity(1 + step.history.len() + step.items.len());
        messages.push(ChatMessage::system(system));
        messages.extend(step.history.iter().cloned());
        messages.extend(step.items.iter().cloned());

        let mut tools = self.tools.specs_for(&step.agent.tools);
        for target in &step.agent.handoffs {
            match self.registry.get(target) {
                Some(definition) => tools.push(ToolSpec {
                    name: definition.handoff_tool_name(),
                    description: definition.handoff_tool_description(),
                    parameters: json!({"type": "object", "properties": {}, "required": []}),
                }),
                None => tracing::warn!(
                    agent = %step.agent.name,
                    target = %target,
                    "handoff target is not registered; not advertising it"
                ),
            }
        }

        let mut request = CompletionRequest::new(messages);
        request.tools = tools;
        request.model = step.agent.model.clone();
        request
    }
}

#[async_trait]
impl RoutingStrategy for ModelRouter {
    async fn decide(
        &self,
        step: &RoutingStep<'_>,
        on_delta: Option<&(dyn for<'s> Fn(&'s str) + Send + Sync)>,
    ) -> Result<Decision, AgentError> {
        let request = self.build_request(step);
        let reply = match on_delta {
            Some(sink) => self.client.complete_streaming(&request, sink).await?,
            None => self.client.complete(&request).await?,
        };
        Ok(classify_reply(reply, step.agent, &self.registry))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub max_turns: usize,
    /// None sends the whole history.
    pub history_window: Option<usize>,
}

impl RunConfig {
    /// Build from raw settings, where a window of 0 means unbounded.
    pub fn new(max_turns: usize, history_window: usize) -> Self {
        Self {
            max_turns,
            history_window: (history_window > 0).then_some(history_window),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS, DEFAULT_HISTORY_WINDOW)
    }
}

/// Outcome of one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub final_output: String,
    pub last_agent: String,
    /// Tool-call and tool-result items produced during the run. Not stored in history.
    pub new_items: Vec<ChatMessage>,
    pub turns_used: usize,
}

pub struct Runner {
    strategy: Arc<dyn RoutingStrategy>,
    registry: Arc<AgentRegistry>,
    tools: Arc<ToolRegistry>,
    config: RunConfig,
}

fn emit(events: Option<&mpsc::UnboundedSender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = events {
        // A closed receiver just means nobody is watching any more.
        let _ = tx.send(event);
    }
}

impl Runner {
    pub fn new(
        strategy: Arc<dyn RoutingStrategy>,
        registry: Arc<AgentRegistry>,
        tools: Arc<ToolRegistry>,
        config: RunConfig,
    ) -> Self {
        Self {
            strategy,
            registry,
            tools,
            config,
        }
    }

    pub fn config(&self) -> RunConfig {
        self.config
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Run from `start` until some agent answers. `history` is read, never modified.
    pub async fn run(
        &self,
        start: &str,
        history: &ConversationHistory,
        context: &mut SessionContext,
        events: Option<&mpsc::UnboundedSender<RunEvent>>,
    ) -> Result<RunResult, AgentError> {
        self.run_inner(start, history, context, events, &mut |_: SessionPhase| {})
            .await
    }

    /// Like `run`, but also walks `session.phase` through the turn cycle.
    /// The caller moves the session into Routing first.
    pub async fn run_session(
        &self,
        start: &str,
        session: &mut Session,
        events: Option<&mpsc::UnboundedSender<RunEvent>>,
    ) -> Result<RunResult, AgentError> {
        let Session {
            session_id,
            history,
            context,
            phase,
            ..
        } = session;
        let session_id = *session_id;
        let mut on_phase = |next: SessionPhase| {
            let current = *phase;
            if current.can_transition_to(next) {
                *phase = next;
            } else {
                tracing::warn!(%session_id, from = ?current, to = ?next, "skipping invalid phase transition");
            }
        };
        self.run_inner(start, history, context, events, &mut on_phase)
            .await
    }

    async fn run_inner(
        &self,
        start: &str,
        history: &ConversationHistory,
        context: &mut SessionContext,
        events: Option<&mpsc::UnboundedSender<RunEvent>>,
        on_phase: &mut (dyn FnMut(SessionPhase) + Send),
    ) -> Result<RunResult, AgentError> {
        let mut agent = self.registry.require(start)?;
        emit(events, RunEvent::AgentStarted {
            agent: agent.name.clone(),
        });

        let window = history.window(self.config.history_window);
        let delta_sink = |delta: &str| {
            emit(events, RunEvent::TextDelta {
                delta: delta.to_string(),
            })
        };
        let on_delta: Option<&(dyn for<'s> Fn(&'s str) + Send + Sync)> = match events {
            Some(_) => Some(&delta_sink),
            None => None,
        };

        let mut items: Vec<ChatMessage> = Vec::new();
        let mut turns = 0;

        loop {
            if turns >= self.config.max_turns {
                tracing::warn!(agent = %agent.name, max_turns = self.config.max_turns, "run exceeded max turns");
                return Err(AgentError::MaxTurnsExceeded(self.config.max_turns));
            }
            turns += 1;

            let step = RoutingStep {
                agent: &agent,
                history: window,
                items: &items,
                context: &*context,
                turn: turns,
            };
            let decision = self.strategy.decide(&step, on_delta).await?;

            match decision {
                Decision::Answer(text) => {
                    on_phase(SessionPhase::AnswerReady);
                    tracing::debug!(agent = %agent.name, turns, "agent answered");
                    return Ok(RunResult {
                        final_output: text,
                        last_agent: agent.name.clone(),
                        new_items: items,
                        turns_used: turns,
                    });
                }
                Decision::CallTools { text, calls } => {
                    if let Some(call) = calls.iter().find(|c| !agent.allows_tool(&c.name)) {
                        return Err(AgentError::ToolNotAllowed {
                            agent: agent.name.clone(),
                            tool: call.name.clone(),
                        });
                    }

                    on_phase(SessionPhase::ToolCall);
                    items.push(ChatMessage::assistant_tool_calls(text, calls.clone()));
                    for call in calls {
                        tracing::debug!(agent = %agent.name, tool = %call.name, "calling tool");
                        emit(events, RunEvent::ToolCalled {
                            agent: agent.name.clone(),
                            tool: call.name.clone(),
                            arguments: call.arguments.clone(),
                        });

                        let result = self
                            .tools
                            .invoke(&call.name, &call.arguments, context)
                            .await?;

                        emit(events, RunEvent::ToolFinished {
                            tool: call.name.clone(),
                            output: result.content.clone(),
                            is_error: result.is_error,
                        });
                        items.push(ChatMessage::tool_result(call.id, result.content));
                    }
                    on_phase(SessionPhase::Routing);
                }
                Decision::Handoff { target, call, text } => {
                    if !agent.allows_handoff(&target) {
                        return Err(AgentError::HandoffNotAllowed {
                            from: agent.name.clone(),
                            to: target,
                        });
                    }
                    let next = self.registry.require(&target)?;

                    on_phase(SessionPhase::Handoff);
                    tracing::info!(from = %agent.name, to = %next.name, "handoff");
                    items.push(ChatMessage::assistant_tool_calls(text, vec![call.clone()]));
                    items.push(ChatMessage::tool_result(
                        call.id,
                        json!({"assistant": next.name}).to_string(),
                    ));
                    emit(events, RunEvent::Handoff {
                        from: agent.name.clone(),
                        to: next.name.clone(),
                    });
                    emit(events, RunEvent::AgentStarted {
                        agent: next.name.clone(),
                    });

                    agent = next;
                    on_phase(SessionPhase::Routing);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedModelClient, ScriptedRouter};
    use crate::tools::{GenerateEventTool, RollDiceTool};
    use switchyard_core::{AppKind, GameContext, Role};

    fn registry() -> Arc<AgentRegistry> {
        let mut registry = AgentRegistry::new();
        registry.define(AgentDefinition::new("NarratorAgent", "Tell the story."));
        registry.define(
            AgentDefinition::new("MonsterAgent", "Run battles.").with_tools(["roll_dice"]),
        );
        registry.define(
            AgentDefinition::new("GameMasterAgent", "Route the player.")
                .with_handoffs(["NarratorAgent", "MonsterAgent"]),
        );
        Arc::new(registry)
    }

    fn tools() -> Arc<ToolRegistry> {
        let mut tools = ToolRegistry::new();
        tools.register(RollDiceTool);
        tools.register(GenerateEventTool);
        Arc::new(tools)
    }

    fn runner(decisions: Vec<Result<Decision, AgentError>>, config: RunConfig) -> Runner {
        Runner::new(
            Arc::new(ScriptedRouter::new(decisions)),
            registry(),
            tools(),
            config,
        )
    }

    fn history_with(message: &str) -> ConversationHistory {
        let mut history = ConversationHistory::new();
        history.push(ChatMessage::user(message));
        history
    }

    #[test]
    fn classify_plain_text_is_answer() {
        let registry = registry();
        let gm = registry.get("GameMasterAgent").unwrap();
        assert_eq!(
            classify_reply(ModelReply::text("Onward."), &gm, &registry),
            Decision::Answer("Onward.".to_string())
        );
    }

    #[test]
    fn classify_first_handoff_wins() {
        let registry = registry();
        let gm = registry.get("GameMasterAgent").unwrap();
        let reply = ModelReply::tool_calls(vec![
            ToolCall::new("c1", "roll_dice", "{}"),
            ToolCall::new("c2", "transfer_to_monsteragent", "{}"),
            ToolCall::new("c3", "transfer_to_narratoragent", "{}"),
        ]);

        match classify_reply(reply, &gm, &registry) {
            Decision::Handoff { target, call, .. } => {
                assert_eq!(target, "MonsterAgent");
                assert_eq!(call.id, "c2");
            }
            other => panic!("expected handoff, got {:?}", other),
        }
    }

    #[test]
    fn classify_tool_calls() {
        let registry = registry();
        let monster = registry.get("MonsterAgent").unwrap();
        let reply = ModelReply::tool_calls(vec![ToolCall::new("c1", "roll_dice", "{}")]);
        assert!(matches!(
            classify_reply(reply, &monster, &registry),
            Decision::CallTools { calls, .. } if calls.len() == 1
        ));
    }

    #[tokio::test]
    async fn text_sent_with_a_handoff_is_kept_in_run_items() {
        let mut reply = ModelReply::tool_calls(vec![ToolCall::new(
            "h1",
            "transfer_to_monsteragent",
            "{}",
        )]);
        reply.content = Some("Let me fetch the monster.".to_string());
        let client = Arc::new(ScriptedModelClient::new(vec![
            Ok(reply),
            Ok(ModelReply::text("Roar.")),
        ]));
        let strategy = Arc::new(ModelRouter::new(client.clone(), registry(), tools()));
        let runner = Runner::new(strategy, registry(), tools(), RunConfig::default());
        let mut context = SessionContext::None;

        let result = runner
            .run("GameMasterAgent", &history_with("danger"), &mut context, None)
            .await
            .unwrap();

        assert_eq!(result.final_output, "Roar.");
        assert_eq!(result.new_items[0].role, Role::Assistant);
        assert_eq!(result.new_items[0].content, "Let me fetch the monster.");
        assert_eq!(result.new_items[0].tool_calls[0].id, "h1");

        // The monster agent sees what the game master said before handing off.
        let second = &client.requests()[1].messages;
        assert!(second.iter().any(|m| m.content == "Let me fetch the monster."));
    }

    #[test]
    fn request_advertises_tools_handoffs_and_context() {
        let registry = registry();
        let client = Arc::new(ScriptedModelClient::new(vec![]));
        let router = ModelRouter::new(client, registry.clone(), tools());
        let gm = registry.get("GameMasterAgent").unwrap();
        let history = history_with("I walk into the cave");
        let context = SessionContext::Game(GameContext::new("Hero"));

        let step = RoutingStep {
            agent: &gm,
            history: history.messages(),
            items: &[],
            context: &context,
            turn: 1,
        };
        let request = router.build_request(&step);

        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.starts_with("Route the player."));
        assert!(request.messages[0].content.contains("Player: Hero."));
        assert_eq!(request.messages[1].content, "I walk into the cave");

        let names: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["transfer_to_narratoragent", "transfer_to_monsteragent"]
        );
    }

    #[tokio::test]
    async fn runs_tools_then_answers() {
        let runner = runner(
            vec![
                Ok(Decision::handoff(
                    "MonsterAgent",
                    ToolCall::new("h1", "transfer_to_monsteragent", "{}"),
                )),
                Ok(Decision::call_tools(vec![ToolCall::new("t1", "roll_dice", "")])),
                Ok(Decision::Answer("The goblin takes 4 damage.".to_string())),
            ],
            RunConfig::default(),
        );
        let history = history_with("A goblin attacks!");
        let mut context = SessionContext::Game(GameContext::new("Hero"));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = runner
            .run("GameMasterAgent", &history, &mut context, Some(&tx))
            .await
            .unwrap();

        assert_eq!(result.final_output, "The goblin takes 4 damage.");
        assert_eq!(result.last_agent, "MonsterAgent");
        assert_eq!(result.turns_used, 3);
        // handoff call + result, tool call + result
        assert_eq!(result.new_items.len(), 4);
        assert_eq!(result.new_items[3].role, Role::Tool);
        assert_eq!(history.len(), 1);

        drop(tx);
        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            kinds.push(event.kind());
        }
        assert_eq!(
            kinds,
            vec![
                "agent_started",
                "handoff",
                "agent_started",
                "tool_called",
                "tool_finished"
            ]
        );
    }

    #[tokio::test]
    async fn tool_error_output_is_flagged_in_events() {
        let mut registry = AgentRegistry::new();
        registry.define(
            AgentDefinition::new("BookingAgent", "Book trips.").with_tools(["get_flights"]),
        );
        let mut tools = ToolRegistry::new();
        tools.register(crate::tools::GetFlightsTool::new(Arc::new(
            ScriptedModelClient::new(vec![Err(AgentError::RateLimited)]),
        )));
        let runner = Runner::new(
            Arc::new(ScriptedRouter::new(vec![
                Ok(Decision::call_tools(vec![ToolCall::new(
                    "t1",
                    "get_flights",
                    r#"{"destination": "Oslo"}"#,
                )])),
                Ok(Decision::Answer("No flights today.".to_string())),
            ])),
            Arc::new(registry),
            Arc::new(tools),
            RunConfig::default(),
        );
        let mut context = SessionContext::Travel(switchyard_core::TravelContext::new("Ahmed"));
        let (tx, mut rx) = mpsc::unbounded_channel();

        runner
            .run("BookingAgent", &history_with("fly me"), &mut context, Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let mut finished = None;
        while let Some(event) = rx.recv().await {
            if let RunEvent::ToolFinished { output, is_error, .. } = event {
                finished = Some((output, is_error));
            }
        }
        let (output, is_error) = finished.unwrap();
        assert!(is_error);
        assert!(output.starts_with("Error: "));
    }

    #[tokio::test]
    async fn undeclared_tool_is_rejected() {
        let runner = runner(
            vec![Ok(Decision::call_tools(vec![ToolCall::new(
                "t1",
                "generate_event",
                "{\"scenario\": \"sneak\"}",
            )]))],
            RunConfig::default(),
        );
        let mut context = SessionContext::None;
        let err = runner
            .run("MonsterAgent", &history_with("hi"), &mut context, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolNotAllowed { tool, .. } if tool == "generate_event"));
    }

    #[tokio::test]
    async fn undeclared_handoff_is_rejected() {
        let runner = runner(
            vec![Ok(Decision::handoff(
                "GameMasterAgent",
                ToolCall::new("h1", "transfer_to_gamemasteragent", "{}"),
            ))],
            RunConfig::default(),
        );
        let mut context = SessionContext::None;
        let err = runner
            .run("NarratorAgent", &history_with("hi"), &mut context, None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "agent 'NarratorAgent' cannot hand off to 'GameMasterAgent'"
        );
    }

    #[tokio::test]
    async fn handoff_loop_hits_max_turns() {
        let decisions = (0..5)
            .map(|i| {
                Ok(Decision::call_tools(vec![ToolCall::new(
                    format!("t{}", i),
                    "roll_dice",
                    "{}",
                )]))
            })
            .collect();
        let runner = runner(decisions, RunConfig::new(3, 0));
        let mut context = SessionContext::None;
        let err = runner
            .run("MonsterAgent", &history_with("attack"), &mut context, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MaxTurnsExceeded(3)));
    }

    #[tokio::test]
    async fn unknown_start_agent_fails() {
        let runner = runner(vec![], RunConfig::default());
        let mut context = SessionContext::None;
        let err = runner
            .run("Ghost", &history_with("hi"), &mut context, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UnknownAgent(name) if name == "Ghost"));
    }

    #[tokio::test]
    async fn history_window_limits_what_is_sent() {
        let client = Arc::new(ScriptedModelClient::new(vec![Ok(ModelReply::text("ok"))]));
        let strategy = Arc::new(ModelRouter::new(client.clone(), registry(), tools()));
        let runner = Runner::new(strategy, registry(), tools(), RunConfig::new(10, 2));

        let mut history = ConversationHistory::new();
        for i in 0..5 {
            history.push(ChatMessage::user(format!("message {}", i)));
        }
        let mut context = SessionContext::None;
        runner
            .run("NarratorAgent", &history, &mut context, None)
            .await
            .unwrap();

        let sent = &client.requests()[0].messages;
        // system prompt + last two messages
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].content, "message 3");
        assert_eq!(history.len(), 5);
    }

    #[tokio::test]
    async fn run_session_walks_phases() {
        let runner = runner(
            vec![
                Ok(Decision::call_tools(vec![ToolCall::new("t1", "roll_dice", "{}")])),
                Ok(Decision::Answer("Hit!".to_string())),
            ],
            RunConfig::default(),
        );
        let mut session = Session::new(
            AppKind::GameMaster,
            SessionContext::Game(GameContext::new("Hero")),
        );
        session.transition(SessionPhase::AwaitingUserInput).unwrap();
        session.history.push(ChatMessage::user("attack"));
        session.transition(SessionPhase::Routing).unwrap();

        let result = runner
            .run_session("MonsterAgent", &mut session, None)
            .await
            .unwrap();

        assert_eq!(result.final_output, "Hit!");
        assert_eq!(session.phase, SessionPhase::AnswerReady);
    }

    #[test]
    fn run_config_zero_window_is_unbounded() {
        assert_eq!(RunConfig::new(10, 0).history_window, None);
        assert_eq!(RunConfig::default().history_window, Some(50));
        assert_eq!(RunConfig::default().max_turns, 10);
    }
}
