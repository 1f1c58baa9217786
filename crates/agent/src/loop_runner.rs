//! The agent reasoning loop implementation.

use std::sync::Arc;

use admuse_core::event::ClientEvent;
use admuse_core::message::{ContentBlock, Conversation, Turn};
use admuse_core::provider::{Provider, ProviderRequest};
use admuse_core::tool::ToolRegistry;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::budget::ToolCallBudget;
use crate::invoker;
use crate::relay::StreamRelay;

/// The core agent loop that orchestrates streamed LLM calls and tool
/// execution for one user turn.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// System instructions, fixed for the lifetime of the loop
    system_prompt: String,

    /// Output-length ceiling per round-trip
    max_tokens: u32,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Maximum tool calls per user turn
    max_tool_calls: usize,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: system_prompt.into(),
            max_tokens: 4096,
            tools,
            max_tool_calls: 5,
        }
    }

    /// Set the max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Set the per-turn tool call ceiling.
    pub fn with_max_tool_calls(mut self, max: usize) -> Self {
        self.max_tool_calls = max;
        self
    }

    /// Process one user turn and stream progress to the client.
    ///
    /// The caller has already appended the user turn to `conversation`.
    /// This streams model round-trips, dispatches tool calls, and feeds
    /// results back until the model stops asking for tools or the budget
    /// trips. Exactly one `done` event is emitted on success; provider
    /// errors propagate to the caller with history left as-is.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        client: &mpsc::Sender<ClientEvent>,
    ) -> Result<String, admuse_core::Error> {
        info!(
            conversation_id = %conversation.id,
            turns = conversation.len(),
            "processing turn"
        );

        let tool_definitions = self.tools.definitions();
        let mut budget = ToolCallBudget::new(self.max_tool_calls);
        let mut response_text = String::new();
        let relay = StreamRelay::new(client);

        loop {
            let request = ProviderRequest {
                model: self.model.clone(),
                max_tokens: self.max_tokens,
                system: Some(self.system_prompt.clone()),
                turns: conversation.turns.clone(),
                tools: tool_definitions.clone(),
            };

            let events = self.provider.stream(request).await?;
            let blocks = relay.run(events).await?;

            for block in &blocks {
                if let ContentBlock::Text { text } = block {
                    response_text.push_str(text);
                }
            }
            conversation.push(Turn::assistant(blocks));

            let tool_uses: Vec<(String, String, serde_json::Value)> = conversation
                .turns
                .last()
                .map(|turn| {
                    turn.tool_uses()
                        .into_iter()
                        .map(|(id, name, input)| {
                            (id.to_string(), name.to_string(), input.clone())
                        })
                        .collect()
                })
                .unwrap_or_default();

            if tool_uses.is_empty() {
                break;
            }

            // Charge the whole round up front; on a trip nothing is
            // dispatched and no result turn is appended.
            if !budget.charge(tool_uses.len()) {
                warn!(
                    conversation_id = %conversation.id,
                    ceiling = budget.ceiling(),
                    "tool call limit reached, stopping agent loop"
                );
                break;
            }

            debug!(tool_count = tool_uses.len(), "executing tool calls");

            let mut results = Vec::with_capacity(tool_uses.len());
            for (id, name, input) in tool_uses {
                let result = invoker::invoke(&self.tools, &name, input).await;
                let _ = client.send(ClientEvent::tool_end(&id, &result)).await;
                results.push(ContentBlock::tool_result(id, result));
            }
            conversation.push(Turn::user(results));

            let _ = client.send(ClientEvent::NewTurn).await;
        }

        let _ = client
            .send(ClientEvent::Done {
                text: Some(response_text.clone()),
            })
            .await;

        Ok(response_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admuse_core::error::{ProviderError, ToolError};
    use admuse_core::provider::ProviderResponse;
    use admuse_core::tool::Tool;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// A provider that replays a script of responses, one per round-trip.
    struct ScriptedProvider {
        script: Mutex<Vec<Vec<ContentBlock>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Vec<ContentBlock>>) -> Self {
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(ProviderError::Network("script exhausted".into()));
            }
            Ok(ProviderResponse {
                content: script.remove(0),
                model: "scripted-model".into(),
                stop_reason: None,
            })
        }
    }

    struct CalcTool;

    #[async_trait]
    impl Tool for CalcTool {
        fn name(&self) -> &str {
            "calculator"
        }
        fn description(&self) -> &str {
            "math"
        }
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
        ) -> std::result::Result<String, ToolError> {
            match arguments["expression"].as_str() {
                Some("3*7") => Ok("21".into()),
                other => Err(ToolError::InvalidArguments(format!(
                    "unexpected expression: {other:?}"
                ))),
            }
        }
    }

    fn tool_use(id: &str, name: &str, input: serde_json::Value) -> ContentBlock {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    fn make_loop(script: Vec<Vec<ContentBlock>>) -> AgentLoop {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CalcTool));
        AgentLoop::new(
            Arc::new(ScriptedProvider::new(script)),
            "scripted-model",
            "You are helpful.",
            Arc::new(registry),
        )
    }

    async fn drain(mut rx: mpsc::Receiver<ClientEvent>) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn plain_text_turn_is_one_round_trip() {
        let agent = make_loop(vec![vec![ContentBlock::text("Hello there!")]]);
        let mut conv = Conversation::new();
        conv.push(Turn::user_text("hi"));

        let (tx, rx) = mpsc::channel(64);
        let text = agent.run_turn(&mut conv, &tx).await.unwrap();
        drop(tx);

        assert_eq!(text, "Hello there!");
        // user + assistant
        assert_eq!(conv.len(), 2);

        let events = drain(rx).await;
        let dones = events
            .iter()
            .filter(|e| matches!(e, ClientEvent::Done { .. }))
            .count();
        assert_eq!(dones, 1);
        assert!(!events.iter().any(|e| matches!(e, ClientEvent::NewTurn)));
    }

    #[tokio::test]
    async fn tool_round_feeds_results_back() {
        let agent = make_loop(vec![
            vec![
                ContentBlock::text("Let me compute that. "),
                tool_use("toolu_1", "calculator", serde_json::json!({"expression": "3*7"})),
            ],
            vec![ContentBlock::text("The answer is 21.")],
        ]);
        let mut conv = Conversation::new();
        conv.push(Turn::user_text("what is 3*7?"));

        let (tx, rx) = mpsc::channel(64);
        let text = agent.run_turn(&mut conv, &tx).await.unwrap();
        drop(tx);

        assert!(text.contains("21"));

        // user, assistant(tool_use), user(tool_result), assistant(text)
        assert_eq!(conv.len(), 4);
        assert_eq!(
            conv.turns[2].content,
            vec![ContentBlock::tool_result("toolu_1", "21")]
        );

        let events = drain(rx).await;
        assert!(events.iter().any(|e| matches!(
            e,
            ClientEvent::ToolStart { name, .. } if name == "calculator"
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ClientEvent::ToolEnd { result: Some(r), .. } if r == "21"
        )));
        assert!(events.iter().any(|e| matches!(e, ClientEvent::NewTurn)));
        assert_eq!(
            events.last(),
            Some(&ClientEvent::Done {
                text: Some(text.clone())
            })
        );
    }

    #[tokio::test]
    async fn results_match_tool_use_order() {
        let agent = make_loop(vec![
            vec![
                tool_use("toolu_a", "calculator", serde_json::json!({"expression": "3*7"})),
                tool_use("toolu_b", "no_such_tool", serde_json::json!({})),
            ],
            vec![ContentBlock::text("done")],
        ]);
        let mut conv = Conversation::new();
        conv.push(Turn::user_text("go"));

        let (tx, _rx) = mpsc::channel(64);
        agent.run_turn(&mut conv, &tx).await.unwrap();

        let results = &conv.turns[2].content;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], ContentBlock::tool_result("toolu_a", "21"));
        match &results[1] {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
            } => {
                assert_eq!(tool_use_id, "toolu_b");
                assert!(content.contains("unknown tool"));
            }
            other => panic!("expected tool_result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn budget_trip_stops_without_dispatch() {
        // Each round requests 2 calls; ceiling 3 allows round one (2 used)
        // and trips on round two (4 > 3) before dispatching it.
        let round = |n: usize| {
            vec![
                tool_use(
                    &format!("toolu_{n}a"),
                    "calculator",
                    serde_json::json!({"expression": "3*7"}),
                ),
                tool_use(
                    &format!("toolu_{n}b"),
                    "calculator",
                    serde_json::json!({"expression": "3*7"}),
                ),
            ]
        };
        let agent = make_loop(vec![round(1), round(2), round(3)]).with_max_tool_calls(3);

        let mut conv = Conversation::new();
        conv.push(Turn::user_text("loop forever"));

        let (tx, rx) = mpsc::channel(64);
        agent.run_turn(&mut conv, &tx).await.unwrap();
        drop(tx);

        let events = drain(rx).await;
        let tool_ends = events
            .iter()
            .filter(|e| matches!(e, ClientEvent::ToolEnd { .. }))
            .count();
        assert_eq!(tool_ends, 2, "only the first round may dispatch");
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, ClientEvent::Done { .. }))
                .count(),
            1
        );

        // The tripped round's tool_use turn is in history with no answering
        // result turn, and no further round-trip was issued.
        assert_eq!(conv.len(), 4);
        assert!(conv.turns[3].content.iter().all(ContentBlock::is_tool_use));
    }

    #[tokio::test]
    async fn provider_error_propagates_and_history_stays() {
        let agent = make_loop(vec![]);
        let mut conv = Conversation::new();
        conv.push(Turn::user_text("hi"));

        let (tx, rx) = mpsc::channel(64);
        let result = agent.run_turn(&mut conv, &tx).await;
        drop(tx);

        assert!(result.is_err());
        assert_eq!(conv.len(), 1, "user turn stays in history");
        assert!(
            !drain(rx).await.iter().any(|e| matches!(e, ClientEvent::Done { .. })),
            "no done on a failed turn"
        );
    }

    #[tokio::test]
    async fn done_text_concatenates_across_round_trips() {
        let agent = make_loop(vec![
            vec![
                ContentBlock::text("First part. "),
                tool_use("toolu_1", "calculator", serde_json::json!({"expression": "3*7"})),
            ],
            vec![ContentBlock::text("Second part.")],
        ]);
        let mut conv = Conversation::new();
        conv.push(Turn::user_text("go"));

        let (tx, _rx) = mpsc::channel(64);
        let text = agent.run_turn(&mut conv, &tx).await.unwrap();
        assert_eq!(text, "First part. Second part.");
    }
}
