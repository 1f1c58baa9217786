//! Provider trait — the abstraction over the LLM backend.
//!
//! A Provider knows how to send a conversation to an LLM and get a
//! response back, either as a complete message or as a stream of typed
//! events. The agent loop only ever sees this trait, so tests drive it
//! with scripted mock providers.

use crate::error::ProviderError;
use crate::message::{ContentBlock, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One completion request: full history plus everything the model needs to
/// decide on tool use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,

    /// Output-length ceiling for this round-trip.
    pub max_tokens: u32,

    /// System instructions, sent as a top-level field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// The conversation history, oldest first.
    pub turns: Vec<Turn>,

    /// Tools the model may call this round-trip.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A tool definition advertised to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's arguments.
    pub input_schema: serde_json::Value,
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The assembled assistant content blocks.
    pub content: Vec<ContentBlock>,

    /// Which model actually responded.
    pub model: String,

    /// Why the model stopped ("end_turn", "tool_use", ...), if reported.
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// The opening of a content block within a streamed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockStart {
    /// A text block is starting; its content arrives as `TextDelta`s.
    Text,
    /// A tool-use block is starting; its arguments arrive as
    /// `InputJsonDelta` fragments and are only meaningful once assembled.
    ToolUse { id: String, name: String },
}

/// One incremental event in a streamed response.
///
/// The stream for a single round-trip is a sequence of block-scoped events
/// terminated by `MessageStop`. Consumers must treat `InputJsonDelta`
/// fragments as opaque until the enclosing `BlockStop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    BlockStart(BlockStart),
    TextDelta(String),
    InputJsonDelta(String),
    BlockStop,
    MessageStop,
}

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Send a request and get a stream of typed response events.
    ///
    /// Default implementation calls `complete()` and replays the assembled
    /// content as a synthetic event stream.
    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamEvent, ProviderError>>,
        ProviderError,
    > {
        let response = self.complete(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        tokio::spawn(async move {
            for block in response.content {
                let events = match block {
                    ContentBlock::Text { text } => vec![
                        StreamEvent::BlockStart(BlockStart::Text),
                        StreamEvent::TextDelta(text),
                        StreamEvent::BlockStop,
                    ],
                    ContentBlock::ToolUse { id, name, input } => vec![
                        StreamEvent::BlockStart(BlockStart::ToolUse { id, name }),
                        StreamEvent::InputJsonDelta(input.to_string()),
                        StreamEvent::BlockStop,
                    ],
                    // Providers never emit image or tool_result blocks.
                    _ => continue,
                };
                for event in events {
                    if tx.send(Ok(event)).await.is_err() {
                        return;
                    }
                }
            }
            let _ = tx.send(Ok(StreamEvent::MessageStop)).await;
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "calculator".into(),
            description: "Evaluate a math expression".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "expression": { "type": "string" }
                },
                "required": ["expression"]
            }),
        };
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["name"], "calculator");
        assert_eq!(json["input_schema"]["type"], "object");
    }

    #[test]
    fn request_serializes_turns_in_wire_format() {
        let req = ProviderRequest {
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 4096,
            system: Some("Be brief.".into()),
            turns: vec![Turn::user_text("hi")],
            tools: vec![],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["turns"][0]["role"], "user");
        assert_eq!(json["turns"][0]["content"][0]["type"], "text");
        // Empty tools list is omitted entirely.
        assert!(json.get("tools").is_none());
    }

    struct FixedProvider;

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                content: vec![
                    ContentBlock::text("hello"),
                    ContentBlock::ToolUse {
                        id: "toolu_1".into(),
                        name: "calculator".into(),
                        input: serde_json::json!({"expression": "1+1"}),
                    },
                ],
                model: "fixed-model".into(),
                stop_reason: Some("tool_use".into()),
            })
        }
    }

    #[tokio::test]
    async fn default_stream_replays_complete() {
        let provider = FixedProvider;
        let request = ProviderRequest {
            model: "fixed-model".into(),
            max_tokens: 16,
            system: None,
            turns: vec![Turn::user_text("hi")],
            tools: vec![],
        };

        let mut rx = provider.stream(request).await.unwrap();
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event.unwrap());
        }

        assert_eq!(events.first(), Some(&StreamEvent::BlockStart(BlockStart::Text)));
        assert_eq!(events.last(), Some(&StreamEvent::MessageStop));
        assert!(events.iter().any(|e| matches!(
            e,
            StreamEvent::BlockStart(BlockStart::ToolUse { name, .. }) if name == "calculator"
        )));
    }
}
