//! Stream relay: turns one provider event stream into assembled content
//! blocks while forwarding client-visible progress.

use admuse_core::error::ProviderError;
use admuse_core::event::ClientEvent;
use admuse_core::message::ContentBlock;
use admuse_core::provider::{BlockStart, StreamEvent};
use tokio::sync::mpsc;
use tracing::debug;

/// A content block still being streamed.
enum PendingBlock {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        input_json: String,
    },
}

/// Consumes one streamed round-trip and returns the assembled content.
///
/// Text deltas and tool-use starts are forwarded to the client as they
/// arrive; tool arguments are accumulated as raw JSON fragments and parsed
/// only once the block is complete. Partial argument fragments never leave
/// this module.
pub struct StreamRelay<'a> {
    client: &'a mpsc::Sender<ClientEvent>,
}

impl<'a> StreamRelay<'a> {
    pub fn new(client: &'a mpsc::Sender<ClientEvent>) -> Self {
        Self { client }
    }

    pub async fn run(
        &self,
        mut events: mpsc::Receiver<Result<StreamEvent, ProviderError>>,
    ) -> Result<Vec<ContentBlock>, ProviderError> {
        let mut blocks = Vec::new();
        let mut pending: Option<PendingBlock> = None;

        while let Some(event) = events.recv().await {
            match event? {
                StreamEvent::BlockStart(BlockStart::Text) => {
                    pending = Some(PendingBlock::Text(String::new()));
                }
                StreamEvent::BlockStart(BlockStart::ToolUse { id, name }) => {
                    self.send(ClientEvent::ToolStart {
                        tool_id: id.clone(),
                        name: name.clone(),
                    })
                    .await;
                    pending = Some(PendingBlock::ToolUse {
                        id,
                        name,
                        input_json: String::new(),
                    });
                }
                StreamEvent::TextDelta(text) => {
                    self.send(ClientEvent::TextDelta { text: text.clone() }).await;
                    match &mut pending {
                        Some(PendingBlock::Text(buf)) => buf.push_str(&text),
                        // Tolerate a delta without an explicit block start.
                        _ => pending = Some(PendingBlock::Text(text)),
                    }
                }
                StreamEvent::InputJsonDelta(fragment) => {
                    if let Some(PendingBlock::ToolUse { input_json, .. }) = &mut pending {
                        input_json.push_str(&fragment);
                    }
                }
                StreamEvent::BlockStop => {
                    if let Some(block) = pending.take() {
                        blocks.push(finalize(block));
                    }
                }
                StreamEvent::MessageStop => break,
            }
        }

        debug!(blocks = blocks.len(), "round-trip stream complete");
        Ok(blocks)
    }

    async fn send(&self, event: ClientEvent) {
        // A closed channel means the client is gone; keep assembling so the
        // turn can still finish cleanly.
        let _ = self.client.send(event).await;
    }
}

fn finalize(block: PendingBlock) -> ContentBlock {
    match block {
        PendingBlock::Text(text) => ContentBlock::Text { text },
        PendingBlock::ToolUse {
            id,
            name,
            input_json,
        } => {
            let input = if input_json.trim().is_empty() {
                serde_json::json!({})
            } else {
                serde_json::from_str(&input_json).unwrap_or_else(|_| serde_json::json!({}))
            };
            ContentBlock::ToolUse { id, name, input }
        }
    }
}
