//! Client-facing notification events.
//!
//! `ClientEvent` is the server→client half of the WebSocket protocol. The
//! agent loop and the gateway push these onto a per-connection channel and
//! a writer task serializes them as JSON frames.
//!
//! Protocol:
//! - `thinking`   — turn processing started/finished (status flag)
//! - `text_delta` — incremental assistant text, forwarded as it streams
//! - `tool_start` — the model began a tool call (name + correlation id)
//! - `tool_end`   — a tool call finished (truncated result preview)
//! - `new_turn`   — a follow-up round-trip is starting after tool results
//! - `done`       — the turn is complete (full assistant text)
//! - `error`      — the turn failed; history is left as-is
//! - `cleared`    — the history was reset on request

use serde::{Deserialize, Serialize};

/// Maximum length of the result preview carried by `tool_end`.
pub const TOOL_RESULT_PREVIEW_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Turn processing indicator. `true` when a turn starts, `false` when
    /// it ends — sent on every exit path, including errors.
    Thinking { status: bool },

    /// Partial assistant text, forwarded immediately for low latency.
    TextDelta { text: String },

    /// The model requested a tool call.
    ToolStart { tool_id: String, name: String },

    /// A tool call completed; `result` is a preview capped at
    /// [`TOOL_RESULT_PREVIEW_LEN`] characters.
    ToolEnd {
        tool_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },

    /// The loop is issuing another round-trip after feeding tool results
    /// back to the model.
    NewTurn,

    /// The turn finished; `text` is the assistant's full text for the turn.
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },

    /// The turn failed.
    Error { message: String },

    /// History was reset in response to a clear request.
    Cleared,
}

impl ClientEvent {
    /// A `tool_end` event with the result preview truncated on a char
    /// boundary.
    pub fn tool_end(tool_id: impl Into<String>, result: &str) -> Self {
        let preview = if result.chars().count() > TOOL_RESULT_PREVIEW_LEN {
            result.chars().take(TOOL_RESULT_PREVIEW_LEN).collect()
        } else {
            result.to_string()
        };
        Self::ToolEnd {
            tool_id: tool_id.into(),
            result: Some(preview),
        }
    }
}
