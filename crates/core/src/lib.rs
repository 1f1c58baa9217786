//! # AdMuse Core
//!
//! Domain types, traits, and error definitions for the AdMuse agent relay.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The provider and the tools are defined as traits here; implementations
//! live in their respective crates. This enables:
//! - Driving the agent loop with scripted mock providers in tests
//! - Swapping generation backends without touching the loop
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use event::ClientEvent;
pub use message::{ContentBlock, Conversation, ConversationId, Role, Turn};
pub use provider::{BlockStart, Provider, ProviderRequest, ProviderResponse, StreamEvent, ToolDefinition};
pub use tool::{Tool, ToolRegistry};
