//! LLM provider implementations for AdMuse.
//!
//! Currently a single backend: Anthropic's native Messages API. The agent
//! loop only depends on the `Provider` trait from `admuse-core`, so
//! additional backends slot in without touching the loop.

pub mod anthropic;

pub use anthropic::AnthropicProvider;
