//! The AdMuse agent loop.
//!
//! One user turn is processed as a sequence of model round-trips: stream a
//! response, dispatch any tool calls, feed the results back, repeat until
//! the model answers in plain text or the per-turn tool budget trips.
//! Client-visible progress (text deltas, tool start/end, completion) is
//! pushed onto a channel as it happens; the transport layer drains it.

pub mod budget;
pub mod invoker;
pub mod loop_runner;
pub mod relay;

pub use budget::ToolCallBudget;
pub use loop_runner::AgentLoop;
pub use relay::StreamRelay;
