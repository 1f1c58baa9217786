//! Error types for the AdMuse domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! `ToolError` display strings are load-bearing: the agent loop frames
//! every tool failure as `"Error: {e}"` and hands that string back to the
//! model as a tool result, so the variants render as the exact phrases the
//! relay protocol documents (e.g. `FAL_KEY not configured`).

use thiserror::Error;

/// The top-level error type for all AdMuse operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Gateway errors ---
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool registered under the requested name.
    #[error("unknown tool '{0}'")]
    NotFound(String),

    /// A required credential is absent. Renders as `<NAME> not configured`.
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// An upstream call exceeded its per-call ceiling.
    #[error("{operation} timed out ({limit})")]
    Timeout {
        operation: &'static str,
        limit: &'static str,
    },

    /// An upstream service answered with a non-2xx status.
    #[error("{service} {status}. {detail}")]
    UpstreamStatus {
        service: &'static str,
        status: u16,
        detail: String,
    },

    /// Malformed or missing arguments, rejected before any side effect.
    #[error("{0}")]
    InvalidArguments(String),

    /// Anything else that went wrong inside a handler.
    #[error("{0}")]
    ExecutionFailed(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid client message: {0}")]
    InvalidPayload(String),

    #[error("Client connection lost: {0}")]
    ConnectionLost(String),

    #[error("Bind failed on {addr}: {reason}")]
    BindFailed { addr: String, reason: String },
}
