//! WebSocket gateway for AdMuse.
//!
//! One `/ws/{session_id}` connection carries one conversation. Client
//! frames are JSON (`message` and `clear`); server frames are the
//! [`ClientEvent`] protocol pushed by the agent loop as the turn streams.
//!
//! Built on Axum for async HTTP and WebSocket handling.

pub mod media;
pub mod session;

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Json},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use admuse_agent::AgentLoop;
use admuse_config::AppConfig;
use admuse_core::event::ClientEvent;
use admuse_providers::AnthropicProvider;

use media::MediaUploader;
use session::{MediaAttachment, Session};

/// Shared application state for the gateway.
///
/// Everything here is immutable after startup; per-connection state lives
/// in each connection's [`Session`].
pub struct GatewayState {
    pub config: AppConfig,
    pub agent: Arc<AgentLoop>,
    pub uploader: MediaUploader,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/ws/{session_id}", get(ws_handler))
        .route("/health", get(health_handler))
        // The browser client may be served from anywhere.
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        warn!("no provider API key configured, turns will fail until one is set");
    }

    let provider = Arc::new(AnthropicProvider::new(
        config.api_key.clone().unwrap_or_default(),
    )?);
    let tools = Arc::new(admuse_tools::default_registry(config.fal_key.clone()));
    let agent = Arc::new(
        AgentLoop::new(provider, &config.model, &config.system_prompt, tools)
            .with_max_tokens(config.max_tokens)
            .with_max_tool_calls(config.max_tool_calls as usize),
    );
    let uploader = MediaUploader::new(config.fal_key.clone());

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState {
        config,
        agent,
        uploader,
    });

    let app = build_router(state);

    info!(addr = %addr, "gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    agent: String,
    version: &'static str,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        agent: state.config.agent_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /ws/{session_id}` — the conversation WebSocket.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, session_id, state))
}

/// A frame from the client.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Message {
        #[serde(default)]
        text: String,
        #[serde(default)]
        media: Vec<MediaAttachment>,
    },
    Clear,
}

async fn handle_connection(socket: WebSocket, session_id: String, state: SharedState) {
    info!(session_id = %session_id, "WebSocket connection established");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer task: drains the event channel onto the socket so the agent
    // loop never blocks on a slow client.
    let (event_tx, mut event_rx) = mpsc::channel::<ClientEvent>(256);
    let writer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let json = serde_json::to_string(&event).unwrap_or_default();
            if ws_tx.send(WsMessage::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = Session::new(&session_id);

    while let Some(msg) = ws_rx.next().await {
        let text = match msg {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue, // ignore binary, ping, pong
            Err(_) => break,
        };

        let client_msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                let _ = event_tx
                    .send(ClientEvent::Error {
                        message: format!("Invalid message: {e}"),
                    })
                    .await;
                continue;
            }
        };

        match client_msg {
            ClientMessage::Clear => {
                session.clear();
                let _ = event_tx.send(ClientEvent::Cleared).await;
            }
            ClientMessage::Message { text, media } => {
                if !session
                    .submit_turn(&text, &media, &state.uploader)
                    .await
                {
                    continue;
                }

                let _ = event_tx.send(ClientEvent::Thinking { status: true }).await;

                if let Err(e) = state
                    .agent
                    .run_turn(session.conversation_mut(), &event_tx)
                    .await
                {
                    error!(session_id = %session_id, error = %e, "turn failed");
                    let _ = event_tx
                        .send(ClientEvent::Error {
                            message: e.to_string(),
                        })
                        .await;
                }

                // Always, whatever the turn's outcome.
                let _ = event_tx.send(ClientEvent::Thinking { status: false }).await;
            }
        }
    }

    drop(event_tx);
    let _ = writer.await;
    info!(session_id = %session_id, "WebSocket connection closed");
}
