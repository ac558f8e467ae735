//! # Proxy server
//!
//! Axum router exposing the relay's single chat endpoint:
//!
//! | Route | Behavior |
//! |-------|----------|
//! | `POST /api/chat` | Assemble and forward one completion; `{content}` or `{error}` |
//! | `GET /health` | Liveness probe, always `ok` |
//!
//! Every [`ProxyError`] becomes a JSON `{error}` body. Upstream failures keep
//! the upstream status and message; anything else is logged in full and
//! answered with a generic 500.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api::{ChatRequest, ChatResponse, ProxyError, Upstream};
use crate::config::RelayConfig;

/// Message returned for every failure that is not an upstream error.
pub const INTERNAL_FAILURE: &str = "Failed to process request";

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub upstream: Upstream,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ProxyError::Upstream { status, .. } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                self.to_string(),
            ),
            _ => {
                error!(error = %self, "Chat API error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_FAILURE.to_string(),
                )
            }
        };
        (status, Json(ChatResponse::error(message))).into_response()
    }
}

/// Build the router around `upstream`.
pub fn router(upstream: Upstream) -> Router {
    let state = Arc::new(AppState { upstream });

    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /api/chat`.
///
/// The body is parsed by hand so that a malformed request is answered like
/// every other internal failure.
async fn chat(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ProxyError> {
    let request: ChatRequest = serde_json::from_slice(&body)?;
    let content = state.upstream.complete(&request).await?;
    Ok(Json(ChatResponse::content(content)))
}

async fn health() -> &'static str {
    "ok"
}

/// Bind `config.bind_address` and serve until Ctrl-C or SIGTERM.
pub async fn serve(config: &RelayConfig) -> Result<(), Box<dyn Error>> {
    let upstream = Upstream::new(config.api_url.clone(), config.api_key.clone());
    let app = router(upstream);

    let addr: SocketAddr = config.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, upstream = %config.api_url, "Chat proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Chat proxy stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
