//! Mint Tracker API Endpoints
//!
//! REST and WebSocket endpoints for mint birth tracking:
//! - GET /api/mints/health - Health check with lifecycle state
//! - GET /api/mints/seen - Addresses claimed this lifecycle
//! - GET /api/mints/stats - Counters
//! - WS /ws/mints - Stream of birth and error events

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use super::service::SharedTrackerService;

/// Create the mint tracker API router
pub fn create_mint_router(service: SharedTrackerService) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/mints/health", get(handle_health))
        .route("/api/mints/seen", get(handle_list_seen))
        .route("/api/mints/stats", get(handle_stats))
        .route("/ws/mints", get(ws_mints_handler))
        .layer(cors)
        .with_state(service)
}

// =============================================================================
// REST Handlers
// =============================================================================

/// GET /api/mints/health
async fn handle_health(State(service): State<SharedTrackerService>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mintwatch",
        "version": env!("CARGO_PKG_VERSION"),
        "state": service.state(),
        "subscribers": service.subscriber_count(),
    }))
}

/// GET /api/mints/seen
///
/// Every mint address claimed since the last start.
async fn handle_list_seen(State(service): State<SharedTrackerService>) -> impl IntoResponse {
    let mints: Vec<String> = service.list_seen().iter().map(|m| m.to_string()).collect();

    Json(serde_json::json!({
        "count": mints.len(),
        "mints": mints,
    }))
}

/// GET /api/mints/stats
async fn handle_stats(State(service): State<SharedTrackerService>) -> impl IntoResponse {
    Json(serde_json::json!({
        "state": service.state(),
        "pass_in_progress": service.is_reconciling(),
        "stats": service.stats(),
    }))
}

// =============================================================================
// WebSocket
// =============================================================================

/// WebSocket upgrade handler for all mint events
///
/// Route: /ws/mints
async fn ws_mints_handler(
    ws: WebSocketUpgrade,
    State(service): State<SharedTrackerService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SharedTrackerService) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = service.subscribe();

    // Forward every event to this client
    let send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "websocket client lagging, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(_) => continue,
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Drain client messages until close
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Err(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }
    debug!("websocket client disconnected");
}

/// Start the API server
pub async fn start_api_server(service: SharedTrackerService, port: u16) -> std::io::Result<()> {
    let app = create_mint_router(service);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "mint tracker API listening");
    println!("Endpoints:");
    println!("  GET  /api/mints/health  - Health check");
    println!("  GET  /api/mints/seen    - List seen mint addresses");
    println!("  GET  /api/mints/stats   - Tracker statistics");
    println!("  WS   /ws/mints          - Subscribe to mint births");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
