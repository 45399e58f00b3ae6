//! Axum router for the echo API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router.
///
/// - `GET /health`
/// - `GET /ws/echoes` -- lifecycle notification stream
/// - `GET|POST /api/worlds/{world_id}/echoes` -- list / manual trigger
/// - `GET /api/worlds/{world_id}/events/{event_id}/echoes`
/// - `POST /api/worlds/{world_id}/events/propagate`
/// - `GET /api/echoes/{echo_id}`
/// - `PATCH /api/echoes/{echo_id}/approve|reject|complete`
/// - `GET /api/connections`
/// - `GET /api/map-data`
///
/// CORS allows any origin so the map UI can be served from elsewhere.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws/echoes", get(ws::ws_echoes))
        // Per-world
        .route(
            "/api/worlds/{world_id}/echoes",
            get(handlers::list_world_echoes).post(handlers::trigger_echo),
        )
        .route(
            "/api/worlds/{world_id}/events/{event_id}/echoes",
            get(handlers::list_event_echoes),
        )
        .route(
            "/api/worlds/{world_id}/events/propagate",
            post(handlers::propagate_event),
        )
        // Per-echo
        .route("/api/echoes/{echo_id}", get(handlers::get_echo))
        .route("/api/echoes/{echo_id}/approve", patch(handlers::approve_echo))
        .route("/api/echoes/{echo_id}/reject", patch(handlers::reject_echo))
        .route("/api/echoes/{echo_id}/complete", patch(handlers::complete_echo))
        // Graph
        .route("/api/connections", get(handlers::list_connections))
        .route("/api/map-data", get(handlers::map_data))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
