//! HTTP surface of the Bleed propagation engine.
//!
//! An Axum server exposing:
//!
//! - **REST endpoints** to list echoes by world or source event, trigger
//!   an echo by hand, hand new events in for propagation, move records
//!   through review (approve, reject, complete), and read the world graph
//! - **`WebSocket` endpoint** (`/ws/echoes`) streaming every lifecycle
//!   notification through a [`tokio::sync::broadcast`] channel
//!
//! Every failure renders as `{"error": {"kind", "message"}, "status"}`;
//! see [`ApiError`]. Mutating routes require a bearer token when
//! `api.auth_token` is configured.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
