//! Shared state handed to every handler.

use std::sync::Arc;

use bleed_core::config::ApiConfig;
use bleed_core::{Propagator, Store};
use bleed_types::EchoNotification;
use tokio::sync::broadcast;

/// State shared across handlers via [`axum::extract::State`].
pub struct AppState {
    /// The propagation engine.
    pub propagator: Propagator<dyn Store>,
    /// Paging limits and the optional bearer token.
    pub api: ApiConfig,
}

impl AppState {
    /// Build the engine over `store`.
    pub fn new(store: Arc<dyn Store>, api: ApiConfig) -> Self {
        Self {
            propagator: Propagator::new(store),
            api,
        }
    }

    /// Subscribe to lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EchoNotification> {
        self.propagator.subscribe()
    }
}
