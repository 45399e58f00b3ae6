//! Map view aggregation.

use std::sync::Arc;

use bleed_types::MapView;

use crate::error::EchoError;
use crate::graph::ConnectionGraph;
use crate::store::{ConnectionStore, EchoStore, WorldStore};

/// Builds the whole-multiverse [`MapView`].
pub struct GraphAggregator<S: ?Sized> {
    store: Arc<S>,
    graph: ConnectionGraph<S>,
}

impl<S: ?Sized> Clone for GraphAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            graph: self.graph.clone(),
        }
    }
}

impl<S: WorldStore + ConnectionStore + EchoStore + ?Sized> GraphAggregator<S> {
    /// Create an aggregator over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            graph: ConnectionGraph::new(Arc::clone(&store)),
            store,
        }
    }

    /// All worlds, active connections, and echo counts per target world.
    ///
    /// The three reads run concurrently and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns the first read failure.
    pub async fn build_map_view(&self) -> Result<MapView, EchoError> {
        let (nodes, edges, echo_counts) = tokio::try_join!(
            self.store.list_worlds(),
            self.graph.all_active(),
            self.store.count_by_target(),
        )?;
        Ok(MapView {
            nodes,
            edges,
            echo_counts,
        })
    }
}
