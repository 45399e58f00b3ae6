//! Connection graph: worlds as nodes, bleed links as undirected edges.
//!
//! Connections are stored with two named endpoints, but a link carries
//! echoes both ways. Every traversal resolves the far side through
//! [`Connection::other_endpoint`] so there is one symmetry rule.

use std::sync::Arc;

use bleed_types::{Connection, WorldId};

use crate::error::EchoError;
use crate::store::ConnectionStore;

/// An active link seen from one world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbour {
    /// The link crossed.
    pub connection: Connection,
    /// The world on the far side.
    pub world_id: WorldId,
}

/// Read-only view of the connection graph.
pub struct ConnectionGraph<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for ConnectionGraph<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ConnectionStore + ?Sized> ConnectionGraph<S> {
    /// Create a graph view over a connection store.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Active links touching `world`, with the far endpoint resolved.
    ///
    /// A world without active links yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`EchoError::Persistence`] if the store read fails.
    pub async fn neighbours(&self, world: WorldId) -> Result<Vec<Neighbour>, EchoError> {
        let connections = self.store.connections_touching(world, true).await?;
        Ok(resolve_neighbours(world, connections))
    }

    /// Every active link in the graph.
    ///
    /// # Errors
    ///
    /// Returns [`EchoError::Persistence`] if the store read fails.
    pub async fn all_active(&self) -> Result<Vec<Connection>, EchoError> {
        let mut connections = self.store.list_connections(true).await?;
        connections.retain(|c| c.is_active);
        Ok(connections)
    }
}

/// Keep the active links that touch `world` and pair each with its far side.
///
/// Inactive links are dropped here as well as in the store query; they are
/// never traversed.
pub fn resolve_neighbours(world: WorldId, connections: Vec<Connection>) -> Vec<Neighbour> {
    connections
        .into_iter()
        .filter(|c| c.is_active)
        .filter_map(|connection| {
            connection
                .other_endpoint(world)
                .map(|world_id| Neighbour {
                    connection,
                    world_id,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use bleed_types::ConnectionId;
    use rust_decimal::Decimal;

    use super::*;

    fn link(a: WorldId, b: WorldId, active: bool) -> Connection {
        Connection {
            id: ConnectionId::new(),
            endpoint_a: a,
            endpoint_b: b,
            connection_type: String::from("bleed"),
            vector_tags: BTreeSet::new(),
            strength: Decimal::ONE,
            description: None,
            is_active: active,
        }
    }

    #[test]
    fn resolves_far_side_in_both_roles() {
        let a = WorldId::new();
        let b = WorldId::new();
        let c = WorldId::new();

        let found = resolve_neighbours(a, vec![link(a, b, true), link(c, a, true)]);
        let targets: BTreeSet<WorldId> = found.iter().map(|n| n.world_id).collect();
        assert_eq!(targets, BTreeSet::from([b, c]));
    }

    #[test]
    fn inactive_and_foreign_links_are_skipped() {
        let a = WorldId::new();
        let b = WorldId::new();
        let found = resolve_neighbours(
            a,
            vec![link(a, b, false), link(b, WorldId::new(), true)],
        );
        assert!(found.is_empty());
    }
}
