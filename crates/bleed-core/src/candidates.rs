//! Candidate generation: where would an eligible event echo to?
//!
//! One candidate per active connection touching the source world. The far
//! endpoint is the target, the depth is one more than the event's own depth,
//! and the strength is the link's strength scaled by the strength the event
//! arrived with. No deduplication: two links to the same world give two
//! candidates.

use std::sync::Arc;

use bleed_types::{Candidate, Connection, SourceEvent, WorldId};
use rust_decimal::Decimal;
use tracing::debug;

use crate::eligibility;
use crate::error::EchoError;
use crate::graph::{ConnectionGraph, Neighbour};
use crate::settings::PropagationSettings;
use crate::store::{ConnectionStore, SettingsStore};

/// Walks the connection graph from a source world.
pub struct CandidateGenerator<S: ?Sized> {
    store: Arc<S>,
    graph: ConnectionGraph<S>,
}

impl<S: ?Sized> Clone for CandidateGenerator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            graph: self.graph.clone(),
        }
    }
}

impl<S: SettingsStore + ConnectionStore + ?Sized> CandidateGenerator<S> {
    /// Create a generator reading settings and connections from `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            graph: ConnectionGraph::new(Arc::clone(&store)),
            store,
        }
    }

    /// Load the typed settings of `world`.
    ///
    /// # Errors
    ///
    /// [`EchoError::Validation`] for a malformed value,
    /// [`EchoError::Persistence`] if the read fails.
    pub async fn settings_for(&self, world: WorldId) -> Result<PropagationSettings, EchoError> {
        let entries = self.store.settings_entries(world).await?;
        PropagationSettings::from_entries(&entries)
    }

    /// Candidates for `event`, using the settings of `source_world`.
    ///
    /// An ineligible event yields an empty list.
    ///
    /// # Errors
    ///
    /// Propagates settings and connection read failures.
    pub async fn generate(
        &self,
        event: &SourceEvent,
        source_world: WorldId,
    ) -> Result<Vec<Candidate>, EchoError> {
        let settings = self.settings_for(source_world).await?;
        self.generate_with(event, &settings, source_world).await
    }

    /// Candidates for `event` under already-loaded settings.
    ///
    /// # Errors
    ///
    /// Propagates connection read failures; [`EchoError::Validation`] if a
    /// candidate strength cannot be derived.
    pub async fn generate_with(
        &self,
        event: &SourceEvent,
        settings: &PropagationSettings,
        source_world: WorldId,
    ) -> Result<Vec<Candidate>, EchoError> {
        if !eligibility::evaluate(event, settings) {
            return Ok(Vec::new());
        }

        let neighbours = self.graph.neighbours(source_world).await?;
        let candidates = candidates_from(event, &neighbours)?;
        debug!(
            event_id = %event.id,
            world_id = %source_world,
            count = candidates.len(),
            "Generated echo candidates"
        );
        Ok(candidates)
    }
}

/// Depth an echo of `event` would carry.
pub fn next_depth(event: &SourceEvent) -> u32 {
    event
        .prior_depth()
        .map_or(1, |depth| depth.saturating_add(1))
}

/// Whether `strength` lies in `[0, 1]`.
pub fn strength_in_range(strength: Decimal) -> bool {
    (Decimal::ZERO..=Decimal::ONE).contains(&strength)
}

/// Strength of an echo of `event` crossing `connection`.
///
/// The link strength scaled by the strength the event arrived with (1 when
/// it carries none).
///
/// # Errors
///
/// [`EchoError::Validation`] if either factor or the product falls outside
/// `[0, 1]`, or the product overflows.
pub fn derive_strength(
    connection: &Connection,
    event: &SourceEvent,
) -> Result<Decimal, EchoError> {
    let incoming = event.external_refs.echo_strength.unwrap_or(Decimal::ONE);
    if !strength_in_range(incoming) {
        return Err(EchoError::Validation(format!(
            "event {} echo_strength {incoming} outside [0, 1]",
            event.id
        )));
    }
    if !strength_in_range(connection.strength) {
        return Err(EchoError::Validation(format!(
            "connection {} strength {} outside [0, 1]",
            connection.id, connection.strength
        )));
    }
    connection
        .strength
        .checked_mul(incoming)
        .filter(|s| strength_in_range(*s))
        .ok_or_else(|| {
            EchoError::Validation(format!(
                "strength {} x {incoming} is not a valid echo strength",
                connection.strength
            ))
        })
}

/// One candidate per neighbour.
///
/// # Errors
///
/// The first [`derive_strength`] failure.
pub fn candidates_from(
    event: &SourceEvent,
    neighbours: &[Neighbour],
) -> Result<Vec<Candidate>, EchoError> {
    let depth = next_depth(event);
    neighbours
        .iter()
        .map(|n| {
            Ok(Candidate {
                target_world_id: n.world_id,
                depth,
                connection_id: Some(n.connection.id),
                vector: n.connection.primary_vector(),
                strength: derive_strength(&n.connection, event)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use bleed_types::{BLEED_DATA_SOURCE, ConnectionId, EchoVector, EventId, ExternalRefs};

    use super::*;
    use crate::graph::resolve_neighbours;
    use crate::memory::InMemoryStore;
    use crate::settings::{KEY_BLEED_ENABLED, KEY_MAX_DEPTH, KEY_MIN_IMPACT};

    fn link(a: WorldId, b: WorldId, strength: Decimal) -> Connection {
        Connection {
            id: ConnectionId::new(),
            endpoint_a: a,
            endpoint_b: b,
            connection_type: String::from("bleed"),
            vector_tags: BTreeSet::from([EchoVector::Dream]),
            strength,
            description: None,
            is_active: true,
        }
    }

    fn event(world: WorldId, impact: i32) -> SourceEvent {
        SourceEvent {
            id: EventId::new(),
            world_id: world,
            impact_level: impact,
            data_source: None,
            external_refs: ExternalRefs::default(),
            campaign_id: None,
        }
    }

    async fn enable(store: &InMemoryStore, world: WorldId) {
        store.set_setting(world, KEY_BLEED_ENABLED, true).await;
        store.set_setting(world, KEY_MIN_IMPACT, 5).await;
        store.set_setting(world, KEY_MAX_DEPTH, 2).await;
    }

    #[test]
    fn depth_follows_prior_depth() {
        let w = WorldId::new();
        assert_eq!(next_depth(&event(w, 8)), 1);

        let mut echo = event(w, 8);
        echo.data_source = Some(String::from(BLEED_DATA_SOURCE));
        assert_eq!(next_depth(&echo), 1);

        echo.external_refs.echo_depth = Some(3);
        assert_eq!(next_depth(&echo), 4);
    }

    #[test]
    fn strength_scales_with_incoming_strength() {
        let a = WorldId::new();
        let c = link(a, WorldId::new(), Decimal::new(8, 1));
        let mut e = event(a, 9);
        assert_eq!(derive_strength(&c, &e).ok(), Some(Decimal::new(8, 1)));

        e.external_refs.echo_strength = Some(Decimal::new(5, 1));
        assert_eq!(derive_strength(&c, &e).ok(), Some(Decimal::new(40, 2)));
    }

    #[test]
    fn out_of_range_strengths_are_validation_errors() {
        let a = WorldId::new();
        let half = link(a, WorldId::new(), Decimal::new(5, 1));
        let mut e = event(a, 9);
        for bad in [Decimal::from(40), Decimal::from(-3)] {
            e.external_refs.echo_strength = Some(bad);
            assert!(matches!(
                derive_strength(&half, &e),
                Err(EchoError::Validation(_))
            ));
        }

        e.external_refs.echo_strength = None;
        let over = link(a, WorldId::new(), Decimal::from(3));
        assert!(matches!(
            derive_strength(&over, &e),
            Err(EchoError::Validation(_))
        ));
    }

    #[test]
    fn overflowing_product_is_an_error_not_a_default() {
        let a = WorldId::new();
        let huge = link(a, WorldId::new(), Decimal::MAX);
        let mut e = event(a, 9);
        e.external_refs.echo_strength = Some(Decimal::MAX);
        assert!(matches!(
            derive_strength(&huge, &e),
            Err(EchoError::Validation(_))
        ));
    }

    #[test]
    fn candidates_cover_both_endpoint_roles() {
        let a = WorldId::new();
        let b = WorldId::new();
        let c = WorldId::new();
        let links = vec![link(a, b, Decimal::ONE), link(c, a, Decimal::ONE)];
        let candidates = candidates_from(&event(a, 9), &resolve_neighbours(a, links));
        let candidates = candidates.unwrap_or_default();
        let targets: BTreeSet<WorldId> = candidates.iter().map(|c| c.target_world_id).collect();
        assert_eq!(targets, BTreeSet::from([b, c]));
        assert!(candidates.iter().all(|c| c.vector == EchoVector::Dream));
    }

    #[tokio::test]
    async fn direct_echo_reaches_linked_world() {
        let store = Arc::new(InMemoryStore::new());
        let a = WorldId::new();
        let b = WorldId::new();
        enable(&store, a).await;
        store.add_connection(link(a, b, Decimal::ONE)).await;

        let generator = CandidateGenerator::new(Arc::clone(&store));
        let candidates = generator.generate(&event(a, 8), a).await;
        let pairs: Option<Vec<(WorldId, u32)>> = candidates
            .ok()
            .map(|cs| cs.iter().map(|c| (c.target_world_id, c.depth)).collect());
        assert_eq!(pairs, Some(vec![(b, 1)]));
    }

    #[tokio::test]
    async fn disabled_world_generates_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let a = WorldId::new();
        store.add_connection(link(a, WorldId::new(), Decimal::ONE)).await;

        let generator = CandidateGenerator::new(Arc::clone(&store));
        let candidates = generator.generate(&event(a, 10), a).await;
        assert_eq!(candidates.ok().map(|c| c.len()), Some(0));
    }

    #[tokio::test]
    async fn isolated_world_generates_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let a = WorldId::new();
        enable(&store, a).await;

        let generator = CandidateGenerator::new(Arc::clone(&store));
        let candidates = generator.generate(&event(a, 10), a).await;
        assert_eq!(candidates.ok().map(|c| c.len()), Some(0));
    }

    #[tokio::test]
    async fn duplicate_links_are_not_deduplicated() {
        let store = Arc::new(InMemoryStore::new());
        let a = WorldId::new();
        let b = WorldId::new();
        enable(&store, a).await;
        store.add_connection(link(a, b, Decimal::ONE)).await;
        store.add_connection(link(b, a, Decimal::ONE)).await;

        let generator = CandidateGenerator::new(Arc::clone(&store));
        let candidates = generator.generate(&event(a, 9), a).await;
        assert_eq!(candidates.ok().map(|c| c.len()), Some(2));
    }
}
