//! The propagation facade.
//!
//! [`Propagator`] wires the generator, lifecycle, and aggregator over one
//! store and is the single entry point the HTTP layer and in-process
//! ingestion call. Propagating an event persists each candidate on its own:
//! a failed insert is reported next to the successful ones and never aborts
//! its siblings.

use std::sync::Arc;

use bleed_types::{
    Candidate, Connection, EchoId, EchoListFilter, EchoNotification, EchoPage, EchoRecord,
    EchoVector, EventId, MAX_IMPACT, MIN_IMPACT, MapView, SourceEvent, WorldId,
};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::aggregator::GraphAggregator;
use crate::candidates::{CandidateGenerator, next_depth, strength_in_range};
use crate::error::EchoError;
use crate::lifecycle::EchoLifecycle;
use crate::store::Store;

/// A candidate whose record could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCandidate {
    /// The candidate.
    pub candidate: Candidate,
    /// Error kind, as in [`EchoError::kind`].
    pub kind: &'static str,
    /// Error message.
    pub message: String,
}

/// Outcome of propagating one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    /// Records persisted in `pending`.
    pub created: Vec<EchoRecord>,
    /// Candidates whose persistence failed.
    pub failed: Vec<FailedCandidate>,
}

/// Operator-initiated propagation that bypasses eligibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualTrigger {
    /// Event to echo; must belong to the world the trigger is issued in.
    pub source_event_id: EventId,
    /// World the echo lands in.
    pub target_world_id: WorldId,
    /// Channel of the echo.
    pub vector: EchoVector,
    /// Strength in `[0, 1]`.
    pub strength: Decimal,
}

/// Propagation engine over one store.
pub struct Propagator<S: ?Sized> {
    store: Arc<S>,
    generator: CandidateGenerator<S>,
    lifecycle: EchoLifecycle<S>,
    aggregator: GraphAggregator<S>,
}

impl<S: Store + ?Sized> Propagator<S> {
    /// Build every component over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            generator: CandidateGenerator::new(Arc::clone(&store)),
            lifecycle: EchoLifecycle::new(Arc::clone(&store)),
            aggregator: GraphAggregator::new(Arc::clone(&store)),
            store,
        }
    }

    /// Subscribe to lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EchoNotification> {
        self.lifecycle.subscribe()
    }

    /// Evaluate `event` and persist one `pending` record per candidate.
    ///
    /// An ineligible event gives an empty report. Candidates are persisted
    /// concurrently.
    ///
    /// # Errors
    ///
    /// [`EchoError::Validation`] for an impact outside `1..=10`, an incoming
    /// `echo_strength` outside `[0, 1]`, or malformed settings;
    /// [`EchoError::Persistence`] if settings or connections cannot be read. Insert failures land in [`PropagationReport::failed`].
    pub async fn propagate(&self, event: &SourceEvent) -> Result<PropagationReport, EchoError> {
        if !event.impact_in_range() {
            return Err(EchoError::Validation(format!(
                "impact {} outside [{MIN_IMPACT}, {MAX_IMPACT}]",
                event.impact_level
            )));
        }
        if let Some(strength) = event
            .external_refs
            .echo_strength
            .filter(|s| !strength_in_range(*s))
        {
            return Err(EchoError::Validation(format!(
                "echo_strength {strength} outside [0, 1]"
            )));
        }

        let candidates = self.generator.generate(event, event.world_id).await?;
        let results = join_all(
            candidates
                .iter()
                .map(|candidate| self.lifecycle.create(event, candidate)),
        )
        .await;

        let mut report = PropagationReport::default();
        for (candidate, result) in candidates.into_iter().zip(results) {
            match result {
                Ok(record) => report.created.push(record),
                Err(e) => report.failed.push(FailedCandidate {
                    candidate,
                    kind: e.kind(),
                    message: e.to_string(),
                }),
            }
        }

        if !report.failed.is_empty() {
            warn!(
                event_id = %event.id,
                failed = report.failed.len(),
                "Some echo candidates could not be persisted"
            );
        }
        info!(
            event_id = %event.id,
            world_id = %event.world_id,
            created = report.created.len(),
            "Event propagated"
        );
        Ok(report)
    }

    /// Create one echo by operator request, without eligibility checks.
    ///
    /// # Errors
    ///
    /// [`EchoError::NotFound`] if the event is not in `world` or the target
    /// world does not exist; [`EchoError::Validation`] for a strength
    /// outside `[0, 1]`; [`EchoError::Persistence`] on store failure.
    pub async fn trigger(
        &self,
        world: WorldId,
        request: ManualTrigger,
    ) -> Result<EchoRecord, EchoError> {
        if !strength_in_range(request.strength) {
            return Err(EchoError::Validation(format!(
                "strength {} outside [0, 1]",
                request.strength
            )));
        }

        let (event, target) = tokio::try_join!(
            self.store.get_event(world, request.source_event_id),
            self.store.get_world(request.target_world_id),
        )?;
        let event = event.ok_or_else(|| EchoError::not_found("event", request.source_event_id))?;
        if target.is_none() {
            return Err(EchoError::not_found("world", request.target_world_id));
        }

        let candidate = Candidate {
            target_world_id: request.target_world_id,
            depth: next_depth(&event),
            connection_id: None,
            vector: request.vector,
            strength: request.strength,
        };
        info!(
            event_id = %event.id,
            target_world_id = %request.target_world_id,
            "Manual echo trigger"
        );
        self.lifecycle.create(&event, &candidate).await
    }

    /// A page of the echoes of one world.
    ///
    /// # Errors
    ///
    /// [`EchoError::Persistence`] on store failure.
    pub async fn list_for_world(&self, filter: &EchoListFilter) -> Result<EchoPage, EchoError> {
        self.store.list_echoes(filter).await
    }

    /// Every echo derived from one event of `world`.
    ///
    /// # Errors
    ///
    /// [`EchoError::Persistence`] on store failure.
    pub async fn list_for_event(
        &self,
        world: WorldId,
        event: EventId,
    ) -> Result<Vec<EchoRecord>, EchoError> {
        let mut records = self.store.echoes_for_event(event).await?;
        records.retain(|r| r.source_world_id == world);
        Ok(records)
    }

    /// Load one echo.
    ///
    /// # Errors
    ///
    /// [`EchoError::NotFound`] if absent.
    pub async fn get(&self, id: EchoId) -> Result<EchoRecord, EchoError> {
        self.lifecycle.get(id).await
    }

    /// Approve a pending echo.
    ///
    /// # Errors
    ///
    /// See [`EchoLifecycle::approve`].
    pub async fn approve(&self, id: EchoId) -> Result<EchoRecord, EchoError> {
        self.lifecycle.approve(id).await
    }

    /// Reject a pending echo.
    ///
    /// # Errors
    ///
    /// See [`EchoLifecycle::reject`].
    pub async fn reject(&self, id: EchoId) -> Result<EchoRecord, EchoError> {
        self.lifecycle.reject(id).await
    }

    /// Record the event an approved echo produced.
    ///
    /// # Errors
    ///
    /// See [`EchoLifecycle::complete`].
    pub async fn complete(
        &self,
        id: EchoId,
        target_event_id: EventId,
    ) -> Result<EchoRecord, EchoError> {
        self.lifecycle.complete(id, target_event_id).await
    }

    /// The aggregated map view.
    ///
    /// # Errors
    ///
    /// [`EchoError::Persistence`] on store failure.
    pub async fn map_view(&self) -> Result<MapView, EchoError> {
        self.aggregator.build_map_view().await
    }

    /// Every connection, active or not.
    ///
    /// # Errors
    ///
    /// [`EchoError::Persistence`] on store failure.
    pub async fn connections(&self) -> Result<Vec<Connection>, EchoError> {
        self.store.list_connections(false).await
    }
}
