//! Echo lifecycle state machine.
//!
//! ```text
//! pending ──approve──▶ generating ──complete──▶ completed
//!    │
//!    └──reject──▶ rejected
//! ```
//!
//! Every transition is one conditional write on the store. When two callers
//! race on the same record exactly one write applies; the other gets
//! [`EchoError::InvalidStateTransition`] naming the status it lost to.
//! Successful writes are announced on a broadcast channel; having no
//! subscribers, or slow ones, never fails a write.

use std::sync::Arc;

use bleed_types::{
    Candidate, EchoId, EchoNotification, EchoRecord, EchoStatus, EventId, NotificationKind,
    SourceEvent,
};
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::error::EchoError;
use crate::store::{EchoStore, TransitionOutcome};

/// Capacity of the notification channel.
///
/// A subscriber more than this many notifications behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
pub const NOTIFICATION_CAPACITY: usize = 256;

/// Creates echo records and drives their transitions.
pub struct EchoLifecycle<S: ?Sized> {
    store: Arc<S>,
    tx: broadcast::Sender<EchoNotification>,
}

impl<S: ?Sized> Clone for EchoLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tx: self.tx.clone(),
        }
    }
}

impl<S: EchoStore + ?Sized> EchoLifecycle<S> {
    /// Create a lifecycle over `store` with a fresh notification channel.
    pub fn new(store: Arc<S>) -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self { store, tx }
    }

    /// Subscribe to lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EchoNotification> {
        self.tx.subscribe()
    }

    /// Persist a `pending` record for `candidate`.
    ///
    /// # Errors
    ///
    /// [`EchoError::Validation`] for a strength outside `[0, 1]` or a zero
    /// depth; [`EchoError::Persistence`] if the insert fails. Nothing is
    /// retried.
    pub async fn create(
        &self,
        source: &SourceEvent,
        candidate: &Candidate,
    ) -> Result<EchoRecord, EchoError> {
        if candidate.strength < Decimal::ZERO || candidate.strength > Decimal::ONE {
            return Err(EchoError::Validation(format!(
                "strength {} outside [0, 1]",
                candidate.strength
            )));
        }
        if candidate.depth == 0 {
            return Err(EchoError::Validation(String::from("depth must be at least 1")));
        }

        let now = Utc::now();
        let record = EchoRecord {
            id: EchoId::new(),
            source_event_id: source.id,
            source_world_id: source.world_id,
            target_world_id: candidate.target_world_id,
            target_event_id: None,
            vector: candidate.vector,
            strength: candidate.strength,
            depth: candidate.depth,
            root_event_id: Some(source.root_event_id()),
            status: EchoStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert_echo(&record).await.inspect_err(|e| {
            warn!(
                source_event_id = %source.id,
                target_world_id = %candidate.target_world_id,
                error = %e,
                "Failed to persist echo"
            );
        })?;

        info!(
            echo_id = %stored.id,
            source_world_id = %stored.source_world_id,
            target_world_id = %stored.target_world_id,
            vector = %stored.vector,
            depth = stored.depth,
            "Echo created"
        );
        self.notify(NotificationKind::Created, &stored);
        Ok(stored)
    }

    /// Load one record.
    ///
    /// # Errors
    ///
    /// [`EchoError::NotFound`] if absent.
    pub async fn get(&self, id: EchoId) -> Result<EchoRecord, EchoError> {
        self.store
            .get_echo(id)
            .await?
            .ok_or_else(|| EchoError::not_found("echo", id))
    }

    /// Move a `pending` echo to `generating`.
    ///
    /// # Errors
    ///
    /// [`EchoError::NotFound`] if absent,
    /// [`EchoError::InvalidStateTransition`] if not `pending`.
    pub async fn approve(&self, id: EchoId) -> Result<EchoRecord, EchoError> {
        let record = self
            .transition(id, EchoStatus::Pending, EchoStatus::Generating, None)
            .await?;
        self.notify(NotificationKind::Approved, &record);
        Ok(record)
    }

    /// Move a `pending` echo to `rejected`.
    ///
    /// # Errors
    ///
    /// [`EchoError::NotFound`] if absent,
    /// [`EchoError::InvalidStateTransition`] if not `pending`.
    pub async fn reject(&self, id: EchoId) -> Result<EchoRecord, EchoError> {
        let record = self
            .transition(id, EchoStatus::Pending, EchoStatus::Rejected, None)
            .await?;
        self.notify(NotificationKind::Rejected, &record);
        Ok(record)
    }

    /// Move a `generating` echo to `completed`, recording the event it
    /// produced in the target world.
    ///
    /// # Errors
    ///
    /// [`EchoError::NotFound`] if absent,
    /// [`EchoError::InvalidStateTransition`] if not `generating`.
    pub async fn complete(
        &self,
        id: EchoId,
        target_event_id: EventId,
    ) -> Result<EchoRecord, EchoError> {
        let record = self
            .transition(
                id,
                EchoStatus::Generating,
                EchoStatus::Completed,
                Some(target_event_id),
            )
            .await?;
        self.notify(NotificationKind::Completed, &record);
        Ok(record)
    }

    async fn transition(
        &self,
        id: EchoId,
        from: EchoStatus,
        to: EchoStatus,
        target_event_id: Option<EventId>,
    ) -> Result<EchoRecord, EchoError> {
        if !from.can_transition_to(to) {
            return Err(EchoError::Validation(format!(
                "no transition from {from} to {to}"
            )));
        }
        match self
            .store
            .transition_echo(id, from, to, target_event_id)
            .await?
        {
            TransitionOutcome::Applied(record) => {
                info!(echo_id = %id, %from, %to, "Echo status changed");
                Ok(record)
            }
            TransitionOutcome::Conflict(current) => Err(EchoError::InvalidStateTransition {
                id,
                current,
                attempted: to,
            }),
            TransitionOutcome::Missing => Err(EchoError::not_found("echo", id)),
        }
    }

    fn notify(&self, kind: NotificationKind, echo: &EchoRecord) {
        // Err only means there are no subscribers right now.
        let _ = self.tx.send(EchoNotification {
            kind,
            echo: echo.clone(),
        });
    }
}
