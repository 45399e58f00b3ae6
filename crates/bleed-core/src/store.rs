//! Repository traits the core reads and writes through.
//!
//! The core owns no durable state. Worlds, events, settings, and connections
//! are read from the surrounding platform; echo records are written through
//! [`EchoStore`]. Two implementations live in this workspace: the
//! [`InMemoryStore`](crate::memory::InMemoryStore) and the `PostgreSQL`
//! store in `bleed-db`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bleed_types::{
    Connection, EchoId, EchoListFilter, EchoPage, EchoRecord, EchoStatus, EventId, SourceEvent,
    WorldId, WorldNode,
};

use crate::error::EchoError;
use crate::settings::SettingEntry;

/// Read access to the worlds of the platform.
#[async_trait]
pub trait WorldStore: Send + Sync {
    /// Every world, in a stable order.
    async fn list_worlds(&self) -> Result<Vec<WorldNode>, EchoError>;

    /// One world, or `None` if it does not exist.
    async fn get_world(&self, id: WorldId) -> Result<Option<WorldNode>, EchoError>;
}

/// Read access to the narrative events of the platform.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// An event belonging to `world`, or `None` if it is absent there.
    async fn get_event(
        &self,
        world: WorldId,
        id: EventId,
    ) -> Result<Option<SourceEvent>, EchoError>;
}

/// Read access to per-world settings rows.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// All settings rows of `world`; an unconfigured world yields none.
    async fn settings_entries(&self, world: WorldId) -> Result<Vec<SettingEntry>, EchoError>;
}

/// Read access to the connection graph.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Connections with `world` in either endpoint role.
    async fn connections_touching(
        &self,
        world: WorldId,
        active_only: bool,
    ) -> Result<Vec<Connection>, EchoError>;

    /// Every connection in the graph.
    async fn list_connections(&self, active_only: bool) -> Result<Vec<Connection>, EchoError>;
}

/// Result of a conditional status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The record was in the expected state and now holds the new one.
    Applied(EchoRecord),
    /// The record exists but was in this other state; nothing was written.
    Conflict(EchoStatus),
    /// No record with that ID.
    Missing,
}

/// Persistence of echo records.
#[async_trait]
pub trait EchoStore: Send + Sync {
    /// Persist a new record.
    async fn insert_echo(&self, record: &EchoRecord) -> Result<EchoRecord, EchoError>;

    /// Load one record.
    async fn get_echo(&self, id: EchoId) -> Result<Option<EchoRecord>, EchoError>;

    /// Atomically move `id` from `from` to `to`.
    ///
    /// Implementations must perform a single conditional write guarded on
    /// the current status (compare-and-swap). `target_event_id`, when given,
    /// is recorded in the same write.
    async fn transition_echo(
        &self,
        id: EchoId,
        from: EchoStatus,
        to: EchoStatus,
        target_event_id: Option<EventId>,
    ) -> Result<TransitionOutcome, EchoError>;

    /// A page of the echoes of one world, newest first.
    async fn list_echoes(&self, filter: &EchoListFilter) -> Result<EchoPage, EchoError>;

    /// Every echo derived from one source event, newest first.
    async fn echoes_for_event(&self, event: EventId) -> Result<Vec<EchoRecord>, EchoError>;

    /// Echo counts grouped by target world, across all statuses.
    async fn count_by_target(&self) -> Result<BTreeMap<WorldId, u64>, EchoError>;
}

/// Everything the propagation core needs from its collaborators.
pub trait Store: WorldStore + EventStore + SettingsStore + ConnectionStore + EchoStore {}

impl<T> Store for T where T: WorldStore + EventStore + SettingsStore + ConnectionStore + EchoStore {}
