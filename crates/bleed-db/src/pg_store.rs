//! The core store traits over a `PostgreSQL` pool.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bleed_core::{
    ConnectionStore, EchoError, EchoStore, EventStore, SettingEntry, SettingsStore,
    TransitionOutcome, WorldStore,
};
use bleed_types::{
    Connection, EchoId, EchoListFilter, EchoPage, EchoRecord, EchoStatus, EventId, SourceEvent,
    WorldId, WorldNode,
};

use crate::echo_store::EchoTable;
use crate::graph_store::{ConnectionTable, WorldTable};
use crate::platform_store::{EventTable, SettingsTable};
use crate::postgres::PostgresPool;

/// Implements every core store trait with `PostgreSQL` queries.
#[derive(Clone)]
pub struct PgStore {
    pool: PostgresPool,
}

impl PgStore {
    /// Wrap a connected pool.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    /// The wrapped pool.
    pub const fn pool(&self) -> &PostgresPool {
        &self.pool
    }
}

#[async_trait]
impl WorldStore for PgStore {
    async fn list_worlds(&self) -> Result<Vec<WorldNode>, EchoError> {
        Ok(WorldTable::new(self.pool.pool()).list().await?)
    }

    async fn get_world(&self, id: WorldId) -> Result<Option<WorldNode>, EchoError> {
        Ok(WorldTable::new(self.pool.pool()).get(id).await?)
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn get_event(
        &self,
        world: WorldId,
        id: EventId,
    ) -> Result<Option<SourceEvent>, EchoError> {
        Ok(EventTable::new(self.pool.pool()).get(world, id).await?)
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn settings_entries(&self, world: WorldId) -> Result<Vec<SettingEntry>, EchoError> {
        Ok(SettingsTable::new(self.pool.pool()).entries(world).await?)
    }
}

#[async_trait]
impl ConnectionStore for PgStore {
    async fn connections_touching(
        &self,
        world: WorldId,
        active_only: bool,
    ) -> Result<Vec<Connection>, EchoError> {
        Ok(ConnectionTable::new(self.pool.pool())
            .touching(world, active_only)
            .await?)
    }

    async fn list_connections(&self, active_only: bool) -> Result<Vec<Connection>, EchoError> {
        Ok(ConnectionTable::new(self.pool.pool()).list(active_only).await?)
    }
}

#[async_trait]
impl EchoStore for PgStore {
    async fn insert_echo(&self, record: &EchoRecord) -> Result<EchoRecord, EchoError> {
        Ok(EchoTable::new(self.pool.pool()).insert(record).await?)
    }

    async fn get_echo(&self, id: EchoId) -> Result<Option<EchoRecord>, EchoError> {
        Ok(EchoTable::new(self.pool.pool()).get(id).await?)
    }

    async fn transition_echo(
        &self,
        id: EchoId,
        from: EchoStatus,
        to: EchoStatus,
        target_event_id: Option<EventId>,
    ) -> Result<TransitionOutcome, EchoError> {
        Ok(EchoTable::new(self.pool.pool())
            .transition(id, from, to, target_event_id)
            .await?)
    }

    async fn list_echoes(&self, filter: &EchoListFilter) -> Result<EchoPage, EchoError> {
        Ok(EchoTable::new(self.pool.pool()).list(filter).await?)
    }

    async fn echoes_for_event(&self, event: EventId) -> Result<Vec<EchoRecord>, EchoError> {
        Ok(EchoTable::new(self.pool.pool()).for_event(event).await?)
    }

    async fn count_by_target(&self) -> Result<BTreeMap<WorldId, u64>, EchoError> {
        Ok(EchoTable::new(self.pool.pool()).count_by_target().await?)
    }
}
