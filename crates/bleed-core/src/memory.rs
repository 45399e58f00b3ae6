//! In-memory implementation of every store trait.
//!
//! Backs the unit tests, the HTTP tests, and the `memory` store backend of
//! the server. State sits behind `tokio::sync::RwLock`s; a status transition
//! is a compare-and-set performed while holding the echo write lock, which
//! gives the same single-winner guarantee as the conditional `UPDATE` of
//! the `PostgreSQL` store.

#[cfg(test)]
use std::collections::HashSet;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bleed_types::{
    Connection, EchoDirection, EchoId, EchoListFilter, EchoPage, EchoRecord, EchoStatus, EventId,
    SourceEvent, WorldId, WorldNode,
};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::EchoError;
use crate::settings::SettingEntry;
use crate::store::{
    ConnectionStore, EchoStore, EventStore, SettingsStore, TransitionOutcome, WorldStore,
};

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    worlds: RwLock<BTreeMap<WorldId, WorldNode>>,
    connections: RwLock<Vec<Connection>>,
    events: RwLock<HashMap<EventId, SourceEvent>>,
    settings: RwLock<HashMap<WorldId, Vec<SettingEntry>>>,
    echoes: RwLock<BTreeMap<EchoId, EchoRecord>>,
    #[cfg(test)]
    failing_targets: RwLock<HashSet<WorldId>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a world.
    pub async fn add_world(&self, world: WorldNode) {
        self.worlds.write().await.insert(world.id, world);
    }

    /// Add a connection.
    pub async fn add_connection(&self, connection: Connection) {
        self.connections.write().await.push(connection);
    }

    /// Add or replace an event.
    pub async fn add_event(&self, event: SourceEvent) {
        self.events.write().await.insert(event.id, event);
    }

    /// Set one settings key of `world`, replacing any earlier value.
    pub async fn set_setting(&self, world: WorldId, key: &str, value: impl Into<Value>) {
        let mut settings = self.settings.write().await;
        let rows = settings.entry(world).or_default();
        rows.retain(|row| row.key != key);
        rows.push(SettingEntry::new(key, value));
    }

    /// Make every later insert of an echo targeting `world` fail.
    #[cfg(test)]
    pub(crate) async fn fail_inserts_for(&self, world: WorldId) {
        self.failing_targets.write().await.insert(world);
    }
}

#[async_trait]
impl WorldStore for InMemoryStore {
    async fn list_worlds(&self) -> Result<Vec<WorldNode>, EchoError> {
        Ok(self.worlds.read().await.values().cloned().collect())
    }

    async fn get_world(&self, id: WorldId) -> Result<Option<WorldNode>, EchoError> {
        Ok(self.worlds.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn get_event(
        &self,
        world: WorldId,
        id: EventId,
    ) -> Result<Option<SourceEvent>, EchoError> {
        Ok(self
            .events
            .read()
            .await
            .get(&id)
            .filter(|e| e.world_id == world)
            .cloned())
    }
}

#[async_trait]
impl SettingsStore for InMemoryStore {
    async fn settings_entries(&self, world: WorldId) -> Result<Vec<SettingEntry>, EchoError> {
        Ok(self
            .settings
            .read()
            .await
            .get(&world)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ConnectionStore for InMemoryStore {
    async fn connections_touching(
        &self,
        world: WorldId,
        active_only: bool,
    ) -> Result<Vec<Connection>, EchoError> {
        Ok(self
            .connections
            .read()
            .await
            .iter()
            .filter(|c| c.touches(world) && (c.is_active || !active_only))
            .cloned()
            .collect())
    }

    async fn list_connections(&self, active_only: bool) -> Result<Vec<Connection>, EchoError> {
        Ok(self
            .connections
            .read()
            .await
            .iter()
            .filter(|c| c.is_active || !active_only)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EchoStore for InMemoryStore {
    async fn insert_echo(&self, record: &EchoRecord) -> Result<EchoRecord, EchoError> {
        #[cfg(test)]
        if self
            .failing_targets
            .read()
            .await
            .contains(&record.target_world_id)
        {
            return Err(EchoError::Persistence(format!(
                "insert rejected for target world {}",
                record.target_world_id
            )));
        }

        let mut echoes = self.echoes.write().await;
        if echoes.contains_key(&record.id) {
            return Err(EchoError::Persistence(format!(
                "duplicate echo id {}",
                record.id
            )));
        }
        echoes.insert(record.id, record.clone());
        Ok(record.clone())
    }

    async fn get_echo(&self, id: EchoId) -> Result<Option<EchoRecord>, EchoError> {
        Ok(self.echoes.read().await.get(&id).cloned())
    }

    async fn transition_echo(
        &self,
        id: EchoId,
        from: EchoStatus,
        to: EchoStatus,
        target_event_id: Option<EventId>,
    ) -> Result<TransitionOutcome, EchoError> {
        let mut echoes = self.echoes.write().await;
        let Some(record) = echoes.get_mut(&id) else {
            return Ok(TransitionOutcome::Missing);
        };
        if record.status != from {
            return Ok(TransitionOutcome::Conflict(record.status));
        }

        record.status = to;
        record.updated_at = Utc::now();
        if target_event_id.is_some() {
            record.target_event_id = target_event_id;
        }
        Ok(TransitionOutcome::Applied(record.clone()))
    }

    async fn list_echoes(&self, filter: &EchoListFilter) -> Result<EchoPage, EchoError> {
        let echoes = self.echoes.read().await;
        let mut matching: Vec<&EchoRecord> = echoes
            .values()
            .filter(|r| match filter.direction {
                EchoDirection::Incoming => r.target_world_id == filter.world_id,
                EchoDirection::Outgoing => r.source_world_id == filter.world_id,
            })
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(filter.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.limit).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(EchoPage {
            items,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    async fn echoes_for_event(&self, event: EventId) -> Result<Vec<EchoRecord>, EchoError> {
        let mut records: Vec<EchoRecord> = self
            .echoes
            .read()
            .await
            .values()
            .filter(|r| r.source_event_id == event)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn count_by_target(&self) -> Result<BTreeMap<WorldId, u64>, EchoError> {
        let mut counts = BTreeMap::new();
        for record in self.echoes.read().await.values() {
            let count: &mut u64 = counts.entry(record.target_world_id).or_default();
            *count = count.saturating_add(1);
        }
        Ok(counts)
    }
}
