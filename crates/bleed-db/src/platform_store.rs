//! Read-side operations on `world_settings` and `world_events`.
//!
//! Both tables belong to the surrounding platform. Settings rows are
//! returned untyped; [`PropagationSettings::from_entries`] interprets them.
//!
//! [`PropagationSettings::from_entries`]: bleed_core::PropagationSettings::from_entries

use bleed_core::SettingEntry;
use bleed_types::{CampaignId, EventId, ExternalRefs, SourceEvent, WorldId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `world_settings` table.
pub struct SettingsTable<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsTable<'a> {
    /// Bind to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every settings row of `world`.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if the query fails.
    pub async fn entries(&self, world: WorldId) -> Result<Vec<SettingEntry>, DbError> {
        let rows: Vec<(String, serde_json::Value)> =
            sqlx::query_as("SELECT key, value FROM world_settings WHERE world_id = $1 ORDER BY key")
                .bind(world.into_inner())
                .fetch_all(self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(key, value)| SettingEntry { key, value })
            .collect())
    }
}

/// Operations on the `world_events` table.
pub struct EventTable<'a> {
    pool: &'a PgPool,
}

impl<'a> EventTable<'a> {
    /// Bind to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One event of `world`.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if the query fails, [`DbError::Serialization`]
    /// if `external_refs` has the wrong shape.
    pub async fn get(&self, world: WorldId, id: EventId) -> Result<Option<SourceEvent>, DbError> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, world_id, impact_level, data_source, external_refs, campaign_id
             FROM world_events
             WHERE id = $1 AND world_id = $2",
        )
        .bind(id.into_inner())
        .bind(world.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(SourceEvent::try_from).transpose()
    }
}

/// A row from the `world_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Event ID.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Impact, 1 to 10.
    pub impact_level: i32,
    /// Origin tag.
    pub data_source: Option<String>,
    /// Propagation bookkeeping as JSON.
    pub external_refs: serde_json::Value,
    /// Amplifying campaign.
    pub campaign_id: Option<Uuid>,
}

impl TryFrom<EventRow> for SourceEvent {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let external_refs: ExternalRefs = if row.external_refs.is_null() {
            ExternalRefs::default()
        } else {
            serde_json::from_value(row.external_refs)?
        };
        Ok(Self {
            id: EventId::from(row.id),
            world_id: WorldId::from(row.world_id),
            impact_level: row.impact_level,
            data_source: row.data_source,
            external_refs,
            campaign_id: row.campaign_id.map(CampaignId::from),
        })
    }
}
