//! Operations on the `event_echoes` table.
//!
//! Status transitions are a single `UPDATE ... WHERE id = $1 AND status =
//! $2 RETURNING`, so concurrent approve/reject calls on one record cannot
//! both apply. The follow-up `SELECT` only classifies a miss as an absent
//! record or a status conflict; it never writes.

use std::collections::BTreeMap;

use bleed_core::TransitionOutcome;
use bleed_types::{
    EchoDirection, EchoId, EchoListFilter, EchoPage, EchoRecord, EchoStatus, EventId, WorldId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

const ECHO_COLUMNS: &str = "id, source_event_id, source_world_id, target_world_id, target_event_id, \
     vector, strength, depth, root_event_id, status, created_at, updated_at";

/// Operations on the `event_echoes` table.
pub struct EchoTable<'a> {
    pool: &'a PgPool,
}

impl<'a> EchoTable<'a> {
    /// Bind to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if the insert fails (including check and
    /// foreign-key violations).
    pub async fn insert(&self, record: &EchoRecord) -> Result<EchoRecord, DbError> {
        let depth = i32::try_from(record.depth)
            .map_err(|e| DbError::Decode(format!("depth {}: {e}", record.depth)))?;
        let row = sqlx::query_as::<_, EchoRow>(&format!(
            "INSERT INTO event_echoes ({ECHO_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {ECHO_COLUMNS}"
        ))
        .bind(record.id.into_inner())
        .bind(record.source_event_id.into_inner())
        .bind(record.source_world_id.into_inner())
        .bind(record.target_world_id.into_inner())
        .bind(record.target_event_id.map(EventId::into_inner))
        .bind(record.vector.as_str())
        .bind(record.strength)
        .bind(depth)
        .bind(record.root_event_id.map(EventId::into_inner))
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(echo_id = %record.id, "Inserted echo");
        row.try_into()
    }

    /// Load one record.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if the query fails, [`DbError::Decode`] for a
    /// row the domain types reject.
    pub async fn get(&self, id: EchoId) -> Result<Option<EchoRecord>, DbError> {
        let row = sqlx::query_as::<_, EchoRow>(&format!(
            "SELECT {ECHO_COLUMNS} FROM event_echoes WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(EchoRecord::try_from).transpose()
    }

    /// Conditionally move `id` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if a query fails.
    pub async fn transition(
        &self,
        id: EchoId,
        from: EchoStatus,
        to: EchoStatus,
        target_event_id: Option<EventId>,
    ) -> Result<TransitionOutcome, DbError> {
        let updated = sqlx::query_as::<_, EchoRow>(&format!(
            "UPDATE event_echoes
             SET status = $3,
                 target_event_id = COALESCE($4, target_event_id),
                 updated_at = now()
             WHERE id = $1 AND status = $2
             RETURNING {ECHO_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(target_event_id.map(EventId::into_inner))
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(TransitionOutcome::Applied(row.try_into()?));
        }

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM event_echoes WHERE id = $1")
                .bind(id.into_inner())
                .fetch_optional(self.pool)
                .await?;

        match current {
            Some(status) => Ok(TransitionOutcome::Conflict(parse_status(&status)?)),
            None => Ok(TransitionOutcome::Missing),
        }
    }

    /// A page of the echoes of one world, newest first.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if a query fails.
    pub async fn list(&self, filter: &EchoListFilter) -> Result<EchoPage, DbError> {
        let world_column = match filter.direction {
            EchoDirection::Incoming => "target_world_id",
            EchoDirection::Outgoing => "source_world_id",
        };
        let status = filter.status.map(EchoStatus::as_str);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM event_echoes
             WHERE {world_column} = $1 AND ($2::TEXT IS NULL OR status = $2)"
        ))
        .bind(filter.world_id.into_inner())
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, EchoRow>(&format!(
            "SELECT {ECHO_COLUMNS} FROM event_echoes
             WHERE {world_column} = $1 AND ($2::TEXT IS NULL OR status = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(filter.world_id.into_inner())
        .bind(status)
        .bind(i64::from(filter.limit))
        .bind(i64::from(filter.offset))
        .fetch_all(self.pool)
        .await?;

        Ok(EchoPage {
            items: rows
                .into_iter()
                .map(EchoRecord::try_from)
                .collect::<Result<_, _>>()?,
            total: u64::try_from(total).unwrap_or(0),
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    /// Every echo derived from one event, newest first.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if the query fails.
    pub async fn for_event(&self, event: EventId) -> Result<Vec<EchoRecord>, DbError> {
        let rows = sqlx::query_as::<_, EchoRow>(&format!(
            "SELECT {ECHO_COLUMNS} FROM event_echoes
             WHERE source_event_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(event.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(EchoRecord::try_from).collect()
    }

    /// Echo counts per target world across all statuses.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if the query fails.
    pub async fn count_by_target(&self) -> Result<BTreeMap<WorldId, u64>, DbError> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT target_world_id, COUNT(*) FROM event_echoes GROUP BY target_world_id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(world, count)| (WorldId::from(world), u64::try_from(count).unwrap_or(0)))
            .collect())
    }
}

/// A row from the `event_echoes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EchoRow {
    /// Echo ID.
    pub id: Uuid,
    /// Source event.
    pub source_event_id: Uuid,
    /// Source world.
    pub source_world_id: Uuid,
    /// Target world.
    pub target_world_id: Uuid,
    /// Produced event, once completed.
    pub target_event_id: Option<Uuid>,
    /// Vector as its wire string.
    pub vector: String,
    /// Strength.
    pub strength: Decimal,
    /// Cascade depth.
    pub depth: i32,
    /// Chain root.
    pub root_event_id: Option<Uuid>,
    /// Status as its wire string.
    pub status: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EchoRow> for EchoRecord {
    type Error = DbError;

    fn try_from(row: EchoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EchoId::from(row.id),
            source_event_id: EventId::from(row.source_event_id),
            source_world_id: WorldId::from(row.source_world_id),
            target_world_id: WorldId::from(row.target_world_id),
            target_event_id: row.target_event_id.map(EventId::from),
            vector: row
                .vector
                .parse()
                .map_err(|e| DbError::Decode(format!("echo {}: {e}", row.id)))?,
            strength: row.strength,
            depth: u32::try_from(row.depth)
                .map_err(|e| DbError::Decode(format!("echo {} depth: {e}", row.id)))?,
            root_event_id: row.root_event_id.map(EventId::from),
            status: parse_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_status(raw: &str) -> Result<EchoStatus, DbError> {
    raw.parse()
        .map_err(|e| DbError::Decode(format!("echo status: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vector: &str, status: &str, depth: i32) -> EchoRow {
        let now = Utc::now();
        EchoRow {
            id: Uuid::now_v7(),
            source_event_id: Uuid::now_v7(),
            source_world_id: Uuid::now_v7(),
            target_world_id: Uuid::now_v7(),
            target_event_id: None,
            vector: vector.to_owned(),
            strength: Decimal::new(5, 1),
            depth,
            root_event_id: None,
            status: status.to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_decodes_into_record() {
        let record = EchoRecord::try_from(row("dream", "generating", 2));
        assert!(matches!(
            record,
            Ok(ref r) if r.status == EchoStatus::Generating && r.depth == 2
        ));
    }

    #[test]
    fn unknown_wire_values_are_decode_errors() {
        assert!(matches!(
            EchoRecord::try_from(row("gossip", "pending", 1)),
            Err(DbError::Decode(_))
        ));
        assert!(matches!(
            EchoRecord::try_from(row("dream", "archived", 1)),
            Err(DbError::Decode(_))
        ));
        assert!(matches!(
            EchoRecord::try_from(row("dream", "pending", -1)),
            Err(DbError::Decode(_))
        ));
    }
}
