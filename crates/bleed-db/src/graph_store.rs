//! Read-side operations on `worlds` and `world_connections`.

use std::collections::BTreeSet;

use bleed_types::{Connection, ConnectionId, EchoVector, WorldId, WorldNode};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

const CONNECTION_COLUMNS: &str =
    "id, endpoint_a, endpoint_b, connection_type, vector_tags, strength, description, is_active";

/// Operations on the `worlds` table.
pub struct WorldTable<'a> {
    pool: &'a PgPool,
}

impl<'a> WorldTable<'a> {
    /// Bind to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every world ordered by name.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if the query fails.
    pub async fn list(&self) -> Result<Vec<WorldNode>, DbError> {
        let rows = sqlx::query_as::<_, WorldRow>(
            "SELECT id, name, slug, status FROM worlds ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(WorldNode::try_from).collect()
    }

    /// One world.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, id: WorldId) -> Result<Option<WorldNode>, DbError> {
        let row = sqlx::query_as::<_, WorldRow>(
            "SELECT id, name, slug, status FROM worlds WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(WorldNode::try_from).transpose()
    }
}

/// Operations on the `world_connections` table.
pub struct ConnectionTable<'a> {
    pool: &'a PgPool,
}

impl<'a> ConnectionTable<'a> {
    /// Bind to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Connections with `world` as either endpoint.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if the query fails, [`DbError::Decode`] for an
    /// unknown vector tag.
    pub async fn touching(
        &self,
        world: WorldId,
        active_only: bool,
    ) -> Result<Vec<Connection>, DbError> {
        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM world_connections
             WHERE (endpoint_a = $1 OR endpoint_b = $1) AND (is_active OR NOT $2)
             ORDER BY id"
        ))
        .bind(world.into_inner())
        .bind(active_only)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Connection::try_from).collect()
    }

    /// Every connection.
    ///
    /// # Errors
    ///
    /// [`DbError::Postgres`] if the query fails, [`DbError::Decode`] for an
    /// unknown vector tag.
    pub async fn list(&self, active_only: bool) -> Result<Vec<Connection>, DbError> {
        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM world_connections
             WHERE is_active OR NOT $1
             ORDER BY id"
        ))
        .bind(active_only)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Connection::try_from).collect()
    }
}

/// A row from the `worlds` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorldRow {
    /// World ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Short name.
    pub slug: String,
    /// Status as its wire string.
    pub status: String,
}

impl TryFrom<WorldRow> for WorldNode {
    type Error = DbError;

    fn try_from(row: WorldRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row
                .status
                .parse()
                .map_err(|e| DbError::Decode(format!("world {}: {e}", row.id)))?,
            id: WorldId::from(row.id),
            name: row.name,
            slug: row.slug,
        })
    }
}

/// A row from the `world_connections` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConnectionRow {
    /// Connection ID.
    pub id: Uuid,
    /// First endpoint.
    pub endpoint_a: Uuid,
    /// Second endpoint.
    pub endpoint_b: Uuid,
    /// Link category.
    pub connection_type: String,
    /// Vector tags as wire strings.
    pub vector_tags: Vec<String>,
    /// Strength.
    pub strength: Decimal,
    /// Operator note.
    pub description: Option<String>,
    /// Whether the link is traversed.
    pub is_active: bool,
}

impl TryFrom<ConnectionRow> for Connection {
    type Error = DbError;

    fn try_from(row: ConnectionRow) -> Result<Self, Self::Error> {
        let vector_tags = row
            .vector_tags
            .iter()
            .map(|tag| tag.parse::<EchoVector>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| DbError::Decode(format!("connection {}: {e}", row.id)))?;
        Ok(Self {
            id: ConnectionId::from(row.id),
            endpoint_a: WorldId::from(row.endpoint_a),
            endpoint_b: WorldId::from(row.endpoint_b),
            connection_type: row.connection_type,
            vector_tags,
            strength: row.strength,
            description: row.description,
            is_active: row.is_active,
        })
    }
}
