//! REST handlers for the echo API.
//!
//! Each handler decodes its inputs through the [`crate::extract`]
//! wrappers, validates request bodies with [`validator`], and delegates to
//! the [`Propagator`](bleed_core::Propagator) held in [`AppState`].
//! Mutating handlers take [`RequireToken`].

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use bleed_core::config::ApiConfig;
use bleed_core::{ManualTrigger, PropagationReport};
use bleed_types::{
    Connection, EchoDirection, EchoId, EchoListFilter, EchoPage, EchoRecord, EchoStatus,
    EchoVector, EventId, MapView, ParseEnumError, SourceEvent, WorldId,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::RequireToken;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/worlds/{world_id}/echoes`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListEchoesQuery {
    /// `incoming` (default) or `outgoing`.
    pub direction: Option<String>,
    /// Restrict to one status.
    pub status: Option<String>,
    /// Page size; defaults to `api.default_page_size`.
    #[validate(range(min = 1))]
    pub limit: Option<u32>,
    /// Records to skip.
    pub offset: Option<u32>,
}

impl ListEchoesQuery {
    /// Resolve the query into a store filter for `world_id`.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] for an unknown direction or status, or a
    /// limit above `api.max_page_size`.
    pub fn to_filter(
        &self,
        world_id: WorldId,
        api: &ApiConfig,
    ) -> Result<EchoListFilter, ApiError> {
        let direction = self
            .direction
            .as_deref()
            .map(str::parse::<EchoDirection>)
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
            .unwrap_or(EchoDirection::Incoming);
        let status = self
            .status
            .as_deref()
            .map(str::parse::<EchoStatus>)
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let limit = self.limit.unwrap_or(api.default_page_size);
        if limit > api.max_page_size {
            return Err(ApiError::BadRequest(format!(
                "limit {limit} exceeds the maximum page size of {}",
                api.max_page_size
            )));
        }

        Ok(EchoListFilter {
            world_id,
            direction,
            status,
            limit,
            offset: self.offset.unwrap_or(0),
        })
    }
}

/// Body of `POST /api/worlds/{world_id}/echoes`.
#[derive(Debug, Deserialize, Validate)]
pub struct TriggerEchoRequest {
    /// Event in the path world to echo.
    pub source_event_id: Uuid,
    /// World the echo lands in.
    pub target_world_id: Uuid,
    /// Vector as its wire string.
    pub vector: String,
    /// Strength in `[0, 1]`; defaults to 1.
    #[validate(custom(function = "validate_strength"))]
    pub strength: Option<Decimal>,
}

/// Body of `PATCH /api/echoes/{echo_id}/complete`.
#[derive(Debug, Deserialize)]
pub struct CompleteEchoRequest {
    /// Event produced in the target world.
    pub target_event_id: Uuid,
}

fn validate_strength(strength: &Decimal) -> Result<(), ValidationError> {
    if (Decimal::ZERO..=Decimal::ONE).contains(strength) {
        Ok(())
    } else {
        Err(ValidationError::new("strength_out_of_range")
            .with_message("strength must be between 0 and 1".into()))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /api/worlds/{world_id}/echoes`
pub async fn list_world_echoes(
    State(state): State<Arc<AppState>>,
    ApiPath(world_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ListEchoesQuery>,
) -> Result<Json<EchoPage>, ApiError> {
    query.validate()?;
    let filter = query.to_filter(WorldId::from(world_id), &state.api)?;
    let page = state.propagator.list_for_world(&filter).await?;
    Ok(Json(page))
}

/// `GET /api/worlds/{world_id}/events/{event_id}/echoes`
pub async fn list_event_echoes(
    State(state): State<Arc<AppState>>,
    ApiPath((world_id, event_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<Vec<EchoRecord>>, ApiError> {
    let records = state
        .propagator
        .list_for_event(WorldId::from(world_id), EventId::from(event_id))
        .await?;
    Ok(Json(records))
}

/// `POST /api/worlds/{world_id}/echoes`
pub async fn trigger_echo(
    _token: RequireToken,
    State(state): State<Arc<AppState>>,
    ApiPath(world_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<TriggerEchoRequest>,
) -> Result<(StatusCode, Json<EchoRecord>), ApiError> {
    body.validate()?;
    let vector: EchoVector = body
        .vector
        .parse()
        .map_err(|e: ParseEnumError| ApiError::BadRequest(e.to_string()))?;

    let record = state
        .propagator
        .trigger(
            WorldId::from(world_id),
            ManualTrigger {
                source_event_id: EventId::from(body.source_event_id),
                target_world_id: WorldId::from(body.target_world_id),
                vector,
                strength: body.strength.unwrap_or(Decimal::ONE),
            },
        )
        .await?;

    info!(echo_id = %record.id, "Manual echo triggered");
    Ok((StatusCode::CREATED, Json(record)))
}

/// `POST /api/worlds/{world_id}/events/propagate`
pub async fn propagate_event(
    _token: RequireToken,
    State(state): State<Arc<AppState>>,
    ApiPath(world_id): ApiPath<Uuid>,
    ApiJson(event): ApiJson<SourceEvent>,
) -> Result<Json<PropagationReport>, ApiError> {
    if event.world_id != WorldId::from(world_id) {
        return Err(ApiError::BadRequest(format!(
            "event {} belongs to world {}, not {world_id}",
            event.id, event.world_id
        )));
    }
    let report = state.propagator.propagate(&event).await?;
    Ok(Json(report))
}

/// `GET /api/echoes/{echo_id}`
pub async fn get_echo(
    State(state): State<Arc<AppState>>,
    ApiPath(echo_id): ApiPath<Uuid>,
) -> Result<Json<EchoRecord>, ApiError> {
    let record = state.propagator.get(EchoId::from(echo_id)).await?;
    Ok(Json(record))
}

/// `PATCH /api/echoes/{echo_id}/approve`
pub async fn approve_echo(
    _token: RequireToken,
    State(state): State<Arc<AppState>>,
    ApiPath(echo_id): ApiPath<Uuid>,
) -> Result<Json<EchoRecord>, ApiError> {
    let record = state.propagator.approve(EchoId::from(echo_id)).await?;
    Ok(Json(record))
}

/// `PATCH /api/echoes/{echo_id}/reject`
pub async fn reject_echo(
    _token: RequireToken,
    State(state): State<Arc<AppState>>,
    ApiPath(echo_id): ApiPath<Uuid>,
) -> Result<Json<EchoRecord>, ApiError> {
    let record = state.propagator.reject(EchoId::from(echo_id)).await?;
    Ok(Json(record))
}

/// `PATCH /api/echoes/{echo_id}/complete`
pub async fn complete_echo(
    _token: RequireToken,
    State(state): State<Arc<AppState>>,
    ApiPath(echo_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CompleteEchoRequest>,
) -> Result<Json<EchoRecord>, ApiError> {
    let record = state
        .propagator
        .complete(EchoId::from(echo_id), EventId::from(body.target_event_id))
        .await?;
    Ok(Json(record))
}

/// `GET /api/connections`
pub async fn list_connections(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Connection>>, ApiError> {
    Ok(Json(state.propagator.connections().await?))
}

/// `GET /api/map-data`
pub async fn map_data(State(state): State<Arc<AppState>>) -> Result<Json<MapView>, ApiError> {
    Ok(Json(state.propagator.map_view().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ApiConfig {
        ApiConfig::default()
    }

    #[test]
    fn empty_query_uses_defaults() {
        let world = WorldId::new();
        let filter = ListEchoesQuery::default().to_filter(world, &api());
        assert!(matches!(
            filter,
            Ok(EchoListFilter {
                direction: EchoDirection::Incoming,
                status: None,
                limit: 25,
                offset: 0,
                ..
            })
        ));
    }

    #[test]
    fn query_parses_direction_and_status() {
        let query = ListEchoesQuery {
            direction: Some(String::from("outgoing")),
            status: Some(String::from("generating")),
            limit: Some(10),
            offset: Some(20),
        };
        let filter = query.to_filter(WorldId::new(), &api());
        assert!(matches!(
            filter,
            Ok(EchoListFilter {
                direction: EchoDirection::Outgoing,
                status: Some(EchoStatus::Generating),
                limit: 10,
                offset: 20,
                ..
            })
        ));
    }

    #[test]
    fn oversized_limit_and_unknown_values_are_rejected() {
        let too_big = ListEchoesQuery {
            limit: Some(101),
            ..ListEchoesQuery::default()
        };
        assert!(matches!(
            too_big.to_filter(WorldId::new(), &api()),
            Err(ApiError::BadRequest(_))
        ));

        let sideways = ListEchoesQuery {
            direction: Some(String::from("sideways")),
            ..ListEchoesQuery::default()
        };
        assert!(sideways.to_filter(WorldId::new(), &api()).is_err());
    }

    #[test]
    fn zero_limit_fails_validation() {
        let query = ListEchoesQuery {
            limit: Some(0),
            ..ListEchoesQuery::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn strength_must_be_a_unit_interval() {
        assert!(validate_strength(&Decimal::ZERO).is_ok());
        assert!(validate_strength(&Decimal::ONE).is_ok());
        assert!(validate_strength(&Decimal::new(11, 1)).is_err());
        assert!(validate_strength(&Decimal::new(-1, 1)).is_err());
    }
}
