//! Core entity structs for the Bleed engine.
//!
//! Covers the read-only platform entities (`WorldNode`, `Connection`,
//! `SourceEvent`), the propagation record (`EchoRecord`) with its
//! candidate and listing shapes, and the aggregated map view.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EchoDirection, EchoStatus, EchoVector, NotificationKind, WorldStatus};
use crate::ids::{CampaignId, ConnectionId, EchoId, EventId, WorldId};

/// Lowest impact level an event can carry.
pub const MIN_IMPACT: i32 = 1;

/// Highest impact level an event can carry.
pub const MAX_IMPACT: i32 = 10;

/// `data_source` tag marking an event that is itself a propagation product.
pub const BLEED_DATA_SOURCE: &str = "bleed";

// ---------------------------------------------------------------------------
// WorldNode
// ---------------------------------------------------------------------------

/// A simulated world, as seen by the propagation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldNode {
    /// World identifier.
    pub id: WorldId,
    /// Display name.
    pub name: String,
    /// URL-safe short name.
    pub slug: String,
    /// Activity status.
    pub status: WorldStatus,
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// A bleed link between two worlds.
///
/// The link is logically undirected: the two endpoints are stored in named
/// fields, but traversal must go through [`Connection::other_endpoint`] so
/// both roles resolve the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Connection {
    /// Connection identifier.
    pub id: ConnectionId,
    /// First endpoint.
    pub endpoint_a: WorldId,
    /// Second endpoint.
    pub endpoint_b: WorldId,
    /// Free-form link category (usually `bleed`).
    pub connection_type: String,
    /// Thematic channels this link permits.
    pub vector_tags: BTreeSet<EchoVector>,
    /// Confidence multiplier in `[0, 1]`.
    #[ts(as = "String")]
    pub strength: Decimal,
    /// Optional operator note.
    pub description: Option<String>,
    /// Inactive connections are never traversed.
    pub is_active: bool,
}

impl Connection {
    /// Whether `world` is one of the two endpoints.
    pub fn touches(&self, world: WorldId) -> bool {
        self.endpoint_a == world || self.endpoint_b == world
    }

    /// Resolve the far side of the link as seen from `world`.
    ///
    /// Returns `None` when `world` is not an endpoint. A self-loop resolves
    /// to the same world.
    pub fn other_endpoint(&self, world: WorldId) -> Option<WorldId> {
        if self.endpoint_a == world {
            Some(self.endpoint_b)
        } else if self.endpoint_b == world {
            Some(self.endpoint_a)
        } else {
            None
        }
    }

    /// The vector used when an echo is generated over this link.
    ///
    /// First tag in canonical order, or [`EchoVector::Resonance`] for an
    /// untagged link.
    pub fn primary_vector(&self) -> EchoVector {
        self.vector_tags
            .iter()
            .next()
            .copied()
            .unwrap_or(EchoVector::Resonance)
    }
}

// ---------------------------------------------------------------------------
// SourceEvent
// ---------------------------------------------------------------------------

/// Propagation bookkeeping carried by an event that is itself an echo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ExternalRefs {
    /// Cascade depth of the echo that produced this event.
    #[serde(default)]
    pub echo_depth: Option<u32>,
    /// The original, un-propagated event at the head of the chain.
    #[serde(default)]
    pub root_event_id: Option<EventId>,
    /// Strength of the echo that produced this event.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub echo_strength: Option<Decimal>,
}

/// An event handed to the engine for propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SourceEvent {
    /// Event identifier.
    pub id: EventId,
    /// World that produced the event.
    pub world_id: WorldId,
    /// Narrative significance, nominally 1 to 10.
    pub impact_level: i32,
    /// Origin tag; [`BLEED_DATA_SOURCE`] marks an echo product.
    #[serde(default)]
    pub data_source: Option<String>,
    /// Propagation bookkeeping when the event is an echo product.
    #[serde(default)]
    pub external_refs: ExternalRefs,
    /// Set when a campaign already amplified this event.
    #[serde(default)]
    pub campaign_id: Option<CampaignId>,
}

impl SourceEvent {
    /// Whether this event was produced by an earlier propagation.
    pub fn is_bleed(&self) -> bool {
        self.data_source.as_deref() == Some(BLEED_DATA_SOURCE)
    }

    /// Whether the impact level lies within `MIN_IMPACT..=MAX_IMPACT`.
    pub const fn impact_in_range(&self) -> bool {
        self.impact_level >= MIN_IMPACT && self.impact_level <= MAX_IMPACT
    }

    /// Cascade depth recorded on this event, if any.
    pub const fn prior_depth(&self) -> Option<u32> {
        self.external_refs.echo_depth
    }

    /// The head of this event's cascade chain.
    pub fn root_event_id(&self) -> EventId {
        self.external_refs.root_event_id.unwrap_or(self.id)
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A propagation the graph walk found, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Candidate {
    /// World the echo would land in.
    pub target_world_id: WorldId,
    /// Cascade depth the echo would carry (1 for a direct echo).
    pub depth: u32,
    /// Connection the walk crossed; `None` for a manual trigger.
    pub connection_id: Option<ConnectionId>,
    /// Channel taken from the connection.
    pub vector: EchoVector,
    /// Derived confidence in `[0, 1]`.
    #[ts(as = "String")]
    pub strength: Decimal,
}

// ---------------------------------------------------------------------------
// EchoRecord
// ---------------------------------------------------------------------------

/// A persisted propagation instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EchoRecord {
    /// Echo identifier.
    pub id: EchoId,
    /// Event the echo derives from.
    pub source_event_id: EventId,
    /// World of the source event.
    pub source_world_id: WorldId,
    /// World the echo lands in.
    pub target_world_id: WorldId,
    /// Event generated in the target world; set on completion.
    pub target_event_id: Option<EventId>,
    /// Channel of this propagation.
    pub vector: EchoVector,
    /// Confidence in `[0, 1]`.
    #[ts(as = "String")]
    pub strength: Decimal,
    /// Hops from the root event (at least 1).
    pub depth: u32,
    /// Original un-propagated event of the chain.
    pub root_event_id: Option<EventId>,
    /// Lifecycle state.
    pub status: EchoStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last status change.
    pub updated_at: DateTime<Utc>,
}

/// A filtered, paginated slice of echoes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EchoPage {
    /// Records in this page, newest first.
    pub items: Vec<EchoRecord>,
    /// Matching records across all pages.
    pub total: u64,
    /// Page size requested.
    pub limit: u32,
    /// Records skipped before this page.
    pub offset: u32,
}

/// Filter for listing the echoes of one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoListFilter {
    /// World whose echoes are listed.
    pub world_id: WorldId,
    /// Whether the world is the target or the source.
    pub direction: EchoDirection,
    /// Restrict to one lifecycle state.
    pub status: Option<EchoStatus>,
    /// Page size.
    pub limit: u32,
    /// Records to skip.
    pub offset: u32,
}

/// A lifecycle change published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EchoNotification {
    /// What happened.
    pub kind: NotificationKind,
    /// The record after the change.
    pub echo: EchoRecord,
}

// ---------------------------------------------------------------------------
// Map view
// ---------------------------------------------------------------------------

/// Aggregated graph for the multiverse map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MapView {
    /// Every world.
    pub nodes: Vec<WorldNode>,
    /// Every active connection.
    pub edges: Vec<Connection>,
    /// Echoes targeting each world, across all statuses.
    pub echo_counts: BTreeMap<WorldId, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(a: WorldId, b: WorldId) -> Connection {
        Connection {
            id: ConnectionId::new(),
            endpoint_a: a,
            endpoint_b: b,
            connection_type: String::from("bleed"),
            vector_tags: BTreeSet::new(),
            strength: Decimal::new(5, 1),
            description: None,
            is_active: true,
        }
    }

    #[test]
    fn other_endpoint_is_symmetric() {
        let a = WorldId::new();
        let b = WorldId::new();
        let c = link(a, b);
        assert_eq!(c.other_endpoint(a), Some(b));
        assert_eq!(c.other_endpoint(b), Some(a));
        assert_eq!(c.other_endpoint(WorldId::new()), None);
    }

    #[test]
    fn self_loop_resolves_to_itself() {
        let a = WorldId::new();
        assert_eq!(link(a, a).other_endpoint(a), Some(a));
    }

    #[test]
    fn primary_vector_prefers_first_tag() {
        let mut c = link(WorldId::new(), WorldId::new());
        assert_eq!(c.primary_vector(), EchoVector::Resonance);

        c.vector_tags.insert(EchoVector::Dream);
        c.vector_tags.insert(EchoVector::Memory);
        assert_eq!(c.primary_vector(), EchoVector::Memory);
    }

    #[test]
    fn source_event_defaults_from_minimal_json() {
        let json = serde_json::json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "world_id": "00000000-0000-0000-0000-000000000002",
            "impact_level": 7,
        });
        let event: Result<SourceEvent, _> = serde_json::from_value(json);
        assert!(event.is_ok());
        if let Ok(event) = event {
            assert!(!event.is_bleed());
            assert!(event.impact_in_range());
            assert_eq!(event.root_event_id(), event.id);
            assert_eq!(event.external_refs, ExternalRefs::default());
            assert_eq!(event.prior_depth(), None);
        }
    }

    #[test]
    fn bleed_event_without_depth_has_no_prior_depth() {
        let event = SourceEvent {
            id: EventId::new(),
            world_id: WorldId::new(),
            impact_level: 9,
            data_source: Some(String::from(BLEED_DATA_SOURCE)),
            external_refs: ExternalRefs::default(),
            campaign_id: None,
        };
        assert!(event.is_bleed());
        assert_eq!(event.prior_depth(), None);
    }
}
