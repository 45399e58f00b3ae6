//! Shared type definitions for the Bleed cross-world propagation engine.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: the core engine, the `PostgreSQL` store, and the HTTP API all
//! speak these structs. Types flow downstream to `TypeScript` via `ts-rs`
//! for the multiverse map.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for worlds, connections, events, echoes
//! - [`enums`] -- Echo status, vectors, listing direction, world status
//! - [`structs`] -- Entities, candidates, echo records, and the map view

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    EchoDirection, EchoStatus, EchoVector, NotificationKind, ParseEnumError, WorldStatus,
};
pub use ids::{CampaignId, ConnectionId, EchoId, EventId, WorldId};
pub use structs::{
    BLEED_DATA_SOURCE, Candidate, Connection, EchoListFilter, EchoNotification, EchoPage,
    EchoRecord, ExternalRefs, MAX_IMPACT, MIN_IMPACT, MapView, SourceEvent, WorldNode,
};
