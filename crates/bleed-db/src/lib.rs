//! `PostgreSQL` data layer for the Bleed propagation engine.
//!
//! ```text
//! Propagator (bleed-core)
//!     |
//!     +-- store traits --> PgStore
//!                             |-- WorldTable       (worlds)
//!                             |-- ConnectionTable  (world_connections)
//!                             |-- SettingsTable    (world_settings)
//!                             |-- EventTable       (world_events)
//!                             +-- EchoTable        (event_echoes)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration, migrations
//! - [`echo_store`] -- Echo inserts, conditional transitions, listings
//! - [`graph_store`] -- Worlds and connections
//! - [`platform_store`] -- Settings rows and source events
//! - [`pg_store`] -- Core store traits over the tables
//! - [`error`] -- Shared error types

pub mod echo_store;
pub mod error;
pub mod graph_store;
pub mod pg_store;
pub mod platform_store;
pub mod postgres;

pub use echo_store::{EchoRow, EchoTable};
pub use error::DbError;
pub use graph_store::{ConnectionRow, ConnectionTable, WorldRow, WorldTable};
pub use pg_store::PgStore;
pub use platform_store::{EventRow, EventTable, SettingsTable};
pub use postgres::{PostgresConfig, PostgresPool};
