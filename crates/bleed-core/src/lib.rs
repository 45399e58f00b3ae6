//! Core propagation logic for the Bleed cross-world echo engine.
//!
//! A significant event in one world may echo into the worlds linked to it.
//! This crate decides whether an event may propagate, which worlds it
//! reaches, and drives each resulting echo record through its review
//! lifecycle. Durable state lives behind the [`store`] traits.
//!
//! # Modules
//!
//! - [`settings`] -- Typed per-world settings parsed from raw rows
//! - [`eligibility`] -- Ordered eligibility rules with cascade-depth cut-off
//! - [`graph`] -- Undirected traversal of active connections
//! - [`candidates`] -- One candidate per active neighbour
//! - [`lifecycle`] -- `pending -> generating -> completed | rejected`
//! - [`aggregator`] -- Whole-graph map view
//! - [`propagator`] -- Facade used by the HTTP layer and ingestion
//! - [`store`] -- Repository traits
//! - [`memory`] -- In-memory store
//! - [`config`] -- Service configuration from `bleed-config.yaml`
//! - [`error`] -- Error taxonomy

pub mod aggregator;
pub mod candidates;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod memory;
pub mod propagator;
pub mod settings;
pub mod store;

pub use aggregator::GraphAggregator;
pub use candidates::CandidateGenerator;
pub use config::{ConfigError, ServiceConfig, StoreBackend};
pub use eligibility::Ineligible;
pub use error::EchoError;
pub use graph::{ConnectionGraph, Neighbour};
pub use lifecycle::EchoLifecycle;
pub use memory::InMemoryStore;
pub use propagator::{FailedCandidate, ManualTrigger, PropagationReport, Propagator};
pub use settings::{PropagationSettings, SettingEntry};
pub use store::{
    ConnectionStore, EchoStore, EventStore, SettingsStore, Store, TransitionOutcome, WorldStore,
};
