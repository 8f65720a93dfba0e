//! Substitution decision engine for panel stock.
//!
//! Given a product query and a quantity, the engine answers "what can we sell
//! instead?" using an equivalence graph, a multi-location stock index and, as a
//! last resort, an external web lookup. It also sizes the edge banding needed
//! for the recommended board.
//!
//! Entry points:
//! - [`snapshot::SnapshotStore`] holds the active data snapshot and exposes the
//!   bulk-replace import operations.
//! - [`orchestrator::SubstitutionOrchestrator::submit`] runs one query.
//! - [`settings`] and [`dataset`] load the TOML files used by the `substitute`
//!   binary.

#![warn(missing_docs)]

pub mod banding;
pub mod dataset;
pub mod errors;
pub mod gateway;
pub mod graph;
pub mod model;
pub mod orchestrator;
pub mod providers;
pub mod query;
pub mod ranking;
pub mod result;
pub mod settings;
pub mod snapshot;
pub mod stock;
