//! # u-cvrptw
//!
//! Capacitated vehicle routing with time windows (CVRPTW) for a single depot,
//! solved by column generation over a restricted set-partitioning master.
//!
//! ## Modules
//!
//! - [`models`]: Input tables and domain values (customers, time windows, vehicle classes)
//! - [`network`]: Validated routing network with split depot vertices and arcs
//! - [`evaluation`]: Path schedules and feasibility checks
//! - [`column`]: Paths, their cost, and the column pool
//! - [`colgen`]: Restricted master, ESPPTW pricing, and the controller loop
//! - [`solution`]: Per-stop itinerary of the final plan
//! - [`lp`]: LP/MIP model, solver trait, and the bundled `microlp` backend
//! - [`config`]: Run configuration
//! - [`generator`]: Seeded synthetic instances

pub mod colgen;
pub mod column;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod generator;
pub mod lp;
pub mod models;
pub mod network;
pub mod solution;

#[cfg(test)]
mod testing;
