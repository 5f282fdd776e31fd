//! Input tables and domain value types.
//!
//! Provides the raw tabular inputs (depots, customers, transportation
//! matrix, vehicles) and the typed values the network is built from:
//! time windows, customers, and vehicle classes.

mod customer;
mod tables;
mod vehicle;

pub use customer::{Customer, TimeWindow};
pub use tables::{CustomerRow, DepotRow, InputTables, TransitRow, VehicleRow};
pub use vehicle::VehicleClass;
