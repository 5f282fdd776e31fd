//! Column generation engine: restricted master problem, pricing subproblem,
//! and the controller driving them.

mod controller;
mod master;
mod pricing;

pub use controller::{
    ColumnGeneration, ControllerState, IterationObserver, IterationRecord, RunError, RunOutcome, Termination,
};
pub use master::{DualPrices, MasterMode, MasterProblem, MasterSolution};
pub use pricing::{arc_usable, big_m, PricingOutcome, PricingProblem};
