//! Linear and mixed-integer programming collaborator.
//!
//! Models are described solver-agnostically with [`Problem`], solved through
//! the [`Solver`] trait, and read back from a [`Solution`]. Time-propagation
//! rules are stated as [`Implication`]s and linearized with their big-M
//! constant by the backend.
//!
//! [`MicroLpSolver`] is the bundled backend, built on the pure-Rust `microlp`
//! crate.

mod backend;
mod problem;
mod solution;

pub use backend::MicroLpSolver;
pub use problem::{ConstrId, Constraint, Domain, Implication, Problem, Relation, Sense, VarId, Variable};
pub use solution::{Solution, SolveOptions, SolveStatus, Solver, SolverError};
