//! Solver result contract and the [`Solver`] trait.

use std::fmt;
use std::time::Duration;

use super::{ConstrId, Problem, VarId};

/// Terminal status reported by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// The time budget expired; the returned point is the best incumbent.
    TimeLimit,
    /// No feasible point exists.
    Infeasible,
}

/// Failures that are not a solver status.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The time budget expired before any feasible point was found.
    TimedOut(String),
    /// The objective is unbounded.
    Unbounded,
    /// The problem uses a feature the backend cannot handle.
    Unsupported(String),
    /// The engine failed internally.
    Backend(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::TimedOut(what) => write!(f, "time limit reached solving '{what}'"),
            SolverError::Unbounded => write!(f, "objective is unbounded"),
            SolverError::Unsupported(msg) => write!(f, "unsupported problem: {msg}"),
            SolverError::Backend(msg) => write!(f, "backend failure: {msg}"),
        }
    }
}

impl std::error::Error for SolverError {}

/// Outcome of a solve.
///
/// `values` and `objective` are meaningful unless the status is
/// [`SolveStatus::Infeasible`]. `duals` is only present for purely
/// continuous problems.
#[derive(Debug, Clone)]
pub struct Solution {
    status: SolveStatus,
    objective: f64,
    values: Vec<f64>,
    duals: Option<Vec<f64>>,
}

impl Solution {
    /// Creates a solution carrying a point.
    pub fn new(status: SolveStatus, objective: f64, values: Vec<f64>, duals: Option<Vec<f64>>) -> Self {
        Self {
            status,
            objective,
            values,
            duals,
        }
    }

    /// Creates the infeasible outcome.
    pub fn infeasible() -> Self {
        Self {
            status: SolveStatus::Infeasible,
            objective: f64::NAN,
            values: Vec::new(),
            duals: None,
        }
    }

    /// Status of the solve.
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Objective value, offset included.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Primal values in variable order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Primal value of one variable.
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    /// Dual values in constraint order, when available.
    pub fn duals(&self) -> Option<&[f64]> {
        self.duals.as_deref()
    }

    /// Dual value of one constraint.
    pub fn dual(&self, constraint: ConstrId) -> Option<f64> {
        self.duals.as_ref().map(|d| d[constraint.index()])
    }

    /// Returns `true` if the solution carries a feasible point.
    pub fn has_point(&self) -> bool {
        !matches!(self.status, SolveStatus::Infeasible)
    }
}

/// Per-call limits handed to a solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveOptions {
    /// Wall-clock budget for this call.
    pub time_limit: Option<Duration>,
}

/// A linear/mixed-integer programming engine.
///
/// Implementations must report one of the three [`SolveStatus`] values or a
/// [`SolverError`], and populate duals for optimal continuous solves over
/// variables on `[0, +inf)`.
pub trait Solver: Send + Sync {
    /// Solves the problem under the given limits.
    fn solve(&self, problem: &Problem, options: &SolveOptions) -> Result<Solution, SolverError>;

    /// Engine name for logging.
    fn name(&self) -> &str {
        "solver"
    }
}
