//! Restricted master problem: set partitioning over the column pool.

use tracing::{debug, instrument, warn};

use crate::column::{ColumnId, ColumnPool};
use crate::error::{Error, Result};
use crate::lp::{Constraint, Problem, Relation, Sense, SolveOptions, SolveStatus, Solver, SolverError, Variable};
use crate::network::{CustomerIndex, Network};

const SELECTION_TOL: f64 = 1e-9;

/// Integrality mode of a master solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterMode {
    /// Continuous selection variables; dual prices are reported.
    Relaxed,
    /// Binary selection variables; used for the final solve.
    Integral,
}

/// One dual price per customer partitioning row.
#[derive(Debug, Clone, PartialEq)]
pub struct DualPrices(Vec<f64>);

impl DualPrices {
    /// Wraps prices given in customer order.
    pub fn new(prices: Vec<f64>) -> Self {
        Self(prices)
    }

    /// Price of `customer`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of range.
    pub fn get(&self, customer: CustomerIndex) -> f64 {
        self.0[customer.index()]
    }

    /// Prices in customer order.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of priced customers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no customer is priced.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of prices over `customers`.
    pub fn total<'a>(&self, customers: impl IntoIterator<Item = &'a CustomerIndex>) -> f64 {
        customers.into_iter().map(|&c| self.get(c)).sum()
    }
}

/// Result of a master solve.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterSolution {
    /// Mode the master was solved in.
    pub mode: MasterMode,
    /// Total cost of the selection.
    pub objective: f64,
    /// Present in relaxed mode only.
    pub duals: Option<DualPrices>,
    /// Columns with a positive selection value.
    pub selection: Vec<(ColumnId, f64)>,
    /// Solver status; `TimeLimit` means an incumbent was used.
    pub status: SolveStatus,
}

impl MasterSolution {
    /// Columns selected with value one (within tolerance).
    pub fn selected_columns(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.selection
            .iter()
            .filter(|(_, value)| *value > 0.5)
            .map(|(id, _)| *id)
    }
}

/// Builds and solves the set-partitioning model over a column pool.
///
/// The model is rebuilt from scratch on every call.
pub struct MasterProblem<'a> {
    network: &'a Network,
    solver: &'a dyn Solver,
    options: SolveOptions,
}

impl<'a> MasterProblem<'a> {
    /// Master over `network`; every solve gets a copy of `options`.
    pub fn new(network: &'a Network, solver: &'a dyn Solver, options: SolveOptions) -> Self {
        Self {
            network,
            solver,
            options,
        }
    }

    /// Minimizes total column cost subject to every customer being covered
    /// exactly once.
    ///
    /// Fails with [`Error::InfeasibleMaster`] if a customer is covered by no
    /// column or the solver reports infeasibility, and with
    /// [`Error::SolverTimeout`] if the budget expires without an incumbent.
    #[instrument(level = "debug", skip(self, pool), fields(columns = pool.len()))]
    pub fn solve(&self, pool: &ColumnPool, mode: MasterMode) -> Result<MasterSolution> {
        for customer in self.network.customers() {
            if pool.covering(customer.index()).next().is_none() {
                return Err(Error::InfeasibleMaster(format!(
                    "customer '{}' is covered by no column",
                    customer.name()
                )));
            }
        }

        let name = match mode {
            MasterMode::Relaxed => "MA_CVRPTW",
            MasterMode::Integral => "MA_CVRPTW_INT",
        };
        let mut problem = Problem::new(name, Sense::Minimize);
        let vars: Vec<_> = pool
            .iter()
            .map(|column| {
                let var = match mode {
                    MasterMode::Relaxed => Variable::continuous(column.name()),
                    MasterMode::Integral => Variable::binary(column.name()),
                };
                problem.add_variable(var.obj(column.cost()))
            })
            .collect();
        for customer in self.network.customers() {
            let terms = pool
                .covering(customer.index())
                .map(|column| (vars[column.id().index()], 1.0))
                .collect();
            problem.add_constraint(Constraint::new(
                format!("Customer{}", customer.name()),
                terms,
                Relation::Equal,
                1.0,
            ));
        }

        let solution = self.solver.solve(&problem, &self.options)?;
        match solution.status() {
            SolveStatus::Infeasible => {
                return Err(Error::InfeasibleMaster(format!(
                    "solver reported '{name}' infeasible over {} columns",
                    pool.len()
                )))
            }
            SolveStatus::TimeLimit => warn!(
                problem = name,
                objective = solution.objective(),
                "master time limit reached; using best incumbent"
            ),
            SolveStatus::Optimal => {}
        }

        let duals = match mode {
            MasterMode::Integral => None,
            MasterMode::Relaxed => match solution.duals() {
                Some(duals) => Some(DualPrices::new(duals.to_vec())),
                None if solution.status() == SolveStatus::TimeLimit => {
                    return Err(Error::SolverTimeout(format!(
                        "'{name}' stopped at the time limit without dual prices"
                    )))
                }
                None => {
                    return Err(Error::Solver(SolverError::Unsupported(format!(
                        "{} returned no dual prices for '{name}'",
                        self.solver.name()
                    ))))
                }
            },
        };

        let selection: Vec<(ColumnId, f64)> = pool
            .iter()
            .zip(&vars)
            .filter_map(|(column, &var)| {
                let value = solution.value(var);
                let value = match mode {
                    MasterMode::Integral => value.round(),
                    MasterMode::Relaxed => value,
                };
                (value > SELECTION_TOL).then_some((column.id(), value))
            })
            .collect();

        debug!(
            objective = solution.objective(),
            selected = selection.len(),
            "master solved"
        );
        Ok(MasterSolution {
            mode,
            objective: solution.objective(),
            duals,
            selection,
            status: solution.status(),
        })
    }
}
