//! Column generation controller.
//!
//! Drives the master/pricing loop as an explicit state machine:
//!
//! ```text
//! Init -> Iterating -> Converged | IterationLimit -> Finalizing -> Done
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::master::{MasterMode, MasterProblem, MasterSolution};
use super::pricing::PricingProblem;
use crate::column::ColumnPool;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::lp::Solver;
use crate::models::InputTables;
use crate::network::Network;
use crate::solution::RoutingPlan;

/// Absorbs the rounding noise of the dual prices in the threshold test.
const REDUCED_COST_TOL: f64 = 1e-9;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    /// Seeding the column pool.
    Init,
    /// Alternating relaxed master and pricing solves.
    Iterating,
    /// Pricing found no route below the reduced-cost threshold.
    Converged,
    /// The configured number of productive iterations was reached.
    IterationLimit,
    /// Solving the master with integrality restored.
    Finalizing,
    /// The plan is available.
    Done,
}

/// Why the iteration loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    Converged,
    IterationLimit,
}

/// Diagnostics emitted after every pricing solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// Productive iterations completed before this one.
    pub iteration: usize,
    pub master_objective: f64,
    pub pricing_objective: f64,
    pub reduced_cost: f64,
    /// Pool size the master was solved over.
    pub pool_size: usize,
    /// Class of the best priced route.
    pub vehicle_class: usize,
}

/// Receives every [`IterationRecord`]. Observers cannot influence the run.
pub trait IterationObserver {
    fn on_iteration(&mut self, record: &IterationRecord);
}

impl<F: FnMut(&IterationRecord)> IterationObserver for F {
    fn on_iteration(&mut self, record: &IterationRecord) {
        self(record)
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub termination: Termination,
    /// Number of columns added by pricing.
    pub iterations: usize,
    pub history: Vec<IterationRecord>,
    pub pool: ColumnPool,
    /// The final integral master solution.
    pub master: MasterSolution,
    pub plan: RoutingPlan,
}

/// A failure that aborted a run.
#[derive(Debug)]
pub struct RunError {
    /// Productive iterations completed when the failure occurred.
    pub iteration: usize,
    pub state: ControllerState,
    pub source: Error,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at iteration {} ({:?}): {}",
            self.source.kind(),
            self.iteration,
            self.state,
            self.source
        )
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Column generation over one network.
///
/// Each run owns its column pool; nothing is shared between runs.
///
/// # Examples
///
/// ```no_run
/// use u_cvrptw::colgen::ColumnGeneration;
/// use u_cvrptw::config::Config;
/// use u_cvrptw::lp::MicroLpSolver;
/// # fn demo(network: &u_cvrptw::network::Network) {
/// let mut engine = ColumnGeneration::new(Config::default(), &MicroLpSolver)
///     .with_observer(|r: &u_cvrptw::colgen::IterationRecord| println!("{}", r.reduced_cost));
/// let outcome = engine.run(network).unwrap();
/// println!("{} routes, cost {}", outcome.plan.num_routes(), outcome.plan.objective);
/// # }
/// ```
pub struct ColumnGeneration<'a> {
    config: Config,
    solver: &'a dyn Solver,
    observer: Option<Box<dyn IterationObserver + 'a>>,
    state: ControllerState,
}

impl<'a> ColumnGeneration<'a> {
    /// Creates a controller in the `Init` state.
    pub fn new(config: Config, solver: &'a dyn Solver) -> Self {
        Self {
            config,
            solver,
            observer: None,
            state: ControllerState::Init,
        }
    }

    /// Registers an observer for iteration records.
    pub fn with_observer(mut self, observer: impl IterationObserver + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Current state; `Done` after a successful run.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Run configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the network from `tables`, then runs.
    pub fn run_tables(&mut self, tables: &InputTables) -> std::result::Result<RunOutcome, RunError> {
        self.state = ControllerState::Init;
        let network = Network::build(tables).map_err(|source| self.fail(0, source))?;
        self.run(&network)
    }

    /// Runs column generation to completion.
    #[instrument(level = "info", skip_all, fields(customers = network.num_customers()))]
    pub fn run(&mut self, network: &Network) -> std::result::Result<RunOutcome, RunError> {
        self.state = ControllerState::Init;
        let mut pool = ColumnPool::seeded(network).map_err(|source| self.fail(0, source))?;
        debug!(columns = pool.len(), "pool seeded");

        let options = self.config.solver.options();
        let master = MasterProblem::new(network, self.solver, options.clone());
        let pricing = PricingProblem::new(network, self.solver, options);

        self.state = ControllerState::Iterating;
        let mut iterations = 0;
        let mut history = Vec::new();
        let termination = loop {
            if iterations >= self.config.max_iterations {
                break Termination::IterationLimit;
            }
            match self.iterate(network, &master, &pricing, &mut pool, iterations) {
                Ok((record, added)) => {
                    history.push(record);
                    if !added {
                        break Termination::Converged;
                    }
                    iterations += 1;
                }
                Err(source) => return Err(self.fail(iterations, source)),
            }
        };
        self.state = match termination {
            Termination::Converged => ControllerState::Converged,
            Termination::IterationLimit => ControllerState::IterationLimit,
        };
        info!(?termination, iterations, columns = pool.len(), "column generation stopped");

        self.state = ControllerState::Finalizing;
        let finalize = || -> Result<(MasterSolution, RoutingPlan)> {
            let solution = master.solve(&pool, MasterMode::Integral)?;
            let plan = RoutingPlan::compile(network, &pool, &solution)?;
            Ok((solution, plan))
        };
        let (final_master, plan) = finalize().map_err(|source| self.fail(iterations, source))?;
        info!(
            objective = final_master.objective,
            routes = plan.num_routes(),
            "final plan"
        );

        self.state = ControllerState::Done;
        Ok(RunOutcome {
            termination,
            iterations,
            history,
            pool,
            master: final_master,
            plan,
        })
    }

    /// One relaxed master solve followed by pricing. Returns the record and
    /// whether a column was added.
    fn iterate(
        &mut self,
        network: &Network,
        master: &MasterProblem<'_>,
        pricing: &PricingProblem<'_>,
        pool: &mut ColumnPool,
        iteration: usize,
    ) -> Result<(IterationRecord, bool)> {
        let relaxed = master.solve(pool, MasterMode::Relaxed)?;
        let duals = relaxed
            .duals
            .as_ref()
            .ok_or_else(|| Error::InfeasibleMaster("relaxed master returned no dual prices".into()))?;
        let priced = pricing.price_fleet(duals, &pool.next_name(), self.config.parallel_pricing)?;

        let record = IterationRecord {
            iteration,
            master_objective: relaxed.objective,
            pricing_objective: priced.objective,
            reduced_cost: priced.reduced_cost,
            pool_size: pool.len(),
            vehicle_class: priced.vehicle_class,
        };
        info!(
            iteration,
            master_objective = record.master_objective,
            pricing_objective = record.pricing_objective,
            reduced_cost = record.reduced_cost,
            pool_size = record.pool_size,
            "iteration"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_iteration(&record);
        }

        if !(priced.reduced_cost < self.config.reduced_cost_threshold - REDUCED_COST_TOL) {
            return Ok((record, false));
        }
        if pool.contains_route(&priced.path) {
            debug!(path = priced.path.name(), "priced route already pooled");
            return Ok((record, false));
        }
        pool.push(priced.path, network)?;
        Ok((record, true))
    }

    fn fail(&self, iteration: usize, source: Error) -> RunError {
        RunError {
            iteration,
            state: self.state,
            source,
        }
    }
}
