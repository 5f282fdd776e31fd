//! Instance builders and solver doubles shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::lp::{MicroLpSolver, Problem, Solution, SolveOptions, SolveStatus, Solver, SolverError};
use crate::models::{CustomerRow, DepotRow, InputTables, TransitRow, VehicleRow};
use crate::network::Network;

/// Customers on a line with the depot at position 0; drive minutes and cost
/// both equal the distance. Customer tuples are
/// `(name, position, window_start, window_end, demand)`; vehicle tuples are
/// `(name, capacity, fixed_cost)`.
pub(crate) fn line_tables(customers: &[(&str, f64, f64, f64, f64)], vehicles: &[(&str, f64, f64)]) -> InputTables {
    let mut positions: Vec<(&str, f64)> = vec![("D", 0.0)];
    positions.extend(customers.iter().map(|c| (c.0, c.1)));
    let mut transit = Vec::new();
    for &(from, x) in &positions {
        for &(to, y) in &positions {
            let d = (x - y).abs();
            transit.push(TransitRow {
                from_location_name: from.to_string(),
                to_location_name: to.to_string(),
                drive_minutes: d,
                transportation_cost: d,
            });
        }
    }
    InputTables {
        depots: vec![DepotRow {
            location_name: "D".into(),
            latitude: None,
            longitude: None,
            time_window_start: 0.0,
            time_window_end: 1000.0,
        }],
        customers: customers
            .iter()
            .map(|&(name, _, start, end, demand)| CustomerRow {
                location_name: name.to_string(),
                latitude: None,
                longitude: None,
                time_window_start: start,
                time_window_end: end,
                demand,
                stop_time: 0.0,
            })
            .collect(),
        transit,
        vehicles: vehicles
            .iter()
            .map(|&(name, capacity, fixed)| VehicleRow {
                vehicle_name: name.to_string(),
                capacity,
                vehicle_fixed_cost: fixed,
                vehicle_variable_cost: 0.0,
            })
            .collect(),
    }
}

pub(crate) fn line_network(customers: &[(&str, f64, f64, f64, f64)], vehicles: &[(&str, f64, f64)]) -> Network {
    match Network::build(&line_tables(customers, vehicles)) {
        Ok(network) => network,
        Err(err) => panic!("fixture network: {err}"),
    }
}

/// What [`StubSolver`] answers for its target problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StubAnswer {
    /// The real solution, relabelled as a time-limited incumbent.
    Incumbent,
    /// A time-limited incumbent without dual prices.
    IncumbentWithoutDuals,
    Infeasible,
    TimedOut,
}

/// Solves with [`MicroLpSolver`] except for the problem named `target`,
/// which gets the scripted answer once it has been solved `after` times.
pub(crate) struct StubSolver {
    target: &'static str,
    answer: StubAnswer,
    after: usize,
    calls: AtomicUsize,
}

impl StubSolver {
    pub fn new(target: &'static str, answer: StubAnswer) -> Self {
        Self {
            target,
            answer,
            after: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn after(mut self, calls: usize) -> Self {
        self.after = calls;
        self
    }
}

impl Solver for StubSolver {
    fn solve(&self, problem: &Problem, options: &SolveOptions) -> Result<Solution, SolverError> {
        if problem.name() != self.target || self.calls.fetch_add(1, Ordering::Relaxed) < self.after {
            return MicroLpSolver.solve(problem, options);
        }
        match self.answer {
            StubAnswer::Infeasible => Ok(Solution::infeasible()),
            StubAnswer::TimedOut => Err(SolverError::TimedOut(problem.name().to_string())),
            StubAnswer::Incumbent | StubAnswer::IncumbentWithoutDuals => {
                let solved = MicroLpSolver.solve(problem, options)?;
                let duals = match self.answer {
                    StubAnswer::Incumbent => solved.duals().map(<[f64]>::to_vec),
                    _ => None,
                };
                Ok(Solution::new(
                    SolveStatus::TimeLimit,
                    solved.objective(),
                    solved.values().to_vec(),
                    duals,
                ))
            }
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}
