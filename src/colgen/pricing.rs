//! Pricing subproblem: elementary shortest path with time windows and
//! capacity, formulated as a binary flow model over the arc set.
//!
//! For one vehicle class with capacity `Q` and dual prices `π`:
//!
//! ```text
//! min   Σ (c_ij − π_i) x_ij + fixed          (π of DEPOT_LEAVE is 0)
//! s.t.  Σ_j x_LEAVE,j = 1
//!       Σ_i x_i,ENTER = 1
//!       Σ_i x_ih − Σ_j x_hj = 0,  Σ_i x_ih ≤ 1     for every customer h
//!       Σ q_i x_ij ≤ Q
//!       x_ij = 1  ⇒  t_j ≥ t_i + s_i + d_ij       (big-M, M_ij per arc)
//!       a_i ≤ t_i ≤ b_i,  x_ij ∈ {0, 1}
//! ```
//!
//! Arcs that no feasible route can use for the class are left out of the
//! model altogether.
//!
//! The first leg out of `DEPOT_LEAVE` is priced like any other arc with a
//! zero dual, so the solver objective of a depot-connected selection equals
//! the reduced cost of its route: column cost plus fixed cost minus the duals
//! of the customers it visits.
//!
//! Cycles whose legs take zero minutes satisfy the time rules, so a selection
//! may hold customer cycles detached from the depot. Each such cycle over the
//! vertex set `S` is cut off with `Σ_{i,j ∈ S} x_ij ≤ |S| − 1` and the model
//! is solved again, until the selected arcs form a single depot-to-depot
//! chain.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument, warn};

use super::master::DualPrices;
use crate::column::{self, Path};
use crate::error::{Error, Result};
use crate::evaluation::PathEvaluator;
use crate::lp::{
    Constraint, Implication, Problem, Relation, Sense, SolveOptions, SolveStatus, Solver, VarId, Variable,
};
use crate::models::VehicleClass;
use crate::network::{Arc, Network, VertexId, DEPOT_ENTER, DEPOT_LEAVE};

const ARC_SELECTED: f64 = 0.5;

/// Best route found for one vehicle class.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingOutcome {
    /// Class the route was priced for.
    pub vehicle_class: usize,
    /// Solver objective, fixed cost included.
    pub objective: f64,
    /// Reduced cost of the reconstructed path: its column cost minus the
    /// dual prices of the customers it visits.
    pub reduced_cost: f64,
    pub path: Path,
    /// Status of the last pricing solve.
    pub status: SolveStatus,
}

/// Slack constant that deactivates the time rule of an unused arc:
/// `M_ij = max(0, b_i + s_i + d_ij − a_j)`.
pub fn big_m(network: &Network, arc: &Arc) -> f64 {
    let from = network.vertex(arc.from);
    let to = network.vertex(arc.to);
    (from.window().due() + from.service_minutes() + arc.drive_minutes - to.window().ready()).max(0.0)
}

/// Returns `true` if some route of `class` could traverse `arc`.
pub fn arc_usable(network: &Network, class: &VehicleClass, arc: &Arc) -> bool {
    let from = network.vertex(arc.from);
    let to = network.vertex(arc.to);
    let earliest = from.window().ready() + from.service_minutes() + arc.drive_minutes;
    earliest <= to.window().due() && class.fits(from.demand() + to.demand())
}

struct PricingModel {
    problem: Problem,
    arcs: Vec<(VarId, VertexId, VertexId)>,
    times: Vec<VarId>,
}

impl PricingModel {
    fn build(network: &Network, class: &VehicleClass, duals: &DualPrices) -> Option<Self> {
        let usable: Vec<&Arc> = network
            .arcs()
            .iter()
            .filter(|arc| arc_usable(network, class, arc))
            .collect();
        if !usable.iter().any(|arc| arc.from == DEPOT_LEAVE) {
            return None;
        }

        let mut problem = Problem::new(format!("SU_CVRPTW_{}", class.index()), Sense::Minimize);
        problem.set_objective_offset(class.fixed_cost());

        let times: Vec<VarId> = network
            .vertices()
            .iter()
            .map(|v| {
                problem.add_variable(
                    Variable::continuous(format!("Time_{}", v.name()))
                        .bounds(v.window().ready(), v.window().due()),
                )
            })
            .collect();

        let mut arcs = Vec::with_capacity(usable.len());
        let mut outgoing: FxHashMap<VertexId, Vec<VarId>> = FxHashMap::default();
        let mut incoming: FxHashMap<VertexId, Vec<VarId>> = FxHashMap::default();
        let mut load = Vec::new();
        for arc in &usable {
            let from = network.vertex(arc.from);
            let price = from.customer_index().map_or(0.0, |c| duals.get(c));
            let x = problem.add_variable(
                Variable::binary(format!("Assign_{}_{}", from.name(), network.vertex(arc.to).name()))
                    .obj(arc.cost - price),
            );
            arcs.push((x, arc.from, arc.to));
            outgoing.entry(arc.from).or_default().push(x);
            incoming.entry(arc.to).or_default().push(x);
            if !from.is_depot() {
                load.push((x, from.demand()));
            }
            problem.add_implication(Implication::new(
                format!("timewindow_{}_{}", from.name(), network.vertex(arc.to).name()),
                x,
                vec![(times[arc.to.index()], 1.0), (times[arc.from.index()], -1.0)],
                from.service_minutes() + arc.drive_minutes,
                big_m(network, arc),
            ));
        }

        let ones = |vars: Option<&Vec<VarId>>, sign: f64| -> Vec<(VarId, f64)> {
            vars.map(|v| v.iter().map(|&x| (x, sign)).collect()).unwrap_or_default()
        };
        problem.add_constraint(Constraint::new(
            "entryDepotConnection",
            ones(outgoing.get(&DEPOT_LEAVE), 1.0),
            Relation::Equal,
            1.0,
        ));
        problem.add_constraint(Constraint::new(
            "exitDepotConnection",
            ones(incoming.get(&DEPOT_ENTER), 1.0),
            Relation::Equal,
            1.0,
        ));
        for customer in network.customers() {
            let v = customer.vertex();
            let inflow = ones(incoming.get(&v), 1.0);
            let mut flow = inflow.clone();
            flow.extend(ones(outgoing.get(&v), -1.0));
            if flow.is_empty() {
                continue;
            }
            problem.add_constraint(Constraint::new(
                format!("forTrip{}", customer.name()),
                flow,
                Relation::Equal,
                0.0,
            ));
            if !inflow.is_empty() {
                problem.add_constraint(Constraint::new(
                    format!("visitOnce{}", customer.name()),
                    inflow,
                    Relation::LessEq,
                    1.0,
                ));
            }
        }
        problem.add_constraint(Constraint::new("Capacity", load, Relation::LessEq, class.capacity()));

        Some(Self {
            problem,
            arcs,
            times,
        })
    }

    /// Adds `Σ x_ij ≤ |S| − 1` over every model arc inside the sorted vertex set `cycle`.
    fn eliminate(&mut self, cycle: &[VertexId], cut: usize) {
        let inside = |v: &VertexId| cycle.binary_search(v).is_ok();
        let terms = self
            .arcs
            .iter()
            .filter(|(_, from, to)| inside(from) && inside(to))
            .map(|&(x, _, _)| (x, 1.0))
            .collect();
        self.problem.add_constraint(Constraint::new(
            format!("subtour_{cut}"),
            terms,
            Relation::LessEq,
            (cycle.len() - 1) as f64,
        ));
    }
}

/// Builds and solves the pricing model for each vehicle class.
pub struct PricingProblem<'a> {
    network: &'a Network,
    solver: &'a dyn Solver,
    options: SolveOptions,
}

impl<'a> PricingProblem<'a> {
    /// Pricing over `network`; every solve gets a copy of `options`.
    pub fn new(network: &'a Network, solver: &'a dyn Solver, options: SolveOptions) -> Self {
        Self {
            network,
            solver,
            options,
        }
    }

    /// Finds the minimum reduced-cost route for `class` and names it `path_name`.
    ///
    /// Fails with [`Error::NoRouteFound`] if the class can start no route, the
    /// solver reports infeasibility, or the selected arcs do not reduce to a
    /// feasible route; with [`Error::SolverTimeout`] if the budget expires
    /// without an incumbent.
    #[instrument(level = "debug", skip(self, class, duals), fields(class = class.index()))]
    pub fn solve_class(&self, class: &VehicleClass, duals: &DualPrices, path_name: &str) -> Result<PricingOutcome> {
        let mut model = PricingModel::build(self.network, class, duals).ok_or_else(|| {
            Error::NoRouteFound(format!("vehicle class {} can serve no customer", class.index()))
        })?;
        let mut cuts: FxHashSet<Vec<VertexId>> = FxHashSet::default();
        let (solution, stops) = loop {
            let solution = self.solver.solve(&model.problem, &self.options)?;
            match solution.status() {
                SolveStatus::Infeasible => {
                    return Err(Error::NoRouteFound(format!(
                        "'{}' is infeasible",
                        model.problem.name()
                    )))
                }
                SolveStatus::TimeLimit => warn!(
                    problem = model.problem.name(),
                    objective = solution.objective(),
                    "pricing time limit reached; using best incumbent"
                ),
                SolveStatus::Optimal => {}
            }

            let selected: Vec<(VertexId, VertexId, f64)> = model
                .arcs
                .iter()
                .filter(|(x, _, _)| solution.value(*x) > ARC_SELECTED)
                .map(|&(_, from, to)| (from, to, solution.value(model.times[to.index()])))
                .collect();
            let chained = chain(self.network, &selected)?;
            if chained.leftover.is_empty() {
                break (solution, chained.stops);
            }
            for cycle in subtours(&chained.leftover) {
                if !cuts.insert(cycle.clone()) {
                    return Err(Error::NoRouteFound(format!(
                        "'{}' keeps selecting a cycle through '{}'",
                        model.problem.name(),
                        self.network.vertex(cycle[0]).name()
                    )));
                }
                model.eliminate(&cycle, cuts.len());
            }
            debug!(cuts = cuts.len(), "detached cycles cut off; solving again");
        };
        let path = Path::new(path_name, stops, class.index());

        let (_, violations) = PathEvaluator::new(self.network, class).schedule(path.stops())?;
        if !violations.is_empty() {
            return Err(Error::NoRouteFound(format!(
                "priced route for class {} is infeasible: {:?}",
                class.index(),
                violations[0].kind
            )));
        }

        let covered: f64 = path
            .customer_vertices()
            .filter_map(|v| self.network.vertex(v).customer_index())
            .map(|c| duals.get(c))
            .sum();
        let reduced_cost = column::cost(&path, self.network)? + class.fixed_cost() - covered;
        debug!(
            objective = solution.objective(),
            reduced_cost,
            stops = path.len(),
            "pricing solved"
        );
        Ok(PricingOutcome {
            vehicle_class: class.index(),
            objective: solution.objective(),
            reduced_cost,
            path,
            status: solution.status(),
        })
    }

    /// Prices every vehicle class that can serve at least one customer and
    /// returns the overall minimum reduced cost; ties go to the lower class
    /// index.
    pub fn price_fleet(&self, duals: &DualPrices, path_name: &str, parallel: bool) -> Result<PricingOutcome> {
        let classes: Vec<&VehicleClass> = self
            .network
            .vehicle_classes()
            .iter()
            .filter(|class| {
                self.network
                    .outgoing(DEPOT_LEAVE)
                    .any(|arc| arc_usable(self.network, class, arc))
            })
            .collect();

        let outcomes: Vec<Result<PricingOutcome>> = if parallel && classes.len() > 1 {
            classes
                .par_iter()
                .map(|class| self.solve_class(class, duals, path_name))
                .collect()
        } else {
            classes
                .iter()
                .map(|class| self.solve_class(class, duals, path_name))
                .collect()
        };

        let mut best: Option<PricingOutcome> = None;
        for outcome in outcomes {
            let outcome = outcome?;
            if best.as_ref().map_or(true, |b| outcome.reduced_cost < b.reduced_cost) {
                best = Some(outcome);
            }
        }
        best.ok_or_else(|| Error::NoRouteFound("no vehicle class can serve any customer".into()))
    }
}

/// The depot-to-depot route in a selection and the selected arcs not on it.
#[derive(Debug)]
struct Chain {
    stops: Vec<VertexId>,
    leftover: Vec<(VertexId, VertexId)>,
}

/// Chains selected arcs from `DEPOT_LEAVE` to `DEPOT_ENTER`. Among several
/// successors of one vertex the one with the earliest solved time wins.
fn chain(network: &Network, selected: &[(VertexId, VertexId, f64)]) -> Result<Chain> {
    let mut successors: FxHashMap<VertexId, Vec<(VertexId, f64)>> = FxHashMap::default();
    for &(from, to, time) in selected {
        successors.entry(from).or_default().push((to, time));
    }
    let broken = |at: VertexId| {
        Error::NoRouteFound(format!(
            "selected arcs do not chain from depot to depot (stopped at '{}')",
            network.vertex(at).name()
        ))
    };

    let mut stops = vec![DEPOT_LEAVE];
    let mut current = DEPOT_LEAVE;
    while current != DEPOT_ENTER {
        let next = successors
            .get(&current)
            .and_then(|next| next.iter().min_by(|a, b| a.1.total_cmp(&b.1)))
            .map(|&(to, _)| to)
            .ok_or_else(|| broken(current))?;
        if stops.contains(&next) {
            return Err(broken(next));
        }
        stops.push(next);
        current = next;
    }

    let on_chain: FxHashSet<(VertexId, VertexId)> = stops.windows(2).map(|leg| (leg[0], leg[1])).collect();
    let leftover = selected
        .iter()
        .map(|&(from, to, _)| (from, to))
        .filter(|arc| !on_chain.contains(arc))
        .collect();
    Ok(Chain { stops, leftover })
}

/// Sorted vertex sets of the cycles formed by `leftover` arcs.
fn subtours(leftover: &[(VertexId, VertexId)]) -> Vec<Vec<VertexId>> {
    let mut successor: FxHashMap<VertexId, VertexId> = leftover.iter().copied().collect();
    let mut cycles = Vec::new();
    for &(start, _) in leftover {
        let mut cycle = Vec::new();
        let mut at = start;
        while let Some(next) = successor.remove(&at) {
            cycle.push(at);
            at = next;
        }
        if cycle.is_empty() {
            continue;
        }
        if !cycle.contains(&at) {
            cycle.push(at);
        }
        cycle.sort_unstable();
        cycles.push(cycle);
    }
    cycles
}
