//! Path evaluator that computes timing, load, and feasibility.

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::models::VehicleClass;
use crate::network::{Network, VertexId, VertexKind};

/// Timing and load at one stop of a path.
#[derive(Debug, Clone, PartialEq)]
pub struct StopTiming {
    /// Vertex visited.
    pub vertex: VertexId,
    /// Arrival time, before any waiting.
    pub arrival_time: f64,
    /// Service start: arrival delayed to the window opening.
    pub service_start: f64,
    /// Service start plus stop duration.
    pub departure_time: f64,
    /// Cumulative load after this stop.
    pub load_after: f64,
    /// Cost of the arc into this stop (zero at the first stop).
    pub leg_cost: f64,
    /// Drive minutes of the arc into this stop.
    pub leg_drive_minutes: f64,
}

/// Forward schedule of a whole path.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub stops: Vec<StopTiming>,
    /// Sum of arc transportation costs.
    pub cost: f64,
    pub drive_minutes: f64,
    pub load: f64,
}

/// A type of constraint violation in a path.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationType {
    /// Cumulative demand exceeds the class capacity.
    CapacityExceeded { load: f64, capacity: f64 },
    /// Arrival after the window closes.
    TimeWindowViolated {
        vertex: VertexId,
        arrival: f64,
        due: f64,
    },
    /// A customer is visited more than once.
    RepeatedCustomer { vertex: VertexId },
    /// The path does not run from `DEPOT_LEAVE` to `DEPOT_ENTER`.
    InvalidEndpoints,
}

/// A constraint violation in a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a violation of the given kind.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

/// Evaluates stop sequences against the network and one vehicle class:
/// earliest-start schedule, cumulative load, and feasibility.
///
/// # Examples
///
/// ```no_run
/// use u_cvrptw::evaluation::PathEvaluator;
/// use u_cvrptw::network::{Network, DEPOT_ENTER, DEPOT_LEAVE};
/// # fn demo(network: &Network) -> u_cvrptw::error::Result<()> {
/// let class = &network.vehicle_classes()[0];
/// let first = network.customers()[0].vertex();
/// let (schedule, violations) =
///     PathEvaluator::new(network, class).schedule(&[DEPOT_LEAVE, first, DEPOT_ENTER])?;
/// assert_eq!(schedule.stops.len(), 3);
/// assert!(violations.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct PathEvaluator<'a> {
    network: &'a Network,
    class: &'a VehicleClass,
}

impl<'a> PathEvaluator<'a> {
    /// Creates an evaluator for routes of `class`.
    pub fn new(network: &'a Network, class: &'a VehicleClass) -> Self {
        Self { network, class }
    }

    /// Computes the schedule of `stops`, departing the first stop as early as
    /// its window allows.
    ///
    /// Returns [`Error::MissingArc`] if two consecutive stops have no arc.
    pub fn schedule(&self, stops: &[VertexId]) -> Result<(Schedule, Vec<Violation>)> {
        let mut violations = Vec::new();
        let endpoints_ok = matches!(
            (stops.first(), stops.last()),
            (Some(&a), Some(&b)) if self.network.vertex(a).kind() == VertexKind::DepotLeave
                && self.network.vertex(b).kind() == VertexKind::DepotEnter
        );
        if !endpoints_ok {
            violations.push(Violation::new(ViolationType::InvalidEndpoints));
        }

        let mut schedule = Schedule {
            stops: Vec::new(),
            cost: 0.0,
            drive_minutes: 0.0,
            load: 0.0,
        };
        let mut seen = FxHashSet::default();
        let mut timings: Vec<StopTiming> = Vec::with_capacity(stops.len());

        for &id in stops {
            let vertex = self.network.vertex(id);
            if !vertex.is_depot() && !seen.insert(id) {
                violations.push(Violation::new(ViolationType::RepeatedCustomer { vertex: id }));
            }
            let (arrival, leg_cost, leg_drive) = match timings.last() {
                None => (vertex.window().ready(), 0.0, 0.0),
                Some(p) => {
                    let arc = self.network.arc_between(p.vertex, id).ok_or_else(|| Error::MissingArc {
                        from: self.network.vertex(p.vertex).name().to_string(),
                        to: vertex.name().to_string(),
                    })?;
                    (p.departure_time + arc.drive_minutes, arc.cost, arc.drive_minutes)
                }
            };
            if vertex.window().is_violated(arrival) {
                violations.push(Violation::new(ViolationType::TimeWindowViolated {
                    vertex: id,
                    arrival,
                    due: vertex.window().due(),
                }));
            }
            let service_start = vertex.window().service_start(arrival);
            schedule.load += vertex.demand();
            schedule.cost += leg_cost;
            schedule.drive_minutes += leg_drive;
            timings.push(StopTiming {
                vertex: id,
                arrival_time: arrival,
                service_start,
                departure_time: service_start + vertex.service_minutes(),
                load_after: schedule.load,
                leg_cost,
                leg_drive_minutes: leg_drive,
            });
        }

        if schedule.load > self.class.capacity() {
            violations.push(Violation::new(ViolationType::CapacityExceeded {
                load: schedule.load,
                capacity: self.class.capacity(),
            }));
        }
        schedule.stops = timings;
        Ok((schedule, violations))
    }

    /// Returns `true` if `stops` is a feasible route for the class.
    pub fn is_feasible(&self, stops: &[VertexId]) -> Result<bool> {
        Ok(self.schedule(stops)?.1.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerRow, DepotRow, InputTables, TransitRow, VehicleRow};
    use crate::network::{DEPOT_ENTER, DEPOT_LEAVE};

    // D at 0, A at 10, B at 20 on a line; drive minutes equal distance.
    fn network(b_window: (f64, f64), capacity: f64) -> Network {
        let pos: [(&str, f64); 3] = [("D", 0.0), ("A", 10.0), ("B", 20.0)];
        let mut transit = Vec::new();
        for (from, x) in pos {
            for (to, y) in pos {
                let d = (x - y).abs();
                transit.push(TransitRow {
                    from_location_name: from.into(),
                    to_location_name: to.into(),
                    drive_minutes: d,
                    transportation_cost: d,
                });
            }
        }
        let tables = InputTables {
            depots: vec![DepotRow {
                location_name: "D".into(),
                latitude: None,
                longitude: None,
                time_window_start: 0.0,
                time_window_end: 500.0,
            }],
            customers: vec![
                CustomerRow {
                    location_name: "A".into(),
                    latitude: None,
                    longitude: None,
                    time_window_start: 30.0,
                    time_window_end: 60.0,
                    demand: 4.0,
                    stop_time: 5.0,
                },
                CustomerRow {
                    location_name: "B".into(),
                    latitude: None,
                    longitude: None,
                    time_window_start: b_window.0,
                    time_window_end: b_window.1,
                    demand: 3.0,
                    stop_time: 5.0,
                },
            ],
            transit,
            vehicles: vec![VehicleRow {
                vehicle_name: "V".into(),
                capacity,
                vehicle_fixed_cost: 0.0,
                vehicle_variable_cost: 0.0,
            }],
        };
        Network::build(&tables).expect("valid")
    }

    #[test]
    fn test_waiting_and_chain() {
        let net = network((0.0, 100.0), 10.0);
        let eval = PathEvaluator::new(&net, &net.vehicle_classes()[0]);
        let a = net.customers()[0].vertex();
        let b = net.customers()[1].vertex();
        let (s, violations) = eval.schedule(&[DEPOT_LEAVE, a, b, DEPOT_ENTER]).expect("arcs");
        assert!(violations.is_empty());
        // arrive A at 10, wait to 30, depart 35, arrive B 45, depart 50, back 70
        assert!((s.stops[1].arrival_time - 10.0).abs() < 1e-10);
        assert!((s.stops[1].service_start - 30.0).abs() < 1e-10);
        assert!((s.stops[2].arrival_time - 45.0).abs() < 1e-10);
        assert!((s.stops[3].arrival_time - 70.0).abs() < 1e-10);
        assert!((s.cost - 40.0).abs() < 1e-10);
        assert!((s.load - 7.0).abs() < 1e-10);
        assert!((s.stops[3].departure_time - s.stops[0].departure_time - 70.0).abs() < 1e-10);
    }

    #[test]
    fn test_time_window_violated() {
        let net = network((0.0, 40.0), 10.0);
        let eval = PathEvaluator::new(&net, &net.vehicle_classes()[0]);
        let a = net.customers()[0].vertex();
        let b = net.customers()[1].vertex();
        let (_, violations) = eval.schedule(&[DEPOT_LEAVE, a, b, DEPOT_ENTER]).expect("arcs");
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0].kind,
            ViolationType::TimeWindowViolated { vertex, .. } if vertex == b
        ));
        assert!(eval.is_feasible(&[DEPOT_LEAVE, b, a, DEPOT_ENTER]).expect("arcs"));
    }

    #[test]
    fn test_capacity_exceeded() {
        let net = network((0.0, 100.0), 5.0);
        let eval = PathEvaluator::new(&net, &net.vehicle_classes()[0]);
        let a = net.customers()[0].vertex();
        let b = net.customers()[1].vertex();
        let (_, violations) = eval.schedule(&[DEPOT_LEAVE, a, b, DEPOT_ENTER]).expect("arcs");
        assert!(matches!(
            violations[0].kind,
            ViolationType::CapacityExceeded { load, capacity } if load == 7.0 && capacity == 5.0
        ));
    }

    #[test]
    fn test_structure_violations() {
        let net = network((0.0, 100.0), 50.0);
        let eval = PathEvaluator::new(&net, &net.vehicle_classes()[0]);
        let a = net.customers()[0].vertex();
        let b = net.customers()[1].vertex();
        let (_, violations) = eval.schedule(&[DEPOT_LEAVE, a, b, a]).expect("arcs");
        let kinds: Vec<_> = violations.into_iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationType::InvalidEndpoints));
        assert!(kinds.contains(&ViolationType::RepeatedCustomer { vertex: a }));
    }

    #[test]
    fn test_missing_arc() {
        let net = network((0.0, 100.0), 10.0);
        let eval = PathEvaluator::new(&net, &net.vehicle_classes()[0]);
        let err = eval.schedule(&[DEPOT_LEAVE, DEPOT_ENTER]).expect_err("no depot arc");
        assert!(matches!(err, Error::MissingArc { ref from, ref to } if from == "D_LEAVE" && to == "D_ENTER"));
    }
}
