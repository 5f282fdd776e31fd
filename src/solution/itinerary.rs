//! Re-expresses the selected columns as a per-route, per-stop itinerary.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::colgen::MasterSolution;
use crate::column::ColumnPool;
use crate::error::{Error, Result};
use crate::evaluation::PathEvaluator;
use crate::network::Network;

/// One stop of one route.
///
/// Times are the earliest feasible schedule: `arrival_time` is the service
/// start after any waiting, `departure_time` adds the stop duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StopRecord {
    pub path_name: String,
    pub vehicle_class: usize,
    pub stop_number: usize,
    /// Physical location; depot copies map back to the depot name.
    pub location_name: String,
    pub vertex_name: String,
    pub previous_location_name: Option<String>,
    pub arrival_time: f64,
    pub departure_time: f64,
    pub demand: f64,
    /// Cost of the incoming leg.
    pub transportation_cost: f64,
    /// Drive minutes of the incoming leg.
    pub drive_minutes: f64,
}

/// A selected route with its stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub path_name: String,
    pub vehicle_class: usize,
    /// Column cost: transportation plus the class fixed cost.
    pub cost: f64,
    pub load: f64,
    pub stops: Vec<StopRecord>,
}

/// The reported solution of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPlan {
    pub objective: f64,
    pub routes: Vec<PlannedRoute>,
}

impl RoutingPlan {
    /// Builds the plan from an integral master solution.
    pub fn compile(network: &Network, pool: &ColumnPool, master: &MasterSolution) -> Result<Self> {
        let mut routes = Vec::new();
        for id in master.selected_columns() {
            let column = pool
                .get(id)
                .ok_or_else(|| Error::InfeasibleMaster(format!("selected column {} is not pooled", id.0)))?;
            let path = column.path();
            let class = network.vehicle_class(path.vehicle_class()).ok_or_else(|| {
                Error::DataIntegrity(format!("path '{}' has unknown vehicle class", path.name()))
            })?;
            let (schedule, _) = PathEvaluator::new(network, class).schedule(path.stops())?;

            let mut previous: Option<String> = None;
            let stops = schedule
                .stops
                .iter()
                .enumerate()
                .map(|(stop_number, timing)| {
                    let vertex = network.vertex(timing.vertex);
                    let record = StopRecord {
                        path_name: path.name().to_string(),
                        vehicle_class: class.index(),
                        stop_number,
                        location_name: vertex.location_name().to_string(),
                        vertex_name: vertex.name().to_string(),
                        previous_location_name: previous.take(),
                        arrival_time: timing.service_start,
                        departure_time: timing.departure_time,
                        demand: vertex.demand(),
                        transportation_cost: timing.leg_cost,
                        drive_minutes: timing.leg_drive_minutes,
                    };
                    previous = Some(vertex.location_name().to_string());
                    record
                })
                .collect();
            routes.push(PlannedRoute {
                path_name: path.name().to_string(),
                vehicle_class: class.index(),
                cost: column.cost(),
                load: schedule.load,
                stops,
            });
        }
        Ok(Self {
            objective: master.objective,
            routes,
        })
    }

    /// Number of routes in the plan.
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// All stop records, route by route.
    pub fn stop_records(&self) -> impl Iterator<Item = &StopRecord> + '_ {
        self.routes.iter().flat_map(|r| r.stops.iter())
    }

    /// Writes one CSV row per stop, with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for record in self.stop_records() {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes the plan as pretty-printed JSON.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
