#![allow(dead_code)]

use u_cvrptw::models::{CustomerRow, DepotRow, InputTables, TransitRow, VehicleRow};
use u_cvrptw::solution::RoutingPlan;

/// Planar instance builder with Euclidean drive minutes and unit cost.
pub struct PlanarInstance {
    depot_window: (f64, f64),
    customers: Vec<(String, (f64, f64), (f64, f64), f64, f64)>,
    vehicles: Vec<(String, f64, f64)>,
}

impl PlanarInstance {
    /// Depot at the origin, open over `[start, end]`.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            depot_window: (start, end),
            customers: Vec::new(),
            vehicles: Vec::new(),
        }
    }

    pub fn customer(mut self, name: &str, at: (f64, f64), window: (f64, f64), demand: f64, stop_time: f64) -> Self {
        self.customers.push((name.to_string(), at, window, demand, stop_time));
        self
    }

    pub fn vehicle(mut self, name: &str, capacity: f64, fixed_cost: f64) -> Self {
        self.vehicles.push((name.to_string(), capacity, fixed_cost));
        self
    }

    pub fn tables(&self) -> InputTables {
        let mut points = vec![("D".to_string(), (0.0, 0.0))];
        points.extend(self.customers.iter().map(|c| (c.0.clone(), c.1)));
        let mut transit = Vec::new();
        for (from, a) in &points {
            for (to, b) in &points {
                let d: f64 = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
                transit.push(TransitRow {
                    from_location_name: from.clone(),
                    to_location_name: to.clone(),
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
                time_window_start: self.depot_window.0,
                time_window_end: self.depot_window.1,
            }],
            customers: self
                .customers
                .iter()
                .map(|(name, _, window, demand, stop_time)| CustomerRow {
                    location_name: name.clone(),
                    latitude: None,
                    longitude: None,
                    time_window_start: window.0,
                    time_window_end: window.1,
                    demand: *demand,
                    stop_time: *stop_time,
                })
                .collect(),
            transit,
            vehicles: self
                .vehicles
                .iter()
                .map(|(name, capacity, fixed)| VehicleRow {
                    vehicle_name: name.clone(),
                    capacity: *capacity,
                    vehicle_fixed_cost: *fixed,
                    vehicle_variable_cost: 0.0,
                })
                .collect(),
        }
    }
}

/// Customer location names per route, depot stops excluded.
pub fn visits(plan: &RoutingPlan, depot: &str) -> Vec<Vec<String>> {
    plan.routes
        .iter()
        .map(|route| {
            route
                .stops
                .iter()
                .filter(|s| s.location_name != depot)
                .map(|s| s.location_name.clone())
                .collect()
        })
        .collect()
}
