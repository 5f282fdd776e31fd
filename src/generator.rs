//! Seeded synthetic instances.
//!
//! Customers are placed uniformly on a square grid around a central depot.
//! Travel is Euclidean (rounded to a tenth of a minute) and costs
//! `cost_per_distance` per unit. Every customer's due time is drawn so the
//! out-and-back route `depot -> customer -> depot` fits the depot horizon,
//! which keeps every generated instance servable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{CustomerRow, DepotRow, InputTables, TransitRow, VehicleRow};

/// Depot location name of generated instances.
pub const DEPOT_NAME: &str = "DEPOT";

/// Parameters of [`generate`].
///
/// # Examples
///
/// ```
/// use u_cvrptw::generator::{generate, GeneratorConfig};
///
/// let tables = generate(&GeneratorConfig::new(5, 42)).unwrap();
/// assert_eq!(tables.customers.len(), 5);
/// assert_eq!(tables.transit.len(), 36);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub customers: usize,
    pub seed: u64,
    /// Side length of the square grid.
    pub grid_size: f64,
    /// Demands are drawn from `1..=max_demand`, capped at the capacity.
    pub max_demand: u32,
    pub service_minutes: f64,
    /// Width of each customer window ending at its due time.
    pub window_width: f64,
    /// Lower bound on the depot closing time.
    pub horizon: f64,
    pub cost_per_distance: f64,
    pub capacity: f64,
    pub fixed_cost: f64,
    pub fleet_size: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            customers: 10,
            seed: 0,
            grid_size: 100.0,
            max_demand: 10,
            service_minutes: 10.0,
            window_width: 60.0,
            horizon: 480.0,
            cost_per_distance: 1.0,
            capacity: 30.0,
            fixed_cost: 0.0,
            fleet_size: 1,
        }
    }
}

impl GeneratorConfig {
    /// Default parameters for `customers` customers drawn from `seed`.
    pub fn new(customers: usize, seed: u64) -> Self {
        Self {
            customers,
            seed,
            ..Self::default()
        }
    }

    /// Sets the grid side length.
    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Sets the largest demand drawn.
    pub fn with_max_demand(mut self, max_demand: u32) -> Self {
        self.max_demand = max_demand;
        self
    }

    /// Sets the vehicle capacity.
    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the fixed cost per vehicle.
    pub fn with_fixed_cost(mut self, fixed_cost: f64) -> Self {
        self.fixed_cost = fixed_cost;
        self
    }

    /// Sets the width of customer windows.
    pub fn with_window_width(mut self, width: f64) -> Self {
        self.window_width = width;
        self
    }

    /// Sets the lower bound on the depot closing time.
    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    /// Sets the stop time of every customer.
    pub fn with_service_minutes(mut self, minutes: f64) -> Self {
        self.service_minutes = minutes;
        self
    }

    /// Sets the number of vehicle rows.
    pub fn with_fleet_size(mut self, fleet_size: usize) -> Self {
        self.fleet_size = fleet_size;
        self
    }

    fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !positive(self.grid_size) {
            return Err(Error::Format("generator grid_size must be positive".into()));
        }
        if !(self.capacity.is_finite() && self.capacity >= 1.0) {
            return Err(Error::Format("generator capacity must be at least 1".into()));
        }
        if self.max_demand == 0 {
            return Err(Error::Format("generator max_demand must be at least 1".into()));
        }
        if self.fleet_size == 0 {
            return Err(Error::Format("generator fleet_size must be at least 1".into()));
        }
        for (name, value) in [
            ("service_minutes", self.service_minutes),
            ("window_width", self.window_width),
            ("horizon", self.horizon),
            ("cost_per_distance", self.cost_per_distance),
            ("fixed_cost", self.fixed_cost),
        ] {
            if !non_negative(value) {
                return Err(Error::Format(format!("generator {name} must be non-negative")));
            }
        }
        Ok(())
    }
}

/// Generates a servable single-depot instance. The same config always
/// yields the same tables.
pub fn generate(config: &GeneratorConfig) -> Result<InputTables> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let center = config.grid_size / 2.0;
    let mut points = vec![(center, center)];
    for _ in 0..config.customers {
        let x = rng.random_range(0.0..=config.grid_size);
        let y = rng.random_range(0.0..=config.grid_size);
        points.push((x, y));
    }
    let names: Vec<String> = std::iter::once(DEPOT_NAME.to_string())
        .chain((1..=config.customers).map(|i| format!("C{i}")))
        .collect();

    let distance = |a: (f64, f64), b: (f64, f64)| {
        let d = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
        (d * 10.0).round() / 10.0
    };
    let from_depot: Vec<f64> = points[1..].iter().map(|&p| distance(points[0], p)).collect();
    let farthest = from_depot.iter().copied().fold(0.0, f64::max);
    // one minute of slack below the depot closing
    let closing = config.horizon.max(2.0 * farthest + config.service_minutes).ceil() + 1.0;

    let max_demand = config.max_demand.min(config.capacity.floor() as u32).max(1);
    let customers = from_depot
        .iter()
        .zip(&names[1..])
        .map(|(&d, name)| {
            let latest = closing - 1.0 - d - config.service_minutes;
            let due = if latest > d { rng.random_range(d..=latest) } else { d };
            let due = due.floor().max(d);
            CustomerRow {
                location_name: name.clone(),
                latitude: None,
                longitude: None,
                time_window_start: (due - config.window_width).max(0.0),
                time_window_end: due,
                demand: f64::from(rng.random_range(1..=max_demand)),
                stop_time: config.service_minutes,
            }
        })
        .collect();

    let mut transit = Vec::with_capacity(points.len() * points.len());
    for (i, &a) in points.iter().enumerate() {
        for (j, &b) in points.iter().enumerate() {
            let d = distance(a, b);
            transit.push(TransitRow {
                from_location_name: names[i].clone(),
                to_location_name: names[j].clone(),
                drive_minutes: d,
                transportation_cost: d * config.cost_per_distance,
            });
        }
    }

    let vehicles = (1..=config.fleet_size)
        .map(|i| VehicleRow {
            vehicle_name: format!("V{i}"),
            capacity: config.capacity,
            vehicle_fixed_cost: config.fixed_cost,
            vehicle_variable_cost: 0.0,
        })
        .collect();

    Ok(InputTables {
        depots: vec![DepotRow {
            location_name: DEPOT_NAME.to_string(),
            latitude: None,
            longitude: None,
            time_window_start: 0.0,
            time_window_end: closing,
        }],
        customers,
        transit,
        vehicles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;

    #[test]
    fn test_deterministic() {
        let config = GeneratorConfig::new(6, 7);
        assert_eq!(generate(&config).expect("gen"), generate(&config).expect("gen"));
        let other = generate(&GeneratorConfig::new(6, 8)).expect("gen");
        assert_ne!(generate(&config).expect("gen"), other);
    }

    #[test]
    fn test_generated_instance_builds() {
        for seed in 0..10 {
            let tables = generate(&GeneratorConfig::new(8, seed).with_window_width(20.0)).expect("gen");
            let network = Network::build(&tables).expect("servable");
            assert_eq!(network.num_customers(), 8);
        }
    }

    #[test]
    fn test_demand_capped_by_capacity() {
        let config = GeneratorConfig::new(20, 3).with_capacity(4.0).with_max_demand(50);
        let tables = generate(&config).expect("gen");
        assert!(tables.customers.iter().all(|c| c.demand >= 1.0 && c.demand <= 4.0));
    }

    #[test]
    fn test_transit_is_complete() {
        let tables = generate(&GeneratorConfig::new(3, 1)).expect("gen");
        assert_eq!(tables.transit.len(), 16);
        let diagonal = tables
            .transit
            .iter()
            .filter(|t| t.from_location_name == t.to_location_name);
        assert!(diagonal.clone().count() == 4 && diagonal.map(|t| t.drive_minutes).all(|d| d == 0.0));
    }

    #[test]
    fn test_invalid_config() {
        assert!(generate(&GeneratorConfig::new(3, 1).with_capacity(0.5)).is_err());
        assert!(generate(&GeneratorConfig::new(3, 1).with_fleet_size(0)).is_err());
        let err = generate(&GeneratorConfig::new(3, 1).with_grid_size(-1.0)).expect_err("grid");
        assert_eq!(err.kind(), "FormatError");
    }

    #[test]
    fn test_zero_customers() {
        let tables = generate(&GeneratorConfig::new(0, 1)).expect("gen");
        assert!(tables.customers.is_empty());
        assert_eq!(tables.transit.len(), 1);
    }
}
