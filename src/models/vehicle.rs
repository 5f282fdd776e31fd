//! Vehicle classes of the fleet.

use serde::{Deserialize, Serialize};

use super::VehicleRow;

/// Vehicles sharing capacity and cost coefficients. Pricing solves one
/// subproblem per class.
///
/// # Examples
///
/// ```
/// use u_cvrptw::models::VehicleClass;
///
/// let class = VehicleClass::new(0, 200.0, 50.0)
///     .with_cost_per_minute(0.5)
///     .with_vehicles(vec!["V1".into(), "V2".into()]);
/// assert_eq!(class.capacity(), 200.0);
/// assert!(class.fits(150.0));
/// assert_eq!(class.vehicles().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleClass {
    index: usize,
    capacity: f64,
    fixed_cost: f64,
    cost_per_minute: f64,
    vehicles: Vec<String>,
}

impl VehicleClass {
    /// Creates a class with no variable cost and no member vehicles.
    pub fn new(index: usize, capacity: f64, fixed_cost: f64) -> Self {
        Self {
            index,
            capacity,
            fixed_cost,
            cost_per_minute: 0.0,
            vehicles: Vec::new(),
        }
    }

    /// Sets the cost per driven minute.
    pub fn with_cost_per_minute(mut self, cost: f64) -> Self {
        self.cost_per_minute = cost;
        self
    }

    /// Sets the member vehicle names.
    pub fn with_vehicles(mut self, vehicles: Vec<String>) -> Self {
        self.vehicles = vehicles;
        self
    }

    /// Groups vehicle rows by identical capacity and cost coefficients.
    ///
    /// Classes are ordered by ascending capacity, then fixed cost, then
    /// variable cost; member names keep their input order.
    pub fn group(rows: &[VehicleRow]) -> Vec<VehicleClass> {
        let mut classes: Vec<VehicleClass> = Vec::new();
        for row in rows {
            let existing = classes.iter_mut().find(|c| {
                c.capacity == row.capacity
                    && c.fixed_cost == row.vehicle_fixed_cost
                    && c.cost_per_minute == row.vehicle_variable_cost
            });
            match existing {
                Some(class) => class.vehicles.push(row.vehicle_name.clone()),
                None => classes.push(
                    VehicleClass::new(0, row.capacity, row.vehicle_fixed_cost)
                        .with_cost_per_minute(row.vehicle_variable_cost)
                        .with_vehicles(vec![row.vehicle_name.clone()]),
                ),
            }
        }
        classes.sort_by(|a, b| {
            a.capacity
                .total_cmp(&b.capacity)
                .then(a.fixed_cost.total_cmp(&b.fixed_cost))
                .then(a.cost_per_minute.total_cmp(&b.cost_per_minute))
        });
        for (i, class) in classes.iter_mut().enumerate() {
            class.index = i;
        }
        classes
    }

    /// Position in [`Network::vehicle_classes`](crate::network::Network::vehicle_classes).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Maximum load.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Cost charged once per route operated by this class.
    pub fn fixed_cost(&self) -> f64 {
        self.fixed_cost
    }

    /// Cost per driven minute. Reported only; not part of the route cost.
    pub fn cost_per_minute(&self) -> f64 {
        self.cost_per_minute
    }

    /// Names of the vehicles in this class.
    pub fn vehicles(&self) -> &[String] {
        &self.vehicles
    }

    /// Returns `true` if a load of `demand` fits.
    pub fn fits(&self, demand: f64) -> bool {
        demand <= self.capacity
    }
}
