//! Routing network: depot-duplicated vertices, arcs, customers, and fleet.
//!
//! The network is built once from the [`InputTables`] and is immutable
//! afterwards. Vertices and arcs live in contiguous arenas and are referenced
//! by [`VertexId`] / [`ArcId`]; index 0 is [`DEPOT_LEAVE`], index 1 is
//! [`DEPOT_ENTER`], customers follow in input order.

mod arc;
mod vertex;

pub use arc::{Arc, ArcId, ArcIndex};
pub use vertex::{CustomerIndex, Vertex, VertexId, VertexKind, DEPOT_ENTER, DEPOT_LEAVE};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::evaluation::PathEvaluator;
use crate::models::{Customer, InputTables, TimeWindow, TransitRow, VehicleClass};

/// The immutable routing network.
///
/// # Examples
///
/// ```
/// use u_cvrptw::models::{CustomerRow, DepotRow, InputTables, TransitRow, VehicleRow};
/// use u_cvrptw::network::{Network, DEPOT_LEAVE};
///
/// let names = ["D", "A"];
/// let mut transit = Vec::new();
/// for from in names {
///     for to in names {
///         let d = if from == to { 0.0 } else { 5.0 };
///         transit.push(TransitRow {
///             from_location_name: from.into(),
///             to_location_name: to.into(),
///             drive_minutes: d,
///             transportation_cost: d,
///         });
///     }
/// }
/// let tables = InputTables {
///     depots: vec![DepotRow {
///         location_name: "D".into(),
///         latitude: None,
///         longitude: None,
///         time_window_start: 0.0,
///         time_window_end: 100.0,
///     }],
///     customers: vec![CustomerRow {
///         location_name: "A".into(),
///         latitude: None,
///         longitude: None,
///         time_window_start: 0.0,
///         time_window_end: 50.0,
///         demand: 1.0,
///         stop_time: 2.0,
///     }],
///     transit,
///     vehicles: vec![VehicleRow {
///         vehicle_name: "V".into(),
///         capacity: 5.0,
///         vehicle_fixed_cost: 0.0,
///         vehicle_variable_cost: 0.0,
///     }],
/// };
/// let network = Network::build(&tables).unwrap();
/// assert_eq!(network.vertices().len(), 3);
/// // LEAVE->A, A->ENTER
/// assert_eq!(network.arcs().len(), 2);
/// assert_eq!(network.vertex(DEPOT_LEAVE).name(), "D_LEAVE");
/// ```
#[derive(Debug, Clone)]
pub struct Network {
    depot_name: String,
    vertices: Vec<Vertex>,
    arcs: Vec<Arc>,
    index: ArcIndex,
    customers: Vec<Customer>,
    vehicle_classes: Vec<VehicleClass>,
}

impl Network {
    /// Validates the input tables and builds the network.
    ///
    /// Fails with [`Error::DataIntegrity`] on any malformed or incomplete
    /// table, and when a customer cannot be served by a route of its own.
    #[instrument(level = "debug", skip(tables))]
    pub fn build(tables: &InputTables) -> Result<Self> {
        let depot = match tables.depots.as_slice() {
            [depot] => depot,
            [] => return Err(integrity("no depot row")),
            many => {
                return Err(integrity(format!(
                    "{} depot rows; exactly one depot is supported",
                    many.len()
                )))
            }
        };
        if tables.customers.is_empty() {
            return Err(integrity("no customer rows"));
        }
        if tables.vehicles.is_empty() {
            return Err(integrity("no vehicle rows"));
        }

        // 0 = depot, 1.. = customers
        let mut locations: FxHashMap<&str, usize> = FxHashMap::default();
        let names = std::iter::once(depot.location_name.as_str())
            .chain(tables.customers.iter().map(|c| c.location_name.as_str()));
        for (i, name) in names.enumerate() {
            if locations.insert(name, i).is_some() {
                return Err(integrity(format!("duplicate location name '{name}'")));
            }
        }
        check_vehicles(tables)?;

        let depot_window = window(
            &depot.location_name,
            depot.time_window_start,
            depot.time_window_end,
        )?;
        let mut vertices = vec![
            Vertex::depot(DEPOT_LEAVE, VertexKind::DepotLeave, &depot.location_name, depot_window),
            Vertex::depot(DEPOT_ENTER, VertexKind::DepotEnter, &depot.location_name, depot_window),
        ];
        let mut customers = Vec::with_capacity(tables.customers.len());
        for (i, row) in tables.customers.iter().enumerate() {
            let name = &row.location_name;
            let tw = window(name, row.time_window_start, row.time_window_end)?;
            if !(row.demand.is_finite() && row.demand > 0.0) {
                return Err(integrity(format!(
                    "customer '{name}' has non-positive demand {}",
                    row.demand
                )));
            }
            if !(row.stop_time.is_finite() && row.stop_time >= 0.0) {
                return Err(integrity(format!(
                    "customer '{name}' has invalid stop time {}",
                    row.stop_time
                )));
            }
            let index = CustomerIndex(i as u32);
            vertices.push(Vertex::customer(index.vertex(), name, tw, row.demand, row.stop_time));
            customers.push(Customer::new(index, index.vertex(), name.as_str(), row.demand, row.stop_time, tw));
        }

        let mut vertex_names = FxHashSet::default();
        for v in &vertices {
            if !vertex_names.insert(v.name()) {
                return Err(integrity(format!(
                    "vertex name '{}' clashes with a depot copy",
                    v.name()
                )));
            }
        }

        let n = locations.len();
        let matrix = transit_matrix(&tables.transit, &locations)?;
        let location_of = |v: &Vertex| if v.is_depot() { 0 } else { v.id().index() - 1 };

        let mut arcs = Vec::new();
        let mut index = ArcIndex::new(vertices.len());
        for from in &vertices {
            if from.kind() == VertexKind::DepotEnter {
                continue;
            }
            for to in &vertices {
                if to.kind() == VertexKind::DepotLeave
                    || from.id() == to.id()
                    || (from.is_depot() && to.is_depot())
                {
                    continue;
                }
                let (drive_minutes, cost) = matrix[location_of(from) * n + location_of(to)];
                let id = ArcId(arcs.len() as u32);
                arcs.push(Arc {
                    id,
                    from: from.id(),
                    to: to.id(),
                    drive_minutes,
                    cost,
                });
                index.insert(from.id(), to.id(), id);
            }
        }

        let network = Self {
            depot_name: depot.location_name.clone(),
            vertices,
            arcs,
            index,
            customers,
            vehicle_classes: VehicleClass::group(&tables.vehicles),
        };
        network.check_servable()?;
        debug!(
            vertices = network.vertices.len(),
            arcs = network.arcs.len(),
            classes = network.vehicle_classes.len(),
            "network built"
        );
        Ok(network)
    }

    /// Name of the depot location.
    pub fn depot_name(&self) -> &str {
        &self.depot_name
    }

    /// All vertices, indexed by [`VertexId`].
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertex by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this network.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// All arcs, indexed by [`ArcId`].
    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    /// Arc from `from` to `to`, if the network has one.
    pub fn arc_between(&self, from: VertexId, to: VertexId) -> Option<&Arc> {
        self.index.get(from, to).map(|id| &self.arcs[id.index()])
    }

    /// Arcs leaving `from`.
    pub fn outgoing(&self, from: VertexId) -> impl Iterator<Item = &Arc> + '_ {
        self.index.outgoing(from).iter().map(|id| &self.arcs[id.index()])
    }

    /// Customers in input order, indexed by [`CustomerIndex`].
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Customer by index.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not belong to this network.
    pub fn customer(&self, index: CustomerIndex) -> &Customer {
        &self.customers[index.index()]
    }

    /// Number of customers.
    pub fn num_customers(&self) -> usize {
        self.customers.len()
    }

    /// Vehicle classes ordered by capacity, then fixed cost.
    pub fn vehicle_classes(&self) -> &[VehicleClass] {
        &self.vehicle_classes
    }

    /// Vehicle class by index.
    pub fn vehicle_class(&self, index: usize) -> Option<&VehicleClass> {
        self.vehicle_classes.get(index)
    }

    /// Cheapest class able to carry `demand`: lowest fixed cost, then
    /// smallest capacity.
    pub fn cheapest_class_for(&self, demand: f64) -> Option<&VehicleClass> {
        self.vehicle_classes
            .iter()
            .filter(|c| c.fits(demand))
            .min_by(|a, b| a.fixed_cost().total_cmp(&b.fixed_cost()))
    }

    /// Every customer must fit some class and be reachable out-and-back
    /// within its own and the depot's windows.
    fn check_servable(&self) -> Result<()> {
        for customer in &self.customers {
            let Some(class) = self.cheapest_class_for(customer.demand()) else {
                return Err(integrity(format!(
                    "customer '{}' demand {} exceeds every vehicle capacity",
                    customer.name(),
                    customer.demand()
                )));
            };
            let stops = [DEPOT_LEAVE, customer.vertex(), DEPOT_ENTER];
            if !PathEvaluator::new(self, class).is_feasible(&stops)? {
                return Err(integrity(format!(
                    "customer '{}' cannot be served within its time window by any route",
                    customer.name()
                )));
            }
        }
        Ok(())
    }
}

fn integrity(msg: impl Into<String>) -> Error {
    Error::DataIntegrity(msg.into())
}

fn window(name: &str, start: f64, end: f64) -> Result<TimeWindow> {
    TimeWindow::new(start, end)
        .ok_or_else(|| integrity(format!("location '{name}' has invalid time window [{start}, {end}]")))
}

fn check_vehicles(tables: &InputTables) -> Result<()> {
    let mut names = FxHashSet::default();
    for v in &tables.vehicles {
        let name = &v.vehicle_name;
        if !names.insert(name.as_str()) {
            return Err(integrity(format!("duplicate vehicle name '{name}'")));
        }
        if !(v.capacity.is_finite() && v.capacity > 0.0) {
            return Err(integrity(format!(
                "vehicle '{name}' has non-positive capacity {}",
                v.capacity
            )));
        }
        if !(v.vehicle_fixed_cost.is_finite() && v.vehicle_variable_cost.is_finite()) {
            return Err(integrity(format!("vehicle '{name}' has non-finite costs")));
        }
    }
    Ok(())
}

/// Dense `(drive_minutes, cost)` matrix over locations, row-major.
fn transit_matrix(rows: &[TransitRow], locations: &FxHashMap<&str, usize>) -> Result<Vec<(f64, f64)>> {
    let n = locations.len();
    if rows.len() != n * n {
        return Err(integrity(format!(
            "transportation matrix has {} rows, expected {} for {} locations",
            rows.len(),
            n * n,
            n
        )));
    }
    let lookup = |name: &str| {
        locations
            .get(name)
            .copied()
            .ok_or_else(|| integrity(format!("transportation matrix references unknown location '{name}'")))
    };
    let mut matrix: Vec<Option<(f64, f64)>> = vec![None; n * n];
    for row in rows {
        let from = lookup(&row.from_location_name)?;
        let to = lookup(&row.to_location_name)?;
        for (what, value) in [("drive minutes", row.drive_minutes), ("cost", row.transportation_cost)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(integrity(format!(
                    "transit '{}' -> '{}' has invalid {what} {value}",
                    row.from_location_name, row.to_location_name
                )));
            }
        }
        let slot = &mut matrix[from * n + to];
        if slot.is_some() {
            return Err(integrity(format!(
                "duplicate transit pair '{}' -> '{}'",
                row.from_location_name, row.to_location_name
            )));
        }
        *slot = Some((row.drive_minutes, row.transportation_cost));
    }
    // n² distinct known pairs fill every slot
    Ok(matrix.into_iter().flatten().collect())
}
