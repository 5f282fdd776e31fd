//! Routes as ordered stop sequences.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::network::{CustomerIndex, Network, VertexId, DEPOT_ENTER, DEPOT_LEAVE};

/// A named route from `DEPOT_LEAVE` to `DEPOT_ENTER` operated by one
/// vehicle class.
///
/// A path's identity is its name; its value is the stop list.
///
/// # Examples
///
/// ```
/// use u_cvrptw::column::Path;
/// use u_cvrptw::network::{VertexId, DEPOT_ENTER, DEPOT_LEAVE};
///
/// let path = Path::new("PATH 0", vec![DEPOT_LEAVE, VertexId(2), DEPOT_ENTER], 0);
/// assert_eq!(path.name(), "PATH 0");
/// assert_eq!(path.customer_vertices().collect::<Vec<_>>(), vec![VertexId(2)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    name: String,
    stops: Vec<VertexId>,
    vehicle_class: usize,
}

impl Path {
    /// Creates a path over `stops` for `vehicle_class`.
    pub fn new(name: impl Into<String>, stops: Vec<VertexId>, vehicle_class: usize) -> Self {
        Self {
            name: name.into(),
            stops,
            vehicle_class,
        }
    }

    /// Path name, unique within a pool.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered stops, depot copies included.
    pub fn stops(&self) -> &[VertexId] {
        &self.stops
    }

    /// Index of the vehicle class operating this path.
    pub fn vehicle_class(&self) -> usize {
        self.vehicle_class
    }

    /// Customer vertices in visit order.
    pub fn customer_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.stops
            .iter()
            .copied()
            .filter(|&v| v != DEPOT_LEAVE && v != DEPOT_ENTER)
    }

    /// Number of customer stops.
    pub fn len(&self) -> usize {
        self.customer_vertices().count()
    }

    /// Returns `true` if the path visits no customer.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sums the transportation cost over consecutive stops.
///
/// Fails with [`Error::MissingArc`] when a consecutive pair has no arc.
pub fn cost(path: &Path, network: &Network) -> Result<f64> {
    path.stops.windows(2).try_fold(0.0, |total, pair| {
        let arc = network
            .arc_between(pair[0], pair[1])
            .ok_or_else(|| Error::MissingArc {
                from: network.vertex(pair[0]).name().to_string(),
                to: network.vertex(pair[1]).name().to_string(),
            })?;
        Ok(total + arc.cost)
    })
}

/// Returns `true` if `path` visits `customer`.
pub fn covers(path: &Path, customer: CustomerIndex) -> bool {
    path.stops.contains(&customer.vertex())
}

/// One out-and-back path per customer, named `PATH <i>` in customer order
/// and assigned to the cheapest class that can carry the customer's demand.
///
/// Together these cover every customer, so the master problem is feasible
/// from the first iteration.
pub fn seed_paths(network: &Network) -> Vec<Path> {
    network
        .customers()
        .iter()
        .enumerate()
        .filter_map(|(i, customer)| {
            let class = network.cheapest_class_for(customer.demand())?;
            Some(Path::new(
                format!("PATH {i}"),
                vec![DEPOT_LEAVE, customer.vertex(), DEPOT_ENTER],
                class.index(),
            ))
        })
        .collect()
}
