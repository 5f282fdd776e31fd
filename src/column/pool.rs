//! Append-only pool of priced columns.

use rustc_hash::{FxHashMap, FxHashSet};

use super::path::{self, Path};
use crate::error::{Error, Result};
use crate::network::{CustomerIndex, Network, VertexId};

/// Index into a [`ColumnPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub u32);

impl ColumnId {
    /// Position of the column in its pool.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A path with its precomputed master-problem coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    id: ColumnId,
    path: Path,
    cost: f64,
    coverage: Vec<CustomerIndex>,
}

impl Column {
    /// Prices `path`: transportation cost plus the fixed cost of its class.
    pub fn new(id: ColumnId, path: Path, network: &Network) -> Result<Self> {
        let class = network.vehicle_class(path.vehicle_class()).ok_or_else(|| {
            Error::DataIntegrity(format!(
                "path '{}' references unknown vehicle class {}",
                path.name(),
                path.vehicle_class()
            ))
        })?;
        let cost = path::cost(&path, network)? + class.fixed_cost();
        let coverage: Vec<CustomerIndex> = network
            .customers()
            .iter()
            .map(|customer| customer.index())
            .filter(|&customer| path::covers(&path, customer))
            .collect();
        Ok(Self {
            id,
            path,
            cost,
            coverage,
        })
    }

    /// Handle of the column in its pool.
    pub fn id(&self) -> ColumnId {
        self.id
    }

    /// The priced route.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the route, also the master variable name.
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Objective coefficient in the master problem.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Customers covered, sorted: the column of the partitioning matrix.
    pub fn coverage(&self) -> &[CustomerIndex] {
        &self.coverage
    }

    /// Returns `true` if the column has a one in the row of `customer`.
    pub fn covers(&self, customer: CustomerIndex) -> bool {
        self.coverage.binary_search(&customer).is_ok()
    }
}

/// The column pool owned by one column generation run.
///
/// Names are unique and a stop sequence is stored at most once per vehicle
/// class. Columns are never removed.
///
/// # Examples
///
/// ```no_run
/// use u_cvrptw::column::ColumnPool;
/// # fn demo(network: &u_cvrptw::network::Network) -> u_cvrptw::error::Result<()> {
/// let pool = ColumnPool::seeded(network)?;
/// assert_eq!(pool.len(), network.num_customers());
/// assert!(pool.by_name("PATH 0").is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ColumnPool {
    columns: Vec<Column>,
    by_name: FxHashMap<String, ColumnId>,
    routes: FxHashSet<(usize, Vec<VertexId>)>,
}

impl ColumnPool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool holding one out-and-back column per customer.
    pub fn seeded(network: &Network) -> Result<Self> {
        let mut pool = Self::new();
        for path in path::seed_paths(network) {
            pool.push(path, network)?;
        }
        Ok(pool)
    }

    /// Appends `path` as a new column.
    ///
    /// Fails with [`Error::DataIntegrity`] if the name or the route is
    /// already pooled.
    pub fn push(&mut self, path: Path, network: &Network) -> Result<ColumnId> {
        if self.by_name.contains_key(path.name()) {
            return Err(Error::DataIntegrity(format!(
                "column '{}' is already pooled",
                path.name()
            )));
        }
        if self.contains_route(&path) {
            return Err(Error::DataIntegrity(format!(
                "route of column '{}' is already pooled",
                path.name()
            )));
        }
        let id = ColumnId(self.columns.len() as u32);
        let column = Column::new(id, path, network)?;
        self.by_name.insert(column.name().to_string(), id);
        self.routes
            .insert((column.path().vehicle_class(), column.path().stops().to_vec()));
        self.columns.push(column);
        Ok(id)
    }

    /// Returns `true` if the same stops are pooled for the same class.
    pub fn contains_route(&self, path: &Path) -> bool {
        self.routes
            .contains(&(path.vehicle_class(), path.stops().to_vec()))
    }

    /// Next free name in the `PATH <i>` sequence.
    pub fn next_name(&self) -> String {
        let mut i = self.columns.len();
        loop {
            let name = format!("PATH {i}");
            if !self.by_name.contains_key(&name) {
                return name;
            }
            i += 1;
        }
    }

    /// Column by handle.
    pub fn get(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.index())
    }

    /// Column by route name.
    pub fn by_name(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).and_then(|&id| self.get(id))
    }

    /// Columns in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter()
    }

    /// Columns covering `customer`.
    pub fn covering(&self, customer: CustomerIndex) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(move |c| c.covers(customer))
    }

    /// Number of pooled columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the pool holds no column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{DEPOT_ENTER, DEPOT_LEAVE};
    use crate::testing::line_network;

    fn network() -> Network {
        line_network(
            &[("A", 10.0, 0.0, 500.0, 2.0), ("B", 20.0, 0.0, 500.0, 2.0)],
            &[("V", 10.0, 7.0)],
        )
    }

    #[test]
    fn test_seeded_pool() {
        let net = network();
        let pool = ColumnPool::seeded(&net).expect("seed");
        assert_eq!(pool.len(), 2);
        let c = pool.by_name("PATH 1").expect("seeded");
        // 20 out, 20 back, fixed 7
        assert!((c.cost() - 47.0).abs() < 1e-10);
        assert_eq!(c.coverage(), &[CustomerIndex(1)]);
        assert_eq!(pool.covering(CustomerIndex(0)).count(), 1);
        assert_eq!(pool.next_name(), "PATH 2");
    }

    #[test]
    fn test_push_rejects_duplicates() {
        let net = network();
        let mut pool = ColumnPool::seeded(&net).expect("seed");
        let both = vec![DEPOT_LEAVE, VertexId(2), VertexId(3), DEPOT_ENTER];
        let id = pool.push(Path::new("PATH 2", both.clone(), 0), &net).expect("new");
        assert_eq!(id, ColumnId(2));
        assert_eq!(pool.get(id).expect("pooled").coverage().len(), 2);

        let same_route = Path::new("PATH 3", both, 0);
        assert!(pool.contains_route(&same_route));
        assert!(pool.push(same_route, &net).is_err());

        let same_name = Path::new("PATH 0", vec![DEPOT_LEAVE, VertexId(3), VertexId(2), DEPOT_ENTER], 0);
        assert!(pool.push(same_name, &net).is_err());
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_push_unknown_class() {
        let net = network();
        let mut pool = ColumnPool::new();
        let path = Path::new("X", vec![DEPOT_LEAVE, VertexId(2), DEPOT_ENTER], 4);
        assert_eq!(pool.push(path, &net).expect_err("class").kind(), "DataIntegrityError");
        assert!(pool.is_empty());
    }
}
