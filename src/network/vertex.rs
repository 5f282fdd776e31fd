//! Vertex arena entries.

use serde::{Deserialize, Serialize};

use crate::models::TimeWindow;

/// Index into [`Network::vertices`](super::Network::vertices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Position in the vertex arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Vertex every route leaves from.
pub const DEPOT_LEAVE: VertexId = VertexId(0);
/// Vertex every route returns to.
pub const DEPOT_ENTER: VertexId = VertexId(1);

/// Dense 0-based customer index used for partitioning rows and dual prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerIndex(pub u32);

impl CustomerIndex {
    /// Position in [`Network::customers`](super::Network::customers).
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Vertex of the customer with this index.
    pub fn vertex(self) -> VertexId {
        VertexId(self.0 + 2)
    }
}

/// Role of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexKind {
    /// Depot copy routes start from.
    DepotLeave,
    /// Depot copy routes end at.
    DepotEnter,
    /// A customer stop.
    Customer,
}

/// A network vertex.
///
/// The depot appears twice, as `<depot>_LEAVE` and `<depot>_ENTER`, so that a
/// route is a simple path with distinct endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    id: VertexId,
    name: String,
    kind: VertexKind,
    location_name: String,
    window: TimeWindow,
    demand: f64,
    service_minutes: f64,
}

impl Vertex {
    pub(crate) fn depot(id: VertexId, kind: VertexKind, depot_name: &str, window: TimeWindow) -> Self {
        let suffix = match kind {
            VertexKind::DepotLeave => "_LEAVE",
            _ => "_ENTER",
        };
        Self {
            id,
            name: format!("{depot_name}{suffix}"),
            kind,
            location_name: depot_name.to_string(),
            window,
            demand: 0.0,
            service_minutes: 0.0,
        }
    }

    pub(crate) fn customer(
        id: VertexId,
        name: &str,
        window: TimeWindow,
        demand: f64,
        service_minutes: f64,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: VertexKind::Customer,
            location_name: name.to_string(),
            window,
            demand,
            service_minutes,
        }
    }

    /// Arena index.
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Vertex name; depot copies carry the `_LEAVE` / `_ENTER` suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Depot copy or customer.
    pub fn kind(&self) -> VertexKind {
        self.kind
    }

    /// Name of the physical location.
    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    /// Time window; the depot window on both depot copies.
    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Demand served here; zero at the depot.
    pub fn demand(&self) -> f64 {
        self.demand
    }

    /// Stop duration; zero at the depot.
    pub fn service_minutes(&self) -> f64 {
        self.service_minutes
    }

    /// Returns `true` for both depot copies.
    pub fn is_depot(&self) -> bool {
        !matches!(self.kind, VertexKind::Customer)
    }

    /// Customer index of a customer vertex.
    pub fn customer_index(&self) -> Option<CustomerIndex> {
        match self.kind {
            VertexKind::Customer => Some(CustomerIndex(self.id.0 - 2)),
            _ => None,
        }
    }
}
