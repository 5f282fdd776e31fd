//! Arcs and the dense vertex-pair arc index.

use serde::{Deserialize, Serialize};

use super::VertexId;

/// Index into [`Network::arcs`](super::Network::arcs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArcId(pub u32);

impl ArcId {
    /// Position of the arc in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A directed arc with its drive time and transportation cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub id: ArcId,
    pub from: VertexId,
    pub to: VertexId,
    pub drive_minutes: f64,
    pub cost: f64,
}

/// Dense n×n lookup from a vertex pair to its arc, stored row-major.
///
/// Also keeps per-vertex outgoing arc lists.
///
/// # Examples
///
/// ```
/// use u_cvrptw::network::{ArcId, ArcIndex, VertexId};
///
/// let mut index = ArcIndex::new(3);
/// index.insert(VertexId(0), VertexId(2), ArcId(0));
/// assert_eq!(index.get(VertexId(0), VertexId(2)), Some(ArcId(0)));
/// assert_eq!(index.get(VertexId(2), VertexId(0)), None);
/// assert_eq!(index.outgoing(VertexId(0)), &[ArcId(0)]);
/// ```
#[derive(Debug, Clone)]
pub struct ArcIndex {
    slots: Vec<Option<ArcId>>,
    outgoing: Vec<Vec<ArcId>>,
    size: usize,
}

impl ArcIndex {
    /// Creates an empty index over `size` vertices.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size * size],
            outgoing: vec![Vec::new(); size],
            size,
        }
    }

    /// Registers `arc` for the pair `(from, to)`.
    ///
    /// # Panics
    ///
    /// Panics if either vertex is out of bounds.
    pub fn insert(&mut self, from: VertexId, to: VertexId, arc: ArcId) {
        self.slots[from.index() * self.size + to.index()] = Some(arc);
        self.outgoing[from.index()].push(arc);
    }

    /// Arc from `from` to `to`, if one exists.
    pub fn get(&self, from: VertexId, to: VertexId) -> Option<ArcId> {
        if from.index() >= self.size || to.index() >= self.size {
            return None;
        }
        self.slots[from.index() * self.size + to.index()]
    }

    /// Arcs leaving `from`, in insertion order.
    pub fn outgoing(&self, from: VertexId) -> &[ArcId] {
        &self.outgoing[from.index()]
    }

    /// Number of vertices covered.
    pub fn size(&self) -> usize {
        self.size
    }
}
