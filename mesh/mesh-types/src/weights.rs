//! Named per-vertex weight maps (vertex groups).

use hashbrown::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named, sparse per-vertex scalar map.
///
/// Vertices without an assignment read as `0.0` in dense form.
///
/// # Example
///
/// ```
/// use mesh_types::WeightMap;
///
/// let mut map = WeightMap::new("spine");
/// map.set(2, 0.75);
/// assert_eq!(map.get(2), Some(0.75));
/// assert_eq!(map.get(0), None);
/// assert_eq!(map.to_dense(4), vec![0.0, 0.0, 0.75, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightMap {
    /// Map name, unique within a surface.
    pub name: String,
    /// Locked maps can be excluded from transfers.
    pub locked: bool,
    weights: HashMap<u32, f64>,
}

impl WeightMap {
    /// Create an empty, unlocked map.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locked: false,
            weights: HashMap::new(),
        }
    }

    /// Build a map from dense values; only strictly positive entries are stored.
    #[must_use]
    pub fn from_dense(name: impl Into<String>, weights: &[f64]) -> Self {
        let mut map = Self::new(name);
        map.assign_dense(weights);
        map
    }

    /// Set the locked flag.
    #[must_use]
    pub const fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Assign a weight to a vertex, replacing any previous value.
    pub fn set(&mut self, vertex: u32, weight: f64) {
        self.weights.insert(vertex, weight);
    }

    /// Remove a vertex from the map.
    pub fn remove(&mut self, vertex: u32) -> Option<f64> {
        self.weights.remove(&vertex)
    }

    /// Weight of a vertex, if assigned.
    #[must_use]
    pub fn get(&self, vertex: u32) -> Option<f64> {
        self.weights.get(&vertex).copied()
    }

    /// Number of assigned vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Check if no vertex is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Highest assigned vertex index, if any.
    #[must_use]
    pub fn max_vertex(&self) -> Option<u32> {
        self.weights.keys().copied().max()
    }

    /// Expand into a dense array of `vertex_count` entries.
    ///
    /// Assignments at or beyond `vertex_count` are ignored.
    #[must_use]
    pub fn to_dense(&self, vertex_count: usize) -> Vec<f64> {
        let mut dense = vec![0.0; vertex_count];
        for (&vertex, &weight) in &self.weights {
            if let Some(slot) = dense.get_mut(vertex as usize) {
                *slot = weight;
            }
        }
        dense
    }

    /// Replace the contents from a dense array.
    ///
    /// Strictly positive values are assigned, everything else is unassigned.
    #[allow(clippy::cast_possible_truncation)]
    // Vertex indices are u32 throughout the mesh types
    pub fn assign_dense(&mut self, weights: &[f64]) {
        self.weights.clear();
        for (i, &w) in weights.iter().enumerate() {
            if w > 0.0 {
                self.weights.insert(i as u32, w);
            }
        }
    }
}
