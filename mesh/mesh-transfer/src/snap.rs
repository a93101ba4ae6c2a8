//! Snapping transferred positions onto the closest source vertex.

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;
use mesh_types::Point3;

/// KD-tree over a set of source positions.
///
/// Built in one pass with [`ImmutableKdTree`], which accepts any number of
/// points sharing a coordinate (flat grids, planar patches).
pub struct VertexSnapper {
    tree: Option<ImmutableKdTree<f64, u32, 3, 32>>,
    positions: Vec<Point3<f64>>,
}

impl std::fmt::Debug for VertexSnapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexSnapper")
            .field("points", &self.positions.len())
            .finish_non_exhaustive()
    }
}

impl VertexSnapper {
    /// Index `positions`.
    #[must_use]
    pub fn new(positions: &[Point3<f64>]) -> Self {
        let points: Vec<[f64; 3]> = positions.iter().map(|p| [p.x, p.y, p.z]).collect();
        let tree = (!points.is_empty()).then(|| ImmutableKdTree::new_from_slice(&points));
        Self {
            tree,
            positions: positions.to_vec(),
        }
    }

    /// Closest indexed position, or `point` itself when nothing is indexed.
    #[must_use]
    pub fn snap(&self, point: &Point3<f64>) -> Point3<f64> {
        let Some(tree) = &self.tree else {
            return *point;
        };
        let nearest = tree.nearest_one::<SquaredEuclidean>(&[point.x, point.y, point.z]);
        let index = nearest.item as usize;
        self.positions.get(index).copied().unwrap_or(*point)
    }
}
