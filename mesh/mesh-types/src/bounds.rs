//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Triangle;

/// An axis-aligned bounding box (AABB).
///
/// # Example
///
/// ```
/// use mesh_types::{Aabb, Point3};
///
/// let aabb = Aabb::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(10.0, 10.0, 10.0),
/// );
///
/// assert_eq!(aabb.distance_squared_to(&Point3::new(5.0, 5.0, 5.0)), 0.0);
/// assert_eq!(aabb.distance_squared_to(&Point3::new(13.0, 5.0, 5.0)), 9.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner (smallest x, y, z values).
    pub min: Point3<f64>,
    /// Maximum corner (largest x, y, z values).
    pub max: Point3<f64>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Create a new AABB from minimum and maximum corners.
    ///
    /// The corners are automatically corrected if min > max for any axis.
    #[must_use]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self {
            min: Point3::new(min.x.min(max.x), min.y.min(max.y), min.z.min(max.z)),
            max: Point3::new(min.x.max(max.x), min.y.max(max.y), min.z.max(max.z)),
        }
    }

    /// Create an empty (inverted) AABB that absorbs anything merged into it.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Bounding box of a triangle.
    #[must_use]
    pub fn from_triangle(tri: &Triangle) -> Self {
        let mut bbox = Self::empty();
        for corner in tri.corners() {
            bbox.expand_to_include(&corner);
        }
        bbox
    }

    /// Check if the box contains no volume at all (inverted).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Size along each axis.
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Index of the longest axis (0=X, 1=Y, 2=Z).
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        let s = self.size();
        if s.x >= s.y && s.x >= s.z {
            0
        } else if s.y >= s.z {
            1
        } else {
            2
        }
    }

    /// Grow the box to include a point.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Grow the box to include another box.
    pub fn merge(&mut self, other: &Self) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// Squared distance from `point` to the box (zero inside).
    #[must_use]
    pub fn distance_squared_to(&self, point: &Point3<f64>) -> f64 {
        let dx = (self.min.x - point.x).max(0.0).max(point.x - self.max.x);
        let dy = (self.min.y - point.y).max(0.0).max(point.y - self.max.y);
        let dz = (self.min.z - point.z).max(0.0).max(point.z - self.max.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Slab test against a ray.
    ///
    /// Returns the entry parameter (clamped to zero when the origin is inside)
    /// or `None` when the ray misses or the box lies behind the origin.
    #[must_use]
    pub fn ray_entry(&self, origin: &Point3<f64>, inv_dir: &Vector3<f64>) -> Option<f64> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            let t1 = (self.min[axis] - origin[axis]) * inv_dir[axis];
            let t2 = (self.max[axis] - origin[axis]) * inv_dir[axis];
            // NaN (0 * inf) means the ray is parallel and on a slab face; keep bounds
            if t1.is_nan() || t2.is_nan() {
                continue;
            }
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }
        (t_min <= t_max).then_some(t_min)
    }
}
