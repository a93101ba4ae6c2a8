//! Triangle type for geometric calculations.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cross-product magnitude at or below which a triangle counts as zero-area.
///
/// The cross product of two edges has a magnitude of twice the area.
pub const ZERO_AREA_EPSILON: f64 = 1e-12;

/// A triangle with concrete vertex positions.
///
/// Winding is **counter-clockwise (CCW) when viewed from the front**
/// (normal points toward viewer).
///
/// # Example
///
/// ```
/// use mesh_types::{Triangle, Point3};
///
/// let tri = Triangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
///
/// assert!((tri.area() - 0.5).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First vertex.
    pub v0: Point3<f64>,
    /// Second vertex.
    pub v1: Point3<f64>,
    /// Third vertex.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// A zero-size triangle collapsed onto a single point.
    ///
    /// Used as the placeholder corner set of a projection that missed.
    #[inline]
    #[must_use]
    pub const fn collapsed(point: Point3<f64>) -> Self {
        Self::new(point, point, point)
    }

    /// The corners as an array, in winding order.
    #[inline]
    #[must_use]
    pub const fn corners(&self) -> [Point3<f64>; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Compute the (unnormalized) face normal via cross product.
    ///
    /// The magnitude equals twice the triangle's area.
    #[inline]
    #[must_use]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Compute the unit face normal.
    ///
    /// Returns `None` for degenerate triangles (zero area).
    ///
    /// ```
    /// use mesh_types::{Triangle, Point3};
    ///
    /// let degen = Triangle::new(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(2.0, 0.0, 0.0),
    /// );
    /// assert!(degen.normal().is_none());
    /// ```
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len_sq = n.norm_squared();
        if len_sq > f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        }
    }

    /// Compute the area of the triangle.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Compute the centroid (center of mass).
    #[inline]
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Check whether the triangle has (near) zero area.
    ///
    /// Compares the cross product magnitude of two edges against
    /// [`ZERO_AREA_EPSILON`].
    #[inline]
    #[must_use]
    pub fn is_zero_area(&self) -> bool {
        self.normal_unnormalized().norm() <= ZERO_AREA_EPSILON
    }

    /// Closest point on the triangle to `point`.
    ///
    /// Region-based algorithm from "Real-Time Collision Detection"
    /// (Ericson), valid for degenerate triangles as well.
    ///
    /// ```
    /// use mesh_types::{Triangle, Point3};
    ///
    /// let tri = Triangle::new(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(10.0, 0.0, 0.0),
    ///     Point3::new(0.0, 10.0, 0.0),
    /// );
    /// let p = tri.closest_point(&Point3::new(2.0, 2.0, 5.0));
    /// assert!((p - Point3::new(2.0, 2.0, 0.0)).norm() < 1e-12);
    /// ```
    #[must_use]
    pub fn closest_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let (a, b, c) = (self.v0, self.v1, self.v2);
        let ab = b - a;
        let ac = c - a;
        let ap = point - a;

        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = point - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = point - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        a + ab * v + ac * w
    }

    /// Barycentric coordinates `[u, v, w]` of `point` projected onto the
    /// triangle's plane, such that `point ≈ u·v0 + v·v1 + w·v2`.
    ///
    /// Solves the 2×2 system built from edge dot products. The result is
    /// NaN (or infinite) when the triangle is degenerate; callers are expected
    /// to check [`Triangle::is_zero_area`] first.
    ///
    /// ```
    /// use mesh_types::{Triangle, Point3};
    ///
    /// let tri = Triangle::new(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// );
    /// let [u, v, w] = tri.barycentric(&tri.centroid());
    /// assert!((u - 1.0 / 3.0).abs() < 1e-12);
    /// assert!((v - 1.0 / 3.0).abs() < 1e-12);
    /// assert!((w - 1.0 / 3.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn barycentric(&self, point: &Point3<f64>) -> [f64; 3] {
        let e0 = self.v1 - self.v0;
        let e1 = self.v2 - self.v0;
        let ep = point - self.v0;

        let d00 = e0.dot(&e0);
        let d01 = e0.dot(&e1);
        let d11 = e1.dot(&e1);
        let d20 = ep.dot(&e0);
        let d21 = ep.dot(&e1);

        let denom = d00 * d11 - d01 * d01;
        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        [1.0 - v - w, v, w]
    }

    /// Evaluate barycentric weights against the corners.
    #[inline]
    #[must_use]
    pub fn point_at(&self, [u, v, w]: [f64; 3]) -> Point3<f64> {
        Point3::from(self.v0.coords * u + self.v1.coords * v + self.v2.coords * w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn right_triangle() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(5.0, 10.0, 0.0),
        )
    }

    #[test]
    fn closest_point_inside_face() {
        let tri = right_triangle();
        let closest = tri.closest_point(&Point3::new(5.0, 3.0, 5.0));
        assert_relative_eq!(closest.z, 0.0, epsilon = 1e-10);
        assert_relative_eq!(closest.x, 5.0, epsilon = 1e-10);
        assert_relative_eq!(closest.y, 3.0, epsilon = 1e-10);
    }

    #[test]
    fn closest_point_vertex_region() {
        let tri = right_triangle();
        let closest = tri.closest_point(&Point3::new(-5.0, -5.0, 0.0));
        assert_relative_eq!(closest.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(closest.y, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn closest_point_edge_region() {
        let tri = right_triangle();
        let closest = tri.closest_point(&Point3::new(5.0, -5.0, 0.0));
        assert_relative_eq!(closest.y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(closest.x, 5.0, epsilon = 1e-10);
    }

    #[test]
    fn barycentric_roundtrips_through_point_at() {
        let tri = right_triangle();
        let p = Point3::new(4.0, 2.5, 0.0);
        let bary = tri.barycentric(&p);
        assert_relative_eq!(bary.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        let back = tri.point_at(bary);
        assert_relative_eq!((back - p).norm(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn barycentric_at_corner() {
        let tri = right_triangle();
        let [u, v, w] = tri.barycentric(&tri.v1);
        assert_relative_eq!(u, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v, 1.0, epsilon = 1e-12);
        assert_relative_eq!(w, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_triangle_yields_non_finite_weights() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        assert!(tri.is_zero_area());
        let bary = tri.barycentric(&Point3::new(0.5, 0.0, 0.0));
        assert!(bary.iter().any(|x| !x.is_finite()));
    }

    #[test]
    fn collapsed_triangle_is_zero_area() {
        let tri = Triangle::collapsed(Point3::new(1.0, 2.0, 3.0));
        assert!(tri.is_zero_area());
        assert_relative_eq!(tri.area(), 0.0);
    }
}
