//! Projection records, barycentric weights and attribute interpolation.

use mesh_types::Triangle;
use nalgebra::{Point3, Vector3};

/// Where one target vertex landed on the source surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionRecord {
    /// Projected point, or the vertex's own position when missed.
    pub hit: Point3<f64>,
    /// Corners of the hit triangle (collapsed onto `hit` when missed).
    pub triangle: Triangle,
    /// Source surface vertices at the triangle corners.
    pub source_vertices: [u32; 3],
    /// No source triangle was found.
    pub missed: bool,
}

impl ProjectionRecord {
    /// A successful projection.
    #[must_use]
    pub const fn hit(hit: Point3<f64>, triangle: Triangle, source_vertices: [u32; 3]) -> Self {
        Self {
            hit,
            triangle,
            source_vertices,
            missed: false,
        }
    }

    /// A failed projection anchored at the vertex's own position.
    #[must_use]
    pub const fn missed(own_position: Point3<f64>) -> Self {
        Self {
            hit: own_position,
            triangle: Triangle::collapsed(own_position),
            source_vertices: [0; 3],
            missed: true,
        }
    }
}

/// Barycentric weights `(u, v, w)` of a hit against its triangle corners.
///
/// NaN for misses and zero-area triangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric {
    /// Weight of the first corner.
    pub u: f64,
    /// Weight of the second corner.
    pub v: f64,
    /// Weight of the third corner.
    pub w: f64,
}

impl Barycentric {
    /// Undefined weights.
    pub const NAN: Self = Self {
        u: f64::NAN,
        v: f64::NAN,
        w: f64::NAN,
    };

    /// Weights of `point` against `triangle`.
    #[must_use]
    pub fn of(triangle: &Triangle, point: &Point3<f64>) -> Self {
        let [u, v, w] = triangle.barycentric(point);
        Self { u, v, w }
    }

    /// The weights as an array.
    #[must_use]
    pub const fn weights(&self) -> [f64; 3] {
        [self.u, self.v, self.w]
    }

    /// Sum of the weights; 1 for a valid hit.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.u + self.v + self.w
    }

    /// Whether all three weights are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.u.is_finite() && self.v.is_finite() && self.w.is_finite()
    }
}

/// Values that can be blended with barycentric weights.
pub trait Interpolate: Copy + Send + Sync {
    /// `u·a + v·b + w·c`.
    fn interpolate(corners: [Self; 3], weights: &Barycentric) -> Self;
}

impl Interpolate for f64 {
    fn interpolate([a, b, c]: [Self; 3], weights: &Barycentric) -> Self {
        a * weights.u + b * weights.v + c * weights.w
    }
}

impl Interpolate for Vector3<f64> {
    fn interpolate([a, b, c]: [Self; 3], weights: &Barycentric) -> Self {
        a * weights.u + b * weights.v + c * weights.w
    }
}

impl Interpolate for Point3<f64> {
    fn interpolate([a, b, c]: [Self; 3], weights: &Barycentric) -> Self {
        Point3::from(<Vector3<f64> as Interpolate>::interpolate(
            [a.coords, b.coords, c.coords],
            weights,
        ))
    }
}

/// Projection of every target vertex onto the source surface.
///
/// Produced once by [`ProjectionCache::ensure`](crate::ProjectionCache::ensure)
/// and read by every attribute transfer of the same request.
#[derive(Debug, Clone)]
pub struct ProjectionResult {
    records: Vec<ProjectionRecord>,
    weights: Vec<Barycentric>,
    degenerate: Vec<bool>,
    has_zero_area_hits: bool,
}

impl ProjectionResult {
    /// Compute barycentric weights for per-vertex records.
    ///
    /// Hits on zero-area triangles are flagged degenerate and keep NaN
    /// weights; this never fails.
    #[must_use]
    pub fn from_records(records: Vec<ProjectionRecord>) -> Self {
        let mut weights = Vec::with_capacity(records.len());
        let mut degenerate = Vec::with_capacity(records.len());
        for record in &records {
            if record.missed {
                weights.push(Barycentric::NAN);
                degenerate.push(false);
            } else if record.triangle.is_zero_area() {
                weights.push(Barycentric::NAN);
                degenerate.push(true);
            } else {
                weights.push(Barycentric::of(&record.triangle, &record.hit));
                degenerate.push(false);
            }
        }
        let has_zero_area_hits = degenerate.iter().any(|&d| d);
        Self {
            records,
            weights,
            degenerate,
            has_zero_area_hits,
        }
    }

    /// Number of target vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no target vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Per-vertex records.
    #[must_use]
    pub fn records(&self) -> &[ProjectionRecord] {
        &self.records
    }

    /// Per-vertex barycentric weights.
    #[must_use]
    pub fn weights(&self) -> &[Barycentric] {
        &self.weights
    }

    /// Whether any hit landed on a zero-area triangle.
    #[must_use]
    pub const fn has_zero_area_hits(&self) -> bool {
        self.has_zero_area_hits
    }

    /// Whether a vertex found no source triangle.
    #[must_use]
    pub fn is_missed(&self, vertex: usize) -> bool {
        self.records.get(vertex).map_or(true, |r| r.missed)
    }

    /// Whether a vertex hit a zero-area triangle.
    #[must_use]
    pub fn is_degenerate(&self, vertex: usize) -> bool {
        self.degenerate.get(vertex).copied().unwrap_or(false)
    }

    /// Number of missed vertices.
    #[must_use]
    pub fn missed_count(&self) -> usize {
        self.records.iter().filter(|r| r.missed).count()
    }

    /// Number of vertices that hit a zero-area triangle.
    #[must_use]
    pub fn degenerate_count(&self) -> usize {
        self.degenerate.iter().filter(|&&d| d).count()
    }

    /// Interpolate a per-source-vertex attribute at every target vertex.
    ///
    /// Missed and degenerate vertices (and records whose source indices
    /// fall outside `values`) yield `None`.
    #[must_use]
    pub fn interpolate<V: Interpolate>(&self, values: &[V]) -> Vec<Option<V>> {
        self.records
            .iter()
            .zip(&self.weights)
            .map(|(record, weights)| {
                if record.missed || !weights.is_finite() {
                    return None;
                }
                let [a, b, c] = record.source_vertices;
                let corners = [
                    *values.get(a as usize)?,
                    *values.get(b as usize)?,
                    *values.get(c as usize)?,
                ];
                Some(V::interpolate(corners, weights))
            })
            .collect()
    }
}
