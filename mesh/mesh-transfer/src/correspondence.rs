//! Correspondence strategies and the memoized projection cache.
//!
//! A [`CorrespondenceProvider`] maps every working vertex of the target
//! sampling surface to a point on the source surface. [`ProjectionCache`]
//! runs the provider at most once per request and keeps the result.

// Mesh processing uses u32 indices; casts are safe for practical mesh sizes.
#![allow(clippy::cast_possible_truncation)]

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::bvh::{Bvh, DEFAULT_MAX_LEAF_SIZE};
use crate::params::SearchMethod;
use crate::projection::{ProjectionRecord, ProjectionResult};
use crate::sampling::SamplingSurface;

/// Vertex count above which per-vertex queries run in parallel.
pub const PARALLEL_THRESHOLD: usize = 1000;

/// Strategy that projects target vertices onto the source surface.
pub trait CorrespondenceProvider: Send + Sync {
    /// One record per working vertex of `target`, in working-vertex order.
    fn project(
        &self,
        source: &SamplingSurface,
        source_index: &Bvh,
        target: &SamplingSurface,
    ) -> Vec<ProjectionRecord>;
}

/// Nearest point on the source surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestPoint;

/// Cast along the target vertex normal, then along its negation.
///
/// Vertices without a normal (no adjacent triangle) and UV-space surfaces
/// cast along +Z.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raycast;

impl CorrespondenceProvider for ClosestPoint {
    fn project(
        &self,
        source: &SamplingSurface,
        source_index: &Bvh,
        target: &SamplingSurface,
    ) -> Vec<ProjectionRecord> {
        for_each_vertex(target, |_, p| {
            source_index
                .nearest(p)
                .and_then(|hit| record_for(source, source_index, hit.triangle, hit.point))
                .unwrap_or_else(|| ProjectionRecord::missed(*p))
        })
    }
}

impl CorrespondenceProvider for Raycast {
    fn project(
        &self,
        source: &SamplingSurface,
        source_index: &Bvh,
        target: &SamplingSurface,
    ) -> Vec<ProjectionRecord> {
        let normals = target.normals();
        let uv_space = target.is_uv_space();
        for_each_vertex(target, |i, p| {
            let normal = normals
                .get(i)
                .copied()
                .filter(|n| !uv_space && n.norm_squared() > 0.0)
                .unwrap_or_else(Vector3::z);
            source_index
                .ray_cast(p, &normal)
                .or_else(|| source_index.ray_cast(p, &-normal))
                .and_then(|hit| record_for(source, source_index, hit.triangle, hit.point))
                .unwrap_or_else(|| ProjectionRecord::missed(*p))
        })
    }
}

/// Provider for a projected search method, `None` for [`SearchMethod::Topology`].
///
/// UV-space search is closest-point search on UV-space sampling surfaces.
#[must_use]
pub fn provider_for(method: SearchMethod) -> Option<Box<dyn CorrespondenceProvider>> {
    match method {
        SearchMethod::Closest | SearchMethod::UvSpace => Some(Box::new(ClosestPoint)),
        SearchMethod::Raycast => Some(Box::new(Raycast)),
        SearchMethod::Topology => None,
    }
}

fn for_each_vertex<F>(target: &SamplingSurface, query: F) -> Vec<ProjectionRecord>
where
    F: Fn(usize, &Point3<f64>) -> ProjectionRecord + Sync,
{
    let positions = &target.mesh().positions;
    if positions.len() > PARALLEL_THRESHOLD {
        positions
            .par_iter()
            .enumerate()
            .map(|(i, p)| query(i, p))
            .collect()
    } else {
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| query(i, p))
            .collect()
    }
}

fn record_for(
    source: &SamplingSurface,
    source_index: &Bvh,
    triangle: u32,
    point: Point3<f64>,
) -> Option<ProjectionRecord> {
    let face = source.mesh().faces.get(triangle as usize)?;
    let map = source.vertex_map();
    let ids = [
        *map.get(face[0] as usize)?,
        *map.get(face[1] as usize)?,
        *map.get(face[2] as usize)?,
    ];
    let corners = *source_index.triangle(triangle)?;
    Some(ProjectionRecord::hit(point, corners, ids))
}

/// Lazily built projection of a target onto a source.
///
/// Owns both sampling surfaces and the source index; all of them are
/// dropped with the cache.
pub struct ProjectionCache {
    source: SamplingSurface,
    target: SamplingSurface,
    provider: Box<dyn CorrespondenceProvider>,
    index: Option<Bvh>,
    result: Option<ProjectionResult>,
}

impl std::fmt::Debug for ProjectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionCache")
            .field("source_vertices", &self.source.surface_vertex_count())
            .field("target_vertices", &self.target.surface_vertex_count())
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl ProjectionCache {
    /// Create a cache; nothing is computed until [`ProjectionCache::ensure`].
    #[must_use]
    pub fn new(
        source: SamplingSurface,
        target: SamplingSurface,
        provider: Box<dyn CorrespondenceProvider>,
    ) -> Self {
        Self {
            source,
            target,
            provider,
            index: None,
            result: None,
        }
    }

    /// Whether the projection has been computed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.result.is_some()
    }

    /// The projection, if it has been computed.
    #[must_use]
    pub const fn result(&self) -> Option<&ProjectionResult> {
        self.result.as_ref()
    }

    /// Source sampling surface.
    #[must_use]
    pub const fn source(&self) -> &SamplingSurface {
        &self.source
    }

    /// Target sampling surface.
    #[must_use]
    pub const fn target(&self) -> &SamplingSurface {
        &self.target
    }

    /// Compute the projection if needed and return it.
    ///
    /// Later calls return the stored result without recomputation.
    pub fn ensure(&mut self) -> &ProjectionResult {
        let Self {
            source,
            target,
            provider,
            index,
            result,
        } = self;
        result.get_or_insert_with(|| {
            let bvh = index.get_or_insert_with(|| Bvh::build(source.mesh(), DEFAULT_MAX_LEAF_SIZE));
            let working = provider.project(source, bvh, target);
            build_result(target, working)
        })
    }
}

/// Spread working-vertex records onto surface vertices.
///
/// A surface vertex reached by several working vertices (UV corners) keeps
/// the last one; vertices reached by none are missed.
fn build_result(target: &SamplingSurface, working: Vec<ProjectionRecord>) -> ProjectionResult {
    let mut per_vertex: Vec<Option<ProjectionRecord>> = vec![None; target.surface_vertex_count()];
    for (record, &vertex) in working.into_iter().zip(target.vertex_map()) {
        if let Some(slot) = per_vertex.get_mut(vertex as usize) {
            *slot = Some(record);
        }
    }
    let anchors = target.surface_positions();
    let records: Vec<ProjectionRecord> = per_vertex
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            record.unwrap_or_else(|| {
                ProjectionRecord::missed(anchors.get(i).copied().unwrap_or_else(Point3::origin))
            })
        })
        .collect();

    let result = ProjectionResult::from_records(records);
    let missed = result.missed_count();
    let degenerate = result.degenerate_count();

    debug!(
        vertices = result.len(),
        hits = result.len() - missed,
        missed,
        degenerate,
        "Projection cache built"
    );
    if missed > 0 {
        warn!(missed, "Target vertices found no source surface");
    }
    if result.has_zero_area_hits() {
        warn!(degenerate, "Projections landed on zero-area triangles");
    }

    result
}
