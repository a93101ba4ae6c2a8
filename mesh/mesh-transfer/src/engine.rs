//! Attribute transfer engine.
//!
//! [`AttributeTransfer`] validates every precondition up front, then maps
//! positions, weight maps and blend shapes from a source surface onto a
//! target through one shared [`Correspondence`].

use mesh_types::{SurfaceAccess, REFERENCE_SHAPE_NAME};
use nalgebra::{Matrix4, Point3};
use tracing::{debug, info, warn};

use crate::correspondence::{provider_for, ProjectionCache};
use crate::error::{Role, TransferError, TransferResult};
use crate::mask::VertexMask;
use crate::params::{PositionOutput, SearchMethod, TransferParams};
use crate::projection::Interpolate;
use crate::sampling::{SamplingOptions, SamplingSurface};
use crate::snap::VertexSnapper;

/// How target vertices find their source values.
#[derive(Debug)]
pub enum Correspondence {
    /// Barycentric interpolation through a projection onto the source.
    Projected(ProjectionCache),
    /// Target vertex `i` takes source vertex `i`.
    Identity {
        /// Shared vertex count of source and target.
        vertex_count: usize,
    },
}

impl Correspondence {
    /// Sample a per-source-vertex attribute at every target vertex.
    ///
    /// `None` marks vertices without a usable source value.
    pub fn sample<V: Interpolate>(&mut self, values: &[V]) -> Vec<Option<V>> {
        match self {
            Self::Projected(cache) => cache.ensure().interpolate(values),
            Self::Identity { vertex_count } => {
                (0..*vertex_count).map(|i| values.get(i).copied()).collect()
            }
        }
    }

    /// Number of target vertices without a source triangle so far.
    #[must_use]
    pub fn missed_vertices(&self) -> usize {
        match self {
            Self::Projected(cache) => cache.result().map_or(0, |r| r.missed_count()),
            Self::Identity { .. } => 0,
        }
    }

    /// Number of target vertices that landed on zero-area triangles so far.
    #[must_use]
    pub fn degenerate_vertices(&self) -> usize {
        match self {
            Self::Projected(cache) => cache.result().map_or(0, |r| r.degenerate_count()),
            Self::Identity { .. } => 0,
        }
    }
}

/// Transfers attributes from one source surface to targets shaped like the
/// surface it was built against.
///
/// # Example
///
/// ```
/// use mesh_transfer::{AttributeTransfer, TransferParams};
/// use mesh_types::{MeshSurface, Point3, SurfaceAccess};
///
/// let source = MeshSurface::from_triangles(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     &[[0, 1, 2]],
/// )
/// .unwrap();
/// let mut target = source.clone();
/// let mut source = source;
/// source.set_weight_map("tip", &[0.0, 0.0, 1.0]).unwrap();
///
/// let params = TransferParams::weight_maps();
/// let mut engine = AttributeTransfer::new(&source, &target, &params).unwrap();
/// let written = engine.transfer_weight_maps(&mut target, None).unwrap();
///
/// assert_eq!(written, vec!["tip".to_string()]);
/// let tip = target.weight_map("tip").unwrap();
/// assert!((tip[2] - 1.0).abs() < 1e-9);
/// assert!(tip[0].abs() < 1e-9);
/// ```
#[derive(Debug)]
pub struct AttributeTransfer<'a, S: SurfaceAccess + ?Sized> {
    source: &'a S,
    params: TransferParams,
    correspondence: Correspondence,
    mask: VertexMask,
    to_target: Matrix4<f64>,
}

impl<'a, S: SurfaceAccess + ?Sized> AttributeTransfer<'a, S> {
    /// Validate preconditions and prepare the correspondence.
    ///
    /// `target` provides the projection geometry, the selection and the mask
    /// weight map. Nothing is projected yet.
    ///
    /// # Errors
    ///
    /// - [`TransferError::TopologyMismatch`] for topology search between
    ///   surfaces of different vertex counts
    /// - [`TransferError::MissingUvLayer`] for UV search without UVs
    /// - [`TransferError::SingularTransform`] for a non-invertible world
    ///   transform in world space
    /// - [`TransferError::MaskWeightMapNotFound`] for an unknown mask map
    pub fn new<T>(source: &'a S, target: &T, params: &TransferParams) -> TransferResult<Self>
    where
        T: SurfaceAccess + ?Sized,
    {
        let method = params.search_method;
        if method == SearchMethod::Topology && source.vertex_count() != target.vertex_count() {
            return Err(TransferError::TopologyMismatch {
                source_vertices: source.vertex_count(),
                target_vertices: target.vertex_count(),
            });
        }

        let to_target = if params.is_world_space() {
            let target_inverse = target
                .world_transform()
                .try_inverse()
                .ok_or(TransferError::SingularTransform { role: Role::Target })?;
            if source.world_transform().try_inverse().is_none() {
                return Err(TransferError::SingularTransform { role: Role::Source });
            }
            target_inverse * source.world_transform()
        } else {
            Matrix4::identity()
        };

        let correspondence = match provider_for(method) {
            None => Correspondence::Identity {
                vertex_count: target.vertex_count(),
            },
            Some(provider) => {
                let uv_space = method == SearchMethod::UvSpace;
                let options = SamplingOptions {
                    triangulate: params.triangulate,
                    world_space: params.is_world_space() && !uv_space,
                    uv_space,
                };
                let source_sampling = SamplingSurface::build(source, options, Role::Source)?;
                let target_sampling = SamplingSurface::build(target, options, Role::Target)?;
                Correspondence::Projected(ProjectionCache::new(
                    source_sampling,
                    target_sampling,
                    provider,
                ))
            }
        };

        let mask = VertexMask::build(target, params)?;

        debug!(
            source_vertices = source.vertex_count(),
            target_vertices = target.vertex_count(),
            method = ?method,
            world_space = params.is_world_space(),
            "Prepared attribute transfer"
        );

        Ok(Self {
            source,
            params: params.clone(),
            correspondence,
            mask,
            to_target,
        })
    }

    /// The correspondence in use.
    #[must_use]
    pub const fn correspondence(&self) -> &Correspondence {
        &self.correspondence
    }

    /// The per-vertex mask in use.
    #[must_use]
    pub const fn mask(&self) -> &VertexMask {
        &self.mask
    }

    /// Source-local to target-local transform (identity in local space).
    #[must_use]
    pub const fn to_target(&self) -> &Matrix4<f64> {
        &self.to_target
    }

    /// Transfer vertex positions.
    ///
    /// Vertices without a usable projection keep their current position.
    ///
    /// # Errors
    ///
    /// - [`TransferError::ReferenceShapeName`] if the output shape is the
    ///   target's reference shape
    /// - any error from writing to `target`
    pub fn transfer_positions<T>(&mut self, target: &mut T, output: &PositionOutput) -> TransferResult<()>
    where
        T: SurfaceAccess + ?Sized,
    {
        if let PositionOutput::ShapeKey { name, .. } = output {
            if name == reference_name(target) {
                return Err(TransferError::ReferenceShapeName(name.clone()));
            }
        }
        let source = self.source;
        let original = target.positions().to_vec();
        info!(
            vertices = original.len(),
            method = ?self.params.search_method,
            "Transferring positions"
        );

        let sampled = self.correspondence.sample(source.positions());
        let snapper = self
            .params
            .snap_to_closest
            .then(|| VertexSnapper::new(source.positions()));

        let transferred: Vec<Point3<f64>> = original
            .iter()
            .enumerate()
            .map(|(i, orig)| match sampled.get(i).copied().flatten() {
                Some(p) => {
                    let p = snapper.as_ref().map_or(p, |s| s.snap(&p));
                    let p = self.to_target.transform_point(&p);
                    self.mask.blend_point(i, orig, &p)
                }
                None => *orig,
            })
            .collect();

        match output {
            PositionOutput::Replace => target.set_positions(transferred)?,
            PositionOutput::ShapeKey { name, activate } => {
                target.set_blend_shape(name, transferred)?;
                if *activate {
                    activate_shape(target, name);
                }
            }
        }
        Ok(())
    }

    /// Transfer every eligible source weight map.
    ///
    /// A map is eligible when it is in `allow_list` (if given) and not locked
    /// while locked maps are excluded. Returns the names written.
    ///
    /// # Errors
    ///
    /// Fails if writing to `target` fails.
    pub fn transfer_weight_maps<T>(
        &mut self,
        target: &mut T,
        allow_list: Option<&[String]>,
    ) -> TransferResult<Vec<String>>
    where
        T: SurfaceAccess + ?Sized,
    {
        let names: Vec<String> = self
            .source
            .weight_map_names()
            .into_iter()
            .filter(|(name, locked)| {
                !(self.params.exclude_locked && *locked)
                    && allow_list.map_or(true, |allow| allow.contains(name))
            })
            .map(|(name, _)| name)
            .collect();

        info!(
            maps = names.len(),
            vertices = target.vertex_count(),
            "Transferring weight maps"
        );

        for name in &names {
            self.write_weight_map(target, name)?;
        }
        Ok(names)
    }

    /// Transfer a single weight map by name.
    ///
    /// Returns `false` (and writes nothing) if the source has no such map or
    /// it is locked while locked maps are excluded.
    ///
    /// # Errors
    ///
    /// Fails if writing to `target` fails.
    pub fn transfer_weight_map<T>(&mut self, target: &mut T, name: &str) -> TransferResult<bool>
    where
        T: SurfaceAccess + ?Sized,
    {
        let eligible = self
            .source
            .weight_map_names()
            .into_iter()
            .any(|(n, locked)| n == name && !(self.params.exclude_locked && locked));
        if !eligible {
            return Ok(false);
        }
        self.write_weight_map(target, name)
    }

    fn write_weight_map<T>(&mut self, target: &mut T, name: &str) -> TransferResult<bool>
    where
        T: SurfaceAccess + ?Sized,
    {
        let Some(weights) = self.source.weight_map(name) else {
            return Ok(false);
        };
        let existing = target
            .weight_map(name)
            .unwrap_or_else(|| vec![0.0; target.vertex_count()]);
        let sampled = self.correspondence.sample(&weights);

        let transferred: Vec<f64> = existing
            .iter()
            .enumerate()
            .map(|(i, &old)| match sampled.get(i).copied().flatten() {
                Some(w) => self.mask.blend_scalar(i, old, w),
                None => old,
            })
            .collect();

        target.set_weight_map(name, &transferred)?;
        Ok(true)
    }

    /// Transfer blend shapes as deltas from the source reference shape.
    ///
    /// Every non-reference source shape is eligible unless it is muted while
    /// `exclude_muted` is set or `names` is given and does not contain it.
    /// Shapes named like the target's reference are skipped. Missed vertices
    /// keep the target's existing shape position. Returns the names written; an empty list means there was nothing to
    /// transfer.
    ///
    /// # Errors
    ///
    /// Fails if writing to `target` fails.
    pub fn transfer_blend_shapes<T>(
        &mut self,
        target: &mut T,
        names: Option<&[String]>,
        exclude_muted: bool,
    ) -> TransferResult<Vec<String>>
    where
        T: SurfaceAccess + ?Sized,
    {
        let source = self.source;
        let Some(keys) = source.shape_keys() else {
            return Ok(Vec::new());
        };
        let eligible: Vec<_> = keys
            .shapes()
            .filter(|s| !(exclude_muted && s.muted))
            .filter(|s| names.map_or(true, |n| n.contains(&s.name)))
            .collect();
        if eligible.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            shapes = eligible.len(),
            vertices = target.vertex_count(),
            method = ?self.params.search_method,
            "Transferring blend shapes"
        );

        let reference = target.reference_positions().to_vec();
        let reference_name = reference_name(target).to_string();
        let base = self.transferred_points(&keys.reference().positions, None);

        let mut written = Vec::with_capacity(eligible.len());
        for shape in eligible {
            if shape.name == reference_name {
                warn!(shape = %shape.name, "Skipping shape named like the target reference");
                continue;
            }
            let snapper = self
                .params
                .snap_shapes_to_closest
                .then(|| VertexSnapper::new(&shape.positions));
            let moved = self.transferred_points(&shape.positions, snapper.as_ref());

            let existing = target
                .shape_keys()
                .and_then(|k| k.get(&shape.name))
                .map(|s| s.positions.clone());

            let result: Vec<Point3<f64>> = reference
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let old = existing.as_ref().and_then(|e| e.get(i));
                    // Missed vertices keep the target's own shape, or the rest pose
                    let sampled = moved.get(i).copied().flatten();
                    let (Some(to), Some(from)) = (sampled, base.get(i).copied().flatten()) else {
                        return old.copied().unwrap_or(*r);
                    };
                    let m = self.mask.factor(i);
                    let mut delta = (to - from) * m;
                    if let Some(old) = old {
                        delta += (old - r) * (1.0 - m);
                    }
                    r + delta
                })
                .collect();

            let written_shape = target.set_blend_shape(&shape.name, result)?;
            written_shape.slider_min = shape.slider_min;
            written_shape.slider_max = shape.slider_max;
            written.push(shape.name.clone());
        }

        debug!(written = written.len(), "Blend shapes written");
        Ok(written)
    }

    /// Sample source points, snap, and map them into target space. `None`
    /// marks vertices without a source value.
    fn transferred_points(
        &mut self,
        values: &[Point3<f64>],
        snapper: Option<&VertexSnapper>,
    ) -> Vec<Option<Point3<f64>>> {
        let to_target = self.to_target;
        self.correspondence
            .sample(values)
            .into_iter()
            .map(|sampled| {
                sampled.map(|p| {
                    let p = snapper.map_or(p, |s| s.snap(&p));
                    to_target.transform_point(&p)
                })
            })
            .collect()
    }
}

/// Name of the target's reference shape, whether or not it exists yet.
fn reference_name<T: SurfaceAccess + ?Sized>(target: &T) -> &str {
    target
        .shape_keys()
        .map_or(REFERENCE_SHAPE_NAME, |k| k.reference().name.as_str())
}

/// Put the named shape at full value, every other shape at zero, and select it.
fn activate_shape<T: SurfaceAccess + ?Sized>(target: &mut T, name: &str) {
    let Some(keys) = target.shape_keys_mut() else {
        return;
    };
    for shape in keys.shapes_mut() {
        shape.value = if shape.name == name { 1.0 } else { 0.0 };
    }
    if let Some(index) = keys.index_of(name) {
        keys.set_active_index(index);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::params::ObjectSpace;
    use mesh_types::{BlendShape, MeshSurface, ShapeKeys, Vector3, WeightMap};

    /// Unit square in the XY plane split into two triangles.
    fn square() -> MeshSurface {
        MeshSurface::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        )
        .unwrap()
    }

    fn with_shape(mut surface: MeshSurface, name: &str, offset: Vector3<f64>) -> MeshSurface {
        let mut keys = ShapeKeys::with_reference(surface.positions().to_vec());
        let moved = surface.positions().iter().map(|p| p + offset).collect();
        keys.push(BlendShape::new(name, moved).with_slider_range(-1.0, 2.0));
        surface.set_shape_keys(keys).unwrap();
        surface
    }

    #[test]
    fn topology_mismatch_fails_fast() {
        let source = square();
        let target = MeshSurface::from_triangles(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            &[[0, 1, 2]],
        )
        .unwrap();
        let params = TransferParams::positions().with_search_method(SearchMethod::Topology);
        let err = AttributeTransfer::new(&source, &target, &params).unwrap_err();
        assert!(matches!(
            err,
            TransferError::TopologyMismatch {
                source_vertices: 4,
                target_vertices: 3
            }
        ));
    }

    #[test]
    fn positions_project_onto_source_plane() {
        let source = square();
        let mut target = square();
        let lifted: Vec<_> = target
            .positions()
            .iter()
            .map(|p| Point3::new(p.x * 0.5 + 0.25, p.y * 0.5 + 0.25, 1.0))
            .collect();
        target.set_positions(lifted).unwrap();

        let params = TransferParams::positions();
        let mut engine = AttributeTransfer::new(&source, &target, &params).unwrap();
        engine
            .transfer_positions(&mut target, &PositionOutput::Replace)
            .unwrap();
        for p in target.positions() {
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
        }
        assert_relative_eq!(target.positions()[0].x, 0.25, epsilon = 1e-9);
    }

    #[test]
    fn positions_as_activated_shape() {
        let source = with_shape(square(), "other", Vector3::z());
        let mut target = with_shape(square(), "other", Vector3::z());
        if let Some(keys) = target.shape_keys_mut() {
            keys.shapes_mut().for_each(|s| s.value = 0.7);
        }
        let params = TransferParams::positions();
        let mut engine = AttributeTransfer::new(&source, &target, &params).unwrap();
        engine
            .transfer_positions(&mut target, &PositionOutput::shape_key())
            .unwrap();

        let keys = target.shape_keys().unwrap();
        assert_eq!(keys.names(), vec!["Basis", "other", "Transferred Position"]);
        assert_eq!(keys.active_index(), 2);
        assert_relative_eq!(keys.get("other").unwrap().value, 0.0);
        assert_relative_eq!(keys.get("Transferred Position").unwrap().value, 1.0);
    }

    #[test]
    fn weight_map_fallback_keeps_existing_values() {
        let mut source = square();
        source.set_weight_map("w", &[1.0; 4]).unwrap();
        source
            .add_weight_map(WeightMap::from_dense("locked", &[1.0; 4]).with_locked(true))
            .unwrap();

        let mut target = square();
        target.set_weight_map("w", &[0.5; 4]).unwrap();
        target.set_weight_map("mask", &[1.0, 0.0, 1.0, 0.0]).unwrap();

        let params = TransferParams::weight_maps()
            .with_mask_weight_map("mask")
            .with_exclude_locked(true);
        let mut engine = AttributeTransfer::new(&source, &target, &params).unwrap();
        let written = engine.transfer_weight_maps(&mut target, None).unwrap();

        assert_eq!(written, vec!["w".to_string()]);
        let w = target.weight_map("w").unwrap();
        for (got, want) in w.iter().zip([1.0, 0.5, 1.0, 0.5]) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
        assert!(target.weight_map("locked").is_none());
    }

    #[test]
    fn unknown_weight_map_is_a_no_op() {
        let source = square();
        let mut target = square();
        let params = TransferParams::weight_maps();
        let mut engine = AttributeTransfer::new(&source, &target, &params).unwrap();
        assert!(!engine.transfer_weight_map(&mut target, "ghost").unwrap());
        assert!(target.weight_map_names().is_empty());
        assert!(!target.is_dirty());
    }

    #[test]
    fn blend_shape_delta_and_slider_range() {
        let source = with_shape(square(), "up", Vector3::new(0.0, 0.0, 2.0));
        let mut target = square();
        let params = TransferParams::blend_shapes();
        let mut engine = AttributeTransfer::new(&source, &target, &params).unwrap();
        let written = engine.transfer_blend_shapes(&mut target, None, false).unwrap();
        assert_eq!(written, vec!["up".to_string()]);

        let shape = target.shape_keys().unwrap().get("up").unwrap();
        assert_relative_eq!(shape.slider_min, -1.0);
        assert_relative_eq!(shape.slider_max, 2.0);
        assert_relative_eq!(shape.value, 0.0);
        for (p, r) in shape.positions.iter().zip(target.reference_positions()) {
            assert_relative_eq!((p - r).z, 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn muted_and_unlisted_shapes_are_skipped() {
        let mut source = with_shape(square(), "a", Vector3::z());
        if let Some(keys) = source.shape_keys_mut() {
            keys.push(BlendShape::new("m", source_positions_plus(&square(), 1.0)).with_muted(true));
        }
        let mut target = square();
        let params = TransferParams::blend_shapes();
        let mut engine = AttributeTransfer::new(&source, &target, &params).unwrap();

        let none = engine
            .transfer_blend_shapes(&mut target, Some(&["zzz".to_string()]), false)
            .unwrap();
        assert!(none.is_empty());
        assert!(target.shape_keys().is_none());

        let written = engine.transfer_blend_shapes(&mut target, None, true).unwrap();
        assert_eq!(written, vec!["a".to_string()]);
    }

    fn source_positions_plus(surface: &MeshSurface, dz: f64) -> Vec<Point3<f64>> {
        surface
            .positions()
            .iter()
            .map(|p| p + Vector3::new(0.0, 0.0, dz))
            .collect()
    }

    #[test]
    fn world_space_maps_into_target_frame() {
        let source = square()
            .with_world_transform(Matrix4::new_translation(&Vector3::new(0.0, 0.0, 3.0)));
        let mut target = square()
            .with_world_transform(Matrix4::new_translation(&Vector3::new(0.0, 0.0, 1.0)));
        let params = TransferParams::positions().with_space(ObjectSpace::World);
        let mut engine = AttributeTransfer::new(&source, &target, &params).unwrap();
        engine
            .transfer_positions(&mut target, &PositionOutput::Replace)
            .unwrap();
        for p in target.positions() {
            assert_relative_eq!(p.z, 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn singular_target_transform_is_rejected() {
        let source = square();
        let target = square().with_world_transform(Matrix4::zeros());
        let params = TransferParams::positions().with_space(ObjectSpace::World);
        let err = AttributeTransfer::new(&source, &target, &params).unwrap_err();
        assert!(matches!(
            err,
            TransferError::SingularTransform { role: Role::Target }
        ));
    }
}
