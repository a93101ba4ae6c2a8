//! Transfer parameters and configuration.
//!
//! This module provides the [`TransferParams`] struct for configuring a
//! transfer request.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name of the shape written by [`PositionOutput::shape_key`].
pub const DEFAULT_POSITION_SHAPE_NAME: &str = "Transferred Position";

/// Which attribute a request transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum AttributeKind {
    /// Raw vertex positions.
    Positions,
    /// Named weight maps (vertex groups).
    WeightMaps,
    /// Blend shapes (shape keys).
    #[default]
    BlendShapes,
}

/// How target vertices are matched to the source surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum SearchMethod {
    /// Nearest point on the source surface.
    #[default]
    Closest,
    /// Cast along the target vertex normal, then against it.
    Raycast,
    /// Match by vertex index; vertex counts must be equal.
    Topology,
    /// Nearest point in the active UV layout.
    UvSpace,
}

impl SearchMethod {
    /// Whether this method needs a projection onto the source surface.
    #[must_use]
    pub const fn is_projected(self) -> bool {
        !matches!(self, Self::Topology)
    }
}

/// Coordinate space the projection runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObjectSpace {
    /// Both surfaces in their own local space.
    #[default]
    Local,
    /// Both surfaces transformed to world space.
    World,
}

/// Where transferred positions are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PositionOutput {
    /// Overwrite the target vertex positions.
    #[default]
    Replace,
    /// Store as a named blend shape.
    ShapeKey {
        /// Shape name.
        name: String,
        /// Make this the only shape at full value and select it.
        activate: bool,
    },
}

impl PositionOutput {
    /// An activated shape named [`DEFAULT_POSITION_SHAPE_NAME`].
    #[must_use]
    pub fn shape_key() -> Self {
        Self::ShapeKey {
            name: DEFAULT_POSITION_SHAPE_NAME.to_string(),
            activate: true,
        }
    }
}

/// Parameters for a transfer request.
///
/// Use the builder methods to configure the request.
///
/// # Example
///
/// ```
/// use mesh_transfer::{AttributeKind, ObjectSpace, SearchMethod, TransferParams};
///
/// let params = TransferParams::blend_shapes()
///     .with_search_method(SearchMethod::Raycast)
///     .with_space(ObjectSpace::World)
///     .with_mask_weight_map("face")
///     .with_exclude_muted(true);
///
/// assert_eq!(params.attribute, AttributeKind::BlendShapes);
/// assert_eq!(params.mask_weight_map.as_deref(), Some("face"));
/// assert!(params.triangulate);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[allow(clippy::struct_excessive_bools)]
pub struct TransferParams {
    /// Attribute to transfer.
    pub attribute: AttributeKind,
    /// Correspondence strategy.
    pub search_method: SearchMethod,
    /// Space the projection runs in.
    pub space: ObjectSpace,
    /// Target weight map used as a per-vertex mask.
    pub mask_weight_map: Option<String>,
    /// Use `1 - weight` as the mask.
    pub invert_mask: bool,
    /// Only affect selected target vertices.
    pub restrict_to_selection: bool,
    /// Where transferred positions go.
    pub position_output: PositionOutput,
    /// Only transfer blend shapes with these names.
    pub shape_names: Option<Vec<String>>,
    /// Only transfer weight maps with these names.
    pub weight_map_names: Option<Vec<String>>,
    /// Skip muted source shapes.
    pub exclude_muted: bool,
    /// Skip locked source weight maps.
    pub exclude_locked: bool,
    /// Snap transferred positions to the closest source vertex.
    pub snap_to_closest: bool,
    /// Snap transferred shapes to the closest vertex of the source shape.
    pub snap_shapes_to_closest: bool,
    /// Read the source with deformations applied.
    pub use_deformed_source: bool,
    /// Project from the target with deformations applied.
    pub use_deformed_target: bool,
    /// Fan-triangulate polygons before indexing.
    pub triangulate: bool,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self::blend_shapes()
    }
}

impl TransferParams {
    /// Parameters for transferring `attribute` with default options.
    #[must_use]
    pub const fn new(attribute: AttributeKind) -> Self {
        Self {
            attribute,
            search_method: SearchMethod::Closest,
            space: ObjectSpace::Local,
            mask_weight_map: None,
            invert_mask: false,
            restrict_to_selection: false,
            position_output: PositionOutput::Replace,
            shape_names: None,
            weight_map_names: None,
            exclude_muted: false,
            exclude_locked: false,
            snap_to_closest: false,
            snap_shapes_to_closest: false,
            use_deformed_source: false,
            use_deformed_target: false,
            triangulate: true,
        }
    }

    /// Transfer vertex positions.
    #[must_use]
    pub const fn positions() -> Self {
        Self::new(AttributeKind::Positions)
    }

    /// Transfer weight maps.
    #[must_use]
    pub const fn weight_maps() -> Self {
        Self::new(AttributeKind::WeightMaps)
    }

    /// Transfer blend shapes.
    #[must_use]
    pub const fn blend_shapes() -> Self {
        Self::new(AttributeKind::BlendShapes)
    }

    /// Set the search method.
    #[must_use]
    pub const fn with_search_method(mut self, method: SearchMethod) -> Self {
        self.search_method = method;
        self
    }

    /// Set the projection space.
    #[must_use]
    pub const fn with_space(mut self, space: ObjectSpace) -> Self {
        self.space = space;
        self
    }

    /// Mask the transfer with a target weight map.
    #[must_use]
    pub fn with_mask_weight_map(mut self, name: impl Into<String>) -> Self {
        self.mask_weight_map = Some(name.into());
        self
    }

    /// Invert the mask weight map.
    #[must_use]
    pub const fn with_invert_mask(mut self, invert: bool) -> Self {
        self.invert_mask = invert;
        self
    }

    /// Only affect selected target vertices.
    #[must_use]
    pub const fn with_restrict_to_selection(mut self, restrict: bool) -> Self {
        self.restrict_to_selection = restrict;
        self
    }

    /// Choose where transferred positions are written.
    #[must_use]
    pub fn with_position_output(mut self, output: PositionOutput) -> Self {
        self.position_output = output;
        self
    }

    /// Only transfer the named blend shapes.
    #[must_use]
    pub fn with_shape_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shape_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Only transfer the named weight maps.
    #[must_use]
    pub fn with_weight_map_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.weight_map_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Skip muted source shapes.
    #[must_use]
    pub const fn with_exclude_muted(mut self, exclude: bool) -> Self {
        self.exclude_muted = exclude;
        self
    }

    /// Skip locked source weight maps.
    #[must_use]
    pub const fn with_exclude_locked(mut self, exclude: bool) -> Self {
        self.exclude_locked = exclude;
        self
    }

    /// Snap transferred positions to the closest source vertex.
    #[must_use]
    pub const fn with_snap_to_closest(mut self, snap: bool) -> Self {
        self.snap_to_closest = snap;
        self
    }

    /// Snap transferred shapes to the closest source shape vertex.
    #[must_use]
    pub const fn with_snap_shapes_to_closest(mut self, snap: bool) -> Self {
        self.snap_shapes_to_closest = snap;
        self
    }

    /// Read the deformed source.
    #[must_use]
    pub const fn with_deformed_source(mut self, deformed: bool) -> Self {
        self.use_deformed_source = deformed;
        self
    }

    /// Project from the deformed target.
    #[must_use]
    pub const fn with_deformed_target(mut self, deformed: bool) -> Self {
        self.use_deformed_target = deformed;
        self
    }

    /// Enable or disable triangulation of polygons.
    #[must_use]
    pub const fn with_triangulate(mut self, triangulate: bool) -> Self {
        self.triangulate = triangulate;
        self
    }

    /// Whether the projection runs in world space.
    #[must_use]
    pub const fn is_world_space(&self) -> bool {
        matches!(self.space, ObjectSpace::World)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = TransferParams::default();
        assert_eq!(params.attribute, AttributeKind::BlendShapes);
        assert_eq!(params.search_method, SearchMethod::Closest);
        assert_eq!(params.space, ObjectSpace::Local);
        assert_eq!(params.position_output, PositionOutput::Replace);
        assert!(params.triangulate);
        assert!(!params.is_world_space());
    }

    #[test]
    fn builder_chain() {
        let params = TransferParams::weight_maps()
            .with_weight_map_names(["a", "b"])
            .with_exclude_locked(true)
            .with_restrict_to_selection(true)
            .with_invert_mask(true);
        assert_eq!(
            params.weight_map_names,
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert!(params.exclude_locked);
        assert!(params.restrict_to_selection);
        assert!(params.invert_mask);
    }

    #[test]
    fn shape_key_output_default_name() {
        match PositionOutput::shape_key() {
            PositionOutput::ShapeKey { name, activate } => {
                assert_eq!(name, DEFAULT_POSITION_SHAPE_NAME);
                assert!(activate);
            }
            PositionOutput::Replace => panic!("expected shape output"),
        }
    }

    #[test]
    fn topology_is_not_projected() {
        assert!(!SearchMethod::Topology.is_projected());
        assert!(SearchMethod::UvSpace.is_projected());
    }
}
