//! In-memory host scene keyed by object name.

use hashbrown::HashMap;
use mesh_types::MeshSurface;

use crate::request::MeshProvider;

/// An object in a [`Scene`].
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum SceneObject {
    /// A mesh with an optional deformed (evaluated) copy.
    Mesh {
        /// Base surface, written by transfers.
        surface: MeshSurface,
        /// Surface with modifiers applied, if the host computed one.
        evaluated: Option<MeshSurface>,
    },
    /// A skeleton; never a valid transfer endpoint.
    Armature,
    /// A transform-only object; never a valid transfer endpoint.
    Empty,
}

impl SceneObject {
    /// A mesh object without an evaluated copy.
    #[must_use]
    pub const fn mesh(surface: MeshSurface) -> Self {
        Self::Mesh {
            surface,
            evaluated: None,
        }
    }
}

/// Objects by name.
///
/// # Example
///
/// ```
/// use mesh_transfer::{MeshProvider, Scene, SceneObject};
/// use mesh_types::{MeshSurface, Point3};
///
/// let mut scene = Scene::new();
/// scene.insert("rig", SceneObject::Armature);
/// scene.insert_mesh(
///     "plane",
///     MeshSurface::from_triangles(
///         vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
///         &[[0, 1, 2]],
///     )
///     .unwrap(),
/// );
///
/// assert!(scene.is_mesh("plane"));
/// assert!(scene.contains("rig") && !scene.is_mesh("rig"));
/// assert_eq!(scene.names(), vec!["plane", "rig"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: HashMap<String, SceneObject>,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub fn insert(&mut self, name: impl Into<String>, object: SceneObject) -> Option<SceneObject> {
        self.objects.insert(name.into(), object)
    }

    /// Insert or replace a mesh object.
    pub fn insert_mesh(&mut self, name: impl Into<String>, surface: MeshSurface) -> Option<SceneObject> {
        self.insert(name, SceneObject::mesh(surface))
    }

    /// Attach an evaluated surface to a mesh object.
    ///
    /// Returns `false` if `name` is not a mesh.
    pub fn set_evaluated(&mut self, name: &str, surface: MeshSurface) -> bool {
        match self.objects.get_mut(name) {
            Some(SceneObject::Mesh { evaluated, .. }) => {
                *evaluated = Some(surface);
                true
            }
            _ => false,
        }
    }

    /// Remove an object.
    pub fn remove(&mut self, name: &str) -> Option<SceneObject> {
        self.objects.remove(name)
    }

    /// Look up an object.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects.get(name)
    }

    /// Base surface of a mesh object.
    #[must_use]
    pub fn mesh(&self, name: &str) -> Option<&MeshSurface> {
        match self.objects.get(name)? {
            SceneObject::Mesh { surface, .. } => Some(surface),
            SceneObject::Armature | SceneObject::Empty => None,
        }
    }

    /// Mutable base surface of a mesh object.
    pub fn mesh_mut(&mut self, name: &str) -> Option<&mut MeshSurface> {
        match self.objects.get_mut(name)? {
            SceneObject::Mesh { surface, .. } => Some(surface),
            SceneObject::Armature | SceneObject::Empty => None,
        }
    }

    /// Object names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.objects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl MeshProvider for Scene {
    type Object = str;
    type Surface = MeshSurface;

    fn contains(&self, object: &str) -> bool {
        self.objects.contains_key(object)
    }

    fn is_mesh(&self, object: &str) -> bool {
        matches!(self.objects.get(object), Some(SceneObject::Mesh { .. }))
    }

    fn surface(&self, object: &str) -> Option<&MeshSurface> {
        self.mesh(object)
    }

    fn surface_mut(&mut self, object: &str) -> Option<&mut MeshSurface> {
        self.mesh_mut(object)
    }

    fn evaluated_surface(&self, object: &str) -> Option<MeshSurface> {
        match self.objects.get(object)? {
            SceneObject::Mesh { surface, evaluated } => {
                Some(evaluated.as_ref().unwrap_or(surface).clone())
            }
            SceneObject::Armature | SceneObject::Empty => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mesh_types::{Point3, SurfaceAccess};

    fn tri(z: f64) -> MeshSurface {
        MeshSurface::from_triangles(
            vec![
                Point3::new(0.0, 0.0, z),
                Point3::new(1.0, 0.0, z),
                Point3::new(0.0, 1.0, z),
            ],
            &[[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn evaluated_falls_back_to_base() {
        let mut scene = Scene::new();
        scene.insert_mesh("a", tri(0.0));
        let base = scene.evaluated_surface("a").unwrap();
        assert!((base.positions()[0].z).abs() < f64::EPSILON);

        assert!(scene.set_evaluated("a", tri(2.0)));
        let deformed = scene.evaluated_surface("a").unwrap();
        assert!((deformed.positions()[0].z - 2.0).abs() < f64::EPSILON);
        assert!((scene.surface("a").unwrap().positions()[0].z).abs() < f64::EPSILON);
    }

    #[test]
    fn non_meshes_have_no_surface() {
        let mut scene = Scene::new();
        scene.insert("empty", SceneObject::Empty);
        assert!(scene.contains("empty"));
        assert!(!scene.is_mesh("empty"));
        assert!(scene.surface("empty").is_none());
        assert!(scene.evaluated_surface("empty").is_none());
        assert!(!scene.set_evaluated("empty", tri(0.0)));
        assert!(!scene.contains("missing"));
        assert_eq!(scene.len(), 1);
    }
}
