use glam::Affine3A;
use lumen_core::{MaterialHandle, NodeHandle};
use lumen_resources::{BoundingSphere, GeometryBuffers};

use crate::transform::Transform;

/// One drawable buffer owned by a node, paired with the material that
/// draws it. A buffer without a material is never drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBuffer {
    pub geometry: GeometryBuffers,
    pub material: Option<MaterialHandle>,
}

impl NodeBuffer {
    #[must_use]
    pub fn new(geometry: GeometryBuffers, material: MaterialHandle) -> Self {
        Self {
            geometry,
            material: Some(material),
        }
    }
}

/// A scene node.
///
/// Nodes form a tree through `parent` / `children` handles into the scene
/// arena. A node may own any number of [`NodeBuffer`]s; nodes without
/// buffers only group and transform their children.
#[derive(Debug, Clone)]
pub struct Node {
    // === Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    pub transform: Transform,

    /// Hides the node and its whole subtree.
    pub visible: bool,
    /// When false the node is drawn even if its bounds miss the frustum.
    pub frustum_culled: bool,

    pub buffers: Vec<NodeBuffer>,
}

impl Node {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            frustum_culled: true,
            buffers: Vec::new(),
        }
    }

    /// Creates a node drawing a single buffer.
    #[must_use]
    pub fn with_buffer(geometry: GeometryBuffers, material: MaterialHandle) -> Self {
        let mut node = Self::new();
        node.buffers.push(NodeBuffer::new(geometry, material));
        node
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }

    /// Union of the buffers' bounding spheres in local space.
    ///
    /// `None` when no buffer carries bounds.
    #[must_use]
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        self.buffers
            .iter()
            .filter_map(|b| b.geometry.bounding_sphere)
            .reduce(|acc, s| acc.union(&s))
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
