//! Scene container.
//!
//! A [`Scene`] owns the node arena, camera components and the material
//! pool. Fields are public so systems can borrow the pools they need
//! independently (the renderer reads nodes while binding programs into
//! materials).

use glam::Affine3A;
use lumen_core::{LumenError, MaterialHandle, NodeHandle, Result};
use lumen_resources::Material;
use slotmap::{SlotMap, SparseSecondaryMap};

use crate::camera::Camera;
use crate::node::Node;
use crate::transform_system;

pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub cameras: SparseSecondaryMap<NodeHandle, Camera>,
    pub materials: SlotMap<MaterialHandle, Material>,

    /// When set, every buffer is drawn with this material instead of its own.
    pub override_material: Option<MaterialHandle>,

    root: NodeHandle,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new());
        Self {
            nodes,
            cameras: SparseSecondaryMap::new(),
            materials: SlotMap::with_key(),
            override_material: None,
            root,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    // === Nodes ===

    /// Inserts a node under the scene root.
    pub fn add(&mut self, node: Node) -> NodeHandle {
        self.add_to_parent(node, self.root)
    }

    /// Inserts a node under `parent`.
    pub fn add_to_parent(&mut self, mut node: Node, parent: NodeHandle) -> NodeHandle {
        node.parent = Some(parent);
        let handle = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        } else {
            log::error!("Parent node not found, {handle:?} left detached");
            self.nodes[handle].parent = None;
        }
        handle
    }

    /// Inserts a node that is not part of the root hierarchy.
    ///
    /// Detached nodes are typically cameras; their transforms are updated by
    /// the renderer when they are used for drawing.
    pub fn add_detached(&mut self, node: Node) -> NodeHandle {
        self.nodes.insert(node)
    }

    /// Moves `child` under `parent`, detaching it from its previous parent.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent {
            log::warn!("Cannot attach node to itself!");
            return;
        }
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            log::error!("Node not found during attach!");
            return;
        }

        self.detach(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[child].transform.mark_dirty();
    }

    /// Removes `child` from its parent's child list.
    pub fn detach(&mut self, child: NodeHandle) {
        let Some(old_parent) = self.nodes.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(old_parent)
            && let Some(i) = p.children.iter().position(|&x| x == child)
        {
            p.children.remove(i);
        }
    }

    /// Removes a node and its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, handle: NodeHandle) {
        if handle == self.root {
            log::warn!("Cannot remove the scene root");
            return;
        }
        self.detach(handle);

        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            if let Some(node) = self.nodes.remove(h) {
                stack.extend(node.children);
                self.cameras.remove(h);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    // === Cameras ===

    /// Creates a detached camera node.
    pub fn add_camera(&mut self, camera: Camera) -> NodeHandle {
        let handle = self.add_detached(Node::new());
        self.cameras.insert(handle, camera);
        handle
    }

    /// Attaches a camera component to an existing node.
    pub fn set_camera(&mut self, node: NodeHandle, camera: Camera) -> Result<()> {
        if !self.nodes.contains_key(node) {
            return Err(LumenError::NodeNotFound(node));
        }
        self.cameras.insert(node, camera);
        Ok(())
    }

    #[must_use]
    pub fn camera(&self, node: NodeHandle) -> Option<&Camera> {
        self.cameras.get(node)
    }

    pub fn camera_mut(&mut self, node: NodeHandle) -> Option<&mut Camera> {
        self.cameras.get_mut(node)
    }

    /// Recomputes the camera's view state from its node's world matrix.
    pub fn update_camera(&mut self, node: NodeHandle) -> Result<()> {
        let world: Affine3A = *self
            .nodes
            .get(node)
            .ok_or(LumenError::NodeNotFound(node))?
            .world_matrix();
        let camera = self
            .cameras
            .get_mut(node)
            .ok_or(LumenError::NotACamera(node))?;
        camera.update_view_projection(&world);
        Ok(())
    }

    // === Materials ===

    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.insert(material)
    }

    #[must_use]
    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle)
    }

    pub fn material_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(handle)
    }

    /// Draws every buffer with `material` instead of its own, or restores
    /// per-buffer materials with `None`.
    pub fn set_override_material(&mut self, material: Option<MaterialHandle>) -> Result<()> {
        if let Some(handle) = material
            && !self.materials.contains_key(handle)
        {
            return Err(LumenError::MaterialNotFound(handle));
        }
        self.override_material = material;
        Ok(())
    }

    // === Transforms ===

    /// Propagates world matrices from the scene root.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy_iterative(&mut self.nodes, &[self.root]);
    }

    /// Propagates world matrices through the subtree rooted at `root`.
    pub fn update_subtree(&mut self, root: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, root);
    }
}
