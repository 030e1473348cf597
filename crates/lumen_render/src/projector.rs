//! Scene Projector
//!
//! Walks the scene from a root node and fills [`RenderLists`] with the
//! buffers that should be drawn this frame.
//!
//! Traversal is depth-first with an explicit stack:
//!
//! 1. An invisible node is skipped together with its whole subtree.
//! 2. A node owning buffers is projected when it opts out of frustum
//!    culling or its world-space bounds intersect the frustum. Projection
//!    updates the node's model-view matrix and emits one
//!    [`RenderableBuffer`] per buffer that has a live material, classified
//!    by the material's transparency.
//! 3. Children are visited regardless of whether their parent was culled.

use glam::{Affine3A, Mat4};
use lumen_core::{MaterialHandle, NodeHandle};
use lumen_resources::Material;
use lumen_scene::{Frustum, Node};
use slotmap::SlotMap;

use crate::render_list::{RenderLists, RenderableBuffer};

/// Per-frame inputs of [`project_scene`].
#[derive(Debug, Clone, Copy)]
pub struct ProjectionView<'a> {
    pub view_matrix: &'a Mat4,
    pub proj_screen_matrix: &'a Mat4,
    pub frustum: &'a Frustum,
    /// Compute depth keys; when false every key is zero.
    pub sort: bool,
}

/// Projects the subtree under `root` into `lists`.
///
/// Returns the number of buffers pushed.
pub fn project_scene(
    nodes: &mut SlotMap<NodeHandle, Node>,
    materials: &SlotMap<MaterialHandle, Material>,
    root: NodeHandle,
    view: &ProjectionView<'_>,
    lists: &mut RenderLists,
) -> usize {
    let mut pushed = 0;
    let mut stack = vec![root];

    while let Some(handle) = stack.pop() {
        let Some(node) = nodes.get_mut(handle) else {
            continue;
        };
        if !node.visible {
            continue;
        }

        if !node.buffers.is_empty() && (!node.frustum_culled || intersects_frustum(node, view.frustum)) {
            node.transform.update_model_view(view.view_matrix);

            let z = if view.sort {
                depth_key(node.world_matrix(), view.proj_screen_matrix)
            } else {
                0.0
            };

            for (buffer_index, buffer) in node.buffers.iter().enumerate() {
                let Some(material_handle) = buffer.material else {
                    continue;
                };
                let Some(material) = materials.get(material_handle) else {
                    continue;
                };

                lists.push(
                    RenderableBuffer {
                        node: handle,
                        buffer_index,
                        geometry: buffer.geometry,
                        material: material_handle,
                        z,
                    },
                    material.transparent,
                );
                pushed += 1;
            }
        }

        stack.extend(node.children().iter().rev().copied());
    }

    pushed
}

fn intersects_frustum(node: &Node, frustum: &Frustum) -> bool {
    node.bounding_sphere().is_none_or(|sphere| {
        let world = sphere.transformed(node.world_matrix());
        frustum.intersects_sphere(world.center, world.radius)
    })
}

/// Screen-space depth of the node's world origin.
fn depth_key(world: &Affine3A, proj_screen: &Mat4) -> f32 {
    let clip = *proj_screen * world.translation.extend(1.0);
    if clip.w == 0.0 { clip.z } else { clip.z / clip.w }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lumen_resources::{BufferId, GeometryBuffers, ShaderSource};
    use lumen_scene::Camera;

    fn geometry() -> GeometryBuffers {
        GeometryBuffers::new(BufferId(1), BufferId(2), 6)
    }

    #[test]
    fn test_depth_key_increases_with_distance() {
        let camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
        let near = Affine3A::from_translation(Vec3::new(0.0, 0.0, -2.0));
        let far = Affine3A::from_translation(Vec3::new(0.0, 0.0, -20.0));

        let vp = camera.view_projection_matrix();
        assert!(depth_key(&near, vp) < depth_key(&far, vp));
    }

    #[test]
    fn test_missing_material_contributes_nothing() {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();
        let mut materials: SlotMap<MaterialHandle, Material> = SlotMap::with_key();
        let material = materials.insert(Material::new(ShaderSource::default()));
        let stale = materials.insert(Material::new(ShaderSource::default()));
        materials.remove(stale);

        let mut node = Node::with_buffer(geometry(), material);
        node.buffers.push(lumen_scene::NodeBuffer::new(geometry(), stale));
        node.buffers.push(lumen_scene::NodeBuffer {
            geometry: geometry(),
            material: None,
        });
        let root = nodes.insert(node);

        let camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
        let view = ProjectionView {
            view_matrix: camera.view_matrix(),
            proj_screen_matrix: camera.view_projection_matrix(),
            frustum: camera.frustum(),
            sort: false,
        };
        let mut lists = RenderLists::new();

        assert_eq!(project_scene(&mut nodes, &materials, root, &view, &mut lists), 1);
        assert_eq!(lists.opaque.len(), 1);
        assert_eq!(lists.opaque[0].z, 0.0);
    }
}
