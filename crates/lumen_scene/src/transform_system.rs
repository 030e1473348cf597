//! Transform System
//!
//! Propagates local transforms down the node hierarchy into world
//! matrices. It borrows only the node arena, not the whole scene, so
//! callers can keep other scene pools borrowed alongside.
//!
//! Traversal uses an explicit stack; deep hierarchies cannot overflow the
//! call stack. A node's world matrix is recomputed only when its own local
//! matrix or an ancestor's world matrix changed.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::node::Node;
use lumen_core::NodeHandle;

/// Updates world matrices of every node reachable from `roots`.
///
/// Roots are treated as top-level: their parent transform is identity.
pub fn update_hierarchy_iterative(nodes: &mut SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) {
    // (node, parent world, parent changed)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false));
    }

    propagate(nodes, &mut stack);
}

/// Updates the subtree rooted at `root`, starting from its parent's current
/// world matrix. The root's world matrix is always recomputed.
pub fn update_subtree(nodes: &mut SlotMap<NodeHandle, Node>, root: NodeHandle) {
    let Some(node) = nodes.get(root) else {
        return;
    };
    let parent_world = node
        .parent
        .and_then(|p| nodes.get(p))
        .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix);

    let mut stack = vec![(root, parent_world, true)];
    propagate(nodes, &mut stack);
}

fn propagate(nodes: &mut SlotMap<NodeHandle, Node>, stack: &mut Vec<(NodeHandle, Affine3A, bool)>) {
    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        if world_needs_update {
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);
        }

        let current_world = node.transform.world_matrix;

        // Reverse push keeps children in declaration order.
        for &child_handle in node.children.iter().rev() {
            stack.push((child_handle, current_world, world_needs_update));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn pair() -> (SlotMap<NodeHandle, Node>, NodeHandle, NodeHandle) {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();

        let mut parent = Node::new();
        parent.transform.position = Vec3::new(1.0, 0.0, 0.0);
        let parent_handle = nodes.insert(parent);

        let mut child = Node::new();
        child.transform.position = Vec3::new(0.0, 1.0, 0.0);
        child.parent = Some(parent_handle);
        let child_handle = nodes.insert(child);

        nodes[parent_handle].children.push(child_handle);
        (nodes, parent_handle, child_handle)
    }

    #[test]
    fn test_hierarchy_update() {
        let (mut nodes, parent, child) = pair();

        update_hierarchy_iterative(&mut nodes, &[parent]);

        let child_world_pos = nodes[child].transform.world_matrix.translation;
        assert!((child_world_pos.x - 1.0).abs() < 1e-5);
        assert!((child_world_pos.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_parent_move_propagates() {
        let (mut nodes, parent, child) = pair();
        update_hierarchy_iterative(&mut nodes, &[parent]);

        nodes[parent].transform.position = Vec3::new(5.0, 0.0, 0.0);
        update_hierarchy_iterative(&mut nodes, &[parent]);

        let child_world_pos = nodes[child].transform.world_matrix.translation;
        assert!((child_world_pos.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_update_subtree_uses_parent_world() {
        let (mut nodes, parent, child) = pair();
        update_hierarchy_iterative(&mut nodes, &[parent]);

        nodes[child].transform.position = Vec3::new(0.0, 0.0, 2.0);
        update_subtree(&mut nodes, child);

        let child_world_pos = nodes[child].transform.world_matrix.translation;
        assert!((child_world_pos.x - 1.0).abs() < 1e-5);
        assert!((child_world_pos.z - 2.0).abs() < 1e-5);
    }
}
