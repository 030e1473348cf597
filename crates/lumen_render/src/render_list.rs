//! Draw lists.
//!
//! [`RenderLists`] holds the opaque and transparent [`RenderableBuffer`]s
//! of one frame. Opaque buffers are drawn front-to-back (ascending depth),
//! transparent ones back-to-front (descending depth). Sorting is stable:
//! buffers with equal depth keep their traversal order.

use lumen_core::{MaterialHandle, NodeHandle};
use lumen_resources::GeometryBuffers;

/// A buffer selected for drawing this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderableBuffer {
    pub node: NodeHandle,
    /// Index into the node's buffer list.
    pub buffer_index: usize,
    pub geometry: GeometryBuffers,
    pub material: MaterialHandle,
    /// Screen-space depth of the node origin.
    pub z: f32,
}

#[derive(Debug, Default, Clone)]
pub struct RenderLists {
    pub opaque: Vec<RenderableBuffer>,
    pub transparent: Vec<RenderableBuffer>,
}

impl RenderLists {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
    }

    pub fn push(&mut self, item: RenderableBuffer, transparent: bool) {
        if transparent {
            self.transparent.push(item);
        } else {
            self.opaque.push(item);
        }
    }

    /// Stable sort: opaque ascending, transparent descending by depth.
    pub fn sort(&mut self) {
        self.opaque.sort_by(|a, b| a.z.total_cmp(&b.z));
        self.transparent.sort_by(|a, b| b.z.total_cmp(&a.z));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_resources::BufferId;

    fn item(buffer_index: usize, z: f32) -> RenderableBuffer {
        RenderableBuffer {
            node: NodeHandle::default(),
            buffer_index,
            geometry: GeometryBuffers::new(BufferId(1), BufferId(2), 3),
            material: MaterialHandle::default(),
            z,
        }
    }

    fn order(list: &[RenderableBuffer]) -> Vec<usize> {
        list.iter().map(|i| i.buffer_index).collect()
    }

    #[test]
    fn test_sort_directions() {
        let mut lists = RenderLists::new();
        for (i, z) in [0.5, 0.1, 0.9].into_iter().enumerate() {
            lists.push(item(i, z), false);
            lists.push(item(i, z), true);
        }
        lists.sort();

        assert_eq!(order(&lists.opaque), [1, 0, 2]);
        assert_eq!(order(&lists.transparent), [2, 0, 1]);
    }

    #[test]
    fn test_equal_keys_keep_insertion_order() {
        let mut lists = RenderLists::new();
        for i in 0..4 {
            lists.push(item(i, 0.3), false);
            lists.push(item(i, 0.3), true);
        }
        lists.push(item(4, 0.1), false);
        lists.sort();

        assert_eq!(order(&lists.opaque), [4, 0, 1, 2, 3]);
        assert_eq!(order(&lists.transparent), [0, 1, 2, 3]);
    }

    #[test]
    fn test_nan_does_not_panic() {
        let mut lists = RenderLists::new();
        lists.push(item(0, f32::NAN), false);
        lists.push(item(1, 0.0), false);
        lists.sort();
        assert_eq!(lists.len(), 2);
    }
}
