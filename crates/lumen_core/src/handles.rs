//! Strongly-typed arena handles.
//!
//! Scene nodes, materials and compiled programs live in slotmaps owned by
//! different crates; the key types are declared here so every crate can
//! refer to them without depending on the owner.

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a node in a scene arena.
    pub struct NodeHandle;

    /// Handle to a material in a scene's material pool.
    pub struct MaterialHandle;

    /// Handle to a compiled program in the renderer's program cache.
    pub struct ProgramHandle;
}
