//! Lumen Scene
//!
//! Hierarchical scene graph: an arena of [`Node`]s with parent/child
//! handles, TRS [`Transform`]s propagated by the [`transform_system`],
//! [`Camera`] components, and the material pool buffers refer to.

pub mod camera;
pub mod node;
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use camera::{Camera, Frustum, Projection};
pub use lumen_core::{MaterialHandle, NodeHandle};
pub use node::{Node, NodeBuffer};
pub use scene::Scene;
pub use transform::Transform;
