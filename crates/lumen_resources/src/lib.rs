//! Lumen Resources
//!
//! Plain data consumed by the renderer: GPU geometry handles, materials,
//! uniform sets, shader sources and shader defines. Nothing in this crate
//! talks to the graphics device.

pub mod geometry;
pub mod material;
pub mod shader;
pub mod shader_defines;
pub mod uniforms;

pub use geometry::{BoundingSphere, BufferId, GeometryBuffers};
pub use material::{
    BlendEquation, BlendFactor, BlendFunction, Blending, Material, PolygonOffset, Side,
};
pub use shader::{Precision, ShaderSource};
pub use shader_defines::ShaderDefines;
pub use uniforms::{TextureId, Uniform, UniformValue, Uniforms};
