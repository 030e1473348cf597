//! Lumen
//!
//! A retained-mode 3D scene renderer for OpenGL-style graphics APIs.
//!
//! ```rust,ignore
//! use lumen::prelude::*;
//!
//! let mut scene = Scene::new();
//! let material = scene.add_material(Material::new(ShaderSource::new(VERTEX, FRAGMENT)));
//! scene.add(Node::with_buffer(geometry, material));
//!
//! let camera = scene.add_camera(Camera::new_perspective(45.0, 16.0 / 9.0, 0.1, 100.0));
//!
//! let mut renderer = Renderer::new(device);
//! renderer.set_size(1280, 720);
//! renderer.render(&mut scene, camera, false)?;
//! ```

pub use glam;
pub use lumen_render as render;
pub use lumen_resources as resources;
pub use lumen_scene as scene;

pub use lumen_core::{LumenError, MaterialHandle, NodeHandle, ProgramHandle, Result, interner};
pub use lumen_render::{RecordingDevice, Renderer, RendererSettings};
pub use lumen_resources::{GeometryBuffers, Material, ShaderSource};
pub use lumen_scene::{Camera, Node, Scene};

pub mod prelude {
    pub use lumen_core::{LumenError, MaterialHandle, NodeHandle, Result};
    #[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
    pub use lumen_render::GlowDevice;
    pub use lumen_render::{
        FramePhase, FrameStats, GraphicsDevice, RecordingDevice, Renderer, RendererSettings,
    };
    pub use lumen_resources::{
        BlendEquation, BlendFactor, BlendFunction, Blending, BoundingSphere, BufferId,
        GeometryBuffers, Material, PolygonOffset, Precision, ShaderDefines, ShaderSource, Side,
        TextureId, UniformValue,
    };
    pub use lumen_scene::{Camera, Node, NodeBuffer, Scene, Transform};
}
