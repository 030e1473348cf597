//! Graphics Device Seam
//!
//! [`GraphicsDevice`] is the narrow driver interface the renderer issues
//! its calls through. It mirrors the subset of an OpenGL-style immediate
//! API the per-frame pipeline needs: fixed-function toggles, blending,
//! clears, program objects, uniforms, vertex attributes and indexed draws.
//!
//! Two implementations ship with the crate:
//!
//! - [`RecordingDevice`]: headless, records every call for inspection
//! - [`GlowDevice`] (feature `glow`): forwards to a `glow::Context`
//!
//! Every call made through the trait is unconditional. Redundancy
//! elimination is the job of the [`PipelineState`](crate::state::PipelineState)
//! cache sitting in front of it.

mod recording;

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
mod gl;

pub use recording::{DeviceCall, RecordingDevice};

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use gl::GlowDevice;

use bitflags::bitflags;
use glam::Vec4;
use lumen_core::Result;
use lumen_resources::{BlendEquation, BlendFactor, BufferId, TextureId, UniformValue};

/// Opaque handle of a linked program object on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Location of a uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Server-side capabilities toggled with enable/disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    CullFace,
    DepthTest,
    Blend,
    PolygonOffsetFill,
}

/// Winding order of front-facing triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Ccw,
    Cw,
}

/// Faces discarded when face culling is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Back,
    FrontAndBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

/// Primitive topology of an indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Triangles,
    Lines,
}

bitflags! {
    /// Buffers cleared by [`GraphicsDevice::clear`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Limits queried once when the renderer is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceCapabilities {
    pub max_texture_units: u32,
    pub max_vertex_texture_units: u32,
    pub max_texture_size: u32,
    pub max_cube_map_size: u32,
    /// `None` when anisotropic filtering is unsupported.
    pub max_anisotropy: Option<f32>,
}

impl DeviceCapabilities {
    /// Vertex shaders may sample textures.
    #[inline]
    #[must_use]
    pub fn supports_vertex_textures(&self) -> bool {
        self.max_vertex_texture_units > 0
    }
}

impl Default for DeviceCapabilities {
    /// OpenGL ES 2.0 minimums.
    fn default() -> Self {
        Self {
            max_texture_units: 8,
            max_vertex_texture_units: 0,
            max_texture_size: 2048,
            max_cube_map_size: 1024,
            max_anisotropy: None,
        }
    }
}

/// Driver interface of an OpenGL-style immediate graphics API.
pub trait GraphicsDevice {
    fn capabilities(&self) -> DeviceCapabilities;

    // === Fixed-function state ===
    fn enable(&mut self, capability: Capability);
    fn disable(&mut self, capability: Capability);
    fn front_face(&mut self, winding: FrontFace);
    fn cull_face(&mut self, face: Face);
    fn depth_func(&mut self, func: DepthFunc);
    fn depth_mask(&mut self, write: bool);
    fn line_width(&mut self, width: f32);
    fn polygon_offset(&mut self, factor: f32, units: f32);

    fn blend_equation(&mut self, equation: BlendEquation);
    fn blend_equation_separate(&mut self, color: BlendEquation, alpha: BlendEquation);
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn blend_func_separate(
        &mut self,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );

    // === Framebuffer ===
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&mut self, color: Vec4);
    fn clear_depth(&mut self, depth: f32);
    fn clear_stencil(&mut self, stencil: i32);
    fn clear(&mut self, mask: ClearMask);

    // === Programs ===
    /// Compiles both stages and links them into a program.
    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId>;
    fn delete_program(&mut self, program: ProgramId);
    fn use_program(&mut self, program: ProgramId);
    /// Names of the active uniforms of a linked program, array suffixes
    /// stripped.
    fn active_uniforms(&mut self, program: ProgramId) -> Vec<String>;
    /// Names of the active vertex attributes of a linked program.
    fn active_attributes(&mut self, program: ProgramId) -> Vec<String>;
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn attribute_location(&mut self, program: ProgramId, name: &str) -> Option<u32>;
    /// Uploads a value to the currently bound program.
    fn uniform(&mut self, location: UniformLocation, value: &UniformValue);

    // === Textures & buffers ===
    fn bind_texture(&mut self, unit: u32, texture: TextureId);
    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId);
    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);
    /// Points `index` at tightly packed `f32` components of the bound array
    /// buffer.
    fn vertex_attrib_pointer(&mut self, index: u32, components: i32);

    /// Draws `count` unsigned 16-bit indices of the bound element buffer.
    fn draw_elements(&mut self, topology: Topology, count: u32);
}
