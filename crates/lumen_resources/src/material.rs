//! Materials
//!
//! A [`Material`] bundles everything the renderer needs to draw a buffer:
//! the shader and its defines, the uniform set, and the fixed-function
//! pipeline state (blending, depth, polygon offset, face culling,
//! wireframe).
//!
//! The compiled program backing a material is resolved lazily by the
//! renderer. Changing the shader or the defines through the setters marks
//! the material as needing an update; the next draw recompiles.

use lumen_core::ProgramHandle;

use crate::shader::ShaderSource;
use crate::shader_defines::ShaderDefines;
use crate::uniforms::Uniforms;

/// Blend mode of a material.
///
/// Every mode except [`Blending::Custom`] maps to a fixed equation/factor
/// triple. `Custom` uses [`Material::blend_function`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Blending {
    None,
    #[default]
    Normal,
    Additive,
    Subtractive,
    Multiply,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    DstColor,
    OneMinusDstColor,
    SrcAlphaSaturate,
}

/// Equation and factors applied by [`Blending::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFunction {
    pub equation: BlendEquation,
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl Default for BlendFunction {
    fn default() -> Self {
        Self {
            equation: BlendEquation::Add,
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::OneMinusSrcAlpha,
        }
    }
}

/// Which faces of a triangle are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Depth offset applied to filled polygons.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolygonOffset {
    pub enabled: bool,
    pub factor: f32,
    pub units: f32,
}

#[derive(Debug)]
pub struct Material {
    // === Shader inputs ===
    shader: ShaderSource,
    defines: ShaderDefines,
    pub uniforms: Uniforms,

    // === Pipeline state ===
    pub blending: Blending,
    pub blend_function: BlendFunction,
    pub depth_test: bool,
    pub depth_write: bool,
    pub polygon_offset: PolygonOffset,
    pub wireframe: bool,
    pub wireframe_line_width: f32,
    pub side: Side,

    // === Classification ===
    /// Transparent materials are drawn back-to-front after all opaque ones.
    pub transparent: bool,
    /// Invisible materials draw nothing.
    pub visible: bool,

    // === Renderer-owned ===
    program: Option<ProgramHandle>,
    needs_update: bool,
}

impl Material {
    #[must_use]
    pub fn new(shader: ShaderSource) -> Self {
        Self {
            shader,
            defines: ShaderDefines::new(),
            uniforms: Uniforms::new(),
            blending: Blending::Normal,
            blend_function: BlendFunction::default(),
            depth_test: true,
            depth_write: true,
            polygon_offset: PolygonOffset::default(),
            wireframe: false,
            wireframe_line_width: 1.0,
            side: Side::Front,
            transparent: false,
            visible: true,
            program: None,
            needs_update: true,
        }
    }

    #[inline]
    #[must_use]
    pub fn shader(&self) -> &ShaderSource {
        &self.shader
    }

    /// Replaces the shader and schedules a recompile.
    pub fn set_shader(&mut self, shader: ShaderSource) {
        self.shader = shader;
        self.needs_update = true;
    }

    #[inline]
    #[must_use]
    pub fn defines(&self) -> &ShaderDefines {
        &self.defines
    }

    /// Mutable access to the defines; schedules a recompile.
    pub fn defines_mut(&mut self) -> &mut ShaderDefines {
        self.needs_update = true;
        &mut self.defines
    }

    /// Program currently backing this material, if compiled.
    #[inline]
    #[must_use]
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    #[inline]
    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Forces a recompile on the next draw.
    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }

    /// Records a freshly compiled program and clears the update flag.
    pub fn bind_program(&mut self, program: ProgramHandle) {
        self.program = Some(program);
        self.needs_update = false;
    }

    /// Detaches the current program so its reference can be released.
    pub fn take_program(&mut self) -> Option<ProgramHandle> {
        self.program.take()
    }
}

/// A clone shares every setting but not the program: program references
/// are counted per material, so the clone compiles (or re-acquires) its own.
impl Clone for Material {
    fn clone(&self) -> Self {
        Self {
            shader: self.shader.clone(),
            defines: self.defines.clone(),
            uniforms: self.uniforms.clone(),
            blending: self.blending,
            blend_function: self.blend_function,
            depth_test: self.depth_test,
            depth_write: self.depth_write,
            polygon_offset: self.polygon_offset,
            wireframe: self.wireframe,
            wireframe_line_width: self.wireframe_line_width,
            side: self.side,
            transparent: self.transparent,
            visible: self.visible,
            program: None,
            needs_update: true,
        }
    }
}
