//! `glow` backend.
//!
//! Forwards [`GraphicsDevice`] calls to a [`glow::Context`]. Device object
//! names are carried in the renderer's opaque ids: a [`BufferId`] holds the
//! GL buffer name, a [`ProgramId`] the GL program name.

use std::num::NonZeroU32;

use glam::Vec4;
use glow::HasContext;
use lumen_core::errors::ShaderStage;
use lumen_core::{LumenError, Result};
use lumen_resources::{BlendEquation, BlendFactor, BufferId, TextureId, UniformValue};

use super::{
    BufferTarget, Capability, ClearMask, DepthFunc, DeviceCapabilities, Face, FrontFace,
    GraphicsDevice, ProgramId, Topology, UniformLocation,
};

pub struct GlowDevice {
    gl: glow::Context,
}

impl GlowDevice {
    #[must_use]
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    #[must_use]
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    /// Uploads vertex data into a new array buffer.
    pub fn create_array_buffer(&mut self, data: &[f32]) -> Result<BufferId> {
        self.create_buffer(glow::ARRAY_BUFFER, bytemuck::cast_slice(data))
    }

    /// Uploads 16-bit indices into a new element buffer.
    pub fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId> {
        self.create_buffer(glow::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(indices))
    }

    pub fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(buffer) = native_buffer(buffer) {
            unsafe { self.gl.delete_buffer(buffer) };
        }
    }

    /// Exposes an existing GL texture to material uniforms.
    #[must_use]
    pub fn texture_id(texture: glow::Texture) -> TextureId {
        TextureId(texture.0.get())
    }

    fn create_buffer(&mut self, target: u32, bytes: &[u8]) -> Result<BufferId> {
        unsafe {
            let buffer = self.gl.create_buffer().map_err(LumenError::Device)?;
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, bytes, glow::STATIC_DRAW);
            self.gl.bind_buffer(target, None);
            Ok(BufferId(buffer.0.get()))
        }
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<glow::Shader> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self.gl.create_shader(kind).map_err(LumenError::Device)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(LumenError::ShaderCompile { stage, log });
            }
            Ok(shader)
        }
    }
}

fn native_program(program: ProgramId) -> Option<glow::Program> {
    NonZeroU32::new(program.0).map(glow::NativeProgram)
}

fn native_buffer(buffer: BufferId) -> Option<glow::Buffer> {
    NonZeroU32::new(buffer.0).map(glow::NativeBuffer)
}

fn native_texture(texture: TextureId) -> Option<glow::Texture> {
    NonZeroU32::new(texture.0).map(glow::NativeTexture)
}

fn strip_array_suffix(name: &str) -> String {
    name.split('[').next().unwrap_or(name).to_owned()
}

fn capability(cap: Capability) -> u32 {
    match cap {
        Capability::CullFace => glow::CULL_FACE,
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::Blend => glow::BLEND,
        Capability::PolygonOffsetFill => glow::POLYGON_OFFSET_FILL,
    }
}

fn blend_equation(equation: BlendEquation) -> u32 {
    match equation {
        BlendEquation::Add => glow::FUNC_ADD,
        BlendEquation::Subtract => glow::FUNC_SUBTRACT,
        BlendEquation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendEquation::Min => glow::MIN,
        BlendEquation::Max => glow::MAX,
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlphaSaturate => glow::SRC_ALPHA_SATURATE,
    }
}

impl GraphicsDevice for GlowDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        unsafe {
            let max_anisotropy = self
                .gl
                .supported_extensions()
                .contains("GL_EXT_texture_filter_anisotropic")
                .then(|| self.gl.get_parameter_f32(glow::MAX_TEXTURE_MAX_ANISOTROPY_EXT));

            DeviceCapabilities {
                max_texture_units: self.gl.get_parameter_i32(glow::MAX_TEXTURE_IMAGE_UNITS) as u32,
                max_vertex_texture_units: self
                    .gl
                    .get_parameter_i32(glow::MAX_VERTEX_TEXTURE_IMAGE_UNITS)
                    as u32,
                max_texture_size: self.gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE) as u32,
                max_cube_map_size: self.gl.get_parameter_i32(glow::MAX_CUBE_MAP_TEXTURE_SIZE)
                    as u32,
                max_anisotropy,
            }
        }
    }

    fn enable(&mut self, cap: Capability) {
        unsafe { self.gl.enable(capability(cap)) };
    }

    fn disable(&mut self, cap: Capability) {
        unsafe { self.gl.disable(capability(cap)) };
    }

    fn front_face(&mut self, winding: FrontFace) {
        let mode = match winding {
            FrontFace::Ccw => glow::CCW,
            FrontFace::Cw => glow::CW,
        };
        unsafe { self.gl.front_face(mode) };
    }

    fn cull_face(&mut self, face: Face) {
        let mode = match face {
            Face::Front => glow::FRONT,
            Face::Back => glow::BACK,
            Face::FrontAndBack => glow::FRONT_AND_BACK,
        };
        unsafe { self.gl.cull_face(mode) };
    }

    fn depth_func(&mut self, func: DepthFunc) {
        let func = match func {
            DepthFunc::Never => glow::NEVER,
            DepthFunc::Less => glow::LESS,
            DepthFunc::Equal => glow::EQUAL,
            DepthFunc::LessEqual => glow::LEQUAL,
            DepthFunc::Greater => glow::GREATER,
            DepthFunc::NotEqual => glow::NOTEQUAL,
            DepthFunc::GreaterEqual => glow::GEQUAL,
            DepthFunc::Always => glow::ALWAYS,
        };
        unsafe { self.gl.depth_func(func) };
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe { self.gl.depth_mask(write) };
    }

    fn line_width(&mut self, width: f32) {
        unsafe { self.gl.line_width(width) };
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        unsafe { self.gl.polygon_offset(factor, units) };
    }

    fn blend_equation(&mut self, equation: BlendEquation) {
        unsafe { self.gl.blend_equation(blend_equation(equation)) };
    }

    fn blend_equation_separate(&mut self, color: BlendEquation, alpha: BlendEquation) {
        unsafe {
            self.gl
                .blend_equation_separate(blend_equation(color), blend_equation(alpha));
        }
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(blend_factor(src), blend_factor(dst)) };
    }

    fn blend_func_separate(
        &mut self,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        unsafe {
            self.gl.blend_func_separate(
                blend_factor(src_color),
                blend_factor(dst_color),
                blend_factor(src_alpha),
                blend_factor(dst_alpha),
            );
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn clear_color(&mut self, color: Vec4) {
        unsafe { self.gl.clear_color(color.x, color.y, color.z, color.w) };
    }

    fn clear_depth(&mut self, depth: f32) {
        unsafe { self.gl.clear_depth_f32(depth) };
    }

    fn clear_stencil(&mut self, stencil: i32) {
        unsafe { self.gl.clear_stencil(stencil) };
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.contains(ClearMask::COLOR) {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if mask.contains(ClearMask::DEPTH) {
            bits |= glow::DEPTH_BUFFER_BIT;
        }
        if mask.contains(ClearMask::STENCIL) {
            bits |= glow::STENCIL_BUFFER_BIT;
        }
        unsafe { self.gl.clear(bits) };
    }

    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId> {
        let vs = self.compile_stage(ShaderStage::Vertex, vertex)?;
        let fs = match self.compile_stage(ShaderStage::Fragment, fragment) {
            Ok(fs) => fs,
            Err(e) => {
                unsafe { self.gl.delete_shader(vs) };
                return Err(e);
            }
        };

        unsafe {
            let program = match self.gl.create_program() {
                Ok(program) => program,
                Err(e) => {
                    self.gl.delete_shader(vs);
                    self.gl.delete_shader(fs);
                    return Err(LumenError::Device(e));
                }
            };
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);

            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);
            self.gl.delete_shader(vs);
            self.gl.delete_shader(fs);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(LumenError::ProgramLink(log));
            }

            Ok(ProgramId(program.0.get()))
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(program) = native_program(program) {
            unsafe { self.gl.delete_program(program) };
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        unsafe { self.gl.use_program(native_program(program)) };
    }

    fn active_uniforms(&mut self, program: ProgramId) -> Vec<String> {
        let Some(program) = native_program(program) else {
            return Vec::new();
        };
        unsafe {
            (0..self.gl.get_active_uniforms(program))
                .filter_map(|i| self.gl.get_active_uniform(program, i))
                .map(|u| strip_array_suffix(&u.name))
                .collect()
        }
    }

    fn active_attributes(&mut self, program: ProgramId) -> Vec<String> {
        let Some(program) = native_program(program) else {
            return Vec::new();
        };
        unsafe {
            (0..self.gl.get_active_attributes(program))
                .filter_map(|i| self.gl.get_active_attribute(program, i))
                .map(|a| a.name)
                .collect()
        }
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let program = native_program(program)?;
        unsafe { self.gl.get_uniform_location(program, name) }.map(|l| UniformLocation(l.0))
    }

    fn attribute_location(&mut self, program: ProgramId, name: &str) -> Option<u32> {
        let program = native_program(program)?;
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let loc = glow::NativeUniformLocation(location.0);
        let loc = Some(&loc);
        unsafe {
            match value {
                UniformValue::Float(v) => self.gl.uniform_1_f32(loc, *v),
                UniformValue::Int(v) => self.gl.uniform_1_i32(loc, *v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(loc, v.x, v.y),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(loc, v.x, v.y, v.z),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(loc, v.x, v.y, v.z, v.w),
                UniformValue::Mat3(m) => {
                    self.gl
                        .uniform_matrix_3_f32_slice(loc, false, &m.to_cols_array());
                }
                UniformValue::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(loc, false, &m.to_cols_array());
                }
                UniformValue::Texture(_) => {
                    log::warn!("Texture uniforms must be resolved to a unit before upload");
                }
            }
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, native_texture(texture));
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        let target = match target {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        };
        unsafe { self.gl.bind_buffer(target, native_buffer(buffer)) };
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) };
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) };
    }

    fn vertex_attrib_pointer(&mut self, index: u32, components: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, 0, 0);
        }
    }

    fn draw_elements(&mut self, topology: Topology, count: u32) {
        let mode = match topology {
            Topology::Triangles => glow::TRIANGLES,
            Topology::Lines => glow::LINES,
        };
        unsafe {
            self.gl
                .draw_elements(mode, count as i32, glow::UNSIGNED_SHORT, 0);
        }
    }
}
