//! Headless recording device.
//!
//! [`RecordingDevice`] implements [`GraphicsDevice`] without a GPU. Every
//! call is appended to a log of [`DeviceCall`]s that tests inspect to
//! assert exactly which driver work the renderer issued.
//!
//! Programs are "compiled" by scanning the sources for `uniform` and
//! `attribute` / `in` declarations, so location lookups behave like a real
//! driver that strips unused inputs: a name resolves only when declared.

use glam::Vec4;
use lumen_core::errors::ShaderStage;
use lumen_core::{LumenError, Result};
use lumen_resources::{BlendEquation, BlendFactor, BufferId, TextureId, UniformValue};
use rustc_hash::FxHashMap;

use super::{
    BufferTarget, Capability, ClearMask, DepthFunc, DeviceCapabilities, Face, FrontFace,
    GraphicsDevice, ProgramId, Topology, UniformLocation,
};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Enable(Capability),
    Disable(Capability),
    FrontFace(FrontFace),
    CullFace(Face),
    DepthFunc(DepthFunc),
    DepthMask(bool),
    LineWidth(f32),
    PolygonOffset { factor: f32, units: f32 },
    BlendEquation(BlendEquation),
    BlendEquationSeparate(BlendEquation, BlendEquation),
    BlendFunc(BlendFactor, BlendFactor),
    BlendFuncSeparate(BlendFactor, BlendFactor, BlendFactor, BlendFactor),
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    ClearColor(Vec4),
    ClearDepth(f32),
    ClearStencil(i32),
    Clear(ClearMask),
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(ProgramId),
    /// Uniform upload, resolved back to the uniform's name in the bound
    /// program.
    Uniform { name: String, value: UniformValue },
    BindTexture { unit: u32, texture: TextureId },
    BindBuffer(BufferTarget, BufferId),
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
    VertexAttribPointer { index: u32, components: i32 },
    DrawElements { topology: Topology, count: u32 },
}

#[derive(Debug)]
struct RecordedProgram {
    uniforms: Vec<String>,
    attributes: Vec<String>,
}

/// Graphics device that records calls instead of executing them.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    capabilities: DeviceCapabilities,
    programs: FxHashMap<u32, RecordedProgram>,
    next_program: u32,
    current_program: Option<ProgramId>,
    reject_marker: Option<String>,
}

impl RecordingDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    /// Makes compilation fail for any shader stage containing `marker`.
    pub fn reject_shaders_containing(&mut self, marker: impl Into<String>) {
        self.reject_marker = Some(marker.into());
    }

    #[must_use]
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Drains the recorded calls.
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    /// Number of uploads of the uniform called `name`.
    #[must_use]
    pub fn uniform_uploads(&self, name: &str) -> usize {
        self.count(|c| matches!(c, DeviceCall::Uniform { name: n, .. } if n == name))
    }

    /// Draw calls in recording order.
    #[must_use]
    pub fn draws(&self) -> Vec<(Topology, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DeviceCall::DrawElements { topology, count } => Some((*topology, *count)),
                _ => None,
            })
            .collect()
    }

    /// Programs created and not yet deleted.
    #[must_use]
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    fn check_stage(&self, stage: ShaderStage, source: &str) -> Result<()> {
        match &self.reject_marker {
            Some(marker) if source.contains(marker.as_str()) => Err(LumenError::ShaderCompile {
                stage,
                log: format!("ERROR: 0:1: '{marker}' : rejected"),
            }),
            _ => Ok(()),
        }
    }
}

/// Names declared with one of `qualifiers` as the first token of a line.
fn declarations(source: &str, qualifiers: &[&str]) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let mut tokens = line.trim().trim_end_matches(';').split_whitespace();
            let qualifier = tokens.next()?;
            if !qualifiers.contains(&qualifier) {
                return None;
            }
            let name = tokens.last()?.split('[').next()?;
            Some(name.to_owned())
        })
        .collect()
}

impl GraphicsDevice for RecordingDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn enable(&mut self, capability: Capability) {
        self.calls.push(DeviceCall::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.calls.push(DeviceCall::Disable(capability));
    }

    fn front_face(&mut self, winding: FrontFace) {
        self.calls.push(DeviceCall::FrontFace(winding));
    }

    fn cull_face(&mut self, face: Face) {
        self.calls.push(DeviceCall::CullFace(face));
    }

    fn depth_func(&mut self, func: DepthFunc) {
        self.calls.push(DeviceCall::DepthFunc(func));
    }

    fn depth_mask(&mut self, write: bool) {
        self.calls.push(DeviceCall::DepthMask(write));
    }

    fn line_width(&mut self, width: f32) {
        self.calls.push(DeviceCall::LineWidth(width));
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.calls.push(DeviceCall::PolygonOffset { factor, units });
    }

    fn blend_equation(&mut self, equation: BlendEquation) {
        self.calls.push(DeviceCall::BlendEquation(equation));
    }

    fn blend_equation_separate(&mut self, color: BlendEquation, alpha: BlendEquation) {
        self.calls.push(DeviceCall::BlendEquationSeparate(color, alpha));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.calls.push(DeviceCall::BlendFunc(src, dst));
    }

    fn blend_func_separate(
        &mut self,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        self.calls.push(DeviceCall::BlendFuncSeparate(
            src_color, dst_color, src_alpha, dst_alpha,
        ));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.calls.push(DeviceCall::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn clear_color(&mut self, color: Vec4) {
        self.calls.push(DeviceCall::ClearColor(color));
    }

    fn clear_depth(&mut self, depth: f32) {
        self.calls.push(DeviceCall::ClearDepth(depth));
    }

    fn clear_stencil(&mut self, stencil: i32) {
        self.calls.push(DeviceCall::ClearStencil(stencil));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.calls.push(DeviceCall::Clear(mask));
    }

    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId> {
        self.check_stage(ShaderStage::Vertex, vertex)?;
        self.check_stage(ShaderStage::Fragment, fragment)?;

        let mut uniforms = declarations(vertex, &["uniform"]);
        for name in declarations(fragment, &["uniform"]) {
            if !uniforms.contains(&name) {
                uniforms.push(name);
            }
        }
        let attributes = declarations(vertex, &["attribute", "in"]);

        self.next_program += 1;
        let id = ProgramId(self.next_program);
        self.programs.insert(
            id.0,
            RecordedProgram {
                uniforms,
                attributes,
            },
        );
        self.calls.push(DeviceCall::CreateProgram(id));
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program.0);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.calls.push(DeviceCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current_program = Some(program);
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn active_uniforms(&mut self, program: ProgramId) -> Vec<String> {
        self.programs
            .get(&program.0)
            .map(|p| p.uniforms.clone())
            .unwrap_or_default()
    }

    fn active_attributes(&mut self, program: ProgramId) -> Vec<String> {
        self.programs
            .get(&program.0)
            .map(|p| p.attributes.clone())
            .unwrap_or_default()
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let p = self.programs.get(&program.0)?;
        let index = p.uniforms.iter().position(|u| u == name)?;
        Some(UniformLocation(index as u32))
    }

    fn attribute_location(&mut self, program: ProgramId, name: &str) -> Option<u32> {
        let p = self.programs.get(&program.0)?;
        p.attributes.iter().position(|a| a == name).map(|i| i as u32)
    }

    fn uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let name = self
            .current_program
            .and_then(|id| self.programs.get(&id.0))
            .and_then(|p| p.uniforms.get(location.0 as usize))
            .cloned()
            .unwrap_or_else(|| format!("<location {}>", location.0));
        self.calls.push(DeviceCall::Uniform {
            name,
            value: *value,
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.calls.push(DeviceCall::BindTexture { unit, texture });
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        self.calls.push(DeviceCall::BindBuffer(target, buffer));
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.calls.push(DeviceCall::EnableVertexAttribArray(index));
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.calls.push(DeviceCall::DisableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer(&mut self, index: u32, components: i32) {
        self.calls.push(DeviceCall::VertexAttribPointer { index, components });
    }

    fn draw_elements(&mut self, topology: Topology, count: u32) {
        self.calls.push(DeviceCall::DrawElements { topology, count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "uniform mat4 projectionMatrix;\n\
                          uniform mat4 modelViewMatrix;\n\
                          attribute vec3 position;\n\
                          attribute vec2 uv;\n\
                          void main() {}\n";
    const FRAGMENT: &str = "uniform vec3 diffuse;\nuniform float weights[4];\nvoid main() {}\n";

    #[test]
    fn test_locations_follow_declarations() {
        let mut device = RecordingDevice::new();
        let program = device.create_program(VERTEX, FRAGMENT).unwrap();

        assert_eq!(
            device.active_uniforms(program),
            ["projectionMatrix", "modelViewMatrix", "diffuse", "weights"]
        );
        assert_eq!(device.attribute_location(program, "uv"), Some(1));
        assert!(device.attribute_location(program, "color").is_none());
        assert!(device.uniform_location(program, "modelMatrix").is_none());
    }

    #[test]
    fn test_uniform_upload_is_named() {
        let mut device = RecordingDevice::new();
        let program = device.create_program(VERTEX, FRAGMENT).unwrap();
        device.use_program(program);

        let loc = device.uniform_location(program, "diffuse").unwrap();
        device.uniform(loc, &UniformValue::Float(1.0));

        assert_eq!(device.uniform_uploads("diffuse"), 1);
    }

    #[test]
    fn test_rejected_shader() {
        let mut device = RecordingDevice::new();
        device.reject_shaders_containing("#error");

        let err = device
            .create_program(VERTEX, "#error broken\nvoid main() {}")
            .unwrap_err();
        assert!(matches!(
            err,
            LumenError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert_eq!(device.live_programs(), 0);
    }
}
