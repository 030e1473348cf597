//! Pipeline State Cache
//!
//! Mirrors the fixed-function state of the graphics device so redundant
//! driver calls are never issued. Every setter compares the requested value
//! against the cached one, emits the driver call only on change, and then
//! records the new value.
//!
//! All fields start out *unknown* (`None`): the first request for any piece
//! of state always reaches the driver. [`PipelineState::reset`] returns to
//! that state, e.g. after foreign code touched the context.

use lumen_core::{MaterialHandle, NodeHandle, ProgramHandle};
use lumen_resources::{BlendEquation, BlendFactor, BlendFunction, Blending, BufferId, Side};

use crate::device::{BufferTarget, Capability, FrontFace, GraphicsDevice, ProgramId};

/// Number of vertex attribute slots tracked by the cache.
pub const MAX_VERTEX_ATTRIBUTES: u32 = 16;

/// Identity of a buffer's attribute bindings. Two consecutive draws with
/// the same group reuse the bindings of the first.
///
/// The array buffers are part of the identity: a node whose geometry was
/// swapped must rebind even though its handle and slot are unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryGroup {
    pub node: NodeHandle,
    pub buffer_index: usize,
    pub program: ProgramHandle,
    pub wireframe: bool,
    pub vertices: BufferId,
    pub colors: Option<BufferId>,
    pub uvs: Option<BufferId>,
}

#[derive(Debug, Default)]
pub struct PipelineState {
    // === Faces ===
    double_sided: Option<bool>,
    flip_sided: Option<bool>,

    // === Depth ===
    depth_test: Option<bool>,
    depth_write: Option<bool>,

    line_width: Option<f32>,

    // === Polygon offset ===
    polygon_offset: Option<bool>,
    polygon_offset_factor: Option<f32>,
    polygon_offset_units: Option<f32>,

    // === Blending ===
    blending: Option<Blending>,
    blend_equation: Option<BlendEquation>,
    blend_src: Option<BlendFactor>,
    blend_dst: Option<BlendFactor>,

    // === Vertex attributes (bit per slot) ===
    new_attributes: u32,
    enabled_attributes: u32,

    // === Bindings ===
    current_program: Option<ProgramHandle>,
    current_material: Option<MaterialHandle>,
    current_camera: Option<NodeHandle>,
    current_element_buffer: Option<BufferId>,
    current_geometry_group: Option<GeometryGroup>,
}

impl PipelineState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything; the next request for any state is emitted.
    ///
    /// Attribute arrays the cache knows to be enabled are kept, so they can
    /// still be disabled once unused.
    pub fn reset(&mut self) {
        let enabled_attributes = self.enabled_attributes;
        *self = Self {
            enabled_attributes,
            ..Self::default()
        };
    }

    // ========================================================================
    // Fixed-function toggles
    // ========================================================================

    /// Configures face culling and winding for a material side.
    pub fn set_material_faces<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, side: Side) {
        let double_sided = side == Side::Double;
        let flip_sided = side == Side::Back;

        if self.double_sided != Some(double_sided) {
            if double_sided {
                device.disable(Capability::CullFace);
            } else {
                device.enable(Capability::CullFace);
            }
            self.double_sided = Some(double_sided);
        }

        if self.flip_sided != Some(flip_sided) {
            if flip_sided {
                device.front_face(FrontFace::Cw);
            } else {
                device.front_face(FrontFace::Ccw);
            }
            self.flip_sided = Some(flip_sided);
        }
    }

    pub fn set_depth_test<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, enabled: bool) {
        if self.depth_test != Some(enabled) {
            if enabled {
                device.enable(Capability::DepthTest);
            } else {
                device.disable(Capability::DepthTest);
            }
            self.depth_test = Some(enabled);
        }
    }

    pub fn set_depth_write<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, enabled: bool) {
        if self.depth_write != Some(enabled) {
            device.depth_mask(enabled);
            self.depth_write = Some(enabled);
        }
    }

    pub fn set_line_width<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, width: f32) {
        if self.line_width != Some(width) {
            device.line_width(width);
            self.line_width = Some(width);
        }
    }

    /// Toggles polygon offset. Factor and units are only programmed while
    /// the offset is enabled.
    pub fn set_polygon_offset<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        enabled: bool,
        factor: f32,
        units: f32,
    ) {
        if self.polygon_offset != Some(enabled) {
            if enabled {
                device.enable(Capability::PolygonOffsetFill);
            } else {
                device.disable(Capability::PolygonOffsetFill);
            }
            self.polygon_offset = Some(enabled);
        }

        if enabled
            && (self.polygon_offset_factor != Some(factor)
                || self.polygon_offset_units != Some(units))
        {
            device.polygon_offset(factor, units);
            self.polygon_offset_factor = Some(factor);
            self.polygon_offset_units = Some(units);
        }
    }

    /// Applies a blend mode. `function` is only read for
    /// [`Blending::Custom`], whose equation and factors are diffed
    /// independently.
    pub fn set_blending<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        blending: Blending,
        function: BlendFunction,
    ) {
        if self.blending != Some(blending) {
            match blending {
                Blending::None => device.disable(Capability::Blend),
                Blending::Normal => {
                    device.enable(Capability::Blend);
                    device.blend_equation_separate(BlendEquation::Add, BlendEquation::Add);
                    device.blend_func_separate(
                        BlendFactor::SrcAlpha,
                        BlendFactor::OneMinusSrcAlpha,
                        BlendFactor::One,
                        BlendFactor::OneMinusSrcAlpha,
                    );
                }
                Blending::Additive => {
                    device.enable(Capability::Blend);
                    device.blend_equation(BlendEquation::Add);
                    device.blend_func(BlendFactor::SrcAlpha, BlendFactor::One);
                }
                Blending::Subtractive => {
                    device.enable(Capability::Blend);
                    device.blend_equation(BlendEquation::Add);
                    device.blend_func(BlendFactor::Zero, BlendFactor::OneMinusSrcColor);
                }
                Blending::Multiply => {
                    device.enable(Capability::Blend);
                    device.blend_equation(BlendEquation::Add);
                    device.blend_func(BlendFactor::Zero, BlendFactor::SrcColor);
                }
                Blending::Custom => device.enable(Capability::Blend),
            }
            self.blending = Some(blending);
        }

        if blending == Blending::Custom {
            if self.blend_equation != Some(function.equation) {
                device.blend_equation(function.equation);
                self.blend_equation = Some(function.equation);
            }
            if self.blend_src != Some(function.src) || self.blend_dst != Some(function.dst) {
                device.blend_func(function.src, function.dst);
                self.blend_src = Some(function.src);
                self.blend_dst = Some(function.dst);
            }
        } else {
            self.blend_equation = None;
            self.blend_src = None;
            self.blend_dst = None;
        }
    }

    #[inline]
    #[must_use]
    pub fn blending(&self) -> Option<Blending> {
        self.blending
    }

    // ========================================================================
    // Vertex attributes
    // ========================================================================

    /// Starts a buffer's attribute setup: no slot is wanted yet.
    #[inline]
    pub fn init_attributes(&mut self) {
        self.new_attributes = 0;
    }

    /// Marks `index` as wanted, enabling its array if not enabled yet.
    pub fn enable_attribute<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, index: u32) {
        if index >= MAX_VERTEX_ATTRIBUTES {
            log::warn!("Vertex attribute slot {index} exceeds the {MAX_VERTEX_ATTRIBUTES} tracked slots");
            return;
        }
        let bit = 1 << index;
        self.new_attributes |= bit;

        if self.enabled_attributes & bit == 0 {
            device.enable_vertex_attrib_array(index);
            self.enabled_attributes |= bit;
        }
    }

    /// Disables every enabled slot not wanted since [`init_attributes`](Self::init_attributes).
    pub fn disable_unused_attributes<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        let mut unused = self.enabled_attributes & !self.new_attributes;
        while unused != 0 {
            let index = unused.trailing_zeros();
            device.disable_vertex_attrib_array(index);
            unused &= unused - 1;
        }
        self.enabled_attributes &= self.new_attributes;
    }

    #[inline]
    #[must_use]
    pub fn enabled_attributes(&self) -> u32 {
        self.enabled_attributes
    }

    // ========================================================================
    // Bindings
    // ========================================================================

    /// Binds a program; returns whether it differed from the bound one.
    pub fn use_program<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        handle: ProgramHandle,
        id: ProgramId,
    ) -> bool {
        if self.current_program == Some(handle) {
            return false;
        }
        device.use_program(id);
        self.current_program = Some(handle);
        true
    }

    #[inline]
    #[must_use]
    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.current_program
    }

    /// Records the current material; returns whether it changed.
    pub fn set_current_material(&mut self, material: MaterialHandle) -> bool {
        if self.current_material == Some(material) {
            return false;
        }
        self.current_material = Some(material);
        true
    }

    /// Records the camera whose projection was last uploaded; returns
    /// whether it changed.
    pub fn set_current_camera(&mut self, camera: NodeHandle) -> bool {
        if self.current_camera == Some(camera) {
            return false;
        }
        self.current_camera = Some(camera);
        true
    }

    /// Forgets a material that is going away.
    pub fn forget_material(&mut self, material: MaterialHandle) {
        if self.current_material == Some(material) {
            self.current_material = None;
        }
    }

    /// Forgets a program that was deleted on the device.
    pub fn forget_program(&mut self, program: ProgramHandle) {
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        if self
            .current_geometry_group
            .is_some_and(|g| g.program == program)
        {
            self.current_geometry_group = None;
        }
    }

    /// Forgets the camera and material bindings at the start of a frame.
    ///
    /// Projection and material uniforms may have been edited in place since
    /// the last frame, so the first draw of each must upload them again.
    /// Program and fixed-function state stay cached.
    pub fn reset_frame_bindings(&mut self) {
        self.current_camera = None;
        self.current_material = None;
    }

    pub fn bind_element_buffer<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, buffer: BufferId) {
        if self.current_element_buffer != Some(buffer) {
            device.bind_buffer(BufferTarget::ElementArray, buffer);
            self.current_element_buffer = Some(buffer);
        }
    }

    /// Records the geometry group about to be drawn; returns whether its
    /// attributes must be (re)bound.
    pub fn set_geometry_group(&mut self, group: GeometryGroup) -> bool {
        if self.current_geometry_group == Some(group) {
            return false;
        }
        self.current_geometry_group = Some(group);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCall, RecordingDevice};

    #[test]
    fn test_depth_test_emits_once() {
        let mut device = RecordingDevice::new();
        let mut state = PipelineState::new();

        state.set_depth_test(&mut device, true);
        state.set_depth_test(&mut device, true);

        assert_eq!(device.calls(), &[DeviceCall::Enable(Capability::DepthTest)]);
    }

    #[test]
    fn test_depth_test_toggle() {
        let mut device = RecordingDevice::new();
        let mut state = PipelineState::new();

        state.set_depth_test(&mut device, true);
        state.set_depth_test(&mut device, false);

        assert_eq!(
            device.calls(),
            &[
                DeviceCall::Enable(Capability::DepthTest),
                DeviceCall::Disable(Capability::DepthTest),
            ]
        );
    }

    #[test]
    fn test_material_faces() {
        let mut device = RecordingDevice::new();
        let mut state = PipelineState::new();

        state.set_material_faces(&mut device, Side::Front);
        assert_eq!(
            device.take_calls(),
            [
                DeviceCall::Enable(Capability::CullFace),
                DeviceCall::FrontFace(FrontFace::Ccw),
            ]
        );

        state.set_material_faces(&mut device, Side::Back);
        assert_eq!(device.take_calls(), [DeviceCall::FrontFace(FrontFace::Cw)]);

        state.set_material_faces(&mut device, Side::Double);
        assert_eq!(
            device.take_calls(),
            [
                DeviceCall::Disable(Capability::CullFace),
                DeviceCall::FrontFace(FrontFace::Ccw),
            ]
        );

        state.set_material_faces(&mut device, Side::Double);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_polygon_offset_values_only_when_enabled() {
        let mut device = RecordingDevice::new();
        let mut state = PipelineState::new();

        state.set_polygon_offset(&mut device, false, 1.0, 2.0);
        assert_eq!(device.take_calls(), [DeviceCall::Disable(Capability::PolygonOffsetFill)]);

        state.set_polygon_offset(&mut device, true, 1.0, 2.0);
        assert_eq!(
            device.take_calls(),
            [
                DeviceCall::Enable(Capability::PolygonOffsetFill),
                DeviceCall::PolygonOffset { factor: 1.0, units: 2.0 },
            ]
        );

        state.set_polygon_offset(&mut device, true, 1.0, 2.0);
        state.set_polygon_offset(&mut device, true, 1.0, 3.0);
        assert_eq!(
            device.take_calls(),
            [DeviceCall::PolygonOffset { factor: 1.0, units: 3.0 }]
        );
    }

    #[test]
    fn test_normal_blending_programmed_once() {
        let mut device = RecordingDevice::new();
        let mut state = PipelineState::new();
        let func = BlendFunction::default();

        state.set_blending(&mut device, Blending::Normal, func);
        state.set_blending(&mut device, Blending::Normal, func);

        assert_eq!(device.count(|c| matches!(c, DeviceCall::Enable(Capability::Blend))), 1);
        assert_eq!(device.count(|c| matches!(c, DeviceCall::BlendFuncSeparate(..))), 1);
        assert_eq!(device.calls().len(), 3);
    }

    #[test]
    fn test_custom_blending_diffs_components() {
        let mut device = RecordingDevice::new();
        let mut state = PipelineState::new();
        let mut func = BlendFunction {
            equation: BlendEquation::Subtract,
            src: BlendFactor::One,
            dst: BlendFactor::One,
        };

        state.set_blending(&mut device, Blending::Custom, func);
        assert_eq!(
            device.take_calls(),
            [
                DeviceCall::Enable(Capability::Blend),
                DeviceCall::BlendEquation(BlendEquation::Subtract),
                DeviceCall::BlendFunc(BlendFactor::One, BlendFactor::One),
            ]
        );

        func.dst = BlendFactor::Zero;
        state.set_blending(&mut device, Blending::Custom, func);
        assert_eq!(
            device.take_calls(),
            [DeviceCall::BlendFunc(BlendFactor::One, BlendFactor::Zero)]
        );

        // Leaving custom forgets the custom triple.
        state.set_blending(&mut device, Blending::None, func);
        state.set_blending(&mut device, Blending::Custom, func);
        assert_eq!(
            device.take_calls(),
            [
                DeviceCall::Disable(Capability::Blend),
                DeviceCall::Enable(Capability::Blend),
                DeviceCall::BlendEquation(BlendEquation::Subtract),
                DeviceCall::BlendFunc(BlendFactor::One, BlendFactor::Zero),
            ]
        );
    }

    #[test]
    fn test_attribute_protocol() {
        let mut device = RecordingDevice::new();
        let mut state = PipelineState::new();

        state.init_attributes();
        state.enable_attribute(&mut device, 0);
        state.enable_attribute(&mut device, 2);
        state.disable_unused_attributes(&mut device);
        assert_eq!(
            device.take_calls(),
            [
                DeviceCall::EnableVertexAttribArray(0),
                DeviceCall::EnableVertexAttribArray(2),
            ]
        );

        state.init_attributes();
        state.enable_attribute(&mut device, 0);
        state.disable_unused_attributes(&mut device);
        assert_eq!(device.take_calls(), [DeviceCall::DisableVertexAttribArray(2)]);
        assert_eq!(state.enabled_attributes(), 0b1);

        state.enable_attribute(&mut device, MAX_VERTEX_ATTRIBUTES);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_reset_forgets_state() {
        let mut device = RecordingDevice::new();
        let mut state = PipelineState::new();

        state.set_depth_write(&mut device, true);
        state.reset();
        state.set_depth_write(&mut device, true);

        assert_eq!(device.count(|c| matches!(c, DeviceCall::DepthMask(true))), 2);
    }

    #[test]
    fn test_frame_bindings_reset_keeps_program() {
        let mut device = RecordingDevice::new();
        let mut state = PipelineState::new();
        let camera = NodeHandle::default();
        let material = MaterialHandle::default();

        state.use_program(&mut device, ProgramHandle::default(), ProgramId(1));
        assert!(state.set_current_camera(camera));
        assert!(state.set_current_material(material));
        assert!(!state.set_current_camera(camera));

        state.reset_frame_bindings();

        assert!(state.set_current_camera(camera));
        assert!(state.set_current_material(material));
        assert_eq!(state.current_program(), Some(ProgramHandle::default()));
    }
}
