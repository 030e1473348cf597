//! GL State Cache Tests
//!
//! Tests for:
//! - Redundant toggle elimination (depth test, depth write, line width)
//! - Face culling / winding per material side
//! - Polygon offset enable and parameter diffing
//! - Fixed blend modes and independently diffed custom blending
//! - Two-phase vertex attribute enable/disable protocol
//! - Cache reset

use lumen::render::{Capability, DeviceCall, FrontFace, PipelineState, RecordingDevice};
use lumen::resources::{BlendEquation, BlendFactor, BlendFunction, Blending, Side};

fn setup() -> (PipelineState, RecordingDevice) {
    (PipelineState::new(), RecordingDevice::new())
}

// ============================================================================
// Depth
// ============================================================================

#[test]
fn depth_test_true_twice_enables_once() {
    let (mut state, mut device) = setup();

    state.set_depth_test(&mut device, true);
    state.set_depth_test(&mut device, true);

    assert_eq!(device.calls(), &[DeviceCall::Enable(Capability::DepthTest)]);
}

#[test]
fn depth_test_true_then_false() {
    let (mut state, mut device) = setup();

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
fn depth_write_is_independent_of_depth_test() {
    let (mut state, mut device) = setup();

    state.set_depth_test(&mut device, true);
    state.set_depth_write(&mut device, false);
    state.set_depth_test(&mut device, true);
    state.set_depth_write(&mut device, false);

    assert_eq!(device.calls().len(), 2);
    assert_eq!(device.count(|c| matches!(c, DeviceCall::DepthMask(false))), 1);
}

#[test]
fn line_width_compared_exactly() {
    let (mut state, mut device) = setup();

    state.set_line_width(&mut device, 1.0);
    state.set_line_width(&mut device, 1.0);
    state.set_line_width(&mut device, 1.5);

    assert_eq!(
        device.calls(),
        &[DeviceCall::LineWidth(1.0), DeviceCall::LineWidth(1.5)]
    );
}

// ============================================================================
// Faces
// ============================================================================

#[test]
fn double_sided_disables_culling() {
    let (mut state, mut device) = setup();

    state.set_material_faces(&mut device, Side::Double);

    assert_eq!(
        device.calls(),
        &[
            DeviceCall::Disable(Capability::CullFace),
            DeviceCall::FrontFace(FrontFace::Ccw),
        ]
    );
}

#[test]
fn back_side_flips_winding_only() {
    let (mut state, mut device) = setup();
    state.set_material_faces(&mut device, Side::Front);
    device.clear_calls();

    state.set_material_faces(&mut device, Side::Back);
    state.set_material_faces(&mut device, Side::Back);

    assert_eq!(device.calls(), &[DeviceCall::FrontFace(FrontFace::Cw)]);
}

// ============================================================================
// Polygon Offset
// ============================================================================

#[test]
fn polygon_offset_parameters_only_while_enabled() {
    let (mut state, mut device) = setup();

    state.set_polygon_offset(&mut device, false, 2.0, 3.0);
    assert_eq!(
        device.calls(),
        &[DeviceCall::Disable(Capability::PolygonOffsetFill)]
    );

    device.clear_calls();
    state.set_polygon_offset(&mut device, true, 2.0, 3.0);
    state.set_polygon_offset(&mut device, true, 2.0, 3.0);
    state.set_polygon_offset(&mut device, true, 2.0, 4.0);

    assert_eq!(
        device.calls(),
        &[
            DeviceCall::Enable(Capability::PolygonOffsetFill),
            DeviceCall::PolygonOffset {
                factor: 2.0,
                units: 3.0
            },
            DeviceCall::PolygonOffset {
                factor: 2.0,
                units: 4.0
            },
        ]
    );
}

// ============================================================================
// Blending
// ============================================================================

#[test]
fn fixed_blend_modes_program_their_triples() {
    let (mut state, mut device) = setup();
    let function = BlendFunction::default();

    state.set_blending(&mut device, Blending::Additive, function);
    assert!(device.calls().contains(&DeviceCall::BlendFunc(
        BlendFactor::SrcAlpha,
        BlendFactor::One
    )));

    device.clear_calls();
    state.set_blending(&mut device, Blending::Multiply, function);
    assert!(device.calls().contains(&DeviceCall::BlendFunc(
        BlendFactor::Zero,
        BlendFactor::SrcColor
    )));

    device.clear_calls();
    state.set_blending(&mut device, Blending::None, function);
    assert_eq!(device.calls(), &[DeviceCall::Disable(Capability::Blend)]);
}

#[test]
fn normal_blending_requested_twice_programs_once() {
    let (mut state, mut device) = setup();
    let function = BlendFunction::default();

    state.set_blending(&mut device, Blending::Normal, function);
    let first = device.calls().len();
    state.set_blending(&mut device, Blending::Normal, function);

    assert_eq!(device.calls().len(), first);
    assert_eq!(state.blending(), Some(Blending::Normal));
}

#[test]
fn custom_blending_diffs_equation_and_factors_independently() {
    let (mut state, mut device) = setup();
    let mut function = BlendFunction {
        equation: BlendEquation::Add,
        src: BlendFactor::One,
        dst: BlendFactor::One,
    };

    state.set_blending(&mut device, Blending::Custom, function);
    device.clear_calls();

    function.equation = BlendEquation::ReverseSubtract;
    state.set_blending(&mut device, Blending::Custom, function);
    assert_eq!(
        device.calls(),
        &[DeviceCall::BlendEquation(BlendEquation::ReverseSubtract)]
    );

    device.clear_calls();
    function.dst = BlendFactor::OneMinusSrcAlpha;
    state.set_blending(&mut device, Blending::Custom, function);
    assert_eq!(
        device.calls(),
        &[DeviceCall::BlendFunc(
            BlendFactor::One,
            BlendFactor::OneMinusSrcAlpha
        )]
    );
}

#[test]
fn leaving_custom_forces_reprogramming_on_return() {
    let (mut state, mut device) = setup();
    let function = BlendFunction {
        equation: BlendEquation::Subtract,
        src: BlendFactor::DstColor,
        dst: BlendFactor::Zero,
    };

    state.set_blending(&mut device, Blending::Custom, function);
    state.set_blending(&mut device, Blending::Normal, function);
    device.clear_calls();

    state.set_blending(&mut device, Blending::Custom, function);

    assert_eq!(
        device.calls(),
        &[
            DeviceCall::Enable(Capability::Blend),
            DeviceCall::BlendEquation(BlendEquation::Subtract),
            DeviceCall::BlendFunc(BlendFactor::DstColor, BlendFactor::Zero),
        ]
    );
}

// ============================================================================
// Vertex Attributes
// ============================================================================

#[test]
fn attribute_enabled_once_across_draws() {
    let (mut state, mut device) = setup();

    for _ in 0..3 {
        state.init_attributes();
        state.enable_attribute(&mut device, 0);
        state.enable_attribute(&mut device, 1);
        state.disable_unused_attributes(&mut device);
    }

    assert_eq!(
        device.count(|c| matches!(c, DeviceCall::EnableVertexAttribArray(_))),
        2
    );
    assert_eq!(
        device.count(|c| matches!(c, DeviceCall::DisableVertexAttribArray(_))),
        0
    );
}

#[test]
fn attribute_not_wanted_is_disabled() {
    let (mut state, mut device) = setup();

    state.init_attributes();
    state.enable_attribute(&mut device, 0);
    state.enable_attribute(&mut device, 2);
    state.disable_unused_attributes(&mut device);
    device.clear_calls();

    state.init_attributes();
    state.enable_attribute(&mut device, 0);
    state.disable_unused_attributes(&mut device);

    assert_eq!(device.calls(), &[DeviceCall::DisableVertexAttribArray(2)]);
    assert_eq!(state.enabled_attributes(), 0b1);
}

#[test]
fn attribute_slot_out_of_range_is_ignored() {
    let (mut state, mut device) = setup();

    state.init_attributes();
    state.enable_attribute(&mut device, 16);

    assert!(device.calls().is_empty());
    assert_eq!(state.enabled_attributes(), 0);
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn reset_reissues_every_toggle() {
    let (mut state, mut device) = setup();

    state.set_depth_test(&mut device, true);
    state.set_blending(&mut device, Blending::None, BlendFunction::default());
    state.reset();
    device.clear_calls();

    state.set_depth_test(&mut device, true);
    state.set_blending(&mut device, Blending::None, BlendFunction::default());

    assert_eq!(
        device.calls(),
        &[
            DeviceCall::Enable(Capability::DepthTest),
            DeviceCall::Disable(Capability::Blend),
        ]
    );
}
