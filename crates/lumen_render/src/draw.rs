//! Draw list scheduling and per-buffer draw emission.

use lumen_core::{MaterialHandle, NodeHandle, ProgramHandle};
use lumen_resources::{BufferId, Material};
use lumen_scene::{Camera, Node, Scene};
use slotmap::SlotMap;

use crate::device::{BufferTarget, GraphicsDevice, Topology};
use crate::render_list::RenderableBuffer;
use crate::renderer::Renderer;
use crate::state::{GeometryGroup, PipelineState};

/// Attribute bindings of a buffer: name, source, components per vertex.
const ATTRIBUTES: [(&str, fn(&RenderableBuffer) -> Option<BufferId>, i32); 3] = [
    ("position", |b| Some(b.geometry.vertices), 3),
    ("color", |b| b.geometry.colors, 3),
    ("uv", |b| b.geometry.uvs, 2),
];

impl<D: GraphicsDevice> Renderer<D> {
    /// Draws one list in order.
    ///
    /// With `use_blending` every buffer applies its material's blend mode;
    /// otherwise blending is left as configured by the caller. An
    /// `override_material` replaces every buffer's own material.
    pub(crate) fn render_objects(
        &mut self,
        list: &[RenderableBuffer],
        scene: &mut Scene,
        camera_handle: NodeHandle,
        use_blending: bool,
        override_material: Option<MaterialHandle>,
    ) {
        let Scene {
            nodes,
            cameras,
            materials,
            ..
        } = scene;
        let Some(camera) = cameras.get(camera_handle) else {
            return;
        };

        for item in list {
            let material_handle = override_material.unwrap_or(item.material);
            if self.invalid_materials.contains(&material_handle) {
                self.stats.skipped_buffers += 1;
                continue;
            }
            let Some(material) = materials.get(material_handle) else {
                continue;
            };
            let Some(node) = nodes.get(item.node) else {
                continue;
            };

            if use_blending {
                self.state
                    .set_blending(&mut self.device, material.blending, material.blend_function);
            }
            self.state.set_depth_test(&mut self.device, material.depth_test);
            self.state.set_depth_write(&mut self.device, material.depth_write);
            let offset = material.polygon_offset;
            self.state
                .set_polygon_offset(&mut self.device, offset.enabled, offset.factor, offset.units);
            self.state.set_material_faces(&mut self.device, material.side);

            self.render_buffer(materials, camera, camera_handle, material_handle, node, item);
        }
    }

    /// Binds the program and attributes of one buffer and issues its draw.
    pub(crate) fn render_buffer(
        &mut self,
        materials: &mut SlotMap<MaterialHandle, Material>,
        camera: &Camera,
        camera_handle: NodeHandle,
        material_handle: MaterialHandle,
        node: &Node,
        item: &RenderableBuffer,
    ) {
        let Some(program_handle) =
            self.set_program(materials, camera, camera_handle, material_handle, node)
        else {
            self.stats.skipped_buffers += 1;
            return;
        };
        let Some(material) = materials.get(material_handle) else {
            return;
        };
        if !material.visible {
            return;
        }

        let group = GeometryGroup {
            node: item.node,
            buffer_index: item.buffer_index,
            program: program_handle,
            wireframe: material.wireframe,
            vertices: item.geometry.vertices,
            colors: item.geometry.colors,
            uvs: item.geometry.uvs,
        };
        if self.state.set_geometry_group(group) {
            self.bind_attributes(program_handle, item);
        }

        let geometry = &item.geometry;
        if material.wireframe {
            let Some(lines) = geometry.lines else {
                log::debug!("Wireframe buffer of {:?} has no line indices", item.node);
                return;
            };
            self.state
                .set_line_width(&mut self.device, material.wireframe_line_width);
            self.state.bind_element_buffer(&mut self.device, lines);
            self.device.draw_elements(Topology::Lines, geometry.line_count);
        } else {
            self.state.bind_element_buffer(&mut self.device, geometry.faces);
            self.device
                .draw_elements(Topology::Triangles, geometry.face_count);
        }
        self.stats.draw_calls += 1;
    }

    fn bind_attributes(&mut self, program_handle: ProgramHandle, item: &RenderableBuffer) {
        let Some(program) = self.programs.get(program_handle) else {
            return;
        };

        self.state.init_attributes();
        for (name, source, components) in ATTRIBUTES {
            if let (Some(location), Some(buffer)) = (program.attribute(name), source(item)) {
                bind_attribute(&mut self.device, &mut self.state, location, buffer, components);
            }
        }
        self.state.disable_unused_attributes(&mut self.device);
    }
}

fn bind_attribute<D: GraphicsDevice>(
    device: &mut D,
    state: &mut PipelineState,
    location: u32,
    buffer: BufferId,
    components: i32,
) {
    device.bind_buffer(BufferTarget::Array, buffer);
    state.enable_attribute(device, location);
    device.vertex_attrib_pointer(location, components);
}
