//! Program / material resolution.
//!
//! Guarantees a compiled program is bound before a buffer is drawn and
//! uploads the uniforms the draw needs:
//!
//! - dirty materials release their old program and acquire a new one
//! - a program switch refreshes program, material and lighting uniforms
//! - a material switch refreshes material uniforms
//! - the projection matrix follows program or camera switches
//! - `modelViewMatrix` / `modelMatrix` go up on every draw
//!
//! A material whose program fails to build is marked invalid for the rest
//! of the frame; every buffer using it is skipped.

use bitflags::bitflags;
use glam::Mat4;
use lumen_core::{MaterialHandle, NodeHandle, ProgramHandle};
use lumen_resources::{Material, UniformValue};
use lumen_scene::{Camera, Node};
use slotmap::SlotMap;

use crate::device::GraphicsDevice;
use crate::program::{ProgramKey, ProgramParameters};
use crate::renderer::Renderer;

bitflags! {
    /// Uniform groups that must be re-uploaded for a draw.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UniformRefresh: u8 {
        const PROGRAM  = 1 << 0;
        const MATERIAL = 1 << 1;
        const LIGHTS   = 1 << 2;
    }
}

/// Texture unit allocator, reset at the start of every program binding.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextureUnits {
    used: u32,
    max: u32,
}

impl TextureUnits {
    pub(crate) fn new(max: u32) -> Self {
        Self { used: 0, max }
    }

    pub(crate) fn reset(&mut self) {
        self.used = 0;
    }

    /// Hands out the next unit. Running past the device limit only warns.
    pub(crate) fn allocate(&mut self) -> u32 {
        let unit = self.used;
        if unit >= self.max {
            log::warn!(
                "Trying to use {} texture units while this GPU supports only {}",
                unit + 1,
                self.max
            );
        }
        self.used += 1;
        unit
    }
}

impl<D: GraphicsDevice> Renderer<D> {
    pub(crate) fn program_parameters(&self) -> ProgramParameters {
        ProgramParameters {
            precision: self.settings.precision,
            supports_vertex_textures: self.capabilities.supports_vertex_textures(),
        }
    }

    /// (Re)builds the material's program if it is dirty.
    ///
    /// Returns false when the material is unusable this frame.
    fn prepare_material(&mut self, handle: MaterialHandle, material: &mut Material) -> bool {
        if !material.needs_update() {
            match material.program() {
                Some(program) if self.programs.get(program).is_some() => return true,
                Some(program) => {
                    log::debug!("Material {handle:?} lost program {program:?}, reacquiring");
                    material.mark_needs_update();
                }
                None => material.mark_needs_update(),
            }
        }

        if let Some(old) = material.take_program()
            && self.programs.release(&mut self.device, old)
        {
            self.state.forget_program(old);
        }

        let key = ProgramKey {
            shader: material.shader().clone(),
            defines: material.defines().clone(),
            parameters: self.program_parameters(),
        };

        match self.programs.acquire(&mut self.device, key) {
            Ok(program) => {
                material.bind_program(program);
                // A program with a single user was just compiled.
                if self.programs.get(program).is_some_and(|p| p.used_times() == 1) {
                    self.stats.programs_compiled += 1;
                }
                true
            }
            Err(e) => {
                log::error!(
                    "Material {handle:?} ('{}') skipped: {e}",
                    material.shader().label()
                );
                self.invalid_materials.insert(handle);
                false
            }
        }
    }

    /// Binds the material's program and uploads the uniforms of one draw.
    ///
    /// Returns the bound program, or `None` when the buffer must be skipped.
    pub(crate) fn set_program(
        &mut self,
        materials: &mut SlotMap<MaterialHandle, Material>,
        camera: &Camera,
        camera_handle: NodeHandle,
        material_handle: MaterialHandle,
        node: &Node,
    ) -> Option<ProgramHandle> {
        self.texture_units.reset();

        if self.invalid_materials.contains(&material_handle) {
            return None;
        }
        let material = materials.get_mut(material_handle)?;
        if !self.prepare_material(material_handle, material) {
            return None;
        }
        let program_handle = material.program()?;
        let program = self.programs.get(program_handle)?;

        let mut refresh = UniformRefresh::empty();
        if self
            .state
            .use_program(&mut self.device, program_handle, program.id())
        {
            refresh = UniformRefresh::all();
            self.stats.program_binds += 1;
        }
        if self.state.set_current_material(material_handle) {
            refresh |= UniformRefresh::MATERIAL;
        }

        let camera_changed = self.state.set_current_camera(camera_handle);
        if (refresh.contains(UniformRefresh::PROGRAM) || camera_changed)
            && let Some(loc) = program.uniform("projectionMatrix")
        {
            self.device
                .uniform(loc, &UniformValue::Mat4(*camera.projection_matrix()));
            self.stats.projection_uploads += 1;
        }

        if refresh.contains(UniformRefresh::MATERIAL) {
            for uniform in material.uniforms.iter() {
                let Some(loc) = program.uniform(&uniform.name) else {
                    continue;
                };
                match uniform.value {
                    UniformValue::Texture(texture) => {
                        let unit = self.texture_units.allocate();
                        self.device.bind_texture(unit, texture);
                        self.device.uniform(loc, &UniformValue::Int(unit as i32));
                    }
                    ref value => self.device.uniform(loc, value),
                }
            }
            self.stats.material_refreshes += 1;
        }

        if refresh.contains(UniformRefresh::LIGHTS) {
            self.stats.light_refreshes += 1;
        }

        let world = Mat4::from(*node.world_matrix());
        if let Some(loc) = program.uniform("modelViewMatrix") {
            let model_view = *camera.view_matrix() * world;
            self.device.uniform(loc, &UniformValue::Mat4(model_view));
        }
        if let Some(loc) = program.uniform("modelMatrix") {
            self.device.uniform(loc, &UniformValue::Mat4(world));
        }

        Some(program_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_units_warn_but_continue() {
        let mut units = TextureUnits::new(2);
        assert_eq!(units.allocate(), 0);
        assert_eq!(units.allocate(), 1);
        assert_eq!(units.allocate(), 2);

        units.reset();
        assert_eq!(units.allocate(), 0);
    }
}
