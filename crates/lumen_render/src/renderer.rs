//! Frame Orchestrator
//!
//! [`Renderer`] owns all per-context rendering state (pipeline state cache,
//! program cache, draw lists, texture unit counter) and drives one frame
//! through the following phases, synchronously and in full:
//!
//! ```text
//! idle → scene-update → camera-update → pre-clear → project → sort
//!      → clear → draw-opaque → draw-transparent → idle
//! ```
//!
//! Opaque buffers are drawn with blending disabled; transparent buffers
//! apply their material's blend mode per buffer. A scene override material
//! replaces every buffer's material and is blended per buffer in both
//! passes.

use glam::{Mat4, Vec4};
use lumen_core::{LumenError, MaterialHandle, NodeHandle, Result};
use lumen_resources::{BlendEquation, BlendFactor, BlendFunction, Blending, Material, Side};
use lumen_scene::{Frustum, Scene};
use rustc_hash::FxHashSet;

use crate::device::{Capability, ClearMask, DepthFunc, DeviceCapabilities, Face, GraphicsDevice};
use crate::frame::{FramePhase, FrameStats};
use crate::program::ProgramCache;
use crate::projector::{ProjectionView, project_scene};
use crate::render_list::{RenderLists, RenderableBuffer};
use crate::resolver::TextureUnits;
use crate::settings::RendererSettings;
use crate::state::PipelineState;

/// Viewport rectangle in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

pub struct Renderer<D: GraphicsDevice> {
    pub(crate) device: D,
    pub(crate) settings: RendererSettings,
    pub(crate) capabilities: DeviceCapabilities,

    width: u32,
    height: u32,
    viewport: Viewport,

    pub(crate) state: PipelineState,
    pub(crate) programs: ProgramCache,
    pub(crate) texture_units: TextureUnits,
    pub(crate) invalid_materials: FxHashSet<MaterialHandle>,
    pub(crate) stats: FrameStats,

    lists: RenderLists,
    proj_screen_matrix: Mat4,
    frustum: Frustum,
    phase: FramePhase,
}

impl<D: GraphicsDevice> Renderer<D> {
    #[must_use]
    pub fn new(device: D) -> Self {
        Self::with_settings(device, RendererSettings::default())
    }

    /// Creates a renderer, queries the device limits and puts the context
    /// into its default state.
    #[must_use]
    pub fn with_settings(device: D, settings: RendererSettings) -> Self {
        let capabilities = device.capabilities();
        log::info!(
            "Renderer initialized: {} texture units, {} vertex texture units, max texture size {}",
            capabilities.max_texture_units,
            capabilities.max_vertex_texture_units,
            capabilities.max_texture_size
        );

        let mut renderer = Self {
            device,
            settings,
            capabilities,
            width: 1,
            height: 1,
            viewport: Viewport {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
            state: PipelineState::new(),
            programs: ProgramCache::new(),
            texture_units: TextureUnits::new(capabilities.max_texture_units),
            invalid_materials: FxHashSet::default(),
            stats: FrameStats::default(),
            lists: RenderLists::new(),
            proj_screen_matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
            phase: FramePhase::Idle,
        };
        renderer.apply_default_state();
        renderer
    }

    fn apply_default_state(&mut self) {
        let device = &mut self.device;

        device.clear_color(self.settings.clear_color);
        device.clear_depth(1.0);
        device.clear_stencil(0);

        self.state.set_depth_test(device, true);
        device.depth_func(DepthFunc::LessEqual);

        self.state.set_material_faces(device, Side::Front);
        device.cull_face(Face::Back);

        // Raw blend setup; the cache keeps blending unknown so the first
        // material's mode is always programmed.
        device.enable(Capability::Blend);
        device.blend_equation(BlendEquation::Add);
        device.blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);

        let vp = self.viewport;
        device.viewport(vp.x, vp.y, vp.width, vp.height);
    }

    /// Forgets the cached pipeline state and re-applies the defaults.
    ///
    /// Call after foreign code issued calls on the same context.
    pub fn reset_state(&mut self) {
        self.state.reset();
        self.apply_default_state();
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.viewport = Viewport {
            x,
            y,
            width,
            height,
        };
        self.device.viewport(x, y, width, height);
    }

    /// Resizes the drawing area and resets the viewport to cover it.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.set_viewport(0, 0, width as i32, height as i32);
    }

    pub fn set_clear_color(&mut self, color: Vec4) {
        self.settings.clear_color = color;
        self.device.clear_color(color);
    }

    pub fn set_auto_clear(&mut self, enabled: bool) {
        self.settings.auto_clear = enabled;
    }

    pub fn set_auto_clear_color(&mut self, enabled: bool) {
        self.settings.clear.color = enabled;
    }

    pub fn set_auto_clear_depth(&mut self, enabled: bool) {
        self.settings.clear.depth = enabled;
    }

    pub fn set_auto_clear_stencil(&mut self, enabled: bool) {
        self.settings.clear.stencil = enabled;
    }

    pub fn set_sort_objects(&mut self, enabled: bool) {
        self.settings.sort_objects = enabled;
    }

    /// Clears the channels enabled in the settings.
    pub fn clear(&mut self) {
        let mask = self.settings.clear.mask();
        if !mask.is_empty() {
            self.device.clear(mask);
        }
    }

    /// Allocates the next texture unit of the current program binding.
    ///
    /// Units past the device limit are still handed out, with a warning.
    pub fn allocate_texture_unit(&mut self) -> u32 {
        self.texture_units.allocate()
    }

    // ========================================================================
    // Frame
    // ========================================================================

    fn enter(&mut self, phase: FramePhase) {
        log::trace!("frame phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Renders `scene` as seen from the camera component on `camera`.
    ///
    /// Fails only when `camera` is not a camera node of the scene. Materials
    /// that cannot be compiled are logged and skipped.
    pub fn render(&mut self, scene: &mut Scene, camera: NodeHandle, force_clear: bool) -> Result<()> {
        let Some(camera_node) = scene.get_node(camera) else {
            return Err(LumenError::NodeNotFound(camera));
        };
        let camera_is_root = camera_node.parent().is_none();
        if scene.camera(camera).is_none() {
            return Err(LumenError::NotACamera(camera));
        }

        self.stats = FrameStats::default();
        self.invalid_materials.clear();
        self.state.reset_frame_bindings();

        self.enter(FramePhase::SceneUpdate);
        scene.update_matrix_world();

        self.enter(FramePhase::CameraUpdate);
        if camera_is_root {
            scene.update_subtree(camera);
        }

        self.enter(FramePhase::PreClear);
        if self.settings.auto_clear {
            self.device.clear(ClearMask::COLOR | ClearMask::DEPTH);
        }

        scene.update_camera(camera)?;
        let root = scene.root();
        let Scene {
            nodes,
            cameras,
            materials,
            ..
        } = &mut *scene;
        let Some(cam) = cameras.get(camera) else {
            return Err(LumenError::NotACamera(camera));
        };
        self.proj_screen_matrix = *cam.view_projection_matrix();
        self.frustum = *cam.frustum();

        self.enter(FramePhase::Project);
        self.lists.clear();
        let view = ProjectionView {
            view_matrix: cam.view_matrix(),
            proj_screen_matrix: &self.proj_screen_matrix,
            frustum: &self.frustum,
            sort: self.settings.sort_objects,
        };
        self.stats.projected_buffers = project_scene(nodes, materials, root, &view, &mut self.lists);

        self.enter(FramePhase::Sort);
        if self.settings.sort_objects {
            self.lists.sort();
        }

        self.enter(FramePhase::Clear);
        if self.settings.auto_clear || force_clear {
            self.clear();
        }

        let lists = std::mem::take(&mut self.lists);
        let override_material = scene
            .override_material
            .filter(|h| scene.materials.contains_key(*h));

        if let Some(handle) = override_material {
            if let Some(material) = scene.materials.get(handle) {
                self.apply_override_state(material);
            }

            self.enter(FramePhase::DrawOpaque);
            self.render_objects(&lists.opaque, scene, camera, true, Some(handle));
            self.enter(FramePhase::DrawTransparent);
            self.render_objects(&lists.transparent, scene, camera, true, Some(handle));
        } else {
            self.state
                .set_blending(&mut self.device, Blending::None, BlendFunction::default());

            self.enter(FramePhase::DrawOpaque);
            self.render_objects(&lists.opaque, scene, camera, false, None);
            self.enter(FramePhase::DrawTransparent);
            self.render_objects(&lists.transparent, scene, camera, true, None);
        }
        self.lists = lists;

        self.enter(FramePhase::Idle);
        Ok(())
    }

    fn apply_override_state(&mut self, material: &Material) {
        self.state
            .set_blending(&mut self.device, material.blending, material.blend_function);
        self.state.set_depth_test(&mut self.device, material.depth_test);
        self.state.set_depth_write(&mut self.device, material.depth_write);
        let offset = material.polygon_offset;
        self.state
            .set_polygon_offset(&mut self.device, offset.enabled, offset.factor, offset.units);
    }

    // ========================================================================
    // Materials
    // ========================================================================

    /// Removes a material from the scene and releases its program.
    pub fn dispose_material(&mut self, scene: &mut Scene, handle: MaterialHandle) -> Option<Material> {
        let mut material = scene.materials.remove(handle)?;
        if let Some(program) = material.take_program()
            && self.programs.release(&mut self.device, program)
        {
            self.state.forget_program(program);
        }
        self.state.forget_material(handle);
        if scene.override_material == Some(handle) {
            scene.override_material = None;
        }
        Some(material)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    #[must_use]
    pub fn into_device(self) -> D {
        self.device
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Opaque buffers of the last frame, in draw order.
    #[inline]
    #[must_use]
    pub fn opaque_list(&self) -> &[RenderableBuffer] {
        &self.lists.opaque
    }

    /// Transparent buffers of the last frame, in draw order.
    #[inline]
    #[must_use]
    pub fn transparent_list(&self) -> &[RenderableBuffer] {
        &self.lists.transparent
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    #[inline]
    #[must_use]
    pub fn programs(&self) -> &ProgramCache {
        &self.programs
    }

    /// Projection×view matrix of the last frame's camera.
    #[inline]
    #[must_use]
    pub fn proj_screen_matrix(&self) -> &Mat4 {
        &self.proj_screen_matrix
    }
}
