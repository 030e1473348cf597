//! Frame bookkeeping: the orchestrator's phase and per-frame counters.

/// Step of [`Renderer::render`](crate::Renderer::render) currently running.
///
/// A frame walks every phase in order and returns to [`FramePhase::Idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FramePhase {
    #[default]
    Idle,
    SceneUpdate,
    CameraUpdate,
    PreClear,
    Project,
    Sort,
    Clear,
    DrawOpaque,
    DrawTransparent,
}

/// Counters collected while rendering one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Buffers emitted by the projector.
    pub projected_buffers: usize,
    pub draw_calls: u32,
    pub program_binds: u32,
    /// Programs created on the driver; cache hits are not counted.
    pub programs_compiled: u32,
    pub projection_uploads: u32,
    pub material_refreshes: u32,
    pub light_refreshes: u32,
    /// Buffers dropped because their material could not be compiled.
    pub skipped_buffers: u32,
}
