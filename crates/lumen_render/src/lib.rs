//! Lumen Render
//!
//! Per-frame forward renderer over a retained scene graph, targeting a
//! GL-class immediate-mode API through the [`GraphicsDevice`] seam.
//!
//! - [`state`]: redundant-call elimination for fixed-function state
//! - [`projector`]: frustum culling and draw-list construction
//! - [`program`]: program compilation and sharing
//! - [`renderer`]: the frame orchestrator
//!
//! The `glow` feature adds [`GlowDevice`], a backend over a real GL context.
//! [`RecordingDevice`] records every call and needs no context at all.

pub mod device;
mod draw;
pub mod frame;
pub mod program;
pub mod projector;
pub mod render_list;
pub mod renderer;
mod resolver;
pub mod settings;
pub mod state;

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use device::GlowDevice;
pub use device::{
    BufferTarget, Capability, ClearMask, DepthFunc, DeviceCall, DeviceCapabilities, Face,
    FrontFace, GraphicsDevice, ProgramId, RecordingDevice, Topology, UniformLocation,
};
pub use frame::{FramePhase, FrameStats};
pub use program::{Program, ProgramCache, ProgramKey, ProgramParameters};
pub use projector::{ProjectionView, project_scene};
pub use render_list::{RenderLists, RenderableBuffer};
pub use renderer::{Renderer, Viewport};
pub use resolver::UniformRefresh;
pub use settings::{ClearFlags, RendererSettings};
pub use state::{GeometryGroup, MAX_VERTEX_ATTRIBUTES, PipelineState};
