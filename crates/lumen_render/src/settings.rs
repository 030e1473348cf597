//! Renderer Settings
//!
//! Frame-level configuration of the [`Renderer`](crate::Renderer). Settings
//! are plain serde data so applications can load them from config files:
//!
//! ```rust,ignore
//! let settings: RendererSettings = serde_json::from_str(r#"{
//!     "auto_clear": false,
//!     "clear_color": [0.1, 0.1, 0.1, 1.0]
//! }"#)?;
//! let renderer = Renderer::with_settings(device, settings);
//! ```
//!
//! Missing fields take their default values.

use glam::Vec4;
use lumen_resources::Precision;
use serde::{Deserialize, Serialize};

use crate::device::ClearMask;

/// Which buffers a clear touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearFlags {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
}

impl Default for ClearFlags {
    fn default() -> Self {
        Self {
            color: true,
            depth: true,
            stencil: true,
        }
    }
}

impl ClearFlags {
    #[must_use]
    pub fn mask(&self) -> ClearMask {
        let mut mask = ClearMask::empty();
        mask.set(ClearMask::COLOR, self.color);
        mask.set(ClearMask::DEPTH, self.depth);
        mask.set(ClearMask::STENCIL, self.stencil);
        mask
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Clear before every frame.
    pub auto_clear: bool,
    /// Channels cleared by [`Renderer::clear`](crate::Renderer::clear).
    pub clear: ClearFlags,
    pub clear_color: Vec4,
    /// Depth-sort the draw lists.
    pub sort_objects: bool,
    /// Float precision declared in composed shaders.
    pub precision: Precision,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            auto_clear: true,
            clear: ClearFlags::default(),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            sort_objects: true,
            precision: Precision::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_mask() {
        let flags = ClearFlags {
            color: true,
            depth: false,
            stencil: true,
        };
        assert_eq!(flags.mask(), ClearMask::COLOR | ClearMask::STENCIL);
        assert_eq!(ClearFlags::default().mask(), ClearMask::all());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: RendererSettings =
            serde_json::from_str(r#"{ "sort_objects": false, "clear": { "stencil": false } }"#)
                .unwrap();

        assert!(!settings.sort_objects);
        assert!(settings.auto_clear);
        assert!(settings.clear.color && !settings.clear.stencil);
        assert_eq!(settings.precision, Precision::High);
    }
}
