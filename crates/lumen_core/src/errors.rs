//! Error Types
//!
//! This module defines the error types used throughout the renderer.
//!
//! # Overview
//!
//! The main error type [`LumenError`] covers:
//! - Shader compilation and program link failures
//! - Lookups of scene handles that no longer exist
//! - Graphics device failures
//!
//! Per-material problems never abort a frame. They surface as a
//! [`LumenError`] only at the program cache boundary; the frame orchestrator
//! logs them and keeps drawing.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumen_core::{LumenError, Result};
//!
//! fn compile() -> Result<()> {
//!     Err(LumenError::ProgramLink("missing main".into()))
//! }
//! ```

use thiserror::Error;

use crate::handles::{MaterialHandle, NodeHandle};

/// Shader pipeline stage, used to label compilation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// The main error type for the Lumen renderer.
#[derive(Error, Debug)]
pub enum LumenError {
    // ========================================================================
    // Shader & Program Errors
    // ========================================================================
    /// A shader stage failed to compile.
    #[error("Failed to compile {stage} shader: {log}")]
    ShaderCompile {
        /// Stage that failed
        stage: ShaderStage,
        /// Driver info log
        log: String,
    },

    /// The shader stages compiled but the program failed to link.
    #[error("Failed to link program: {0}")]
    ProgramLink(String),

    // ========================================================================
    // Scene Errors
    // ========================================================================
    /// The node handle does not refer to a live node.
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeHandle),

    /// The node exists but carries no camera component.
    #[error("Node {0:?} is not a camera")]
    NotACamera(NodeHandle),

    /// The material handle does not refer to a live material.
    #[error("Material not found: {0:?}")]
    MaterialNotFound(MaterialHandle),

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// Generic graphics device failure.
    #[error("Graphics device error: {0}")]
    Device(String),
}

/// Alias for `Result<T, LumenError>`.
pub type Result<T> = std::result::Result<T, LumenError>;
