//! Shader sources and shading precision.

use serde::{Deserialize, Serialize};

/// Floating point precision declared at the top of composed shader sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Low,
    Medium,
    #[default]
    High,
}

impl Precision {
    /// GLSL qualifier for this precision.
    #[must_use]
    pub const fn qualifier(self) -> &'static str {
        match self {
            Precision::Low => "lowp",
            Precision::Medium => "mediump",
            Precision::High => "highp",
        }
    }
}

/// Vertex and fragment source of a material's shader.
///
/// Sources are written without a precision header or defines; those are
/// prepended when the program is composed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ShaderSource {
    pub name: Option<String>,
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    #[must_use]
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            name: None,
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name used in logs; falls back to `"unnamed"`.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}
