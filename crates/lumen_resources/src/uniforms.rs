//! Material uniform sets.
//!
//! A [`Uniforms`] set holds the named values a material uploads whenever it
//! becomes the current material. Values are uploaded by location; the
//! renderer resolves names through the bound program's location table.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use smallvec::SmallVec;

/// Opaque handle of a texture object living on the graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
    /// Sampled texture; bound to a freshly allocated texture unit on upload.
    Texture(TextureId),
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat3> for UniformValue {
    fn from(v: Mat3) -> Self {
        UniformValue::Mat3(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

impl From<TextureId> for UniformValue {
    fn from(v: TextureId) -> Self {
        UniformValue::Texture(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub name: String,
    pub value: UniformValue,
}

/// Ordered set of named uniform values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uniforms {
    entries: SmallVec<[Uniform; 8]>,
}

impl Uniforms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing an existing value in place.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|u| u.name == name) {
            entry.value = value;
        } else {
            self.entries.push(Uniform {
                name: name.to_owned(),
                value,
            });
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries.iter().find(|u| u.name == name).map(|u| &u.value)
    }

    pub fn remove(&mut self, name: &str) -> Option<UniformValue> {
        let idx = self.entries.iter().position(|u| u.name == name)?;
        Some(self.entries.remove(idx).value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uniform> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|u| u.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut uniforms = Uniforms::new();
        uniforms.set("diffuse", Vec3::ONE);
        uniforms.set("opacity", 0.5_f32);
        uniforms.set("diffuse", Vec3::ZERO);

        assert_eq!(uniforms.len(), 2);
        assert_eq!(uniforms.get("diffuse"), Some(&UniformValue::Vec3(Vec3::ZERO)));
        assert_eq!(uniforms.names().collect::<Vec<_>>(), ["diffuse", "opacity"]);
    }

    #[test]
    fn test_remove() {
        let mut uniforms = Uniforms::new();
        uniforms.set("map", TextureId(3));

        assert_eq!(uniforms.remove("map"), Some(UniformValue::Texture(TextureId(3))));
        assert!(uniforms.remove("map").is_none());
        assert!(uniforms.is_empty());
    }
}
