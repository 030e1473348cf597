//! Program Cache
//!
//! Owns every linked program and deduplicates them by structural identity.
//! A [`ProgramKey`] captures everything that affects the compiled code:
//! the shader sources, the material's defines and the renderer-level
//! [`ProgramParameters`]. Materials with equal keys share one [`Program`].
//!
//! Programs are reference counted by the number of materials bound to
//! them. Releasing the last reference deletes the program on the device.

use lumen_core::{ProgramHandle, Result};
use lumen_resources::{Precision, ShaderDefines, ShaderSource};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use xxhash_rust::xxh3::xxh3_64;

use crate::device::{GraphicsDevice, ProgramId, UniformLocation};

/// Renderer-wide inputs that affect program compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramParameters {
    pub precision: Precision,
    pub supports_vertex_textures: bool,
}

/// Full structural identity of a program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramKey {
    pub shader: ShaderSource,
    pub defines: ShaderDefines,
    pub parameters: ProgramParameters,
}

impl ProgramKey {
    /// Final vertex and fragment sources: precision header, defines, then
    /// the material's own code.
    #[must_use]
    pub fn compose_sources(&self) -> (String, String) {
        let qualifier = self.parameters.precision.qualifier();
        let mut prefix = format!("precision {qualifier} float;\nprecision {qualifier} int;\n");
        prefix.push_str(&self.defines.to_source());

        let mut vertex = prefix.clone();
        if self.parameters.supports_vertex_textures {
            vertex.push_str("#define VERTEX_TEXTURES\n");
        }
        vertex.push_str(&self.shader.vertex);

        let mut fragment = prefix;
        fragment.push_str(&self.shader.fragment);

        (vertex, fragment)
    }
}

/// A linked program with its location tables.
#[derive(Debug)]
pub struct Program {
    id: ProgramId,
    key: ProgramKey,
    code_hash: u64,
    uniforms: FxHashMap<String, UniformLocation>,
    attributes: FxHashMap<String, u32>,
    used_times: u32,
}

impl Program {
    #[inline]
    #[must_use]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> &ProgramKey {
        &self.key
    }

    /// xxh3 hash of the composed sources.
    #[inline]
    #[must_use]
    pub fn code_hash(&self) -> u64 {
        self.code_hash
    }

    #[inline]
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied()
    }

    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    /// Number of materials currently bound to this program.
    #[inline]
    #[must_use]
    pub fn used_times(&self) -> u32 {
        self.used_times
    }
}

#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: SlotMap<ProgramHandle, Program>,
    lookup: FxHashMap<ProgramKey, ProgramHandle>,
}

impl ProgramCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the program for `key`, compiling it on first use, and takes
    /// one reference to it.
    pub fn acquire<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        key: ProgramKey,
    ) -> Result<ProgramHandle> {
        if let Some(&handle) = self.lookup.get(&key)
            && let Some(program) = self.programs.get_mut(handle)
        {
            program.used_times += 1;
            return Ok(handle);
        }

        let (vertex, fragment) = key.compose_sources();
        let code_hash = xxh3_64(format!("{vertex}\n{fragment}").as_bytes());
        let id = device.create_program(&vertex, &fragment)?;

        let uniforms = device
            .active_uniforms(id)
            .into_iter()
            .filter_map(|name| device.uniform_location(id, &name).map(|loc| (name, loc)))
            .collect();
        let attributes = device
            .active_attributes(id)
            .into_iter()
            .filter_map(|name| device.attribute_location(id, &name).map(|loc| (name, loc)))
            .collect();

        log::debug!(
            "Compiled program {code_hash:016x} for shader '{}'",
            key.shader.label()
        );

        let handle = self.programs.insert(Program {
            id,
            key: key.clone(),
            code_hash,
            uniforms,
            attributes,
            used_times: 1,
        });
        self.lookup.insert(key, handle);
        Ok(handle)
    }

    /// Drops one reference; deletes the program once unreferenced.
    ///
    /// Returns whether the program was deleted.
    pub fn release<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        handle: ProgramHandle,
    ) -> bool {
        let Some(program) = self.programs.get_mut(handle) else {
            return false;
        };
        program.used_times = program.used_times.saturating_sub(1);
        if program.used_times > 0 {
            return false;
        }

        if let Some(program) = self.programs.remove(handle) {
            self.lookup.remove(&program.key);
            device.delete_program(program.id);
            log::debug!("Deleted program {:016x}", program.code_hash);
        }
        true
    }

    #[inline]
    #[must_use]
    pub fn get(&self, handle: ProgramHandle) -> Option<&Program> {
        self.programs.get(handle)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordingDevice;

    const VERTEX: &str = "uniform mat4 projectionMatrix;\nattribute vec3 position;\nvoid main() {}\n";
    const FRAGMENT: &str = "uniform vec3 diffuse;\nvoid main() {}\n";

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn key(defines: &[(&str, &str)]) -> ProgramKey {
        ProgramKey {
            shader: ShaderSource::new(VERTEX, FRAGMENT),
            defines: ShaderDefines::from(defines),
            parameters: ProgramParameters {
                precision: Precision::High,
                supports_vertex_textures: false,
            },
        }
    }

    #[test]
    fn test_compose_sources() {
        let mut k = key(&[("USE_UV", "1")]);
        k.parameters.supports_vertex_textures = true;
        let (vertex, fragment) = k.compose_sources();

        assert!(vertex.starts_with("precision highp float;\n"));
        assert!(vertex.contains("#define USE_UV 1\n#define VERTEX_TEXTURES\n"));
        assert!(vertex.ends_with(VERTEX));
        assert!(!fragment.contains("VERTEX_TEXTURES"));
        assert!(fragment.ends_with(FRAGMENT));
    }

    #[test]
    fn test_equal_keys_share_program() {
        init_logger();
        let mut device = RecordingDevice::new();
        let mut cache = ProgramCache::new();

        let a = cache.acquire(&mut device, key(&[])).unwrap();
        let b = cache.acquire(&mut device, key(&[])).unwrap();
        let c = cache.acquire(&mut device, key(&[("USE_UV", "1")])).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(a).unwrap().used_times(), 2);
        assert_eq!(device.live_programs(), 2);
    }

    #[test]
    fn test_location_tables() {
        let mut device = RecordingDevice::new();
        let mut cache = ProgramCache::new();

        let handle = cache.acquire(&mut device, key(&[])).unwrap();
        let program = cache.get(handle).unwrap();

        assert!(program.uniform("projectionMatrix").is_some());
        assert!(program.uniform("diffuse").is_some());
        assert!(program.uniform("modelMatrix").is_none());
        assert_eq!(program.attribute("position"), Some(0));
    }

    #[test]
    fn test_release_deletes_last_reference() {
        init_logger();
        let mut device = RecordingDevice::new();
        let mut cache = ProgramCache::new();

        let a = cache.acquire(&mut device, key(&[])).unwrap();
        cache.acquire(&mut device, key(&[])).unwrap();

        assert!(!cache.release(&mut device, a));
        assert_eq!(device.live_programs(), 1);
        assert!(cache.release(&mut device, a));
        assert_eq!(device.live_programs(), 0);
        assert!(cache.is_empty());

        // Recompiled from scratch afterwards.
        let again = cache.acquire(&mut device, key(&[])).unwrap();
        assert_ne!(again, a);
    }

    #[test]
    fn test_release_of_deleted_program_is_noop() {
        init_logger();
        let mut device = RecordingDevice::new();
        let mut cache = ProgramCache::new();

        let stale = cache.acquire(&mut device, key(&[])).unwrap();
        assert!(cache.release(&mut device, stale));
        let live = cache.acquire(&mut device, key(&[])).unwrap();

        assert!(!cache.release(&mut device, stale));
        assert!(cache.get(stale).is_none());
        assert_eq!(cache.get(live).unwrap().used_times(), 1);
        assert_eq!(device.live_programs(), 1);
    }

    #[test]
    fn test_compile_failure_caches_nothing() {
        init_logger();
        let mut device = RecordingDevice::new();
        device.reject_shaders_containing("diffuse");
        let mut cache = ProgramCache::new();

        assert!(cache.acquire(&mut device, key(&[])).is_err());
        assert!(cache.is_empty());
    }
}
