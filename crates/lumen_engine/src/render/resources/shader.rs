//! Shader programs and the shader library
//!
//! Uniforms are addressed by string name, so a misspelled uniform is only
//! caught by the backend (or silently ignored by drivers that do so).

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::api::{ShaderDescriptor, ShaderId, SharedBackend, UniformValue};
use crate::render::{RenderError, RenderResult};

/// Linked shader program
#[derive(Debug)]
pub struct Shader {
    backend: SharedBackend,
    id: ShaderId,
    name: String,
    lit: bool,
}

impl Shader {
    /// Create a program from its stage sources
    pub fn new(backend: &SharedBackend, descriptor: &ShaderDescriptor) -> RenderResult<Self> {
        let id = backend.create_shader(descriptor)?;
        Ok(Self {
            backend: Rc::clone(backend),
            id,
            name: descriptor.name.clone(),
            lit: false,
        })
    }

    /// Mark the program as consuming the scene light arrays
    pub fn lit(mut self) -> Self {
        self.lit = true;
        self
    }

    /// Make the program current
    pub fn enable(&self) -> RenderResult<()> {
        self.backend.enable_shader(self.id)?;
        Ok(())
    }

    /// Set any uniform value
    pub fn set_uniform(&self, name: &str, value: UniformValue) -> RenderResult<()> {
        self.backend.set_uniform(self.id, name, &value)?;
        Ok(())
    }

    /// Set an `int` or sampler uniform
    pub fn set_int(&self, name: &str, value: i32) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Int(value))
    }

    /// Set an `int[]` or sampler array uniform
    pub fn set_int_array(&self, name: &str, values: &[i32]) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::IntArray(values.to_vec()))
    }

    /// Set a `float` uniform
    pub fn set_float(&self, name: &str, value: f32) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Float(value))
    }

    /// Set a `vec3` uniform
    pub fn set_float3(&self, name: &str, value: Vec3) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Vec3(value))
    }

    /// Set a `vec4` uniform
    pub fn set_float4(&self, name: &str, value: Vec4) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Vec4(value))
    }

    /// Set a `mat4` uniform
    pub fn set_mat4(&self, name: &str, value: &Mat4) -> RenderResult<()> {
        self.set_uniform(name, UniformValue::Mat4(*value))
    }

    /// Backend handle
    pub fn id(&self) -> ShaderId {
        self.id
    }

    /// Library name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the program reads the scene light arrays
    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.backend.delete_shader(self.id);
    }
}

/// Name → program map
///
/// Iteration order is by name, which keeps per-frame uniform uploads
/// deterministic.
#[derive(Debug, Default)]
pub struct ShaderLibrary {
    shaders: BTreeMap<String, Rc<Shader>>,
}

impl ShaderLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a program, replacing any program with the same name
    pub fn add(&mut self, shader: Shader) -> Rc<Shader> {
        let shader = Rc::new(shader);
        if self.shaders.insert(shader.name().to_string(), Rc::clone(&shader)).is_some() {
            log::warn!("Shader '{}' replaced in library", shader.name());
        }
        shader
    }

    /// Create a program from a descriptor and add it
    pub fn load(&mut self, backend: &SharedBackend, descriptor: &ShaderDescriptor) -> RenderResult<Rc<Shader>> {
        Ok(self.add(Shader::new(backend, descriptor)?))
    }

    /// Look up a program by name
    pub fn get(&self, name: &str) -> RenderResult<Rc<Shader>> {
        self.shaders
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownShader(name.to_string()))
    }

    /// Whether a program with this name exists
    pub fn exists(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    /// All programs, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Shader>> {
        self.shaders.values()
    }

    /// Programs that read the scene light arrays
    pub fn lit_shaders(&self) -> impl Iterator<Item = &Rc<Shader>> {
        self.shaders.values().filter(|s| s.is_lit())
    }

    /// Number of programs
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::HeadlessBackend;

    #[test]
    fn test_library_lookup() {
        let backend: SharedBackend = Rc::new(HeadlessBackend::new());
        let mut library = ShaderLibrary::new();
        library.load(&backend, &ShaderDescriptor::named("Flat")).unwrap();

        assert!(library.exists("Flat"));
        assert_eq!(library.get("Flat").unwrap().name(), "Flat");
        assert!(matches!(library.get("Missing"), Err(RenderError::UnknownShader(_))));
    }

    #[test]
    fn test_uniforms_reach_backend() {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: SharedBackend = headless.clone();
        let shader = Shader::new(&backend, &ShaderDescriptor::named("Flat")).unwrap();

        shader.set_float("u_Exposure", 1.5).unwrap();
        assert_eq!(headless.uniform("Flat", "u_Exposure"), Some(UniformValue::Float(1.5)));
    }

    #[test]
    fn test_lit_filter() {
        let backend: SharedBackend = Rc::new(HeadlessBackend::new());
        let mut library = ShaderLibrary::new();
        library.add(Shader::new(&backend, &ShaderDescriptor::named("Flat")).unwrap());
        library.add(Shader::new(&backend, &ShaderDescriptor::named("PBR")).unwrap().lit());

        let lit: Vec<&str> = library.lit_shaders().map(|s| s.name()).collect();
        assert_eq!(lit, vec!["PBR"]);
        assert_eq!(library.len(), 2);
    }
}
