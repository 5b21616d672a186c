//! Core type definitions for shader composition.

use bitflags::bitflags;

/// Shader stage a var or statement belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

/// WGSL type of a shader-side value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderType {
    F32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Texture2D,
    Sampler,
}

impl ShaderType {
    /// Returns the WGSL type name for this value type.
    pub fn wgsl(self) -> &'static str {
        match self {
            ShaderType::F32 => "f32",
            ShaderType::Vec2 => "vec2f",
            ShaderType::Vec3 => "vec3f",
            ShaderType::Vec4 => "vec4f",
            ShaderType::Mat4 => "mat4x4f",
            ShaderType::Texture2D => "texture_2d<f32>",
            ShaderType::Sampler => "sampler",
        }
    }
}

bitflags! {
    /// How a var is bound outside of function scope.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct VarRole: u8 {
        const UNIFORM = 1 << 0;
        const SAMPLER = 1 << 1;
        const TEXTURE = 1 << 2;
    }
}

/// Handle to a var owned by a [`VariableRegistry`](super::registry::VariableRegistry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

/// A named, typed shader-side value.
#[derive(Clone, Debug, PartialEq)]
pub struct Var {
    pub name: String,
    pub ty: ShaderType,
    pub role: VarRole,
    /// Texture unit for samplers/textures, constant register for plain uniforms.
    pub slot: Option<u32>,
    /// Enclosing IO struct (`IN` / `OUT`), if any.
    pub struct_name: Option<String>,
    /// `@location` inside the enclosing struct.
    pub location: Option<u32>,
    /// Set by the registry when the var is registered.
    pub stage: Option<ShaderStage>,
}

impl Var {
    /// A function-local value.
    pub fn local(name: impl Into<String>, ty: ShaderType) -> Self {
        Self {
            name: name.into(),
            ty,
            role: VarRole::empty(),
            slot: None,
            struct_name: None,
            location: None,
            stage: None,
        }
    }

    /// A module-scope uniform. The register is assigned on registration.
    pub fn uniform(name: impl Into<String>, ty: ShaderType) -> Self {
        Self {
            role: VarRole::UNIFORM,
            ..Self::local(name, ty)
        }
    }

    /// A member of an IO struct such as `IN` or `OUT`.
    pub fn member(struct_name: &str, name: impl Into<String>, ty: ShaderType) -> Self {
        Self {
            struct_name: Some(struct_name.to_string()),
            ..Self::local(name, ty)
        }
    }

    pub fn at_location(mut self, location: u32) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_slot(mut self, slot: u32) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Registry key and the text substituted into statements.
    pub fn path(&self) -> String {
        match &self.struct_name {
            Some(s) => format!("{s}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn is_uniform(&self) -> bool {
        self.role.contains(VarRole::UNIFORM)
    }

    pub fn is_sampler(&self) -> bool {
        self.role.contains(VarRole::SAMPLER)
    }

    pub fn is_texture(&self) -> bool {
        self.role.contains(VarRole::TEXTURE)
    }

    /// Plain uniforms hold a constant register; samplers and textures hold a unit.
    pub fn constant_register(&self) -> Option<u32> {
        if self.is_uniform() && !self.is_sampler() && !self.is_texture() {
            self.slot
        } else {
            None
        }
    }

    pub fn texture_unit(&self) -> Option<u32> {
        if self.is_sampler() || self.is_texture() {
            self.slot
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_path_includes_struct() {
        let v = Var::member("OUT", "col2", ShaderType::Vec4);
        assert_eq!(v.path(), "OUT.col2");
        assert_eq!(Var::local("PBRConfig", ShaderType::Vec4).path(), "PBRConfig");
    }

    #[test]
    fn test_slot_kind_follows_role() {
        let uniform = Var::uniform("matInfoFlags", ShaderType::F32).with_slot(3);
        assert_eq!(uniform.constant_register(), Some(3));
        assert_eq!(uniform.texture_unit(), None);

        let mut sampler = Var::uniform("DiffuseMap", ShaderType::Sampler).with_slot(1);
        sampler.role |= VarRole::SAMPLER;
        assert_eq!(sampler.constant_register(), None);
        assert_eq!(sampler.texture_unit(), Some(1));
    }
}
