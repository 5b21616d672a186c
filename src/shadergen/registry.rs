//! Pass-scoped variable registry.
//!
//! Vars are keyed by path (`OUT.col2`, `PBRConfig`) within the current stage.
//! The first feature to create a path owns its declaration; later lookups get
//! the same [`VarId`] back. The registry also owns the texture-unit and
//! constant-register counters for the whole pass, and the vertex→pixel
//! varying table.

use std::collections::HashMap;

use super::error::{ComposeError, Result};
use super::types::{ShaderStage, ShaderType, Var, VarId, VarRole};

/// A vertex output consumed by the pixel stage.
#[derive(Clone, Debug, PartialEq)]
pub struct Varying {
    pub name: String,
    pub ty: ShaderType,
    pub location: u32,
}

#[derive(Debug)]
pub struct VariableRegistry {
    vars: Vec<Var>,
    by_path: HashMap<(ShaderStage, String), VarId>,
    stage: ShaderStage,
    texture_units: u32,
    constant_registers: u32,
    vertex_inputs: u32,
    varyings: Vec<Varying>,
}

impl Default for VariableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            by_path: HashMap::new(),
            stage: ShaderStage::Vertex,
            texture_units: 0,
            constant_registers: 0,
            vertex_inputs: 0,
            varyings: Vec::new(),
        }
    }

    /// Switch lookups and new registrations to `stage`.
    pub fn begin_stage(&mut self, stage: ShaderStage) {
        self.stage = stage;
    }

    pub fn find(&self, path: &str) -> Option<VarId> {
        self.by_path.get(&(self.stage, path.to_string())).copied()
    }

    pub fn get(&self, id: VarId) -> Result<&Var> {
        self.vars.get(id.0).ok_or(ComposeError::UnknownVar(id.0))
    }

    /// Register a new var. Fails if the path is already taken in this stage.
    pub fn create(&mut self, var: Var) -> Result<VarId> {
        let path = var.path();
        if self.find(&path).is_some() {
            return Err(ComposeError::DuplicateVar(path));
        }
        Ok(self.insert(var))
    }

    /// Return the var registered under `var`'s path, creating it if absent.
    ///
    /// The existing var's role and slot win; asking for a different type is a
    /// programming error in the calling feature.
    pub fn find_or_create(&mut self, var: Var) -> Result<VarId> {
        Ok(self.lookup_or_insert(var)?.0)
    }

    /// Like [`find_or_create`](Self::find_or_create), also reporting whether
    /// the var was created by this call.
    pub fn lookup_or_insert(&mut self, var: Var) -> Result<(VarId, bool)> {
        let path = var.path();
        let Some(id) = self.find(&path) else {
            return Ok((self.insert(var), true));
        };
        let existing = self.vars[id.0].ty;
        if existing != var.ty {
            log::error!(
                "var `{path}` redeclared as {} (first declared as {})",
                var.ty.wgsl(),
                existing.wgsl()
            );
            return Err(ComposeError::TypeMismatch {
                path,
                existing,
                requested: var.ty,
            });
        }
        Ok((id, false))
    }

    /// Find or create a plain uniform.
    pub fn uniform(&mut self, name: &str, ty: ShaderType) -> Result<VarId> {
        self.find_or_create(Var::uniform(name, ty))
    }

    /// Find or create a sampler `name` and its texture `nameTex`.
    ///
    /// Both share the texture unit allocated when the sampler was created.
    pub fn sampler_pair(&mut self, name: &str) -> Result<(VarId, VarId)> {
        let mut sampler = Var::uniform(name, ShaderType::Sampler);
        sampler.role |= VarRole::SAMPLER;
        let sampler_id = self.find_or_create(sampler)?;

        let mut texture = Var::uniform(format!("{name}Tex"), ShaderType::Texture2D);
        texture.role |= VarRole::TEXTURE;
        texture.slot = self.vars[sampler_id.0].slot;
        let texture_id = self.find_or_create(texture)?;
        Ok((sampler_id, texture_id))
    }

    pub fn next_texture_unit(&mut self) -> u32 {
        let unit = self.texture_units;
        self.texture_units += 1;
        unit
    }

    pub fn next_constant_register(&mut self) -> u32 {
        let register = self.constant_registers;
        self.constant_registers += 1;
        register
    }

    pub fn texture_units_used(&self) -> u32 {
        self.texture_units
    }

    pub fn constant_registers_used(&self) -> u32 {
        self.constant_registers
    }

    pub fn next_vertex_input_location(&mut self) -> u32 {
        let location = self.vertex_inputs;
        self.vertex_inputs += 1;
        location
    }

    /// Declare a vertex output for the pixel stage, returning its location.
    pub fn declare_varying(&mut self, name: &str, ty: ShaderType) -> Result<u32> {
        if let Some(existing) = self.varying(name) {
            if existing.ty != ty {
                return Err(ComposeError::TypeMismatch {
                    path: name.to_string(),
                    existing: existing.ty,
                    requested: ty,
                });
            }
            return Ok(existing.location);
        }
        let location = self.varyings.len() as u32;
        self.varyings.push(Varying {
            name: name.to_string(),
            ty,
            location,
        });
        Ok(location)
    }

    pub fn varying(&self, name: &str) -> Option<&Varying> {
        self.varyings.iter().find(|v| v.name == name)
    }

    pub fn varyings(&self) -> &[Varying] {
        &self.varyings
    }

    /// Vars registered in `stage`, in creation order.
    pub fn vars_in_stage(&self, stage: ShaderStage) -> impl Iterator<Item = (VarId, &Var)> + '_ {
        self.vars
            .iter()
            .enumerate()
            .filter(move |(_, v)| v.stage == Some(stage))
            .map(|(i, v)| (VarId(i), v))
    }

    /// Bound vars without an explicit slot get the next unit or register here,
    /// so each physical sampler or uniform takes exactly one.
    fn insert(&mut self, mut var: Var) -> VarId {
        if var.slot.is_none() {
            if var.is_sampler() || var.is_texture() {
                var.slot = Some(self.next_texture_unit());
            } else if var.is_uniform() {
                var.slot = Some(self.next_constant_register());
            }
        }
        let id = VarId(self.vars.len());
        var.stage = Some(self.stage);
        self.by_path.insert((self.stage, var.path()), id);
        self.vars.push(var);
        id
    }
}
