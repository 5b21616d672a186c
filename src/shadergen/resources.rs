//! Resource accounting and the texture-binding pass.
//!
//! Composition and binding walk the same ordered feature list. Texture units
//! handed out while composing must line up 1:1 with the slots filled while
//! binding, otherwise the shader samples the wrong texture. Every mismatch is
//! reported as an error.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

use super::error::{ComposeError, Result};
use super::feature_data::FeatureContext;
use super::features::ShaderFeature;
use super::types::{ShaderStage, ShaderType};

/// Texture and constant-register demand of one feature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Resources {
    pub textures: u32,
    pub registers: u32,
}

impl Resources {
    pub fn new(textures: u32, registers: u32) -> Self {
        Self {
            textures,
            registers,
        }
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Resources {
        Resources {
            textures: self.textures + rhs.textures,
            registers: self.registers + rhs.registers,
        }
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Resources) {
        *self = *self + rhs;
    }
}

impl Sub for Resources {
    type Output = Resources;

    fn sub(self, rhs: Resources) -> Resources {
        Resources {
            textures: self.textures.saturating_sub(rhs.textures),
            registers: self.registers.saturating_sub(rhs.registers),
        }
    }
}

fn default_max_texture_units() -> u32 {
    16
}

fn default_max_constant_registers() -> u32 {
    12
}

/// Hardware limits a material variant must fit in.
///
/// Defaults match the WebGPU default limits for sampled textures and uniform
/// buffers per stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBudget {
    #[serde(default = "default_max_texture_units", rename = "maxTextureUnits")]
    pub max_texture_units: u32,
    #[serde(
        default = "default_max_constant_registers",
        rename = "maxConstantRegisters"
    )]
    pub max_constant_registers: u32,
}

impl Default for ResourceBudget {
    fn default() -> Self {
        Self {
            max_texture_units: default_max_texture_units(),
            max_constant_registers: default_max_constant_registers(),
        }
    }
}

/// Per-feature demand, summed in composition order.
#[derive(Debug)]
pub struct ResourceAccountant {
    declared: Vec<(&'static str, Resources)>,
    totals: Resources,
}

impl ResourceAccountant {
    /// Sum every feature's demand and check it against `budget`.
    pub fn tally(
        features: &[Box<dyn ShaderFeature>],
        fd: &FeatureContext,
        budget: &ResourceBudget,
    ) -> Result<Self> {
        let mut declared = Vec::with_capacity(features.len());
        let mut totals = Resources::default();
        for feature in features {
            let res = feature.resources(fd);
            totals += res;
            declared.push((feature.name(), res));
        }

        if totals.textures > budget.max_texture_units {
            return Err(ComposeError::BudgetExceeded {
                resource: "texture unit",
                requested: totals.textures,
                limit: budget.max_texture_units,
            });
        }
        if totals.registers > budget.max_constant_registers {
            return Err(ComposeError::BudgetExceeded {
                resource: "constant register",
                requested: totals.registers,
                limit: budget.max_constant_registers,
            });
        }

        log::debug!(
            "resource tally: {} textures, {} registers over {} features",
            totals.textures,
            totals.registers,
            features.len()
        );
        Ok(Self { declared, totals })
    }

    pub fn totals(&self) -> Resources {
        self.totals
    }

    pub fn declared(&self) -> &[(&'static str, Resources)] {
        &self.declared
    }

    /// Compare what feature `index` allocated while emitting with what it declared.
    pub fn check_allocation(&self, index: usize, allocated: Resources) -> Result<()> {
        let Some(&(feature, declared)) = self.declared.get(index) else {
            return Ok(());
        };
        if allocated != declared {
            log::warn!("feature {feature} declared {declared:?}, allocated {allocated:?}");
        }
        if allocated.textures != declared.textures {
            return Err(ComposeError::ResourceMismatch {
                feature,
                resource: "texture units",
                declared: declared.textures,
                allocated: allocated.textures,
            });
        }
        if allocated.registers != declared.registers {
            return Err(ComposeError::ResourceMismatch {
                feature,
                resource: "constant registers",
                declared: declared.registers,
                allocated: allocated.registers,
            });
        }
        Ok(())
    }
}

/// Texture unit assigned during composition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureBinding {
    pub unit: u32,
    pub sampler_name: String,
    pub texture_name: String,
}

/// Constant register assigned during composition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstantBinding {
    pub register: u32,
    pub name: String,
    pub ty: ShaderType,
    pub stage: ShaderStage,
}

/// What a material uses a texture for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextureUsage {
    DiffuseMap,
    PbrConfigMap,
}

/// Opaque reference to a GPU texture owned by the renderer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureHandle(pub String);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TexKind {
    #[default]
    NoTexture,
    Standard,
}

/// Textures a material stage provides, keyed by usage.
#[derive(Clone, Debug, Default)]
pub struct StageData {
    textures: BTreeMap<TextureUsage, TextureHandle>,
}

impl StageData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texture(mut self, usage: TextureUsage, texture: TextureHandle) -> Self {
        self.textures.insert(usage, texture);
        self
    }

    pub fn insert(&mut self, usage: TextureUsage, texture: TextureHandle) {
        self.textures.insert(usage, texture);
    }

    pub fn texture(&self, usage: TextureUsage) -> Option<&TextureHandle> {
        self.textures.get(&usage)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindingSlot {
    pub sampler_name: String,
    pub kind: TexKind,
    pub texture: Option<TextureHandle>,
}

/// Per-render-pass slot table filled by the binding pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPassData {
    slots: Vec<BindingSlot>,
}

impl RenderPassData {
    pub fn with_slots(count: usize) -> Self {
        Self {
            slots: vec![BindingSlot::default(); count],
        }
    }

    pub fn slots(&self) -> &[BindingSlot] {
        &self.slots
    }

    /// Fill the slot under `cursor` and advance it.
    pub fn bind(
        &mut self,
        cursor: &mut usize,
        sampler_name: &str,
        kind: TexKind,
        texture: TextureHandle,
    ) -> Result<()> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(*cursor)
            .ok_or(ComposeError::SlotOutOfRange { slot: *cursor, len })?;
        slot.sampler_name = sampler_name.to_string();
        slot.kind = kind;
        slot.texture = Some(texture);
        *cursor += 1;
        Ok(())
    }
}

/// Walk `features` in composition order and bind their textures.
///
/// `expected` is the unit table produced while composing the same features.
pub fn bind_textures(
    features: &[Box<dyn ShaderFeature>],
    stage: &StageData,
    fd: &FeatureContext,
    expected: &[TextureBinding],
) -> Result<RenderPassData> {
    let mut pass = RenderPassData::with_slots(expected.len());
    let mut cursor = 0usize;

    for feature in features {
        let declared = feature.resources(fd).textures;
        let before = cursor;
        feature.set_tex_data(stage, fd, &mut pass, &mut cursor)?;
        let bound = cursor.saturating_sub(before) as u32;
        if bound != declared {
            log::error!(
                "feature {} bound {bound} textures, declared {declared}",
                feature.name()
            );
            return Err(ComposeError::BindingMismatch {
                feature: feature.name(),
                declared,
                bound,
            });
        }
    }

    for (slot, binding) in expected.iter().enumerate() {
        let found = &pass.slots[slot].sampler_name;
        if binding.unit as usize != slot || *found != binding.sampler_name {
            return Err(ComposeError::SlotMismatch {
                slot,
                expected: binding.sampler_name.clone(),
                found: found.clone(),
            });
        }
    }

    Ok(pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadergen::feature_data::MaterialFeatures;
    use crate::shadergen::features::{DiffuseColor, DiffuseMap, PbrConfigMap};

    fn features() -> Vec<Box<dyn ShaderFeature>> {
        vec![
            Box::new(DiffuseMap),
            Box::new(DiffuseColor),
            Box::new(PbrConfigMap),
        ]
    }

    fn expected() -> Vec<TextureBinding> {
        vec![
            TextureBinding {
                unit: 0,
                sampler_name: "DiffuseMap".to_string(),
                texture_name: "DiffuseMapTex".to_string(),
            },
            TextureBinding {
                unit: 1,
                sampler_name: "PBRConfigMap".to_string(),
                texture_name: "PBRConfigMapTex".to_string(),
            },
        ]
    }

    fn stage() -> StageData {
        StageData::new()
            .with_texture(TextureUsage::DiffuseMap, TextureHandle("albedo.png".into()))
            .with_texture(TextureUsage::PbrConfigMap, TextureHandle("orm.png".into()))
    }

    #[test]
    fn test_tally_sums_in_order() {
        let fd = FeatureContext::forward(MaterialFeatures::empty());
        let acc = ResourceAccountant::tally(&features(), &fd, &ResourceBudget::default()).unwrap();
        assert_eq!(acc.totals(), Resources::new(2, 1));
        let names: Vec<_> = acc.declared().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["DiffuseMap", "DiffuseColor", "PbrConfigMap"]);
    }

    #[test]
    fn test_tally_rejects_over_budget() {
        let fd = FeatureContext::forward(MaterialFeatures::empty());
        let budget = ResourceBudget {
            max_texture_units: 1,
            ..ResourceBudget::default()
        };
        let err = ResourceAccountant::tally(&features(), &fd, &budget).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::BudgetExceeded {
                requested: 2,
                limit: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_check_allocation_reports_feature() {
        let fd = FeatureContext::forward(MaterialFeatures::empty());
        let acc = ResourceAccountant::tally(&features(), &fd, &ResourceBudget::default()).unwrap();
        acc.check_allocation(0, Resources::new(1, 0)).unwrap();
        let err = acc.check_allocation(1, Resources::new(0, 2)).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::ResourceMismatch {
                feature: "DiffuseColor",
                ..
            }
        ));
    }

    #[test]
    fn test_bind_textures_fills_slots_in_order() {
        let fd = FeatureContext::forward(MaterialFeatures::empty());
        let pass = bind_textures(&features(), &stage(), &fd, &expected()).unwrap();
        let slots = pass.slots();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].sampler_name, "DiffuseMap");
        assert_eq!(slots[0].kind, TexKind::Standard);
        assert_eq!(slots[1].texture, Some(TextureHandle("orm.png".into())));
    }

    #[test]
    fn test_missing_texture_is_binding_mismatch() {
        let fd = FeatureContext::forward(MaterialFeatures::empty());
        let stage = StageData::new()
            .with_texture(TextureUsage::DiffuseMap, TextureHandle("albedo.png".into()));
        let err = bind_textures(&features(), &stage, &fd, &expected()).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::BindingMismatch {
                feature: "PbrConfigMap",
                declared: 1,
                bound: 0,
            }
        ));
    }

    #[test]
    fn test_reordered_features_are_slot_mismatch() {
        let fd = FeatureContext::forward(MaterialFeatures::empty());
        let reordered: Vec<Box<dyn ShaderFeature>> =
            vec![Box::new(PbrConfigMap), Box::new(DiffuseMap)];
        let err = bind_textures(&reordered, &stage(), &fd, &expected()).unwrap_err();
        assert!(matches!(err, ComposeError::SlotMismatch { slot: 0, .. }));
    }

    #[test]
    fn test_bind_past_end_is_out_of_range() {
        let mut pass = RenderPassData::with_slots(0);
        let mut cursor = 0;
        let err = pass
            .bind(&mut cursor, "DiffuseMap", TexKind::Standard, TextureHandle("a".into()))
            .unwrap_err();
        assert!(matches!(err, ComposeError::SlotOutOfRange { slot: 0, len: 0 }));
        assert_eq!(cursor, 0);
    }
}
