//! Material description: JSON loading, feature selection and texture data.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::shadergen::{
    ComposedShader, FeatureContext, MaterialFeatures, RenderBin, RenderPassData, ResourceBudget,
    ShaderFeature, StageData, TextureHandle, TextureUsage, bind_textures, compose,
    features::{
        DeferredEmissive, DiffuseColor, DiffuseMap, MatInfoFlags, PbrConfigMap, PbrConfigVars,
        TexAnim, VertPosition,
    },
};

fn default_features() -> MaterialFeatures {
    MaterialFeatures::VERT_POSITION
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MaterialDesc {
    pub name: String,
    #[serde(default = "default_features")]
    pub features: MaterialFeatures,
    #[serde(default)]
    pub bin: RenderBin,
    /// Color targets of the render pass; defaults to the full G-buffer in the
    /// deferred bin and a single target otherwise.
    #[serde(default, rename = "renderTargets", skip_serializing_if = "Option::is_none")]
    pub render_targets: Option<u32>,
    #[serde(default)]
    pub textures: BTreeMap<TextureUsage, TextureHandle>,
    #[serde(default)]
    pub budget: ResourceBudget,
}

impl MaterialDesc {
    pub fn feature_context(&self) -> FeatureContext {
        let render_targets = self.render_targets.unwrap_or(match self.bin {
            RenderBin::Deferred => 4,
            _ => 1,
        });
        FeatureContext::new(self.features, self.bin, render_targets)
    }

    pub fn stage_data(&self) -> StageData {
        let mut stage = StageData::new();
        for (usage, texture) in &self.textures {
            stage.insert(*usage, texture.clone());
        }
        stage
    }
}

pub fn load_material_from_path(path: impl AsRef<Path>) -> Result<MaterialDesc> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read material json at {}", path.display()))?;
    parse_material(&text).with_context(|| format!("in {}", path.display()))
}

pub fn parse_material(text: &str) -> Result<MaterialDesc> {
    let material: MaterialDesc =
        serde_json::from_str(text).context("failed to parse material json")?;
    log::debug!(
        "material {}: features [{:?}], bin {:?}, {} render targets",
        material.name,
        material.features,
        material.bin,
        material.feature_context().render_targets
    );
    Ok(material)
}

/// Default feature order for a material.
///
/// The order decides which feature owns shared vars, so it is part of the
/// material's contract with the shaders it produces.
pub fn select_features(fd: &FeatureContext) -> Vec<Box<dyn ShaderFeature>> {
    let mut features: Vec<Box<dyn ShaderFeature>> = Vec::new();
    if fd.has(MaterialFeatures::VERT_POSITION) {
        features.push(Box::new(VertPosition));
    }
    let samples_textures =
        fd.has(MaterialFeatures::DIFFUSE_MAP) || fd.has(MaterialFeatures::PBR_CONFIG_MAP);
    if samples_textures && fd.has(MaterialFeatures::TEX_ANIM) {
        features.push(Box::new(TexAnim));
    }
    if fd.has(MaterialFeatures::DIFFUSE_MAP) {
        features.push(Box::new(DiffuseMap));
    }
    if fd.has(MaterialFeatures::DIFFUSE_COLOR) {
        features.push(Box::new(DiffuseColor));
    }
    if fd.has(MaterialFeatures::PBR_CONFIG_MAP) {
        features.push(Box::new(PbrConfigMap));
    } else if fd.has(MaterialFeatures::PBR_CONFIG_VARS) {
        features.push(Box::new(PbrConfigVars));
    }
    if fd.has(MaterialFeatures::MAT_INFO_FLAGS) {
        features.push(Box::new(MatInfoFlags));
    }
    if fd.is_deferred() && fd.has(MaterialFeatures::DEFERRED_EMISSIVE) {
        features.push(Box::new(DeferredEmissive));
    }
    features
}

/// Shaders of one material together with its bound texture slots.
#[derive(Clone, Debug)]
pub struct CompiledMaterial {
    pub shader: ComposedShader,
    pub pass_data: RenderPassData,
}

/// Compose both stages of `material` and bind its textures in the same order.
pub fn compile_material(material: &MaterialDesc) -> Result<CompiledMaterial> {
    let fd = material.feature_context();
    let features = select_features(&fd);
    let shader = compose(&features, &fd, &material.budget)
        .with_context(|| format!("failed to compose material {}", material.name))?;
    let pass_data = bind_textures(&features, &material.stage_data(), &fd, &shader.textures)
        .with_context(|| format!("failed to bind textures of material {}", material.name))?;
    log::info!(
        "material {}: {} texture units, {} constant registers, {} targets",
        material.name,
        shader.resources.textures,
        shader.resources.registers,
        shader.targets.len()
    );
    Ok(CompiledMaterial { shader, pass_data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_applies_defaults() {
        let material = parse_material(r#"{ "name": "plain" }"#).unwrap();
        assert_eq!(material.features, MaterialFeatures::VERT_POSITION);
        assert_eq!(material.bin, RenderBin::Regular);
        assert_eq!(material.feature_context().render_targets, 1);
        assert_eq!(material.budget, ResourceBudget::default());
        assert!(material.textures.is_empty());
    }

    #[test]
    fn test_parse_full_description() {
        let material = parse_material(
            r#"{
                "name": "rock",
                "features": "VERT_POSITION | PBR_CONFIG_MAP | MAT_INFO_FLAGS",
                "bin": "deferred",
                "textures": { "pbrConfigMap": "rock_orm.png" },
                "budget": { "maxTextureUnits": 8 }
            }"#,
        )
        .unwrap();
        let fd = material.feature_context();
        assert!(fd.is_deferred());
        assert_eq!(fd.render_targets, 4);
        assert!(fd.has(MaterialFeatures::PBR_CONFIG_MAP));
        assert_eq!(material.budget.max_texture_units, 8);
        assert_eq!(material.budget.max_constant_registers, 12);
        assert_eq!(
            material.stage_data().texture(TextureUsage::PbrConfigMap),
            Some(&TextureHandle("rock_orm.png".into()))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        assert!(parse_material(r#"{ "name": "x", "features": "SPARKLES" }"#).is_err());
    }

    #[test]
    fn test_select_features_order() {
        let fd = FeatureContext::deferred(MaterialFeatures::all());
        let names: Vec<_> = select_features(&fd).iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            [
                "VertPosition",
                "TexAnim",
                "DiffuseMap",
                "DiffuseColor",
                "PbrConfigMap",
                "MatInfoFlags",
                "DeferredEmissive"
            ]
        );
    }

    #[test]
    fn test_compile_binds_textures_in_unit_order() {
        let material = parse_material(
            r#"{
                "name": "painted",
                "features": "VERT_POSITION | DIFFUSE_MAP | PBR_CONFIG_MAP",
                "textures": { "diffuseMap": "albedo.png", "pbrConfigMap": "orm.png" }
            }"#,
        )
        .unwrap();
        let compiled = compile_material(&material).unwrap();
        let slots: Vec<_> = compiled
            .pass_data
            .slots()
            .iter()
            .map(|s| (s.sampler_name.as_str(), s.texture.clone()))
            .collect();
        assert_eq!(
            slots,
            [
                ("DiffuseMap", Some(TextureHandle("albedo.png".into()))),
                ("PBRConfigMap", Some(TextureHandle("orm.png".into()))),
            ]
        );
    }

    #[test]
    fn test_compile_fails_without_texture() {
        let material = parse_material(
            r#"{ "name": "bare", "features": "VERT_POSITION | DIFFUSE_MAP" }"#,
        )
        .unwrap();
        let err = compile_material(&material).unwrap_err();
        assert!(format!("{err:#}").contains("bare"));
    }

    #[test]
    fn test_tex_anim_needs_a_sampled_texture() {
        let fd = FeatureContext::forward(
            MaterialFeatures::TEX_ANIM | MaterialFeatures::PBR_CONFIG_VARS,
        );
        let names: Vec<_> = select_features(&fd).iter().map(|f| f.name()).collect();
        assert_eq!(names, ["PbrConfigVars"]);
    }

    #[test]
    fn test_select_features_skips_emissive_outside_deferred() {
        let fd = FeatureContext::forward(
            MaterialFeatures::PBR_CONFIG_VARS | MaterialFeatures::DEFERRED_EMISSIVE,
        );
        let names: Vec<_> = select_features(&fd).iter().map(|f| f.name()).collect();
        assert_eq!(names, ["PbrConfigVars"]);
    }
}
