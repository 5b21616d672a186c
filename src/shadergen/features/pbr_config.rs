//! Smoothness / metalness features.
//!
//! Channel layout of the material-info target and of the forward `PBRConfig`
//! value: r = material flags, g = reserved for ambient occlusion,
//! b = smoothness, a = metalness.

use super::{
    ShaderFeature, bind_stage_texture, decl_or_var, in_tex_coord, out_tex_coord, pbr_config_target,
};
use crate::shadergen::compose::ComposePass;
use crate::shadergen::error::Result;
use crate::shadergen::feature_data::{FeatureContext, MaterialFeatures};
use crate::shadergen::ir::{GenOp, StatementBlock};
use crate::shadergen::resources::{RenderPassData, Resources, StageData, TextureUsage};
use crate::shadergen::router::{TargetSet, material_info_target};
use crate::shadergen::types::{ShaderType, Var};

/// Smoothness and metalness sampled from a config texture.
#[derive(Debug, Default, Clone, Copy)]
pub struct PbrConfigMap;

impl PbrConfigMap {
    pub const SAMPLER: &'static str = "PBRConfigMap";
}

impl ShaderFeature for PbrConfigMap {
    fn name(&self) -> &'static str {
        "PbrConfigMap"
    }

    fn resources(&self, _fd: &FeatureContext) -> Resources {
        Resources::new(1, 0)
    }

    fn process_vert(&self, fd: &FeatureContext, pass: &mut ComposePass) -> Result<StatementBlock> {
        let mut block = StatementBlock::new();
        out_tex_coord(fd, pass, &mut block)?;
        Ok(block)
    }

    fn process_pix(&self, fd: &FeatureContext, pass: &mut ComposePass) -> Result<StatementBlock> {
        let mut block = StatementBlock::new();
        let tex_coord = in_tex_coord(pass)?;
        let pbr_config = pbr_config_target(fd, pass, &mut block)?;

        let (sampler, texture) = pass.vars.sampler_pair(Self::SAMPLER)?;
        let sample = GenOp::new(
            "textureSample(@, @, @)",
            vec![texture.into(), sampler.into(), tex_coord.into()],
        )?;

        let (smoothness, new_smoothness) = pass
            .vars
            .lookup_or_insert(Var::local("smoothness", ShaderType::F32))?;
        let (metalness, new_metalness) = pass
            .vars
            .lookup_or_insert(Var::local("metalness", ShaderType::F32))?;

        block.push_op(
            "@ = @.r",
            vec![decl_or_var(smoothness, new_smoothness), sample.clone().into()],
        )?;
        block.push_op(
            "@ = @.b",
            vec![decl_or_var(metalness, new_metalness), sample.clone().into()],
        )?;

        if fd.has(MaterialFeatures::INVERT_SMOOTHNESS) {
            block.push_op("@ = 1.0 - @", vec![smoothness.into(), smoothness.into()])?;
        }

        if !fd.is_deferred() {
            block.push_op("@ = @.ggga", vec![pbr_config.into(), sample.into()])?;
        }
        block.push_op(
            "@ = vec4f(@.r, @.g, @, @)",
            vec![
                pbr_config.into(),
                pbr_config.into(),
                pbr_config.into(),
                smoothness.into(),
                metalness.into(),
            ],
        )?;
        Ok(block)
    }

    fn set_tex_data(
        &self,
        stage: &StageData,
        _fd: &FeatureContext,
        pass_data: &mut RenderPassData,
        cursor: &mut usize,
    ) -> Result<()> {
        bind_stage_texture(stage, TextureUsage::PbrConfigMap, Self::SAMPLER, pass_data, cursor)
    }

    fn output_targets(&self, fd: &FeatureContext) -> TargetSet {
        material_info_target(fd).flag()
    }
}

/// Smoothness and metalness from per-material constants.
#[derive(Debug, Default, Clone, Copy)]
pub struct PbrConfigVars;

impl ShaderFeature for PbrConfigVars {
    fn name(&self) -> &'static str {
        "PbrConfigVars"
    }

    fn resources(&self, _fd: &FeatureContext) -> Resources {
        Resources::new(0, 2)
    }

    fn process_pix(&self, fd: &FeatureContext, pass: &mut ComposePass) -> Result<StatementBlock> {
        let mut block = StatementBlock::new();
        let pbr_config = pbr_config_target(fd, pass, &mut block)?;

        let metalness_const = pass.vars.uniform("matMetalness", ShaderType::F32)?;
        let smoothness_const = pass.vars.uniform("matSmoothness", ShaderType::F32)?;
        let (smoothness, new_smoothness) = pass
            .vars
            .lookup_or_insert(Var::local("smoothness", ShaderType::F32))?;
        let (metalness, new_metalness) = pass
            .vars
            .lookup_or_insert(Var::local("metalness", ShaderType::F32))?;

        block.push_op(
            "@ = @",
            vec![decl_or_var(smoothness, new_smoothness), smoothness_const.into()],
        )?;
        block.push_op(
            "@ = @",
            vec![decl_or_var(metalness, new_metalness), metalness_const.into()],
        )?;
        if fd.has(MaterialFeatures::INVERT_SMOOTHNESS) {
            block.push_op("@ = 1.0 - @", vec![smoothness.into(), smoothness.into()])?;
        }

        // Green stays reserved for ambient occlusion.
        block.push_op("@.g = 1.0", vec![pbr_config.into()])?;
        block.push_op("@.b = @", vec![pbr_config.into(), smoothness.into()])?;
        block.push_op("@.a = @", vec![pbr_config.into(), metalness.into()])?;
        Ok(block)
    }

    fn output_targets(&self, fd: &FeatureContext) -> TargetSet {
        material_info_target(fd).flag()
    }
}
