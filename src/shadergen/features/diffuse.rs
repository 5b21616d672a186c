//! Base color features.

use super::{ShaderFeature, bind_stage_texture, decl_or_var, in_tex_coord, out_tex_coord};
use crate::shadergen::compose::ComposePass;
use crate::shadergen::error::Result;
use crate::shadergen::feature_data::FeatureContext;
use crate::shadergen::ir::{GenOp, Operand, StatementBlock};
use crate::shadergen::resources::{RenderPassData, Resources, StageData, TextureUsage};
use crate::shadergen::router::{TargetSet, color_target};
use crate::shadergen::types::{ShaderType, Var};

/// Write `value` to the color target, modulating whatever an earlier feature wrote.
fn write_color(
    fd: &FeatureContext,
    pass: &mut ComposePass,
    block: &mut StatementBlock,
    value: Operand,
) -> Result<()> {
    let target = color_target(fd);
    let existed = pass.targets.find(target).is_some();
    let out = pass.targets.resolve(&mut pass.vars, target)?;
    if existed {
        block.push_op("@ = @ * @", vec![out.into(), out.into(), value])
    } else {
        block.push_op("@ = @", vec![out.into(), value])
    }
}

/// Samples the diffuse map into the color target.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffuseMap;

impl DiffuseMap {
    pub const SAMPLER: &'static str = "DiffuseMap";
}

impl ShaderFeature for DiffuseMap {
    fn name(&self) -> &'static str {
        "DiffuseMap"
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
        let (sampler, texture) = pass.vars.sampler_pair(Self::SAMPLER)?;
        let sample = GenOp::new(
            "textureSample(@, @, @)",
            vec![texture.into(), sampler.into(), tex_coord.into()],
        )?;

        let (diffuse, created) = pass
            .vars
            .lookup_or_insert(Var::local("diffuseColor", ShaderType::Vec4))?;
        block.push_op("@ = @", vec![decl_or_var(diffuse, created), sample.into()])?;
        write_color(fd, pass, &mut block, diffuse.into())?;
        Ok(block)
    }

    fn set_tex_data(
        &self,
        stage: &StageData,
        _fd: &FeatureContext,
        pass_data: &mut RenderPassData,
        cursor: &mut usize,
    ) -> Result<()> {
        bind_stage_texture(stage, TextureUsage::DiffuseMap, Self::SAMPLER, pass_data, cursor)
    }

    fn output_targets(&self, fd: &FeatureContext) -> TargetSet {
        color_target(fd).flag()
    }
}

/// Per-material constant diffuse color.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffuseColor;

impl ShaderFeature for DiffuseColor {
    fn name(&self) -> &'static str {
        "DiffuseColor"
    }

    fn resources(&self, _fd: &FeatureContext) -> Resources {
        Resources::new(0, 1)
    }

    fn process_pix(&self, fd: &FeatureContext, pass: &mut ComposePass) -> Result<StatementBlock> {
        let mut block = StatementBlock::new();
        let color = pass.vars.uniform("diffuseMaterialColor", ShaderType::Vec4)?;
        write_color(fd, pass, &mut block, color.into())?;
        Ok(block)
    }

    fn output_targets(&self, fd: &FeatureContext) -> TargetSet {
        color_target(fd).flag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadergen::feature_data::MaterialFeatures;
    use crate::shadergen::types::ShaderStage;

    fn pixel_pass(fd: &FeatureContext) -> ComposePass {
        let mut pass = ComposePass::new(fd);
        let mut block = StatementBlock::new();
        out_tex_coord(fd, &mut pass, &mut block).unwrap();
        pass.vars.begin_stage(ShaderStage::Pixel);
        pass
    }

    #[test]
    fn test_diffuse_color_alone_assigns_target() {
        let fd = FeatureContext::forward(MaterialFeatures::DIFFUSE_COLOR);
        let mut pass = pixel_pass(&fd);
        let block = DiffuseColor.process_pix(&fd, &mut pass).unwrap();
        assert_eq!(
            block.render(&pass.vars, "").unwrap(),
            "OUT.col = diffuseMaterialColor;\n"
        );
    }

    #[test]
    fn test_diffuse_color_modulates_diffuse_map() {
        let fd = FeatureContext::deferred(
            MaterialFeatures::DIFFUSE_MAP | MaterialFeatures::DIFFUSE_COLOR,
        );
        let mut pass = pixel_pass(&fd);
        let map = DiffuseMap.process_pix(&fd, &mut pass).unwrap();
        let color = DiffuseColor.process_pix(&fd, &mut pass).unwrap();

        assert_eq!(
            map.render(&pass.vars, "").unwrap(),
            "var diffuseColor: vec4f = textureSample(DiffuseMapTex, DiffuseMap, IN.texCoord);\n\
             OUT.col1 = diffuseColor;\n"
        );
        assert_eq!(
            color.render(&pass.vars, "").unwrap(),
            "OUT.col1 = OUT.col1 * diffuseMaterialColor;\n"
        );
    }

    #[test]
    fn test_diffuse_map_binds_one_slot() {
        let fd = FeatureContext::forward(MaterialFeatures::DIFFUSE_MAP);
        let stage = StageData::new().with_texture(
            TextureUsage::DiffuseMap,
            crate::shadergen::resources::TextureHandle("albedo".into()),
        );
        let mut pass_data = RenderPassData::with_slots(1);
        let mut cursor = 0;
        DiffuseMap
            .set_tex_data(&stage, &fd, &mut pass_data, &mut cursor)
            .unwrap();
        assert_eq!(cursor, 1);
        assert_eq!(pass_data.slots()[0].sampler_name, "DiffuseMap");
    }
}
