use super::{ShaderFeature, pbr_config_target};
use crate::shadergen::compose::ComposePass;
use crate::shadergen::error::Result;
use crate::shadergen::feature_data::FeatureContext;
use crate::shadergen::ir::StatementBlock;
use crate::shadergen::resources::Resources;
use crate::shadergen::router::{TargetSet, material_info_target};
use crate::shadergen::types::ShaderType;

/// Material flags into the red channel of the material-info target.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatInfoFlags;

impl ShaderFeature for MatInfoFlags {
    fn name(&self) -> &'static str {
        "MatInfoFlags"
    }

    fn resources(&self, _fd: &FeatureContext) -> Resources {
        Resources::new(0, 1)
    }

    fn process_pix(&self, fd: &FeatureContext, pass: &mut ComposePass) -> Result<StatementBlock> {
        let mut block = StatementBlock::new();
        let target = pbr_config_target(fd, pass, &mut block)?;
        let flags = pass.vars.uniform("matInfoFlags", ShaderType::F32)?;
        block.push_op("@.r = @", vec![target.into(), flags.into()])?;
        Ok(block)
    }

    fn output_targets(&self, fd: &FeatureContext) -> TargetSet {
        material_info_target(fd).flag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadergen::error::ComposeError;
    use crate::shadergen::feature_data::MaterialFeatures;
    use crate::shadergen::types::{ShaderStage, Var};

    #[test]
    fn test_deferred_writes_red_channel() {
        let fd = FeatureContext::deferred(MaterialFeatures::MAT_INFO_FLAGS);
        let mut pass = ComposePass::new(&fd);
        pass.vars.begin_stage(ShaderStage::Pixel);
        let block = MatInfoFlags.process_pix(&fd, &mut pass).unwrap();
        assert_eq!(
            block.render(&pass.vars, "").unwrap(),
            "OUT.col2.r = matInfoFlags;\n"
        );
    }

    #[test]
    fn test_forward_reuses_existing_pbr_config() {
        let fd = FeatureContext::forward(MaterialFeatures::MAT_INFO_FLAGS);
        let mut pass = ComposePass::new(&fd);
        pass.vars.begin_stage(ShaderStage::Pixel);
        pass.vars
            .create(Var::local("PBRConfig", ShaderType::Vec4))
            .unwrap();
        let block = MatInfoFlags.process_pix(&fd, &mut pass).unwrap();
        assert_eq!(
            block.render(&pass.vars, "").unwrap(),
            "PBRConfig.r = matInfoFlags;\n"
        );
    }

    #[test]
    fn test_forward_rejects_mistyped_pbr_config() {
        let fd = FeatureContext::forward(MaterialFeatures::MAT_INFO_FLAGS);
        let mut pass = ComposePass::new(&fd);
        pass.vars.begin_stage(ShaderStage::Pixel);
        pass.vars
            .create(Var::local("PBRConfig", ShaderType::Vec3))
            .unwrap();
        let err = MatInfoFlags.process_pix(&fd, &mut pass).unwrap_err();
        assert!(matches!(err, ComposeError::TypeMismatch { .. }));
    }
}
