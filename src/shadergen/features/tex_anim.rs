use super::{ShaderFeature, TEX_MAT};
use crate::shadergen::compose::ComposePass;
use crate::shadergen::error::Result;
use crate::shadergen::feature_data::FeatureContext;
use crate::shadergen::ir::StatementBlock;
use crate::shadergen::resources::Resources;
use crate::shadergen::router::TargetSet;
use crate::shadergen::types::ShaderType;

/// Owns the texture matrix applied to the texcoord pass-through.
///
/// Must run before any feature that samples a texture so the pass-through
/// picks the matrix up.
#[derive(Debug, Default, Clone, Copy)]
pub struct TexAnim;

impl ShaderFeature for TexAnim {
    fn name(&self) -> &'static str {
        "TexAnim"
    }

    fn resources(&self, _fd: &FeatureContext) -> Resources {
        Resources::new(0, 1)
    }

    fn process_vert(&self, _fd: &FeatureContext, pass: &mut ComposePass) -> Result<StatementBlock> {
        pass.vars.uniform(TEX_MAT, ShaderType::Mat4)?;
        Ok(StatementBlock::new())
    }

    fn output_targets(&self, _fd: &FeatureContext) -> TargetSet {
        TargetSet::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadergen::error::ComposeError;
    use crate::shadergen::feature_data::MaterialFeatures;
    use crate::shadergen::features::DiffuseMap;

    #[test]
    fn test_texcoord_goes_through_tex_mat() {
        let fd =
            FeatureContext::forward(MaterialFeatures::DIFFUSE_MAP | MaterialFeatures::TEX_ANIM);
        let mut pass = ComposePass::new(&fd);
        assert!(TexAnim.process_vert(&fd, &mut pass).unwrap().is_empty());
        let block = DiffuseMap.process_vert(&fd, &mut pass).unwrap();

        assert_eq!(
            block.render(&pass.vars, "").unwrap(),
            "OUT.texCoord = (texMat * vec4f(IN.texCoord, 0.0, 1.0)).xy;\n"
        );
        let tex_mat = pass.vars.find(TEX_MAT).unwrap();
        assert_eq!(pass.vars.get(tex_mat).unwrap().constant_register(), Some(0));
    }

    #[test]
    fn test_plain_copy_without_flag() {
        let fd = FeatureContext::forward(MaterialFeatures::DIFFUSE_MAP);
        let mut pass = ComposePass::new(&fd);
        let block = DiffuseMap.process_vert(&fd, &mut pass).unwrap();
        assert_eq!(
            block.render(&pass.vars, "").unwrap(),
            "OUT.texCoord = IN.texCoord;\n"
        );
    }

    #[test]
    fn test_sampling_before_tex_anim_fails() {
        let fd =
            FeatureContext::forward(MaterialFeatures::DIFFUSE_MAP | MaterialFeatures::TEX_ANIM);
        let mut pass = ComposePass::new(&fd);
        let err = DiffuseMap.process_vert(&fd, &mut pass).unwrap_err();
        assert!(matches!(err, ComposeError::MissingUniform(name) if name == TEX_MAT));
    }
}
