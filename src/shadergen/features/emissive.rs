use super::ShaderFeature;
use crate::shadergen::compose::ComposePass;
use crate::shadergen::error::Result;
use crate::shadergen::feature_data::FeatureContext;
use crate::shadergen::ir::StatementBlock;
use crate::shadergen::router::{OutputTarget, TargetSet};

/// Routes the diffuse color into the scene-color target of the deferred pass.
///
/// Emission reuses the diffuse color; there is no dedicated emissive texture.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredEmissive;

impl ShaderFeature for DeferredEmissive {
    fn name(&self) -> &'static str {
        "DeferredEmissive"
    }

    fn process_pix(&self, _fd: &FeatureContext, pass: &mut ComposePass) -> Result<StatementBlock> {
        let mut block = StatementBlock::new();
        let Some(diffuse) = pass.targets.find(OutputTarget::RenderTarget1) else {
            log::debug!("no diffuse target written, skipping deferred emissive");
            return Ok(block);
        };
        let scene_color = pass
            .targets
            .resolve(&mut pass.vars, OutputTarget::RenderTarget3)?;
        block.push_op(
            "@ = vec4f(@.rgb, 0.0)",
            vec![scene_color.into(), diffuse.into()],
        )?;
        Ok(block)
    }

    fn output_targets(&self, _fd: &FeatureContext) -> TargetSet {
        TargetSet::RENDER_TARGET_3
    }
}
