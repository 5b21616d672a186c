use super::{ShaderFeature, vertex_input};
use crate::shadergen::compose::ComposePass;
use crate::shadergen::error::Result;
use crate::shadergen::feature_data::FeatureContext;
use crate::shadergen::ir::StatementBlock;
use crate::shadergen::resources::Resources;
use crate::shadergen::router::TargetSet;
use crate::shadergen::types::{ShaderType, Var};

/// Transforms the object-space vertex position to clip space.
#[derive(Debug, Default, Clone, Copy)]
pub struct VertPosition;

impl ShaderFeature for VertPosition {
    fn name(&self) -> &'static str {
        "VertPosition"
    }

    fn resources(&self, _fd: &FeatureContext) -> Resources {
        Resources::new(0, 1)
    }

    fn process_vert(&self, _fd: &FeatureContext, pass: &mut ComposePass) -> Result<StatementBlock> {
        let mut block = StatementBlock::new();
        let position = vertex_input(pass, "position", ShaderType::Vec3)?;
        let modelview = pass.vars.uniform("modelview", ShaderType::Mat4)?;
        let hpos = pass
            .vars
            .find_or_create(Var::member("OUT", "hpos", ShaderType::Vec4))?;
        block.push_op(
            "@ = @ * vec4f(@, 1.0)",
            vec![hpos.into(), modelview.into(), position.into()],
        )?;
        Ok(block)
    }

    fn output_targets(&self, _fd: &FeatureContext) -> TargetSet {
        TargetSet::empty()
    }
}
