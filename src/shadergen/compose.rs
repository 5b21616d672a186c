//! Composition driver: runs the ordered feature list through both stages.

use super::emitter;
use super::error::{ComposeError, Result};
use super::feature_data::FeatureContext;
use super::features::ShaderFeature;
use super::ir::StatementBlock;
use super::registry::VariableRegistry;
use super::resources::{
    ConstantBinding, ResourceAccountant, ResourceBudget, Resources, TextureBinding,
};
use super::router::{OutputTarget, TargetRouter, TargetSet};
use super::types::ShaderStage;

/// State scoped to composing one material variant.
///
/// Nothing here outlives the pass, so independent materials never share vars
/// or counters.
#[derive(Debug)]
pub struct ComposePass {
    pub vars: VariableRegistry,
    pub targets: TargetRouter,
}

impl ComposePass {
    pub fn new(fd: &FeatureContext) -> Self {
        Self {
            vars: VariableRegistry::new(),
            targets: TargetRouter::new(fd.render_targets),
        }
    }

    fn allocated(&self) -> Resources {
        Resources::new(
            self.vars.texture_units_used(),
            self.vars.constant_registers_used(),
        )
    }
}

/// Shader source and resource layout of one material variant.
#[derive(Clone, Debug)]
pub struct ComposedShader {
    pub vertex: String,
    pub pixel: String,
    /// Texture units in unit order.
    pub textures: Vec<TextureBinding>,
    /// Constant registers in register order.
    pub constants: Vec<ConstantBinding>,
    /// Written pixel targets in location order.
    pub targets: Vec<OutputTarget>,
    pub resources: Resources,
}

fn run_stage(
    stage: ShaderStage,
    features: &[Box<dyn ShaderFeature>],
    fd: &FeatureContext,
    pass: &mut ComposePass,
    allocated: &mut [Resources],
) -> Result<Vec<StatementBlock>> {
    pass.vars.begin_stage(stage);
    let mut blocks = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let before = pass.allocated();
        let block = match stage {
            ShaderStage::Vertex => feature.process_vert(fd, pass)?,
            ShaderStage::Pixel => feature.process_pix(fd, pass)?,
        };
        allocated[i] += pass.allocated() - before;
        log::debug!(
            "{stage:?} {}: {} statements",
            feature.name(),
            block.len()
        );
        blocks.push(block);
    }
    Ok(blocks)
}

/// Compose vertex and pixel source for `features`, invoked in slice order.
pub fn compose(
    features: &[Box<dyn ShaderFeature>],
    fd: &FeatureContext,
    budget: &ResourceBudget,
) -> Result<ComposedShader> {
    let accountant = ResourceAccountant::tally(features, fd, budget)?;
    let mut pass = ComposePass::new(fd);
    let mut allocated = vec![Resources::default(); features.len()];

    let vert_blocks = run_stage(ShaderStage::Vertex, features, fd, &mut pass, &mut allocated)?;
    let pix_blocks = run_stage(ShaderStage::Pixel, features, fd, &mut pass, &mut allocated)?;

    for (i, res) in allocated.iter().enumerate() {
        accountant.check_allocation(i, *res)?;
    }

    let declared = features
        .iter()
        .fold(TargetSet::empty(), |acc, f| acc | f.output_targets(fd));
    for (target, _) in pass.targets.resolved() {
        if !declared.contains(target.flag()) {
            log::warn!("{target:?} written outside of any feature's declared targets");
            return Err(ComposeError::UndeclaredTarget { target });
        }
    }

    let vertex = emitter::emit_vertex(&pass.vars, &vert_blocks)?;
    let pixel = emitter::emit_pixel(&pass.vars, &pass.targets, &pix_blocks)?;

    Ok(ComposedShader {
        vertex,
        pixel,
        textures: texture_bindings(&pass.vars),
        constants: constant_bindings(&pass.vars),
        targets: pass.targets.resolved().map(|(t, _)| t).collect(),
        resources: accountant.totals(),
    })
}

fn texture_bindings(vars: &VariableRegistry) -> Vec<TextureBinding> {
    let mut out: Vec<TextureBinding> = [ShaderStage::Vertex, ShaderStage::Pixel]
        .into_iter()
        .flat_map(|stage| vars.vars_in_stage(stage))
        .filter(|(_, v)| v.is_sampler())
        .filter_map(|(_, v)| {
            Some(TextureBinding {
                unit: v.texture_unit()?,
                sampler_name: v.name.clone(),
                texture_name: format!("{}Tex", v.name),
            })
        })
        .collect();
    out.sort_by_key(|b| b.unit);
    out
}

fn constant_bindings(vars: &VariableRegistry) -> Vec<ConstantBinding> {
    let mut out: Vec<ConstantBinding> = [ShaderStage::Vertex, ShaderStage::Pixel]
        .into_iter()
        .flat_map(|stage| vars.vars_in_stage(stage).map(move |(_, v)| (stage, v)))
        .filter_map(|(stage, v)| {
            Some(ConstantBinding {
                register: v.constant_register()?,
                name: v.name.clone(),
                ty: v.ty,
                stage,
            })
        })
        .collect();
    out.sort_by_key(|b| b.register);
    out
}
