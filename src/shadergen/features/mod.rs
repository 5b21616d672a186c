//! Shader feature trait and helpers shared by feature implementations.

pub mod diffuse;
pub mod emissive;
pub mod mat_info;
pub mod pbr_config;
pub mod position;
pub mod tex_anim;

pub use diffuse::{DiffuseColor, DiffuseMap};
pub use emissive::DeferredEmissive;
pub use mat_info::MatInfoFlags;
pub use pbr_config::{PbrConfigMap, PbrConfigVars};
pub use position::VertPosition;
pub use tex_anim::TexAnim;

use std::fmt;

use super::compose::ComposePass;
use super::error::{ComposeError, Result};
use super::feature_data::{FeatureContext, MaterialFeatures};
use super::ir::{Operand, StatementBlock};
use super::resources::{RenderPassData, Resources, StageData, TexKind, TextureUsage};
use super::router::{self, OutputTarget, TargetSet};
use super::types::{ShaderType, Var, VarId};

/// Name of the shared forward-path PBR config value.
pub const PBR_CONFIG: &str = "PBRConfig";

pub const TEX_COORD: &str = "texCoord";

/// Vertex-stage texture matrix owned by [`TexAnim`].
pub const TEX_MAT: &str = "texMat";

/// One shading capability contributing code to a material's shaders.
///
/// A feature is invoked once per stage, in the order the material lists it.
/// Vars shared with other features must go through the registry so the first
/// feature in order owns the declaration.
pub trait ShaderFeature: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Texture units and constant registers this feature allocates.
    ///
    /// Must match what `process_vert` and `process_pix` actually allocate.
    fn resources(&self, fd: &FeatureContext) -> Resources {
        let _ = fd;
        Resources::default()
    }

    fn process_vert(&self, fd: &FeatureContext, pass: &mut ComposePass) -> Result<StatementBlock> {
        let _ = (fd, pass);
        Ok(StatementBlock::new())
    }

    fn process_pix(&self, fd: &FeatureContext, pass: &mut ComposePass) -> Result<StatementBlock> {
        let _ = (fd, pass);
        Ok(StatementBlock::new())
    }

    /// Bind this feature's textures at `cursor`, advancing it once per texture.
    fn set_tex_data(
        &self,
        stage: &StageData,
        fd: &FeatureContext,
        pass_data: &mut RenderPassData,
        cursor: &mut usize,
    ) -> Result<()> {
        let _ = (stage, fd, pass_data, cursor);
        Ok(())
    }

    /// Pixel-stage targets this feature may write.
    fn output_targets(&self, fd: &FeatureContext) -> TargetSet {
        let _ = fd;
        TargetSet::DEFAULT
    }
}

/// `var x: T` when the caller just created `id`, plain `x` otherwise.
pub(crate) fn decl_or_var(id: VarId, created: bool) -> Operand {
    if created {
        Operand::Decl(id)
    } else {
        Operand::Var(id)
    }
}

/// Vertex input `IN.name`, assigned the next attribute location on creation.
pub(crate) fn vertex_input(pass: &mut ComposePass, name: &str, ty: ShaderType) -> Result<VarId> {
    let var = Var::member("IN", name, ty);
    if pass.vars.find(&var.path()).is_some() {
        return pass.vars.find_or_create(var);
    }
    let location = pass.vars.next_vertex_input_location();
    pass.vars.create(var.at_location(location))
}

/// Vertex stage: pass the mesh texcoord through to the pixel stage.
///
/// Emits the copy only for the first feature asking for it. With
/// `TEX_ANIM` the copy goes through the [`TEX_MAT`] uniform, which must
/// already be registered.
pub(crate) fn out_tex_coord(
    fd: &FeatureContext,
    pass: &mut ComposePass,
    block: &mut StatementBlock,
) -> Result<VarId> {
    if let Some(id) = pass.vars.find(&format!("OUT.{TEX_COORD}")) {
        return Ok(id);
    }
    let tex_mat = if fd.has(MaterialFeatures::TEX_ANIM) {
        let id = pass
            .vars
            .find(TEX_MAT)
            .ok_or_else(|| ComposeError::MissingUniform(TEX_MAT.to_string()))?;
        Some(id)
    } else {
        None
    };

    let location = pass.vars.declare_varying(TEX_COORD, ShaderType::Vec2)?;
    let out = pass
        .vars
        .create(Var::member("OUT", TEX_COORD, ShaderType::Vec2).at_location(location))?;
    let input = vertex_input(pass, TEX_COORD, ShaderType::Vec2)?;
    match tex_mat {
        Some(tex_mat) => block.push_op(
            "@ = (@ * vec4f(@, 0.0, 1.0)).xy",
            vec![out.into(), tex_mat.into(), input.into()],
        )?,
        None => block.push_op("@ = @", vec![out.into(), input.into()])?,
    }
    Ok(out)
}

/// Pixel stage: the interpolated texcoord written by [`out_tex_coord`].
pub(crate) fn in_tex_coord(pass: &mut ComposePass) -> Result<VarId> {
    let (location, ty) = pass
        .vars
        .varying(TEX_COORD)
        .map(|v| (v.location, v.ty))
        .ok_or_else(|| ComposeError::MissingVarying(TEX_COORD.to_string()))?;
    pass.vars
        .find_or_create(Var::member("IN", TEX_COORD, ty).at_location(location))
}

/// Where PBR config and material-info flags are written.
///
/// Deferred: the material-info render target. Forward: the shared
/// `PBRConfig` value, declared by whichever feature gets here first.
pub(crate) fn pbr_config_target(
    fd: &FeatureContext,
    pass: &mut ComposePass,
    block: &mut StatementBlock,
) -> Result<VarId> {
    match router::material_info_target(fd) {
        OutputTarget::Default => {
            let (id, created) = pass
                .vars
                .lookup_or_insert(Var::local(PBR_CONFIG, ShaderType::Vec4))?;
            if created {
                block.declare(id);
            }
            Ok(id)
        }
        target => pass.targets.resolve(&mut pass.vars, target),
    }
}

/// Bind the stage texture for `usage`, if the material has one.
pub(crate) fn bind_stage_texture(
    stage: &StageData,
    usage: TextureUsage,
    sampler_name: &str,
    pass_data: &mut RenderPassData,
    cursor: &mut usize,
) -> Result<()> {
    if let Some(texture) = stage.texture(usage) {
        pass_data.bind(cursor, sampler_name, TexKind::Standard, texture.clone())?;
    }
    Ok(())
}
