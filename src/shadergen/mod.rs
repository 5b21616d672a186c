//! Material shader composition.
//!
//! Features are invoked in material order once per stage. They share vars
//! through a pass-scoped [`VariableRegistry`], write pixel outputs through a
//! [`TargetRouter`], and declare their texture and register demand to the
//! [`ResourceAccountant`]. The same feature order later drives
//! [`bind_textures`], which must land every texture on the unit the shader
//! was composed with.

pub mod compose;
pub mod emitter;
pub mod error;
pub mod feature_data;
pub mod features;
pub mod ir;
pub mod registry;
pub mod resources;
pub mod router;
pub mod types;
pub mod validation;

pub use compose::{ComposePass, ComposedShader, compose};
pub use error::{ComposeError, Result};
pub use feature_data::{FeatureContext, MaterialFeatures, RenderBin};
pub use features::ShaderFeature;
pub use ir::{GenOp, Operand, Statement, StatementBlock};
pub use registry::VariableRegistry;
pub use resources::{
    BindingSlot, RenderPassData, ResourceAccountant, ResourceBudget, Resources, StageData,
    TexKind, TextureHandle, TextureUsage, bind_textures,
};
pub use router::{OutputTarget, TargetRouter, TargetSet};
pub use types::{ShaderStage, ShaderType, Var, VarId, VarRole};
