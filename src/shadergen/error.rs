//! Error type shared by every stage of a composition pass.

use super::router::OutputTarget;
use super::types::ShaderType;

pub type Result<T, E = ComposeError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("{resource} budget exceeded: material needs {requested}, limit is {limit}")]
    BudgetExceeded {
        resource: &'static str,
        requested: u32,
        limit: u32,
    },

    #[error("var `{path}` already declared as {existing:?}, requested as {requested:?}")]
    TypeMismatch {
        path: String,
        existing: ShaderType,
        requested: ShaderType,
    },

    #[error("var `{0}` is already declared in this stage")]
    DuplicateVar(String),

    #[error("unknown var id {0}")]
    UnknownVar(usize),

    #[error("template `{template}` has {placeholders} placeholders but {operands} operands")]
    OperandMismatch {
        template: String,
        placeholders: usize,
        operands: usize,
    },

    #[error("{target:?} needs {needed} render targets, only {available} available")]
    TargetUnavailable {
        target: OutputTarget,
        needed: u32,
        available: u32,
    },

    #[error("{target:?} was written but no feature lists it in its output targets")]
    UndeclaredTarget { target: OutputTarget },

    #[error("pixel stage reads varying `{0}` that the vertex stage never wrote")]
    MissingVarying(String),

    #[error("uniform `{0}` is used before the feature owning it ran")]
    MissingUniform(String),

    #[error("feature {feature} declared {declared} {resource} but allocated {allocated}")]
    ResourceMismatch {
        feature: &'static str,
        resource: &'static str,
        declared: u32,
        allocated: u32,
    },

    #[error("feature {feature} declared {declared} textures but bound {bound}")]
    BindingMismatch {
        feature: &'static str,
        declared: u32,
        bound: u32,
    },

    #[error("slot {slot} expects sampler `{expected}`, binding pass put `{found}`")]
    SlotMismatch {
        slot: usize,
        expected: String,
        found: String,
    },

    #[error("binding cursor {slot} is outside the {len} slots of this render pass")]
    SlotOutOfRange { slot: usize, len: usize },
}
