//! Output target routing for the pixel stage.

use std::collections::BTreeMap;

use bitflags::bitflags;

use super::error::{ComposeError, Result};
use super::feature_data::FeatureContext;
use super::registry::VariableRegistry;
use super::types::{ShaderType, Var, VarId};

/// Struct the fragment outputs live in.
pub const FRAG_OUT_STRUCT: &str = "OUT";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputTarget {
    Default,
    RenderTarget1,
    RenderTarget2,
    RenderTarget3,
}

impl OutputTarget {
    /// Canonical member name inside the fragment output struct.
    pub fn var_name(self) -> &'static str {
        match self {
            OutputTarget::Default => "col",
            OutputTarget::RenderTarget1 => "col1",
            OutputTarget::RenderTarget2 => "col2",
            OutputTarget::RenderTarget3 => "col3",
        }
    }

    pub fn location(self) -> u32 {
        match self {
            OutputTarget::Default => 0,
            OutputTarget::RenderTarget1 => 1,
            OutputTarget::RenderTarget2 => 2,
            OutputTarget::RenderTarget3 => 3,
        }
    }

    pub fn flag(self) -> TargetSet {
        match self {
            OutputTarget::Default => TargetSet::DEFAULT,
            OutputTarget::RenderTarget1 => TargetSet::RENDER_TARGET_1,
            OutputTarget::RenderTarget2 => TargetSet::RENDER_TARGET_2,
            OutputTarget::RenderTarget3 => TargetSet::RENDER_TARGET_3,
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TargetSet: u8 {
        const DEFAULT = 1 << 0;
        const RENDER_TARGET_1 = 1 << 1;
        const RENDER_TARGET_2 = 1 << 2;
        const RENDER_TARGET_3 = 1 << 3;
    }
}

/// Where PBR config and material-info flags go.
pub fn material_info_target(fd: &FeatureContext) -> OutputTarget {
    if fd.is_deferred() {
        OutputTarget::RenderTarget2
    } else {
        OutputTarget::Default
    }
}

/// Where the diffuse color goes.
pub fn color_target(fd: &FeatureContext) -> OutputTarget {
    if fd.is_deferred() {
        OutputTarget::RenderTarget1
    } else {
        OutputTarget::Default
    }
}

/// Tracks the single output var declared per target in one pixel pass.
#[derive(Debug)]
pub struct TargetRouter {
    available: u32,
    resolved: BTreeMap<OutputTarget, VarId>,
}

impl TargetRouter {
    pub fn new(available: u32) -> Self {
        Self {
            available,
            resolved: BTreeMap::new(),
        }
    }

    /// The target var if some earlier feature already wrote it.
    pub fn find(&self, target: OutputTarget) -> Option<VarId> {
        self.resolved.get(&target).copied()
    }

    /// Find or create the output var for `target`.
    pub fn resolve(&mut self, vars: &mut VariableRegistry, target: OutputTarget) -> Result<VarId> {
        if let Some(id) = self.find(target) {
            return Ok(id);
        }
        let needed = target.location() + 1;
        if needed > self.available {
            return Err(ComposeError::TargetUnavailable {
                target,
                needed,
                available: self.available,
            });
        }
        let var = Var::member(FRAG_OUT_STRUCT, target.var_name(), ShaderType::Vec4)
            .at_location(target.location());
        let id = vars.find_or_create(var)?;
        self.resolved.insert(target, id);
        Ok(id)
    }

    /// Resolved targets in location order.
    pub fn resolved(&self) -> impl Iterator<Item = (OutputTarget, VarId)> + '_ {
        self.resolved.iter().map(|(t, id)| (*t, *id))
    }

    pub fn resolved_set(&self) -> TargetSet {
        self.resolved
            .keys()
            .fold(TargetSet::empty(), |acc, t| acc | t.flag())
    }
}
