//! Read-only material description consumed by every feature during a pass.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Capability flags of one material variant.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MaterialFeatures: u32 {
        const VERT_POSITION = 1 << 0;
        const DIFFUSE_MAP = 1 << 1;
        const DIFFUSE_COLOR = 1 << 2;
        const PBR_CONFIG_MAP = 1 << 3;
        const PBR_CONFIG_VARS = 1 << 4;
        const MAT_INFO_FLAGS = 1 << 5;
        const DEFERRED_EMISSIVE = 1 << 6;
        const INVERT_SMOOTHNESS = 1 << 7;
        const TEX_ANIM = 1 << 8;
    }
}

/// Classification of the render pass the material is drawn in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderBin {
    #[default]
    Regular,
    Glow,
    Deferred,
    Highlight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureContext {
    pub features: MaterialFeatures,
    pub bin: RenderBin,
    /// Number of color targets the render pass provides.
    pub render_targets: u32,
}

impl FeatureContext {
    pub fn new(features: MaterialFeatures, bin: RenderBin, render_targets: u32) -> Self {
        Self {
            features,
            bin,
            render_targets,
        }
    }

    /// Single-target forward rendering in the regular bin.
    pub fn forward(features: MaterialFeatures) -> Self {
        Self::new(features, RenderBin::Regular, 1)
    }

    /// Deferred bin with the full G-buffer (diffuse, material info, scene color).
    pub fn deferred(features: MaterialFeatures) -> Self {
        Self::new(features, RenderBin::Deferred, 4)
    }

    pub fn has(&self, feature: MaterialFeatures) -> bool {
        self.features.contains(feature)
    }

    pub fn is_deferred(&self) -> bool {
        self.bin == RenderBin::Deferred
    }
}
