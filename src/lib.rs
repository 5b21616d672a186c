//! Per-material WGSL assembly from composable shader features.

pub mod material;
pub mod shadergen;
