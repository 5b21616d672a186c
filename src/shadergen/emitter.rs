//! WGSL source emission.
//!
//! Binding layout:
//! - `@group(0)`: constant registers, one uniform per register
//! - `@group(1)`: textures, binding = texture unit
//! - `@group(2)`: samplers, binding = texture unit

use std::fmt::Write as _;

use super::error::Result;
use super::ir::StatementBlock;
use super::registry::VariableRegistry;
use super::router::TargetRouter;
use super::types::{ShaderStage, Var};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const PIXEL_ENTRY: &str = "fs_main";

pub const UNIFORM_GROUP: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;
pub const SAMPLER_GROUP: u32 = 2;

const INDENT: &str = "    ";

/// Module-scope declaration for a bound var, if it is one.
fn binding_decl(var: &Var) -> Option<String> {
    let slot = var.slot?;
    if var.is_texture() {
        Some(format!(
            "@group({TEXTURE_GROUP}) @binding({slot})\nvar {}: {};\n",
            var.name,
            var.ty.wgsl()
        ))
    } else if var.is_sampler() {
        Some(format!(
            "@group({SAMPLER_GROUP}) @binding({slot})\nvar {}: {};\n",
            var.name,
            var.ty.wgsl()
        ))
    } else if var.is_uniform() {
        Some(format!(
            "@group({UNIFORM_GROUP}) @binding({slot})\nvar<uniform> {}: {};\n",
            var.name,
            var.ty.wgsl()
        ))
    } else {
        None
    }
}

fn push_bindings(out: &mut String, vars: &VariableRegistry, stage: ShaderStage) {
    let decls: Vec<String> = vars
        .vars_in_stage(stage)
        .filter_map(|(_, v)| binding_decl(v))
        .collect();
    if decls.is_empty() {
        return;
    }
    for decl in decls {
        out.push_str(&decl);
    }
    out.push('\n');
}

fn push_vert_out(out: &mut String, vars: &VariableRegistry) {
    out.push_str("struct VertOut {\n");
    out.push_str("    @builtin(position) hpos: vec4f,\n");
    for v in vars.varyings() {
        let _ = writeln!(out, "    @location({}) {}: {},", v.location, v.name, v.ty.wgsl());
    }
    out.push_str("};\n\n");
}

fn push_blocks(out: &mut String, vars: &VariableRegistry, blocks: &[StatementBlock]) -> Result<()> {
    for block in blocks {
        out.push_str(&block.render(vars, INDENT)?);
    }
    Ok(())
}

/// Standalone vertex module: bindings, IO structs and the `vs_main` entry.
pub fn emit_vertex(vars: &VariableRegistry, blocks: &[StatementBlock]) -> Result<String> {
    let mut out = String::new();
    push_bindings(&mut out, vars, ShaderStage::Vertex);

    let mut inputs: Vec<&Var> = vars
        .vars_in_stage(ShaderStage::Vertex)
        .map(|(_, v)| v)
        .filter(|v| v.struct_name.as_deref() == Some("IN"))
        .collect();
    inputs.sort_by_key(|v| v.location);

    if !inputs.is_empty() {
        out.push_str("struct VertIn {\n");
        for v in &inputs {
            let _ = writeln!(
                out,
                "    @location({}) {}: {},",
                v.location.unwrap_or_default(),
                v.name,
                v.ty.wgsl()
            );
        }
        out.push_str("};\n\n");
    }
    push_vert_out(&mut out, vars);

    out.push_str("@vertex\n");
    if inputs.is_empty() {
        let _ = writeln!(out, "fn {VERTEX_ENTRY}() -> VertOut {{");
    } else {
        let _ = writeln!(out, "fn {VERTEX_ENTRY}(IN: VertIn) -> VertOut {{");
    }
    out.push_str("    var OUT: VertOut;\n");
    push_blocks(&mut out, vars, blocks)?;
    out.push_str("    return OUT;\n}\n");
    Ok(out)
}

/// Standalone pixel module: bindings, IO structs and the `fs_main` entry.
pub fn emit_pixel(
    vars: &VariableRegistry,
    targets: &TargetRouter,
    blocks: &[StatementBlock],
) -> Result<String> {
    let mut out = String::new();
    push_bindings(&mut out, vars, ShaderStage::Pixel);
    push_vert_out(&mut out, vars);

    let resolved: Vec<_> = targets.resolved().collect();
    if !resolved.is_empty() {
        out.push_str("struct FragOut {\n");
        for (target, _) in &resolved {
            let _ = writeln!(
                out,
                "    @location({}) {}: vec4f,",
                target.location(),
                target.var_name()
            );
        }
        out.push_str("};\n\n");
    }

    out.push_str("@fragment\n");
    if resolved.is_empty() {
        let _ = writeln!(out, "fn {PIXEL_ENTRY}(IN: VertOut) {{");
        push_blocks(&mut out, vars, blocks)?;
        out.push_str("}\n");
    } else {
        let _ = writeln!(out, "fn {PIXEL_ENTRY}(IN: VertOut) -> FragOut {{");
        out.push_str("    var OUT: FragOut;\n");
        push_blocks(&mut out, vars, blocks)?;
        out.push_str("    return OUT;\n}\n");
    }
    Ok(out)
}
