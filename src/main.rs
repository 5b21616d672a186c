use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use material_shadergen::material::{self, CompiledMaterial};
use material_shadergen::shadergen::validation;

const USAGE: &str = "--material-json <material.json>, --output-dir <dir>, --validate";

#[derive(Debug, Default, Clone)]
struct Cli {
    material_json: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    validate: bool,
}

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--validate" => {
                cli.validate = true;
                i += 1;
            }
            "--material-json" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --material-json"));
                };
                cli.material_json = Some(PathBuf::from(v));
                i += 2;
            }
            "--outputdir" | "--output-dir" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --output-dir"));
                };
                cli.output_dir = Some(PathBuf::from(v));
                i += 2;
            }
            other => {
                return Err(anyhow!("unknown argument: {other} (supported: {USAGE})"));
            }
        }
    }
    Ok(cli)
}

fn write_stage(output_dir: &Path, name: &str, stage: &str, source: &str) -> Result<PathBuf> {
    let mut out = output_dir.to_path_buf();
    out.push(format!("{name}.{stage}.wgsl"));
    std::fs::write(&out, source)
        .map_err(|e| anyhow!("failed to write {}: {e}", out.display()))?;
    Ok(out)
}

fn print_bindings(compiled: &CompiledMaterial) {
    let shader = &compiled.shader;
    println!("textures:");
    for (binding, slot) in shader.textures.iter().zip(compiled.pass_data.slots()) {
        let texture = slot
            .texture
            .as_ref()
            .map(|t| t.0.as_str())
            .unwrap_or("<none>");
        println!(
            "  unit {:2}  {} / {}  <- {}",
            binding.unit, binding.sampler_name, binding.texture_name, texture
        );
    }
    println!("constants:");
    for c in &shader.constants {
        println!(
            "  reg  {:2}  {}: {} ({:?})",
            c.register,
            c.name,
            c.ty.wgsl(),
            c.stage
        );
    }
    println!("targets:");
    for t in &shader.targets {
        println!("  @location({}) OUT.{}", t.location(), t.var_name());
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;
    let material_path = cli
        .material_json
        .ok_or_else(|| anyhow!("--material-json <material.json> is required"))?;

    let desc = material::load_material_from_path(&material_path)?;
    let compiled = material::compile_material(&desc)?;

    if cli.validate {
        validation::validate_composed(&compiled.shader, &desc.name)?;
        log::info!("material {}: both stages validated", desc.name);
    }

    match cli.output_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .map_err(|e| anyhow!("failed to create {}: {e}", dir.display()))?;
            let vertex = write_stage(&dir, &desc.name, "vertex", &compiled.shader.vertex)?;
            let pixel = write_stage(&dir, &desc.name, "pixel", &compiled.shader.pixel)?;
            println!("saved: {}", vertex.display());
            println!("saved: {}", pixel.display());
        }
        None => {
            println!("// ---- {}.vertex.wgsl ----", desc.name);
            print!("{}", compiled.shader.vertex);
            println!("// ---- {}.pixel.wgsl ----", desc.name);
            print!("{}", compiled.shader.pixel);
        }
    }

    print_bindings(&compiled);
    Ok(())
}
