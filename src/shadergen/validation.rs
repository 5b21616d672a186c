//! WGSL validation using the naga library.

use anyhow::{Context, Result, anyhow};

use super::compose::ComposedShader;

/// Parse and validate WGSL source code with naga.
///
/// # Returns
/// The parsed naga Module on success, or an error carrying the numbered
/// source on failure.
pub fn validate_wgsl(source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("WGSL parse failed:\n{}", format_with_source(source, &e)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| anyhow!("WGSL validation failed:\n{}", format_with_source(source, &e)))?;

    Ok(module)
}

/// Validate WGSL and name what generated it in the error.
pub fn validate_wgsl_with_context(source: &str, context: &str) -> Result<naga::Module> {
    validate_wgsl(source).with_context(|| format!("{} generated invalid WGSL", context))
}

/// Validate both stages of a composed material.
pub fn validate_composed(shader: &ComposedShader, material: &str) -> Result<()> {
    validate_wgsl_with_context(&shader.vertex, &format!("material {material} (vertex)"))?;
    validate_wgsl_with_context(&shader.pixel, &format!("material {material} (pixel)"))?;
    Ok(())
}

/// Error message followed by the source with line numbers.
fn format_with_source(source: &str, error: &dyn std::fmt::Debug) -> String {
    let mut output = String::new();

    output.push_str(&format!("  {:?}\n", error));

    output.push_str("\nGenerated WGSL:\n");
    output.push_str("---\n");
    for (line_num, line) in source.lines().enumerate() {
        output.push_str(&format!("{:4} | {}\n", line_num + 1, line));
    }
    output.push_str("---\n");

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_wgsl() {
        let source = r#"
@vertex
fn vs_main(@location(0) position: vec3f) -> @builtin(position) vec4f {
    return vec4f(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4f {
    return vec4f(1.0, 0.0, 0.0, 1.0);
}
"#;
        assert!(validate_wgsl(source).is_ok());
    }

    #[test]
    fn test_invalid_wgsl_syntax() {
        let source = "fn invalid() -> { return vec4f(1.0); }"; // Missing type
        assert!(validate_wgsl(source).is_err());
    }

    #[test]
    fn test_invalid_wgsl_type_error() {
        let source = r#"
@fragment
fn fs_main() -> @location(0) vec4f {
    let x: vec4f = 1.0; // Type mismatch: assigning f32 to vec4f
    return x;
}
"#;
        assert!(validate_wgsl(source).is_err());
    }

    #[test]
    fn test_validate_with_context() {
        let source = "invalid wgsl";
        let result = validate_wgsl_with_context(source, "material test");
        assert!(result.is_err());
        let err_msg = format!("{:#}", result.unwrap_err());
        assert!(err_msg.contains("material test"));
    }
}
