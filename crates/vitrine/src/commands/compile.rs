//! Compile one snippet file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use vitrine_sfc::{BuildPass, ScopeId};

use super::config::load_config;

/// Compile `file` and return what would be printed.
pub fn compile_file(
    pass: &mut BuildPass,
    file: &Path,
    styles: Option<&Path>,
    expression: bool,
) -> Result<String> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if expression {
        let targets = &pass.config().targets;
        return Ok(pass
            .assembler()
            .compile_snippet(&source, ScopeId::new(1), targets)?);
    }

    let output = pass.compile_embedded_components(&source);
    if output.is_empty() {
        tracing::warn!("{} produced no demo script", file.display());
    }

    if let Some(styles) = styles {
        fs::write(styles, pass.concatenated_styles())
            .with_context(|| format!("Failed to write {}", styles.display()))?;
        tracing::info!(
            "Wrote {} style section(s) to {}",
            pass.styles().len(),
            styles.display()
        );
    }

    Ok(output.script_markup)
}

/// Run the compile command.
pub fn run(config_path: &Path, file: &Path, styles: Option<&Path>, expression: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let mut pass = BuildPass::new(config.build);

    let printed = compile_file(&mut pass, file, styles, expression)?;
    println!("{}", printed);

    Ok(())
}
