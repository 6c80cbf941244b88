//! Report diagnostics for every snippet without writing output.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use vitrine_md::find_snippets;
use vitrine_sfc::{BuildPass, PipelineConfig};

use super::build::discover_pages;
use super::config::load_config;

/// Totals of a check run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub snippets: usize,
    pub errors: usize,
    pub warnings: usize,
}

/// Compile every snippet under `docs_dir`, returning one line per
/// diagnostic as `path:line: severity: message`.
pub fn check_docs(docs_dir: &Path, config: PipelineConfig) -> Result<(Vec<String>, CheckSummary)> {
    let mut pass = BuildPass::new(config);
    let mut lines = Vec::new();
    let mut summary = CheckSummary::default();

    for page in discover_pages(docs_dir)? {
        let markdown = fs::read_to_string(&page.source_path)
            .with_context(|| format!("Failed to read {}", page.source_path.display()))?;

        for snippet in find_snippets(&markdown) {
            summary.snippets += 1;
            let output = pass.compile_embedded_components(&snippet.source);

            for diagnostic in &output.diagnostics {
                let line = diagnostic
                    .span
                    .map(|span| snippet.source_line(span.line))
                    .unwrap_or(snippet.line_number);
                lines.push(format!(
                    "{}:{}: {}: {}",
                    page.relative_path.display(),
                    line,
                    diagnostic.severity,
                    diagnostic.message
                ));

                if diagnostic.is_error() {
                    summary.errors += 1;
                } else if diagnostic.severity == vitrine_sfc::Severity::Warning {
                    summary.warnings += 1;
                }
            }
        }
    }

    Ok((lines, summary))
}

/// Run the check command.
pub fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    let (lines, summary) = check_docs(&config.docs.dir, config.build)?;
    for line in &lines {
        println!("{}", line);
    }

    tracing::info!(
        "Checked {} snippets: {} errors, {} warnings",
        summary.snippets,
        summary.errors,
        summary.warnings
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn reports_diagnostics_with_file_lines() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("page.md"),
            "# Page\n\n```vue\n<template>\n  <div>\n    <span>oops\n  </div>\n</template>\n```\n\n```vue\n<template><p>{{ fine }}</p></template>\n```\n",
        )
        .unwrap();

        let (lines, summary) = check_docs(temp.path(), PipelineConfig::default()).unwrap();

        assert_eq!(
            summary,
            CheckSummary {
                snippets: 2,
                errors: 1,
                warnings: 0
            }
        );
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("page.md:6: error: tag <span> has no matching end tag."));
    }
}
