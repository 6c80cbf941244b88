//! Documentation build command.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use walkdir::WalkDir;
use vitrine_md::PageRenderer;
use vitrine_sfc::{BuildPass, PipelineConfig};

use super::config::load_config;

/// File the concatenated demo styles are written to.
pub const STYLES_FILE: &str = "demos.css";

/// A markdown page found in the docs directory.
#[derive(Debug, Clone)]
pub struct Page {
    /// Source file path
    pub source_path: PathBuf,

    /// Relative path from docs dir
    pub relative_path: PathBuf,
}

/// Result of a build.
#[derive(Debug)]
pub struct BuildSummary {
    /// Number of pages written
    pub pages: usize,

    /// Number of components mounted or registered
    pub components: usize,

    /// Number of snippets that reported errors
    pub failures: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,
}

/// Find every markdown page under `docs_dir`, sorted by path.
pub fn discover_pages(docs_dir: &Path) -> Result<Vec<Page>> {
    if !docs_dir.is_dir() {
        anyhow::bail!("Docs directory not found: {}", docs_dir.display());
    }

    let mut pages = Vec::new();

    for entry in WalkDir::new(docs_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != "md" {
            continue;
        }

        let relative_path = path.strip_prefix(docs_dir).unwrap_or(path).to_path_buf();

        pages.push(Page {
            source_path: path.to_path_buf(),
            relative_path,
        });
    }

    Ok(pages)
}

/// Render every page to an HTML fragment and write the collected styles.
pub fn build_site(
    docs_dir: &Path,
    output_dir: &Path,
    config: PipelineConfig,
) -> Result<BuildSummary> {
    let start = Instant::now();
    let pages = discover_pages(docs_dir)?;

    let mut pass = BuildPass::new(config);
    let mut renderer = PageRenderer::new();
    let mut summary = BuildSummary {
        pages: 0,
        components: 0,
        failures: 0,
        duration_ms: 0,
    };

    for page in &pages {
        let markdown = fs::read_to_string(&page.source_path)
            .with_context(|| format!("Failed to read {}", page.source_path.display()))?;

        let rendered = renderer.render(&markdown, &mut pass);
        for snippet in &rendered.snippets {
            if snippet.output.has_error() {
                tracing::warn!(
                    "Snippet at {}:{} failed to compile cleanly",
                    page.source_path.display(),
                    snippet.line_number
                );
                summary.failures += 1;
            }
        }
        summary.components += rendered.components();

        let output_path = output_dir.join(&page.relative_path).with_extension("html");
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(
            &output_path,
            format!("<div class=\"module\">\n{}</div>\n", rendered.html),
        )
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

        summary.pages += 1;
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let styles_path = output_dir.join(STYLES_FILE);
    fs::write(&styles_path, pass.concatenated_styles())
        .with_context(|| format!("Failed to write {}", styles_path.display()))?;

    summary.duration_ms = start.elapsed().as_millis() as u64;
    Ok(summary)
}

/// Run the build command.
pub fn run(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    tracing::info!("Building documentation...");

    let config = load_config(config_path)?;
    let output_dir = output.unwrap_or(config.docs.output);

    let summary = build_site(&config.docs.dir, &output_dir, config.build)?;

    tracing::info!(
        "Built {} pages with {} components in {}ms",
        summary.pages,
        summary.components,
        summary.duration_ms
    );
    if summary.failures > 0 {
        tracing::warn!("{} snippet(s) rendered without a working demo", summary.failures);
    }

    tracing::info!("Output: {}", output_dir.display());

    Ok(())
}
