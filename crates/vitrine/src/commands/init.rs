//! Initialize documentation in a project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Write the default config to `config_path` and a sample page to `docs/`.
pub fn init_project(root: &Path, config_path: &Path, yes: bool) -> Result<()> {
    let docs_dir = root.join("docs");

    if docs_dir.exists() {
        if !yes {
            tracing::warn!("docs/ directory already exists. Use --yes to overwrite.");
            return Ok(());
        }
    } else {
        fs::create_dir_all(&docs_dir).context("Failed to create docs directory")?;
    }

    let config_path = root.join(config_path);
    if !config_path.exists() || yes {
        fs::write(&config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        tracing::info!("Created {}", config_path.display());
    }

    let index_path = docs_dir.join("index.md");
    if !index_path.exists() || yes {
        fs::write(&index_path, DEFAULT_INDEX).context("Failed to write index.md")?;
        tracing::info!("Created docs/index.md");
    }

    Ok(())
}

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing vitrine...");

    init_project(Path::new("."), config_path, yes)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'vitrine build' to render the docs.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Vitrine Configuration

[docs]
# Source directory for documentation
dir = "docs"

# Output directory for rendered pages
output = "dist"

[build]
# Browsers the demo scripts must run on (browserslist queries)
targets = ["last 2 versions", "ie >= 9"]

# Keep whitespace between elements in templates
preserve_whitespace = true

# Class of the element each demo is mounted into
demo_class = "rule-demo"
"#;

const DEFAULT_INDEX: &str = r#"# Components

Every `vue` code block with a `<template>` renders a live demo right above it.
Add `no-demo` after the language to show the source only.

::: DEMO
```vue
<template>
  <div class="counter">
    <button @click="count++">Clicked {{ count }} times</button>
    <badge-label :text="label"></badge-label>
  </div>
</template>
<script>
export default {
  data() {
    return { count: 0, label: 'new' };
  }
}
</script>
<style>
.counter button { padding: 4px 8px; }
</style>

<template>
  <span class="badge">{{ text }}</span>
</template>
<script>
export default {
  name: 'badge-label',
  props: ['text']
}
</script>
```
:::
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vitrine_md::find_snippets;
    use vitrine_sfc::{BuildPass, PipelineConfig};

    #[test]
    fn creates_config_and_sample_page() {
        let temp = tempdir().unwrap();

        init_project(temp.path(), Path::new("vitrine.toml"), false).unwrap();

        let config = fs::read_to_string(temp.path().join("vitrine.toml")).unwrap();
        assert!(config.contains("demo_class"));
        assert!(temp.path().join("docs/index.md").exists());
    }

    #[test]
    fn keeps_existing_docs_without_yes() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();

        init_project(temp.path(), Path::new("vitrine.toml"), false).unwrap();

        assert!(!temp.path().join("vitrine.toml").exists());
    }

    #[test]
    fn default_config_parses() {
        let config: crate::commands::config::ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap();

        assert_eq!(config.build, PipelineConfig::default());
    }

    #[test]
    fn sample_page_compiles_cleanly() {
        let snippets = find_snippets(DEFAULT_INDEX);
        assert_eq!(snippets.len(), 1);

        let mut pass = BuildPass::new(PipelineConfig::default());
        let output = pass.compile_embedded_components(&snippets[0].source);

        assert_eq!(output.components, 2);
        assert!(!output.has_error());
        assert!(output.diagnostics.is_empty());
    }
}
