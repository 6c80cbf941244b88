//! Configuration file (vitrine.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use vitrine_sfc::PipelineConfig;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub build: PipelineConfig,
}

#[derive(Debug, Deserialize)]
pub struct DocsConfig {
    #[serde(default = "default_docs_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            dir: default_docs_dir(),
            output: default_output(),
        }
    }
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}
fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

/// Load configuration from `path` if it exists.
///
/// Returns an error if the file exists but is malformed or names targets
/// the downleveler cannot resolve.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .build
        .targets
        .validate()
        .with_context(|| format!("Invalid [build] targets in {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_means_defaults() {
        let temp = tempdir().unwrap();

        let config = load_config(&temp.path().join("vitrine.toml")).unwrap();

        assert_eq!(config.docs.dir, PathBuf::from("docs"));
        assert_eq!(config.docs.output, PathBuf::from("dist"));
        assert_eq!(config.build, PipelineConfig::default());
    }

    #[test]
    fn reads_sections() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("vitrine.toml");
        fs::write(
            &path,
            r#"
[docs]
dir = "guide"

[build]
targets = ["chrome 49"]
demo_class = "demo-box"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.docs.dir, PathBuf::from("guide"));
        assert_eq!(config.docs.output, PathBuf::from("dist"));
        assert_eq!(config.build.targets.query(), "chrome 49");
        assert_eq!(config.build.demo_class, "demo-box");
        assert!(config.build.preserve_whitespace);
    }

    #[test]
    fn rejects_malformed_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("vitrine.toml");
        fs::write(&path, "[docs\ndir = ").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_unknown_targets() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("vitrine.toml");
        fs::write(&path, "[build]\ntargets = [\"not a browser 99\"]\n").unwrap();

        assert!(load_config(&path).is_err());
    }
}
