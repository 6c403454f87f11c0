//! Configuration loading and store factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mathdrill_core::scoring::ScoringConfig;
use mathdrill_core::traits::ResultStore;

use crate::file::JsonFileStore;
use crate::memory::MemoryStore;

/// Where completed exam records go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// One JSON file per record under `dir`.
    File {
        #[serde(default = "default_results_dir")]
        dir: PathBuf,
    },
    /// Records are kept in memory for the life of the process.
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            dir: default_results_dir(),
        }
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("./mathdrill-results")
}

/// Rendering options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Display size in pixels of emitted SVG documents.
    #[serde(default = "default_canvas_size")]
    pub canvas_size: f64,
}

fn default_canvas_size() -> f64 {
    300.0
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_size: default_canvas_size(),
        }
    }
}

/// Top-level mathdrill configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MathdrillConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `mathdrill.toml` in the current directory
/// 2. `~/.config/mathdrill/config.toml`
///
/// Environment variable override: `MATHDRILL_RESULTS_DIR`.
pub fn load_config() -> Result<MathdrillConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MathdrillConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("mathdrill.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<MathdrillConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => MathdrillConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut MathdrillConfig) {
    if let Ok(dir) = std::env::var("MATHDRILL_RESULTS_DIR") {
        config.store = StoreConfig::File {
            dir: PathBuf::from(dir),
        };
    }

    if let StoreConfig::File { dir } = &mut config.store {
        *dir = PathBuf::from(resolve_env_vars(&dir.to_string_lossy()));
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("mathdrill"))
}

/// Create a store instance from its configuration.
pub fn create_store(config: &StoreConfig) -> Box<dyn ResultStore> {
    match config {
        StoreConfig::File { dir } => Box::new(JsonFileStore::new(dir)),
        StoreConfig::Memory => Box::new(MemoryStore::new()),
    }
}
