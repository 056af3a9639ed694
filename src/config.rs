//! Ambient configuration for the catalog tool: which external tool to
//! invoke, where to look for bundles, and how to report the results.
//!
//! Loaded in layers, lowest to highest precedence: built-in defaults, a
//! config file (TOML or YAML, first one found wins), then environment
//! variables. Mirrors the teacher's `Config::load` layering, scaled down to
//! the handful of settings this crate actually has.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Name of the catalog tool to invoke (`ansible-galaxy` by default).
    pub tool: String,

    /// Extra collection search paths, colon-joined and exported as
    /// `ANSIBLE_COLLECTIONS_PATH` when discovering bundles.
    pub collections_path: Option<String>,

    /// Log verbosity passed to `tracing_subscriber`'s `EnvFilter` when
    /// `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            tool: "ansible-galaxy".to_string(),
            collections_path: None,
            log_level: "warn".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Loads configuration from an explicit path (if given), falling back
    /// to `./plugincat.toml`/`./plugincat.yml`, then applying environment
    /// overrides.
    pub fn load(explicit_path: Option<&PathBuf>) -> Result<Self, CatalogError> {
        let mut config = Self::default();

        for path in Self::candidate_paths(explicit_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn candidate_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }
        let mut paths = vec![
            PathBuf::from("plugincat.toml"),
            PathBuf::from("plugincat.yml"),
            PathBuf::from("plugincat.yaml"),
        ];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config/plugincat.toml"));
            paths.push(home.join(".config/plugincat/config.toml"));
        }
        paths
    }

    fn merge_from_file(&self, path: &PathBuf) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: CatalogConfig = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .map_err(|e| CatalogError::Config(format!("{}: {e}", path.display())))?,
            _ => toml::from_str(&content)
                .map_err(|e| CatalogError::Config(format!("{}: {e}", path.display())))?,
        };

        Ok(file_config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(tool) = std::env::var("PLUGINCAT_TOOL") {
            self.tool = tool;
        }
        if let Ok(path) = std::env::var("PLUGINCAT_COLLECTIONS_PATH") {
            self.collections_path = Some(path);
        }
        if let Ok(level) = std::env::var("PLUGINCAT_LOG_LEVEL") {
            self.log_level = level;
        }
    }
}
