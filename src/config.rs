use crate::backend::DiskBackend;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// Configuration for a [`Stash`](crate::Stash) instance.
#[derive(Debug, Clone)]
pub struct StashConfig {
    /// Prefix isolating this instance's keys from other consumers of the
    /// same backend. Empty means no isolation.
    pub namespace: String,
    /// Applied when `set` is called without a per-call ttl. `None` means
    /// entries never expire by default.
    pub default_ttl: Option<Duration>,
    /// Emit `warn!` diagnostics on recoverable failures. Never affects
    /// return values.
    pub warnings: bool,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            default_ttl: None,
            warnings: true,
        }
    }
}

impl StashConfig {
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }
}

/// On-disk configuration for the CLI, loaded from a YAML file.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub default_ttl_ms: Option<u64>,
    #[serde(default)]
    pub warnings: Option<bool>,
    #[serde(default)]
    pub data_path: Option<String>,
}

impl AppConfig {
    /// Loads the default config file, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "kvstash", "kvstash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        DiskBackend::default_data_path()
    }

    /// Resolves the store configuration, with `namespace` overridable from
    /// the command line.
    pub fn stash_config(&self, namespace_override: Option<&str>) -> StashConfig {
        StashConfig {
            namespace: namespace_override
                .map(str::to_string)
                .or_else(|| self.namespace.clone())
                .unwrap_or_default(),
            default_ttl: self.default_ttl_ms.map(Duration::from_millis),
            warnings: self.warnings.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
namespace: "app"
default_ttl_ms: 60000
warnings: false
data_path: "/tmp/kvstash-test"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.namespace.as_deref(), Some("app"));
        assert_eq!(config.default_ttl_ms, Some(60_000));
        assert_eq!(config.warnings, Some(false));
        assert_eq!(config.data_path.as_deref(), Some("/tmp/kvstash-test"));

        let stash_config = config.stash_config(None);
        assert_eq!(stash_config.namespace, "app");
        assert_eq!(stash_config.default_ttl, Some(Duration::from_secs(60)));
        assert!(!stash_config.warnings);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        let stash_config = config.stash_config(None);
        assert_eq!(stash_config.namespace, "");
        assert_eq!(stash_config.default_ttl, None);
        assert!(stash_config.warnings);
    }

    #[test]
    fn test_namespace_override_wins() {
        let config: AppConfig = serde_yaml::from_str("namespace: app").unwrap();
        let stash_config = config.stash_config(Some("other"));
        assert_eq!(stash_config.namespace, "other");
    }
}
