//! Manager configuration and its TOML loader.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

/// Tuning knobs for a [`Manager`](crate::Manager).
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Seconds between root executions.
    pub update_frequency: f32,
    /// Restart the tree when it finishes instead of settling in `Completed`.
    pub loop_tree: bool,
    /// Start the default tree during `begin_play`.
    pub auto_start: bool,
    /// Log lifecycle transitions at debug level.
    pub debug_mode: bool,
    /// Capacity of the manager's outbound event channel.
    pub event_buffer_size: usize,
    /// Seed for the manager's RNG; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            update_frequency: 0.1,
            loop_tree: true,
            auto_start: true,
            debug_mode: false,
            event_buffer_size: 100,
            seed: None,
        }
    }
}

/// Loader for manager configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads a [`ManagerConfig`] from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<ManagerConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to load manager config from {}", path.display()))
    }

    /// Parses a [`ManagerConfig`] from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<ManagerConfig> {
        let config: ManagerConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        if config.event_buffer_size == 0 {
            anyhow::bail!("event_buffer_size must be at least 1");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ManagerConfig::default();
        assert_eq!(config.update_frequency, 0.1);
        assert!(config.loop_tree);
        assert!(config.auto_start);
        assert!(!config.debug_mode);
        assert_eq!(config.event_buffer_size, 100);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "update_frequency = 0.5\nloop_tree = false\nseed = 7").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.update_frequency, 0.5);
        assert!(!config.loop_tree);
        assert_eq!(config.seed, Some(7));
        assert!(config.auto_start);
        assert_eq!(config.event_buffer_size, 100);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = ConfigLoader::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }

    #[test]
    fn rejects_malformed_toml_and_zero_buffer() {
        assert!(ConfigLoader::parse("update_frequency = \"fast\"").is_err());
        assert!(ConfigLoader::parse("event_buffer_size = 0").is_err());
    }
}
