//! Configuration management for the Meridian world server.
//!
//! Settings come from a TOML file with three tables: `[server]` for process
//! wiring, `[world]` for simulation tuning and `[logging]`. Missing keys fall
//! back to their defaults; a missing file is created with every default
//! written out.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use world_server::{NavGrid, WorldConfig};

/// Default tick interval for serde deserialization
fn default_tick_interval() -> u64 {
    40 // 25 ticks per second
}

fn default_navgrid_offset() -> i64 {
    NavGrid::DEFAULT_OFFSET
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Simulation tuning, passed through to the world
    #[serde(default)]
    pub world: WorldConfig,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Process-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Server tick interval in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Level description to populate the world from; an empty world when unset
    #[serde(default)]
    pub level_path: Option<String>,
    /// Walkability grid for NPC pathfinding; an open grid when unset
    #[serde(default)]
    pub navgrid_path: Option<String>,
    /// World X coordinate of grid column 0
    #[serde(default = "default_navgrid_offset")]
    pub navgrid_offset_x: i64,
    /// World Z coordinate of grid row 0
    #[serde(default = "default_navgrid_offset")]
    pub navgrid_offset_z: i64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            level_path: None,
            navgrid_path: None,
            navgrid_offset_x: default_navgrid_offset(),
            navgrid_offset_z: default_navgrid_offset(),
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, a default configuration file is written
    /// there and the defaults are returned.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// The world configuration with server-level settings folded in.
    pub fn to_world_config(&self) -> WorldConfig {
        WorldConfig {
            tick_interval_ms: self.server.tick_interval_ms,
            ..self.world.clone()
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.tick_interval_ms == 0 {
            return Err("server.tick_interval_ms must be greater than 0".to_string());
        }

        for (name, path) in [
            ("level_path", &self.server.level_path),
            ("navgrid_path", &self.server.navgrid_path),
        ] {
            if matches!(path, Some(p) if p.trim().is_empty()) {
                return Err(format!("server.{name} cannot be empty when set"));
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        self.to_world_config()
            .validate()
            .map_err(|e| format!("world: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.server.tick_interval_ms, 40);
        assert!(config.server.level_path.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.server.tick_interval_ms, 40);
        assert!(path.exists());

        // The written file loads back to the same settings
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.world, config.world);
        assert_eq!(reloaded.logging.level, config.logging.level);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[server]
tick_interval_ms = 50
level_path = "levels/forest.json"
navgrid_offset_x = -64

[world]
aggro_radius = 8.0
rng_seed = 42

[logging]
level = "debug"
json_format = true
"#;
        let file = NamedTempFile::new().unwrap();
        tokio::fs::write(file.path(), toml_content).await.unwrap();

        let config = AppConfig::load_from_file(&file.path().to_path_buf())
            .await
            .unwrap();
        assert_eq!(config.server.tick_interval_ms, 50);
        assert_eq!(config.server.level_path.as_deref(), Some("levels/forest.json"));
        assert!(config.server.navgrid_path.is_none());
        assert_eq!(config.server.navgrid_offset_x, -64);
        assert_eq!(config.server.navgrid_offset_z, NavGrid::DEFAULT_OFFSET);
        assert_eq!(config.world.aggro_radius, 8.0);
        assert_eq!(config.world.interest_radius, 30.0);
        assert_eq!(config.world.rng_seed, Some(42));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);

        let world = config.to_world_config();
        assert_eq!(world.tick_interval_ms, 50);
        assert_eq!(world.aggro_radius, 8.0);
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_toml() {
        let file = NamedTempFile::new().unwrap();
        tokio::fs::write(file.path(), "[server\ntick_interval_ms = ").await.unwrap();
        assert!(AppConfig::load_from_file(&file.path().to_path_buf()).await.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_settings() {
        let mut config = AppConfig::default();
        config.server.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().unwrap_err().contains("loud"));

        let mut config = AppConfig::default();
        config.server.navgrid_path = Some("  ".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.world.aggro_radius = 100.0;
        assert!(config.validate().unwrap_err().starts_with("world:"));
    }

    #[test]
    fn test_valid_log_levels() {
        let mut config = AppConfig::default();
        for level in ["trace", "debug", "info", "warn", "error"] {
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "{level}");
        }
    }
}
