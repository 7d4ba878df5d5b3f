//! Configuration management for fleetlink
//!
//! Config stored at: ~/.config/fleetlink/config.json

use std::path::PathBuf;
use std::time::Duration;

use fleetlink_domain::service::AggregatorConfig;
use fleetlink_types::{ConfigError, DispatchMode, OutputFormat, Result};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store directory override
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// How per-vehicle operations are dispatched (sequential, concurrent)
    #[serde(default)]
    pub dispatch: DispatchMode,

    /// Worker threads for concurrent dispatch. 0 = CPU count.
    #[serde(default)]
    pub workers: usize,

    /// Upper bound for one reconcile call in milliseconds
    #[serde(default)]
    pub reconcile_timeout_ms: Option<u64>,
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: None,
            output_format: default_output_format(),
            dispatch: DispatchMode::default(),
            workers: 0,
            reconcile_timeout_ms: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("fleetlink");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the store directory path
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.store_dir {
            return Ok(dir.clone());
        }

        let store_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("fleetlink");
        Ok(store_dir)
    }

    /// Effective worker count
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    /// Set the reconcile timeout; 0 clears it
    pub fn set_reconcile_timeout_ms(&mut self, ms: u64) {
        self.reconcile_timeout_ms = (ms > 0).then_some(ms);
    }

    pub fn reconcile_timeout(&self) -> Option<Duration> {
        self.reconcile_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Aggregator settings derived from this config
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            dispatch: self.dispatch,
            workers: self.worker_count(),
            timeout: self.reconcile_timeout(),
        }
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Fleetlink Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Store dir:      {}",
            self.store_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Output format:  {}", self.output_format)?;
        writeln!(f, "Dispatch:       {}", self.dispatch)?;
        writeln!(f, "Workers:        {}", self.worker_count())?;
        match self.reconcile_timeout_ms {
            Some(ms) => writeln!(f, "Timeout:        {} ms", ms)?,
            None => writeln!(f, "Timeout:        (none)")?,
        }

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.output_format, OutputFormat::Table);
        assert_eq!(config.dispatch, DispatchMode::Concurrent);
        assert!(config.reconcile_timeout().is_none());
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_aggregator_config_follows_settings() {
        let config: Config = serde_json::from_str(
            r#"{"dispatch": "sequential", "workers": 3, "reconcile_timeout_ms": 1500}"#,
        )
        .unwrap();
        let aggregator = config.aggregator_config();
        assert_eq!(aggregator.dispatch, DispatchMode::Sequential);
        assert_eq!(aggregator.workers, 3);
        assert_eq!(aggregator.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_zero_timeout_means_no_timeout() {
        let mut config = Config::default();
        config.set_reconcile_timeout_ms(250);
        assert_eq!(config.reconcile_timeout(), Some(Duration::from_millis(250)));

        config.set_reconcile_timeout_ms(0);
        assert_eq!(config.reconcile_timeout_ms, None);
        assert!(config.aggregator_config().timeout.is_none());

        let loaded: Config = serde_json::from_str(r#"{"reconcile_timeout_ms": 0}"#).unwrap();
        assert!(loaded.reconcile_timeout().is_none());
    }
}
