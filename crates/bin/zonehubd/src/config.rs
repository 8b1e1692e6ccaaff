//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `zonehub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use zonehub_app::monitor::MonitorConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Monitor tuning.
    pub monitor: MonitorSection,
    /// Event bus settings.
    pub bus: BusConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Extension toggles.
    pub integrations: IntegrationsConfig,
}

/// `[monitor]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Seconds between two expiry sweeps.
    pub sweep_interval_secs: u64,
    /// Lease granted to the daemon's own monitor groups.
    pub default_lease_secs: u64,
}

/// `[bus]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Events buffered per consumer before the slowest one starts lagging.
    pub capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Per-extension toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    /// Enable the virtual/demo extension.
    pub virtual_enabled: bool,
}

impl Config {
    /// Load configuration from `zonehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("zonehub.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(secs) = var("ZONEHUB_SWEEP_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.monitor.sweep_interval_secs = secs;
        }
        if let Some(secs) = var("ZONEHUB_LEASE_SECS").and_then(|v| v.parse().ok()) {
            self.monitor.default_lease_secs = secs;
        }
        if let Some(capacity) = var("ZONEHUB_BUS_CAPACITY").and_then(|v| v.parse().ok()) {
            self.bus.capacity = capacity;
        }
        if let Some(val) = var("ZONEHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.sweep_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "sweep interval must be non-zero".to_string(),
            ));
        }
        if self.monitor.default_lease_secs == 0 {
            return Err(ConfigError::Validation("lease must be non-zero".to_string()));
        }
        if self.bus.capacity == 0 {
            return Err(ConfigError::Validation(
                "bus capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings handed to the monitor.
    #[must_use]
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            sweep_interval: Duration::from_secs(self.monitor.sweep_interval_secs),
        }
    }

    /// Lease of the daemon's own monitor groups.
    #[must_use]
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.monitor.default_lease_secs)
    }
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 5,
            default_lease_secs: 60,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "zonehubd=info,zonehub_app=info,zonehub_adapter_virtual=info".to_string(),
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            virtual_enabled: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
