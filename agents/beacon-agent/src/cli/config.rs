//! Configuration module
//!
//! Handles loading and validating agent configuration from TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::beacon::scheduler::BeaconTimings;
use crate::cli::duration::serde_text;

/// Main configuration structure for the Beacon Agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Collector settings
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Probe cadence and lookup settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Collector configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// URL to phone home to; the positional CLI argument takes precedence
    #[serde(default)]
    pub url: Option<String>,
}

/// Probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Timeout for an individual request
    #[serde(default = "default_timeout", with = "serde_text")]
    pub timeout: Duration,

    /// Delay after a failed probe
    #[serde(default = "default_retry", with = "serde_text")]
    pub retry: Duration,

    /// Delay after a successful probe
    #[serde(default = "default_interval", with = "serde_text")]
    pub interval: Duration,

    /// Public host:port used to learn the outbound address
    #[serde(default = "default_lookup_addr")]
    pub lookup_addr: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default)]
    pub format: LogFormat,

    /// Where probe outcome lines go
    #[serde(default)]
    pub sink: SinkKind,
}

/// Diagnostic log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Destination of the "Success"/"Error"/"Sleeping for" lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Bare lines on stdout
    #[default]
    Stdout,
    /// Info events through `tracing`
    Tracing,
}

// Default value functions
fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retry() -> Duration {
    Duration::from_secs(10)
}

fn default_interval() -> Duration {
    Duration::from_secs(6 * 60 * 60)
}

fn default_lookup_addr() -> String {
    "google.com:80".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retry: default_retry(),
            interval: default_interval(),
            lookup_addr: default_lookup_addr(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            sink: SinkKind::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            collector: CollectorConfig::default(),
            probe: ProbeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// The duration triple driving the scheduler
    pub fn timings(&self) -> BeaconTimings {
        BeaconTimings {
            timeout: self.probe.timeout,
            retry: self.probe.retry,
            interval: self.probe.interval,
        }
    }
}
