//! Configuration management for Textgate.
//!
//! Configuration is layered: serde defaults, then an optional YAML file, then
//! `TEXTGATE__*` environment variables (`__` separates nested keys, so
//! `TEXTGATE__RATE_LIMITING__ENFORCEMENT=disabled` turns enforcement off).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, TextgateError};
use crate::ratelimit::{Enforcement, QuotaTable, RateLimitConfig};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "TEXTGATE";

/// Main configuration for the Textgate service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextgateConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// gRPC server address
    #[serde(default = "default_grpc_addr")]
    pub grpc_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grpc_addr: default_grpc_addr(),
        }
    }
}

fn default_grpc_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 50051))
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// `disabled` lets every request through, for local development
    #[serde(default)]
    pub enforcement: Enforcement,

    /// Seconds between sweeps of expired records; 0 disables sweeping
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Replaces the quota for endpoints without their own entry
    #[serde(default)]
    pub default_quota: Option<RateLimitConfig>,

    /// Per-endpoint quotas, merged over the built-in table
    #[serde(default)]
    pub endpoints: HashMap<String, RateLimitConfig>,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            enforcement: Enforcement::default(),
            sweep_interval_secs: default_sweep_interval(),
            default_quota: None,
            endpoints: HashMap::new(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

impl RateLimitingConfig {
    /// Build the effective quota table.
    pub fn quota_table(&self) -> Result<QuotaTable> {
        QuotaTable::with_overrides(self.default_quota, &self.endpoints)
    }

    /// Sweep interval, or `None` when sweeping is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TextgateConfig {
    /// Load configuration from an optional YAML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env = config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);
        Self::load_with_env(path, env)
    }

    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }

        let config: TextgateConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path, ignoring the environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: TextgateConfig = serde_yaml::from_str(yaml)
            .map_err(|e| TextgateError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configured quotas are usable.
    pub fn validate(&self) -> Result<()> {
        self.rate_limiting.quota_table().map(|_| ())
    }
}
