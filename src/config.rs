//! Configuration for the log streaming endpoint
//! Loaded from TOML with environment overrides, the same way the embedding services are

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings for the log streaming handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Route the handler is mounted on
    pub route: String,
    /// Lines buffered between the handler and the connection
    pub channel_capacity: usize,
    /// Maximum accepted POST body size in bytes
    pub max_body_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            route: "/system/logs".to_string(),
            channel_capacity: 1,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl StreamConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: StreamConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(route) = std::env::var("LOG_STREAM_ROUTE") {
            config.route = route;
        }

        if let Ok(capacity) = std::env::var("LOG_STREAM_CHANNEL_CAPACITY") {
            config.channel_capacity = capacity
                .parse()
                .context("Invalid LOG_STREAM_CHANNEL_CAPACITY")?;
        }

        if let Ok(max_body) = std::env::var("LOG_STREAM_MAX_BODY_BYTES") {
            config.max_body_bytes = max_body
                .parse()
                .context("Invalid LOG_STREAM_MAX_BODY_BYTES")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.route.starts_with('/') {
            return Err(anyhow::anyhow!("Route must start with '/': {}", self.route));
        }

        if self.channel_capacity == 0 {
            return Err(anyhow::anyhow!("Channel capacity cannot be 0"));
        }

        if self.max_body_bytes == 0 {
            return Err(anyhow::anyhow!("Maximum body size cannot be 0"));
        }

        Ok(())
    }
}
