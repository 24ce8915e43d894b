//! Gateway resilience settings
//!
//! The re-authentication budget for CREST calls plus the `[monitoring]` section
//! of the config file, which drives the operation logger.

use super::retry::RetryConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub monitoring: MonitoringConfig,
}

/// `[monitoring]` settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Tag every operation's log lines with a uuid
    #[serde(default = "enabled")]
    pub correlation_ids: bool,
    /// Log each HTTP request and response, not just the operation outcome
    #[serde(default = "enabled")]
    pub request_logging: bool,
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Verbosity of the operation logger, least verbose first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn enabled() -> bool {
    true
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            correlation_ids: enabled(),
            request_logging: enabled(),
            log_level: LogLevel::default(),
        }
    }
}

impl ResilienceConfig {
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    /// Whether a rejected session is refreshed and the call repeated once
    pub fn reauthenticate(mut self, enabled: bool) -> Self {
        self.config.retry = if enabled {
            RetryConfig::default()
        } else {
            RetryConfig::disabled()
        };
        self
    }

    pub fn monitoring_config(mut self, monitoring: MonitoringConfig) -> Self {
        self.config.monitoring = monitoring;
        self
    }

    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}
