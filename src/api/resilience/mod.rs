//! Resilience module for CREST calls
//!
//! Re-authenticating retry and structured operation logging.

pub mod config;
pub mod logging;
pub mod retry;

pub use config::{LogLevel, MonitoringConfig, ResilienceConfig, ResilienceConfigBuilder};
pub use logging::{ApiLogger, OperationContext, OperationMetrics};
pub use retry::{RetryConfig, RetryPolicy};
