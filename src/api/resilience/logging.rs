//! Structured logging with correlation tracking for CREST operations
//!
//! Every gateway call gets an [`OperationContext`]; request, response and
//! completion events are emitted as JSON log lines through the `log` facade.

use super::config::{LogLevel, MonitoringConfig};
use crate::api::error::ErrorKind;
use log::{debug, error, info, warn};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

const REDACTED: &str = "[REDACTED]";

/// Header name fragments that always mark a credential
const SECRET_MARKERS: [&str; 4] = ["authorization", "token", "password", "cookie"];

#[derive(Debug, Clone)]
pub struct ApiLogger {
    config: MonitoringConfig,
}

/// One gateway call, from request building to its final outcome
#[derive(Debug, Clone)]
pub struct OperationContext {
    /// Empty when correlation ids are switched off
    pub correlation_id: String,
    pub operation: String,
    pub resource: String,
    pub start_time: Instant,
}

/// Outcome of a gateway operation
#[derive(Debug, Clone)]
pub struct OperationMetrics {
    pub duration: Duration,
    /// Attempts made, including the re-authenticated retry
    pub attempts: u32,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error_kind: Option<ErrorKind>,
}

impl ApiLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    pub fn start_operation(&self, operation: &str, resource: &str) -> OperationContext {
        let context = OperationContext {
            correlation_id: if self.config.correlation_ids {
                uuid::Uuid::new_v4().to_string()
            } else {
                String::new()
            },
            operation: operation.to_string(),
            resource: resource.to_string(),
            start_time: Instant::now(),
        };

        if self.traces_http(LogLevel::Info) {
            info!("CREST call started: {}", context.event("crest_call_started", json!({})));
        }
        context
    }

    /// Log an outbound request; `secret_headers` are redacted along with any
    /// credential-looking header
    pub fn log_request(
        &self,
        context: &OperationContext,
        method: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
        secret_headers: &[&str],
    ) {
        if !self.traces_http(LogLevel::Debug) {
            return;
        }

        let line = context.event(
            "http_request",
            json!({
                "method": method,
                "url": url,
                "headers": sanitize_headers(headers, secret_headers),
            }),
        );
        debug!("HTTP request: {}", line);
    }

    pub fn log_response(&self, context: &OperationContext, status_code: u16, duration: Duration) {
        if !self.traces_http(LogLevel::Debug) {
            return;
        }

        let line = context.event(
            "http_response",
            json!({"status_code": status_code, "duration_ms": duration.as_millis()}),
        );
        match status_code {
            401 => info!("HTTP response, session rejected: {}", line),
            400..=u16::MAX => warn!("HTTP response (error): {}", line),
            _ => debug!("HTTP response: {}", line),
        }
    }

    pub fn complete_operation(&self, context: &OperationContext, metrics: &OperationMetrics) {
        if !self.enabled(LogLevel::Info) {
            return;
        }

        let line = context.event(
            "crest_call_completed",
            json!({
                "duration_ms": metrics.duration.as_millis(),
                "attempts": metrics.attempts,
                "success": metrics.success,
                "status_code": metrics.status_code,
                "error_kind": metrics.error_kind.map(|k| k.as_str()),
            }),
        );
        if metrics.success {
            info!("CREST call completed: {}", line);
        } else {
            error!("CREST call failed: {}", line);
        }
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level <= self.config.log_level
    }

    fn traces_http(&self, level: LogLevel) -> bool {
        self.config.request_logging && self.enabled(level)
    }
}

/// Copy of `headers` with credentials replaced by a placeholder
pub fn sanitize_headers(headers: &BTreeMap<String, String>, secret_headers: &[&str]) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let lower = name.to_ascii_lowercase();
            let secret = secret_headers.iter().any(|s| s.eq_ignore_ascii_case(name))
                || SECRET_MARKERS.iter().any(|marker| lower.contains(marker));
            let value = if secret { REDACTED.to_string() } else { value.clone() };
            (name.clone(), value)
        })
        .collect()
}

impl OperationContext {
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn create_metrics(&self, attempts: u32, status_code: Option<u16>, error_kind: Option<ErrorKind>) -> OperationMetrics {
        OperationMetrics {
            duration: self.elapsed(),
            attempts,
            success: error_kind.is_none(),
            status_code,
            error_kind,
        }
    }

    /// JSON log line carrying this call's identity plus `fields`
    fn event(&self, name: &str, fields: Value) -> Value {
        let mut line = json!({
            "event": name,
            "correlation_id": self.correlation_id,
            "operation": self.operation,
            "resource": self.resource,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let (Some(line), Value::Object(fields)) = (line.as_object_mut(), fields) {
            line.extend(fields);
        }
        line
    }
}
