use std::env;
use std::time::Duration;

use crate::{MetricsError, Result};

pub const DEFAULT_FUNCTION: &str = "max_over_time";
pub const DEFAULT_RANGE: &str = "1d";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend host or service name, optionally with a scheme.
    pub prometheus_service: String,
    pub query_timeout: Duration,
    pub function: String,
    pub range: String,
    pub bind_addr: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prometheus_service = lookup("METRICS_PROMETHEUS_SERVICE")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                MetricsError::Config("METRICS_PROMETHEUS_SERVICE must be set".to_string())
            })?;

        let timeout_ms = match lookup("METRICS_QUERY_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                MetricsError::Config(format!("Invalid METRICS_QUERY_TIMEOUT_MS {:?}: {}", raw, e))
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("compact") => LogFormat::Compact,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(MetricsError::Config(format!("Unknown LOG_FORMAT {:?}", other)))
            }
        };

        Ok(Self {
            prometheus_service,
            query_timeout: Duration::from_millis(timeout_ms),
            function: lookup("METRICS_FUNCTION").unwrap_or_else(|| DEFAULT_FUNCTION.to_string()),
            range: lookup("METRICS_RANGE").unwrap_or_else(|| DEFAULT_RANGE.to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            log_format,
        })
    }
}
