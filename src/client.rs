use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{
    metrics::{record_query_failure, QueryTimer},
    models::ResultEnvelope,
    query::Query,
    MetricsError, Result,
};

/// Executes queries against a time-series backend.
///
/// Implementations return `Ok` for every response the backend managed to
/// produce, including `status: error` envelopes. Only failures to obtain an
/// envelope at all are reported as [`MetricsError::Transport`]. No retries
/// happen at this layer.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn execute(&self, query: &Query) -> Result<ResultEnvelope>;
}

/// Prometheus HTTP API client (`/api/v1/query`).
#[derive(Debug, Clone)]
pub struct HttpBackendClient {
    http: Client,
}

impl HttpBackendClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetricsError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    fn endpoint(host: &str) -> String {
        let host = host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/api/v1/query", host)
        } else {
            format!("http://{}/api/v1/query", host)
        }
    }

    async fn send(&self, query: &Query) -> Result<ResultEnvelope> {
        let url = Self::endpoint(query.host());
        let expression = query.expression();
        debug!("Querying {} with {}", url, expression);

        let response = self
            .http
            .get(&url)
            .query(&[("query", expression.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        // Prometheus reports bad queries with 4xx/5xx and an error envelope.
        let envelope: ResultEnvelope = serde_json::from_slice(&body).map_err(|e| {
            MetricsError::Transport(format!(
                "malformed response body (HTTP {}): {}",
                status, e
            ))
        })?;
        envelope.validate()?;
        Ok(envelope)
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn execute(&self, query: &Query) -> Result<ResultEnvelope> {
        let _timer = QueryTimer::new();
        match self.send(query).await {
            Ok(envelope) => Ok(envelope),
            Err(e) => {
                warn!("Query {} failed: {}", query, e);
                record_query_failure(&e);
                Err(e)
            }
        }
    }
}
