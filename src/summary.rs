use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::{
    client::BackendClient,
    config::Config,
    extract::extract,
    merge::{merge_across_keys, MaxTimestamps, MergeOperator, SumCounters},
    metrics::record_summary,
    models::{IntegrationMetricsSummary, LabelValueMap, ScalarValue, ValueType},
    query::{LabelFilter, Query},
    MetricsError, Result,
};

pub const EXCHANGES_TOTAL: &str = "org_apache_camel_ExchangesTotal";
pub const EXCHANGES_FAILED: &str = "org_apache_camel_ExchangesFailed";
pub const START_TIMESTAMP: &str = "io_syndesis_camel_StartTimestamp";
pub const LAST_EXCHANGE_COMPLETED_TIMESTAMP: &str =
    "io_syndesis_camel_LastExchangeCompletedTimestamp";

pub const DEPLOYMENT_ID_LABEL: &str = "syndesis_io_deployment_id";
pub const INTEGRATION_ID_LABEL: &str = "syndesis_io_integration_id";

/// Answers health-summary questions about integrations.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn integration_metrics_summary(
        &self,
        integration_id: &str,
    ) -> Result<IntegrationMetricsSummary>;

    async fn total_integration_metrics_summary(&self) -> Result<IntegrationMetricsSummary>;
}

/// How summary queries are shaped: target, function, window and filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarySettings {
    pub host: String,
    pub function: String,
    pub range: String,
    pub grouping_label: String,
    pub integration_label: String,
    /// Appended after the integration filter on every query.
    pub extra_filters: Vec<LabelFilter>,
}

impl SummarySettings {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            function: crate::config::DEFAULT_FUNCTION.to_string(),
            range: crate::config::DEFAULT_RANGE.to_string(),
            grouping_label: DEPLOYMENT_ID_LABEL.to_string(),
            integration_label: INTEGRATION_ID_LABEL.to_string(),
            extra_filters: vec![LabelFilter::new("type", "context")],
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            function: config.function.clone(),
            range: config.range.clone(),
            ..Self::new(config.prometheus_service.clone())
        }
    }

    pub fn filters_for(&self, integration_id: &str) -> Vec<LabelFilter> {
        let mut filters = Vec::with_capacity(self.extra_filters.len() + 1);
        filters.push(LabelFilter::new(
            self.integration_label.clone(),
            integration_id.to_ascii_lowercase(),
        ));
        filters.extend(self.extra_filters.iter().cloned());
        filters
    }

    pub fn query_for(&self, integration_id: &str, metric: &str) -> Result<Query> {
        Query::builder()
            .host(self.host.clone())
            .function(self.function.clone())
            .metric(metric)
            .filters(self.filters_for(integration_id))
            .range(self.range.clone())
            .build()
    }
}

/// Builds integration summaries from a Prometheus-style backend.
#[derive(Clone)]
pub struct PrometheusMetricsProvider {
    client: Arc<dyn BackendClient>,
    settings: SummarySettings,
}

impl PrometheusMetricsProvider {
    pub fn new(client: Arc<dyn BackendClient>, settings: SummarySettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &SummarySettings {
        &self.settings
    }

    async fn metric_values(
        &self,
        integration_id: &str,
        metric: &str,
        value_type: ValueType,
        merge: &dyn MergeOperator,
    ) -> Result<Option<LabelValueMap>> {
        let query = self.settings.query_for(integration_id, metric)?;
        let envelope = self.client.execute(&query).await?;
        let values = extract(&envelope, &self.settings.grouping_label, value_type, merge)?;
        debug!(
            metric,
            series = envelope.series().len(),
            keys = values.as_ref().map(|v| v.len()).unwrap_or(0),
            "Fetched metric values"
        );
        Ok(values)
    }

    pub async fn summarize(&self, integration_id: &str) -> Result<IntegrationMetricsSummary> {
        record_summary();

        let id = integration_id;
        let (total, failed, start, last) = futures::try_join!(
            self.metric_values(id, EXCHANGES_TOTAL, ValueType::Counter, &SumCounters),
            self.metric_values(id, EXCHANGES_FAILED, ValueType::Counter, &SumCounters),
            self.metric_values(id, START_TIMESTAMP, ValueType::Timestamp, &MaxTimestamps),
            self.metric_values(
                id,
                LAST_EXCHANGE_COMPLETED_TIMESTAMP,
                ValueType::Timestamp,
                &MaxTimestamps
            ),
        )?;

        let messages = merge_across_keys(total.as_ref(), &SumCounters)?;
        let errors = merge_across_keys(failed.as_ref(), &SumCounters)?;
        let start = merge_across_keys(start.as_ref(), &MaxTimestamps)?;
        let last_processed = merge_across_keys(last.as_ref(), &MaxTimestamps)?;

        Ok(IntegrationMetricsSummary {
            start: start.as_ref().and_then(ScalarValue::as_timestamp),
            last_processed: last_processed.as_ref().and_then(ScalarValue::as_timestamp),
            messages: messages.as_ref().and_then(ScalarValue::as_counter).unwrap_or(0),
            errors: errors.as_ref().and_then(ScalarValue::as_counter).unwrap_or(0),
        })
    }
}

#[async_trait]
impl MetricsProvider for PrometheusMetricsProvider {
    #[instrument(skip(self))]
    async fn integration_metrics_summary(
        &self,
        integration_id: &str,
    ) -> Result<IntegrationMetricsSummary> {
        let summary = self.summarize(integration_id).await?;
        info!(
            messages = summary.messages,
            errors = summary.errors,
            "Summarized integration metrics"
        );
        Ok(summary)
    }

    async fn total_integration_metrics_summary(&self) -> Result<IntegrationMetricsSummary> {
        Err(MetricsError::NotImplemented(
            "total integration metrics summary is not supported".to_string(),
        ))
    }
}
