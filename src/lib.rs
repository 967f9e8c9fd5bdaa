pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod merge;
pub mod metrics;
pub mod models;
pub mod query;
pub mod summary;

pub use client::{BackendClient, HttpBackendClient};
pub use error::{MetricsError, Result};
pub use merge::{merge_across_keys, MaxTimestamps, MergeOperator, SumCounters};
pub use models::{
    IntegrationMetricsSummary, LabelValueMap, ResultEnvelope, ScalarValue, Series, ValueType,
};
pub use query::{LabelFilter, Query, QueryBuilder};
pub use summary::{MetricsProvider, PrometheusMetricsProvider, SummarySettings};
