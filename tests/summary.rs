use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use httpmock::{Method::GET, MockServer};
use integration_metrics::{
    summary::{
        EXCHANGES_FAILED, EXCHANGES_TOTAL, LAST_EXCHANGE_COMPLETED_TIMESTAMP, START_TIMESTAMP,
    },
    HttpBackendClient, MetricsError, MetricsProvider, PrometheusMetricsProvider, SummarySettings,
};

const INTEGRATION: &str = "I-Orders";

const ALL_METRICS: [&str; 4] = [
    EXCHANGES_TOTAL,
    EXCHANGES_FAILED,
    START_TIMESTAMP,
    LAST_EXCHANGE_COMPLETED_TIMESTAMP,
];

const TOO_MANY_SAMPLES: &str = r#"{"status":"error","errorType":"execution","error":"query processing would load too many samples"}"#;

fn vector(entries: &[(&str, &str)]) -> String {
    let result: Vec<serde_json::Value> = entries
        .iter()
        .map(|(dep, value)| {
            serde_json::json!({
                "metric": {
                    "syndesis_io_deployment_id": dep,
                    "syndesis_io_integration_id": "i-orders",
                    "type": "context"
                },
                "value": [1518000000.5, value]
            })
        })
        .collect();
    serde_json::json!({
        "status": "success",
        "data": { "resultType": "vector", "result": result }
    })
    .to_string()
}

/// Answers `metric` with `status` and `body`, after `delay`.
async fn mock_metric(
    server: &MockServer,
    settings: &SummarySettings,
    metric: &str,
    status: u16,
    body: String,
    delay: Duration,
) {
    let expression = settings.query_for(INTEGRATION, metric).unwrap().expression();
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/query")
                .query_param("query", expression.as_str());
            then.status(status).delay(delay).body(body);
        })
        .await;
}

async fn mock_ok(server: &MockServer, settings: &SummarySettings, metric: &str, body: String) {
    mock_metric(server, settings, metric, 200, body, Duration::ZERO).await;
}

fn provider(settings: SummarySettings, timeout: Duration) -> PrometheusMetricsProvider {
    let client = HttpBackendClient::new(timeout).unwrap();
    PrometheusMetricsProvider::new(Arc::new(client), settings)
}

#[test_log::test(tokio::test)]
async fn summary_sums_counters_and_takes_latest_timestamps() {
    let server = MockServer::start_async().await;
    let settings = SummarySettings::new(server.base_url());

    let total = vector(&[("v1", "100"), ("v2", "50")]);
    mock_ok(&server, &settings, EXCHANGES_TOTAL, total).await;
    mock_ok(&server, &settings, EXCHANGES_FAILED, vector(&[])).await;
    let start = vector(&[("v2", "1518000000000")]);
    mock_ok(&server, &settings, START_TIMESTAMP, start).await;
    let last = vector(&[("v2", "1518003600000")]);
    mock_ok(&server, &settings, LAST_EXCHANGE_COMPLETED_TIMESTAMP, last).await;

    let summary = provider(settings, Duration::from_secs(5))
        .integration_metrics_summary(INTEGRATION)
        .await
        .unwrap();

    assert_eq!(summary.messages, 150);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.start, Utc.timestamp_millis_opt(1_518_000_000_000).single());
    assert_eq!(
        summary.last_processed,
        Utc.timestamp_millis_opt(1_518_003_600_000).single()
    );
}

#[test_log::test(tokio::test)]
async fn any_backend_error_aborts_the_summary() {
    let server = MockServer::start_async().await;
    let settings = SummarySettings::new(server.base_url());

    mock_ok(&server, &settings, EXCHANGES_TOTAL, vector(&[("v1", "100")])).await;
    mock_ok(&server, &settings, EXCHANGES_FAILED, vector(&[("v1", "3")])).await;
    let start = vector(&[("v1", "1518000000000")]);
    mock_ok(&server, &settings, START_TIMESTAMP, start).await;
    mock_metric(
        &server,
        &settings,
        LAST_EXCHANGE_COMPLETED_TIMESTAMP,
        422,
        TOO_MANY_SAMPLES.to_string(),
        Duration::ZERO,
    )
    .await;

    let result = provider(settings, Duration::from_secs(5))
        .integration_metrics_summary(INTEGRATION)
        .await;

    match result {
        Err(MetricsError::BackendQuery { error_type, message }) => {
            assert_eq!(error_type, "execution");
            assert_eq!(message, "query processing would load too many samples");
        }
        other => panic!("expected backend query error, got {:?}", other),
    }
}

#[test_log::test(tokio::test)]
async fn unreachable_backend_is_a_transport_error() {
    let server = MockServer::start_async().await;
    let settings = SummarySettings::new(server.base_url());

    for metric in ALL_METRICS {
        let body = "upstream connect error".to_string();
        mock_metric(&server, &settings, metric, 503, body, Duration::ZERO).await;
    }

    let result = provider(settings, Duration::from_secs(5))
        .integration_metrics_summary(INTEGRATION)
        .await;
    assert!(matches!(result, Err(MetricsError::Transport(_))));
}

#[test_log::test(tokio::test)]
async fn slow_metric_times_out_the_summary() {
    let server = MockServer::start_async().await;
    let settings = SummarySettings::new(server.base_url());

    mock_ok(&server, &settings, EXCHANGES_TOTAL, vector(&[("v1", "100")])).await;
    mock_ok(&server, &settings, EXCHANGES_FAILED, vector(&[])).await;
    mock_ok(&server, &settings, START_TIMESTAMP, vector(&[])).await;
    mock_metric(
        &server,
        &settings,
        LAST_EXCHANGE_COMPLETED_TIMESTAMP,
        200,
        vector(&[("v1", "1518000000000")]),
        Duration::from_millis(800),
    )
    .await;

    let result = provider(settings, Duration::from_millis(100))
        .integration_metrics_summary(INTEGRATION)
        .await;
    assert!(matches!(result, Err(MetricsError::Transport(_))));
}

#[test_log::test(tokio::test)]
async fn total_summary_is_not_implemented() {
    let settings = SummarySettings::new("prometheus:9090");
    let result = provider(settings, Duration::from_secs(5))
        .total_integration_metrics_summary()
        .await;
    assert!(matches!(result, Err(MetricsError::NotImplemented(_))));
}
