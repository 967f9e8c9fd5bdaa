use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    client::HttpBackendClient,
    config::Config,
    metrics,
    models::IntegrationMetricsSummary,
    summary::{MetricsProvider, PrometheusMetricsProvider, SummarySettings},
    MetricsError, Result,
};

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MetricsProvider>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(service_metrics))
        .route("/metrics/integrations", get(get_total_summary))
        .route("/metrics/integrations/:id", get(get_integration_summary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_integration_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IntegrationMetricsSummary>> {
    info!("Getting metrics summary for integration: {}", id);
    let summary = state.provider.integration_metrics_summary(&id).await?;
    Ok(Json(summary))
}

async fn get_total_summary(
    State(state): State<AppState>,
) -> Result<Json<IntegrationMetricsSummary>> {
    let summary = state.provider.total_integration_metrics_summary().await?;
    Ok(Json(summary))
}

async fn service_metrics() -> Result<impl IntoResponse> {
    let body = metrics::gather_text()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

pub async fn start_server(config: Config) -> Result<()> {
    let client = Arc::new(HttpBackendClient::new(config.query_timeout)?);
    let provider = PrometheusMetricsProvider::new(client, SummarySettings::from_config(&config));
    let state = AppState {
        provider: Arc::new(provider),
    };

    let app = router(state);
    info!(
        "Starting integration metrics service on {} (backend: {})",
        config.bind_addr, config.prometheus_service
    );

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| MetricsError::Internal(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| MetricsError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
