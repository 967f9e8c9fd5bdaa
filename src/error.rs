use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    /// The backend could not be reached or answered with something that is not an envelope.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with `status: error`.
    #[error("Backend query error: Error Type: {error_type}, Error: {message}")]
    BackendQuery { error_type: String, message: String },

    #[error("Value parse error: {0}")]
    ValueParse(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Short label used for the failure counter.
    pub fn kind(&self) -> &'static str {
        match self {
            MetricsError::Transport(_) => "transport",
            MetricsError::BackendQuery { .. } => "backend_query",
            MetricsError::ValueParse(_) => "value_parse",
            MetricsError::NotImplemented(_) => "not_implemented",
            MetricsError::InvalidQuery(_) => "invalid_query",
            MetricsError::TypeMismatch(_) => "type_mismatch",
            MetricsError::Config(_) => "config",
            MetricsError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for MetricsError {
    fn from(err: reqwest::Error) -> Self {
        MetricsError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for MetricsError {
    fn from(err: serde_json::Error) -> Self {
        MetricsError::Transport(format!("malformed response body: {}", err))
    }
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> Response {
        let status = match self {
            MetricsError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            MetricsError::BackendQuery { .. } | MetricsError::ValueParse(_) => {
                StatusCode::BAD_GATEWAY
            }
            MetricsError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            MetricsError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            MetricsError::TypeMismatch(_)
            | MetricsError::Config(_)
            | MetricsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_query_message_carries_type_and_error() {
        let err = MetricsError::BackendQuery {
            error_type: "bad_data".to_string(),
            message: "parse error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Backend query error: Error Type: bad_data, Error: parse error"
        );
        assert_eq!(err.kind(), "backend_query");
    }

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (MetricsError::Transport("refused".into()), StatusCode::SERVICE_UNAVAILABLE),
            (MetricsError::ValueParse("x".into()), StatusCode::BAD_GATEWAY),
            (MetricsError::NotImplemented("total".into()), StatusCode::NOT_IMPLEMENTED),
            (MetricsError::InvalidQuery("empty".into()), StatusCode::BAD_REQUEST),
            (MetricsError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
