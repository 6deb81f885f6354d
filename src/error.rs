use crate::config::ConfigError;
use crate::datasource::DataSourceError;
use crate::domain::ChainId;
use crate::engine::NormalizeError;
use crate::orchestration::AggregationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(ChainId),
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<DataSourceError> for AppError {
    fn from(err: DataSourceError) -> Self {
        AppError::UpstreamFetch(err.to_string())
    }
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        AppError::MalformedRecord(err.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<AggregationError> for AppError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::DataSource(e) => e.into(),
            AggregationError::Normalize(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_)
            | AppError::UnsupportedChain(_)
            | AppError::UnsupportedCurrency(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            AppError::MalformedRecord(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
