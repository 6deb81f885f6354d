pub mod health;
pub mod stream_periods;

use crate::config::Config;
use crate::orchestration::FundingService;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FundingService>,
    pub config: Config,
}

impl AppState {
    pub fn new(service: Arc<FundingService>, config: Config) -> Self {
        Self { service, config }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/stream-periods", get(stream_periods::get_stream_periods))
        .layer(cors)
        .with_state(state)
}
