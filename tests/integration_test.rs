use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use stream_accounting::api::{self, AppState};
use stream_accounting::config::Config;
use stream_accounting::datasource::{MockFundingSource, MockPriceSource};
use stream_accounting::domain::NetworkRegistry;
use stream_accounting::orchestration::{Aggregator, FundingService, PriceResolver};
use tower::util::ServiceExt;

fn setup_test_app() -> axum::Router {
    let config = Config {
        port: 0,
        subgraph_base_url: "http://example.invalid".to_string(),
        price_api_url: "http://example.invalid".to_string(),
        price_api_key: None,
        page_size: 500,
        hourly_price_max_age_days: 90,
        http_timeout: Duration::from_secs(1),
    };

    let service = Arc::new(FundingService::new(
        NetworkRegistry::builtin(),
        Aggregator::new(Arc::new(MockFundingSource::new()), config.page_size),
        PriceResolver::new(Arc::new(MockPriceSource::new())),
        config.hourly_price_max_age_days,
    ));
    api::create_router(AppState::new(service, config))
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, json) = get_json(setup_test_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint_lists_chains() {
    let (status, json) = get_json(setup_test_app(), "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
    assert_eq!(json["pageSize"], 500);

    let chains: Vec<u64> = json["chains"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_u64().unwrap())
        .collect();
    assert!(chains.contains(&137));
    assert!(chains.contains(&1));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/v1/unknown")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = setup_test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
