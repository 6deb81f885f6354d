use axum::extract::State;
use axum::Json;

use crate::api::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Readiness plus the chain ids this instance can answer for.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    let chains: Vec<u64> = state
        .service
        .registry()
        .chain_ids()
        .map(|id| id.as_u64())
        .collect();
    Json(serde_json::json!({
        "status": "ready",
        "chains": chains,
        "pageSize": state.config.page_size,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }
}
