use std::net::SocketAddr;
use std::sync::Arc;
use stream_accounting::orchestration::{Aggregator, PriceResolver};
use stream_accounting::{
    api, config::Config, CoingeckoPriceSource, FundingService, FundingSource, NetworkRegistry,
    PriceSource, SubgraphFundingSource,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Build collaborators
    let funding: Arc<dyn FundingSource> = Arc::new(SubgraphFundingSource::new(
        config.subgraph_base_url.clone(),
        config.http_timeout,
    ));
    let prices: Arc<dyn PriceSource> = Arc::new(CoingeckoPriceSource::new(
        config.price_api_url.clone(),
        config.price_api_key.clone(),
        config.http_timeout,
    ));
    let service = Arc::new(FundingService::new(
        NetworkRegistry::builtin(),
        Aggregator::new(funding, config.page_size),
        PriceResolver::new(prices),
        config.hourly_price_max_age_days,
    ));

    // Create router
    let app = api::create_router(api::AppState::new(service, config));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
