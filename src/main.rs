use siterace::{
    build_router, scoring::PageSpeedScoreFetcher, AppConfig, AppState, InMemoryStore,
    KeyValueStore, RedisStore,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real environment variables still apply
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siterace=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting site race server");

    let config = AppConfig::from_env();

    let store: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(redis_url) => Arc::new(RedisStore::connect(redis_url).await?),
        None => {
            warn!("REDIS_URL not set, race history is kept in memory only");
            Arc::new(InMemoryStore::new())
        }
    };

    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN not set, admin stats are disabled");
    }

    let score_fetcher = Arc::new(PageSpeedScoreFetcher::from_config(&config)?);
    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, score_fetcher, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server running on http://{}", bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}
