use std::net::SocketAddr;
use std::time::Duration;

use custos::api::routes::create_router;
use custos::{AppState, Config, UserStore};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Idle limiter windows older than this many window lengths are swept.
const SWEEP_WINDOW_MULTIPLE: u64 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "custos=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

    let store = UserStore::open(&config.database.path).await?;
    tracing::info!(path = %config.database.path, "database ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    if config.server.maintenance {
        tracing::warn!("maintenance mode is on; only the admin surface is reachable");
    }

    let state = AppState::new(config, store);

    // Drop limiter entries for callers that have gone quiet.
    let limiter = state.limiter.clone();
    let window_secs = state.config.rate_limit.window_secs;
    tokio::spawn(async move {
        let max_age = Duration::from_secs(window_secs * SWEEP_WINDOW_MULTIPLE);
        let mut ticker = tokio::time::interval(max_age);
        loop {
            ticker.tick().await;
            limiter.sweep(max_age);
            tracing::debug!(entries = limiter.len(), "rate limiter swept");
        }
    });

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "custos listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
