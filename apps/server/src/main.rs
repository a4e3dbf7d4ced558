use crossprice_core::fx::CacheState;
use crossprice_server::{api::app_router, build_state, config::Config, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config)?;

    // Warm the rate cache without holding up startup
    if state.rate_cache.state() != CacheState::Fresh {
        let rate_cache = state.rate_cache.clone();
        tokio::spawn(async move { rate_cache.ensure_fresh().await });
    }

    let router = app_router(state, &config);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
