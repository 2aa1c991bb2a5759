use anyhow::{Context, Result};
use reqwest::Client;
use sheetdash::{
    config::{ServerConfig, CACHE_TTL, SOURCE_URL},
    fetch::HttpSource,
    server::{self, AppState},
};
use std::{env, sync::Arc};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();
    info!("startup");

    // ─── 2) build the shared cache over the HTTP source ──────────────
    let client = Client::builder()
        .user_agent(concat!("sheetdash/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;
    let state = Arc::new(AppState::new(HttpSource::new(client), SOURCE_URL, CACHE_TTL));
    info!(url = SOURCE_URL, ttl_secs = CACHE_TTL.as_secs(), "data source");

    // ─── 3) serve until ctrl-c ───────────────────────────────────────
    let cfg = ServerConfig::from_env();
    let (addr, serve) = warp::serve(server::routes(state))
        .try_bind_with_graceful_shutdown(cfg.addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .with_context(|| format!("binding {}", cfg.addr))?;
    info!("dashboard: http://{}/", addr);
    info!("API: http://{}/products, http://{}/metrics?product=...", addr, addr);

    serve.await;
    info!("all done");
    Ok(())
}
