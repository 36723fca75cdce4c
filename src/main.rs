mod address;
mod api;
mod chain;
mod config;
mod error;
mod fetcher;
mod pipeline;
mod scorer;
mod types;

#[cfg(test)]
mod test_support;

use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::pipeline::ServiceContext;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Collaborators, built once ---
    let ctx = ServiceContext::from_config(&cfg)?;
    log_collaborators(&cfg, &ctx);

    // --- HTTP API ---
    let origin = cfg
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|_| AppError::Config(format!("invalid CORS_ORIGIN: {}", cfg.cors_origin)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true);

    let app = router(ApiState { ctx }).layer(cors);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Report which external collaborators are wired up. Never logs secrets.
fn log_collaborators(cfg: &Config, ctx: &ServiceContext) {
    let configured = |yes: bool| if yes { "configured" } else { "missing" };

    info!("Indexer: {}", cfg.indexer_api_url);
    info!("Scoring model: {} ({})", cfg.openai_model, configured(cfg.openai_api_key.is_some()));
    info!("Chain RPC: {} (chain id {})", cfg.rpc_url, cfg.chain_id);
    info!("Signing key: {}", configured(cfg.private_key.is_some()));
    info!(
        "ReputationOracle contract: {}",
        cfg.oracle_address.as_deref().unwrap_or("missing")
    );

    if cfg.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY not set; every active wallet will receive the heuristic score");
    }
    if !ctx.committer.can_commit() {
        warn!("Signing key or contract missing; scores will be computed but not stored on-chain");
    }
}
