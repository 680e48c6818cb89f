mod cache;
mod clock;
mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod policy;
mod rate_limit;
mod routes;
mod state;
mod viewers;
mod worker;

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::clock::SystemClock;
use crate::config::Args;
use crate::state::AppState;
use crate::worker::sweep_worker;

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();
    let policies = args.policy_table();

    // creating shared state
    let state = Arc::new(AppState::new(
        Arc::new(SystemClock),
        policies,
        args.cache_ttl(),
        args.viewer_stale_after(),
    ));

    // spawn the background sweeper
    tokio::spawn(sweep_worker(state.clone(), args.sweep_interval()));

    let app = routes::router(state.clone());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Gateway running on http://localhost:{}", args.port);
    tracing::info!("Cache TTL: {} seconds", args.cache_ttl);
    tracing::info!("Viewers go stale after {} seconds", args.viewer_stale_after);
    for (policy, config) in state.policies.iter() {
        tracing::info!(
            "Rate limit {}: {} attempts per {} ms",
            policy.namespace(),
            config.max_attempts(),
            config.window_ms()
        );
    }

    axum::serve(listener, app).await?;
    Ok(())
}
