//! Runs the gateway's HTTP server.
//!
//! Wiring concrete [`Provider`](waystation::providers::Provider) adapters
//! and the account pool is a deployment concern outside this crate's
//! scope — this binary starts the server with whatever the embedding
//! application has registered via [`waystation::server::state::AppState`].
//! As shipped, it starts empty: every request will resolve to "no
//! providers are registered" until a real deployment wires one in.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use waystation::account::{AccountManager, SoftLimitPolicy};
use waystation::config;
use waystation::providers::ProviderRegistry;
use waystation::server::{self, AppState};

#[derive(Debug, Parser)]
#[command(name = "waystationd", about = "Anthropic-compatible gateway")]
struct Args {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "WAYSTATION_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,
}

struct RejectAllTokens;

#[async_trait::async_trait]
impl waystation::account::TokenSource for RejectAllTokens {
    async fn refresh(&self, _refresh_token: &str) -> waystation::error::Result<String> {
        Err(waystation::error::GatewayError::Upstream(
            "authentication failed: no token source configured".to_string(),
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = config::config();

    let registry = ProviderRegistry::new();
    let accounts = AccountManager::new(vec![], SoftLimitPolicy::disabled(), Arc::new(RejectAllTokens));
    let state = AppState::new(registry, accounts, cfg.clone());

    let app = server::build_router(state);
    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    tracing::info!(addr = %args.addr, "waystationd listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
