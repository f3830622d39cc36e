//! Plasma child-chain node
//!
//! Hosts a single [`ChildChain`] behind a JSON-RPC endpoint:
//! - Accepts operator blocks via `plasma_submitBlock`
//! - Records root-ledger deposits and exits reported by a watcher
//! - Stores spend confirmations
//! - Serves blocks, transactions, exit and challenge proofs

mod config;
mod rpc;

use std::sync::{Arc, RwLock};

use anyhow::Context;
use plasma_core::ChildChain;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    info!("Starting Plasma child-chain node...");
    info!("  Operator: {}", config.operator_hex());

    let chain = Arc::new(RwLock::new(ChildChain::new(config.operator)));
    let app = rpc::router(chain);

    let listener = tokio::net::TcpListener::bind(&config.rpc_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.rpc_addr))?;
    info!("RPC server listening on {}", config.rpc_addr);
    axum::serve(listener, app).await.context("RPC server failed")?;
    Ok(())
}
