// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PrintBridge: local HTTP print bridge.
//
// Entry point. Initialises logging, loads configuration, picks the render
// host for this machine and serves the HTTP API until Ctrl-C.

use tracing::{info, warn};

use printbridge_core::error::Result;
use printbridge_server::services::{self, AppServices};
use printbridge_server::{data_dir, router};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("PrintBridge starting");

    let dir = data_dir::data_dir();
    let config = services::load_or_init_config(&dir);
    let services = AppServices::init(&dir, config, printbridge_host::render_host())?;
    let _sweeper = services.start_sweeper();

    let addr = services.config().listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, data_dir = %dir.display(), "HTTP server listening");

    axum::serve(listener, router(services.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let destroyed = services.shutdown();
    info!(destroyed, "PrintBridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
