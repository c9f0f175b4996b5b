// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use clap::Parser;
use lockfleet_rs::{
    api::{router::build_router, state::AppState},
    cfg::{
        cli::{Cli, resolve_config_path},
        config::AppConfig,
        logger::init_logger,
    },
    registry::init::initialize,
};
use tokio::{net::TcpListener, signal};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;

    let cli = Cli::parse();
    let config_path =
        resolve_config_path(&cli.config).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load configuration")?;

    let registry = initialize(config.devices.clone()).await;

    let state = AppState::new(registry, config.devices, config.secrets);
    let router = build_router(state.clone());

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    info!(bind = %cli.bind, "lockfleetd listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal(state: std::sync::Arc<AppState>) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, disconnecting all device sessions");
    for (_, session) in state.registry.all_sessions() {
        session.disconnect().await;
    }
}
