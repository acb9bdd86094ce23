use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dht_hook::{
    api::AppState,
    config::Config,
    create_router,
    hook::{Hook, HttpNotifier},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dht-hook");

    // Load configuration
    let config = Config::load()?;
    let hook_config = config.hook_config();
    tracing::info!(?hook_config, "Configuration loaded");

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing metrics recorder")?;

    let hook = Arc::new(Hook::new(hook_config));
    if let Some(remote) = &config.remote {
        hook.subscribe(remote, config.remote_interval())
            .await
            .with_context(|| format!("subscribing startup remote {}", remote))?;
    }

    let shutdown = CancellationToken::new();

    let notifier = HttpNotifier::new(hook_config.delivery_timeout)?;
    let dispatcher = tokio::spawn(
        hook.dispatcher(notifier)
            .run(hook_config.tick_period, shutdown.clone()),
    );

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        });
    }

    // Build router
    let state = AppState::new(hook.clone(), config.clone()).with_metrics(metrics);
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    // the server may stop on its own; make sure the dispatcher follows
    shutdown.cancel();
    dispatcher.await?;

    tracing::info!(status = ?hook.status().await, "Stopped");
    Ok(())
}
