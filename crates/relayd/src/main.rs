//! relayd — media-packet stream relay daemon.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use relay_core::config::RelayConfig;
use relay_stream::{new_conn_table, DelayPolicy, Server};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = RelayConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = RelayConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        RelayConfig::default()
    });

    // Bind stream listener
    let listener = TcpListener::bind(&config.network.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.network.listen_addr))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, "relayd listening");

    // Delay policy
    let policy = DelayPolicy::from_config(&config.processing);
    tracing::info!(
        control_delay_ms = config.processing.control_delay_ms,
        payload_delay_min_ms = config.processing.payload_delay_min_ms,
        payload_delay_max_ms = config.processing.payload_delay_max_ms,
        "processing delay policy"
    );

    // Shared state
    let connections = new_conn_table();

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let server_task = {
        let server = Server::new(listener, policy, connections.clone(), shutdown_tx.clone());
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                tracing::error!(error = %e, "stream server failed");
            }
        })
    };

    let snapshot_task = {
        let connections = connections.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                interval.tick().await;
                tracing::info!(count = connections.len(), "connection table snapshot");
                for c in connections.iter() {
                    tracing::info!(
                        conn_id = *c.key(),
                        peer = %c.value().peer_addr,
                        age_secs = c.value().established_at.elapsed().as_secs(),
                        "  connection"
                    );
                }
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = server_task        => tracing::error!("stream server exited: {:?}", r),
        r = snapshot_task      => tracing::error!("snapshot printer exited: {:?}", r),
    }

    Ok(())
}
