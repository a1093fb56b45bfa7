//! yunshen - game bot runtime host.
//!
//! Usage: `yunshen [config.toml]`

use std::sync::Arc;
use tracing::{error, info, warn};
use yunshen::config::{self, Config, LoggingConfig};
use yunshen::context::HostContext;
use yunshen::supervisor::{Manifests, Supervisor, SupervisorHandle};
use yunshen::{http, metrics, telemetry};
use yunshen_link::jsonl::JsonLinesConnector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            let _guard = telemetry::init_logging(&LoggingConfig::default());
            error!(path = %config_path, error = %e, "Failed to load config");
            return Err(e.into());
        }
    };

    // Held until exit so the file appender flushes.
    let _log_guard = telemetry::init_logging(&config.logging);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    info!(
        host = %config.server.host,
        port = config.server.port,
        username = %config.server.username,
        auto_reconnect = config.bot.auto_reconnect,
        "Starting yunshen"
    );

    // Convention: metrics.port = 0 disables the HTTP endpoint.
    let metrics_port = config.metrics.port;
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let host = HostContext::new(Arc::new(config));
    let supervisor = Supervisor::new(
        host,
        Arc::new(JsonLinesConnector::default()),
        Manifests::builtin(),
    );
    spawn_signal_listener(supervisor.handle());

    supervisor.run().await?;
    info!("yunshen stopped");
    Ok(())
}

/// Trigger a graceful shutdown on SIGINT or SIGTERM.
fn spawn_signal_listener(handle: SupervisorHandle) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => info!(signal = "SIGINT", "Shutdown requested"),
                        _ = term.recv() => info!(signal = "SIGTERM", "Shutdown requested"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl-C only");
                    let _ = tokio::signal::ctrl_c().await;
                    info!(signal = "SIGINT", "Shutdown requested");
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!(signal = "SIGINT", "Shutdown requested");
        }
        handle.shutdown();
    });
}
