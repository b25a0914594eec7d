//! SLO remote-read proxy binary
//!
//! Serves `slo:`-prefixed series from a Prometheus remote-read backend with
//! configured override values.

use slo_proxy::api::{self, ApiServerConfig, DEFAULT_MAX_BODY_SIZE};
use slo_proxy::config::{
    parse_listen_addr, ComponentFactory, ProxyConfig, DEFAULT_CONFIG_FILE, DEFAULT_LISTEN_ADDRESS,
    DEFAULT_REMOTE_READ_TIMEOUT, DEFAULT_REMOTE_READ_URL,
};
use slo_proxy::telemetry::Telemetry;
use slo_proxy::Error;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// SLO remote-read proxy
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on for web endpoints
    #[arg(long = "web.listen-address", env = "SLO_PROXY_LISTEN_ADDRESS", default_value = DEFAULT_LISTEN_ADDRESS)]
    listen_address: String,

    /// Override configuration file path
    #[arg(long = "config.file", env = "SLO_PROXY_CONFIG_FILE", default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,

    /// Backend remote-read endpoint
    #[arg(long = "remote-read.url", env = "SLO_PROXY_REMOTE_READ_URL", default_value = DEFAULT_REMOTE_READ_URL)]
    remote_read_url: String,

    /// Backend request timeout in seconds
    #[arg(long = "remote-read.timeout-secs", default_value_t = DEFAULT_REMOTE_READ_TIMEOUT.as_secs())]
    remote_read_timeout_secs: u64,

    /// Maximum compressed request body in bytes
    #[arg(long = "web.max-body-bytes", default_value_t = DEFAULT_MAX_BODY_SIZE)]
    max_body_bytes: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _telemetry = Telemetry::init(&args.log_level)?;

    let config = ProxyConfig {
        listen_addr: parse_listen_addr(&args.listen_address)?,
        config_file: args.config_file.clone(),
        remote_read_url: args.remote_read_url.clone(),
        remote_read_timeout: Duration::from_secs(args.remote_read_timeout_secs),
    };

    let proxy = ComponentFactory::create_proxy(&config).map_err(|e| {
        error!(err = %e, "Startup failed");
        e
    })?;

    let router = api::build_http_router(
        proxy,
        &ApiServerConfig {
            max_body_size: args.max_body_bytes,
        },
    );

    let listener = TcpListener::bind(config.listen_addr).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    info!(
        listen_addr = %config.listen_addr,
        config_file = %config.config_file.display(),
        remote_read_url = %config.remote_read_url,
        "Listening on {}",
        config.listen_addr
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .await
        .map_err(|e| Error::Internal(format!("HTTP server error: {e}")))?;

    info!("Proxy shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(err = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(err = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    if *shutdown.borrow() {
        return;
    }
    let _ = shutdown.changed().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_follow_library_constants() {
        let args = Args::parse_from(["slo-proxy"]);

        assert_eq!(args.listen_address, DEFAULT_LISTEN_ADDRESS);
        assert_eq!(
            Duration::from_secs(args.remote_read_timeout_secs),
            DEFAULT_REMOTE_READ_TIMEOUT
        );
        assert_eq!(args.max_body_bytes, DEFAULT_MAX_BODY_SIZE);
    }

    #[test]
    fn cli_flags_override_defaults() {
        let args = Args::parse_from([
            "slo-proxy",
            "--remote-read.timeout-secs",
            "5",
            "--web.max-body-bytes",
            "1024",
        ]);

        assert_eq!(args.remote_read_timeout_secs, 5);
        assert_eq!(args.max_body_bytes, 1024);
    }
}
