use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use webmock_server::config::{Config, ConfigOverrides, LogFormat, LoggingConfig};
use webmock_server::{ControlApiServer, Matcher, MockServer};

/// Programmable HTTP mock server
#[derive(Parser, Debug)]
#[command(name = "webmock-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML config file; flags override its values
    #[arg(short, long, env = "WEBMOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Bind the control API on this host
    #[arg(long, env = "WEBMOCK_CONTROL_HOST")]
    control_host: Option<String>,

    /// Bind the control API on this port
    #[arg(long, env = "WEBMOCK_CONTROL_PORT")]
    control_port: Option<u16>,

    /// Bind the mock HTTP server on this host
    #[arg(long, env = "WEBMOCK_HTTP_HOST")]
    http_host: Option<String>,

    /// Bind the mock HTTP server on this port
    #[arg(long, env = "WEBMOCK_HTTP_PORT")]
    http_port: Option<u16>,

    /// Log filter directive (e.g. info, webmock_server=debug)
    #[arg(long, env = "WEBMOCK_LOG")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            control_host: self.control_host.clone(),
            control_port: self.control_port,
            http_host: self.http_host.clone(),
            http_port: self.http_port,
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref(), args.overrides())?;
    init_logging(&config.logging);

    let matcher = Arc::new(Matcher::new());

    let control_addr = config.control.socket_addr()?;
    let http_addr = config.http.socket_addr()?;
    let control = ControlApiServer::bind(control_addr, Arc::clone(&matcher))
        .await
        .context("control API")?;
    let mock = MockServer::bind(http_addr, Arc::clone(&matcher))
        .await
        .context("mock HTTP server")?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let mut control_task = tokio::spawn(control.run(shutdown_tx.subscribe()));
    let mut mock_task = tokio::spawn(mock.run(shutdown_tx.subscribe()));

    // A server exiting on its own is fatal; otherwise wait for a signal
    tokio::select! {
        _ = shutdown_signal() => {}
        result = &mut control_task => {
            anyhow::bail!("control API stopped unexpectedly: {:?}", result);
        }
        result = &mut mock_task => {
            anyhow::bail!("mock HTTP server stopped unexpectedly: {:?}", result);
        }
    }

    info!("Shutting down");
    let _ = shutdown_tx.send(());
    let (control_result, mock_result) = tokio::join!(control_task, mock_task);
    control_result.context("control API task panicked")??;
    mock_result.context("mock HTTP server task panicked")??;
    info!("Shutdown complete");
    Ok(())
}
