use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use textgate::config::{LogFormat, LoggingConfig, TextgateConfig};
use textgate::grpc::GrpcServer;
use textgate::ratelimit::{spawn_sweeper, Enforcement, RateLimiter};

/// Per-endpoint rate limiting for text-processing API callers.
#[derive(Parser, Debug)]
#[command(name = "textgate", version, about)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address for the gRPC server, overriding the configuration
    #[arg(long)]
    grpc_addr: Option<SocketAddr>,

    /// Allow every request without counting it (local development only)
    #[arg(long)]
    disable_enforcement: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gRPC rate limit service (default)
    Serve,
    /// Print the effective quota table as JSON and exit
    Quotas,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = TextgateConfig::load(cli.config.as_deref())?;
    if let Some(addr) = cli.grpc_addr {
        config.server.grpc_addr = addr;
    }
    if cli.disable_enforcement {
        config.rate_limiting.enforcement = Enforcement::Disabled;
    }

    let quotas = config.rate_limiting.quota_table()?;

    if let Some(Command::Quotas) = cli.command {
        let table = serde_json::json!({
            "default": quotas.default_quota(),
            "endpoints": quotas.entries(),
        });
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    init_tracing(&config.logging);

    info!("Starting Textgate Rate Limiting Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        grpc_addr = %config.server.grpc_addr,
        enforcement = ?config.rate_limiting.enforcement,
        "Configuration loaded"
    );

    let rate_limiter = Arc::new(RateLimiter::new(quotas, config.rate_limiting.enforcement));
    info!("Rate limiter initialized");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = config
        .rate_limiting
        .sweep_interval()
        .map(|interval| spawn_sweeper(rate_limiter.clone(), interval, shutdown_rx));

    let grpc_server = GrpcServer::new(config.server.grpc_addr, rate_limiter);

    // Run the server with graceful shutdown on Ctrl+C
    let served = grpc_server.serve_with_shutdown(shutdown_signal()).await;

    let _ = shutdown_tx.send(true);
    if let Some(sweeper) = sweeper {
        sweeper.await?;
    }

    served?;
    info!("Textgate Rate Limiting Service stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(true);

    match logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
