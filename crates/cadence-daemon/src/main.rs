use std::sync::Arc;

use cadence_core::CadenceConfig;
use cadence_daemon::{DaemonState, Server};
use cadence_terminal::{CommandExecutor, ShellExecutor};
use clap::Parser;
use tracing::{info, warn};

/// Run shell commands on a fixed interval, controlled over TCP.
#[derive(Parser, Debug)]
#[command(name = "cadenced", version)]
struct Args {
    /// Config file (default: $CADENCE_CONFIG or ~/.cadence/cadence.toml)
    #[arg(long, short = 'c')]
    config: Option<String>,

    /// Address to bind, overriding the config file
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on, overriding the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cadence_daemon=info,cadence_scheduler=info,cadence_terminal=info".into()
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = CadenceConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        CadenceConfig::default()
    });
    if let Some(bind) = args.bind {
        config.daemon.bind = bind;
    }
    if let Some(port) = args.port {
        config.daemon.port = port;
    }

    // Commands go to the shell verbatim: anyone who can reach this port can
    // run code as this user.
    let executor: Arc<dyn CommandExecutor> =
        Arc::new(ShellExecutor::new(config.exec.clone().into()));
    info!(shell = %config.exec.shell, "command executor ready");

    let state = Arc::new(DaemonState::new(config, executor));
    let server = Server::bind(Arc::clone(&state)).await?;
    info!("Cadence daemon listening on {}", server.local_addr()?);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let listener = tokio::spawn(server.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    // stop accepting first, then cancel every job
    let _ = shutdown_tx.send(true);
    let _ = listener.await;
    let cancelled = state.dispatcher.shutdown().await?;
    info!(cancelled, "daemon stopped");
    Ok(())
}
