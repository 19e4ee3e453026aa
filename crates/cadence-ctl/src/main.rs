mod client;
mod duration;

use std::{process::ExitCode, time::Duration};

use cadence_core::{config::DaemonConfig, CadenceConfig, JobId};
use cadence_protocol::{Request, TaskSpec};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::client::Client;

#[derive(Parser, Debug)]
#[command(name = "cadence", version)]
#[command(about = "Add, stop and list jobs on a running cadenced")]
struct Cli {
    /// Daemon address (default: derived from the config file, 127.0.0.1:54030)
    #[arg(long, global = true)]
    addr: Option<String>,

    /// Config file (default: $CADENCE_CONFIG or ~/.cadence/cadence.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run COMMAND every INTERVAL
    Add {
        /// Shell command, passed to the daemon's shell as-is
        command: String,

        /// Time between runs, e.g. 500ms, 10s, 1m30s
        #[arg(value_parser = duration::parse_duration)]
        interval: Duration,

        /// Extra runs after the first; negative runs until stopped
        #[arg(allow_negative_numbers = true)]
        repeat: i64,

        /// Owner label used by `list <owner>`
        owner: Option<String>,
    },

    /// Stop a running job
    Stop { job_id: String },

    /// List running jobs, optionally only those of one owner
    List { owner: Option<String> },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CadenceConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        CadenceConfig::default()
    });
    let addr = cli.addr.unwrap_or_else(|| connect_addr(&config.daemon));
    let client = Client::new(
        addr,
        config.daemon.max_frame_bytes,
        Duration::from_millis(config.daemon.read_timeout_ms),
    );

    match cli.command {
        Commands::Add {
            command,
            interval,
            repeat,
            owner,
        } => {
            let task = TaskSpec {
                id: JobId::generate(),
                command,
                interval,
                repeat,
            };
            let id = task.id.clone();
            client.send(&Request::task(task, owner)).await?;
            println!("Task {id} added");
        }
        Commands::Stop { job_id } => {
            client.send(&Request::stop(job_id.as_str())).await?;
            println!("Task {job_id} stop request sent");
        }
        Commands::List { owner } => {
            let owner = owner.filter(|o| !o.is_empty());
            let ids = client.list(owner.clone()).await?;
            match owner {
                Some(owner) => println!("Running tasks for user {owner} :"),
                None => println!("Running tasks:"),
            }
            for id in ids {
                println!("{id}");
            }
        }
    }
    Ok(())
}

/// The daemon may listen on a wildcard address; connect over loopback then.
fn connect_addr(daemon: &DaemonConfig) -> String {
    match daemon.bind.as_str() {
        "0.0.0.0" | "::" | "[::]" | "" => format!("127.0.0.1:{}", daemon.port),
        _ => daemon.addr(),
    }
}
