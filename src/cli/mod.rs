use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::collector::Collector;
use crate::config::Config;
use crate::history::HistoryStore;
use crate::http;
use crate::http::state::AppState;
use crate::resolver::Resolver;
use crate::sources::Sources;

#[derive(Parser)]
#[command(author, version, about)]
pub(crate) struct Cli {
    /// Path to a TOML config file; built-in defaults apply when absent.
    #[arg(long, global = true, env = "BLOXCHASER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API, with a background collection loop unless disabled
    Run(RunArgs),
    /// Execute one collection pass and exit; non-zero when no coin updated
    Collect(CollectArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, env = "HTTP_PORT")]
    http_port: Option<u16>,

    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Skip the in-process collection loop (an external scheduler runs
    /// `collect` instead)
    #[arg(long)]
    no_collector: bool,
}

#[derive(Args)]
struct CollectArgs {
    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,
}

pub(crate) async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::read_from_toml_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Run(args) => {
            let mut config = config;
            if let Some(port) = args.http_port {
                config.http_port = port;
            }
            if let Some(data_dir) = args.data_dir {
                config.data_dir = data_dir;
            }
            run(config, args.no_collector).await
        }
        Commands::Collect(args) => {
            let mut config = config;
            if let Some(data_dir) = args.data_dir {
                config.data_dir = data_dir;
            }
            collect(config).await
        }
        Commands::Config => {
            println!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn build_components(config: &Config) -> anyhow::Result<(Arc<Resolver>, Arc<HistoryStore>)> {
    let sources = Arc::new(Sources::new(config)?);
    let resolver = Arc::new(Resolver::new(sources));
    let store = Arc::new(HistoryStore::new(
        &config.data_dir,
        config.history_cache_ttl,
    )?);
    Ok((resolver, store))
}

async fn collect(config: Config) -> anyhow::Result<()> {
    let (resolver, store) = build_components(&config)?;
    let collector = Collector::new(resolver, store);

    let report = collector.run_once().await;
    if report.updated == 0 {
        anyhow::bail!("collection pass failed: no coins were updated");
    }
    if !report.failed.is_empty() {
        tracing::warn!("collection finished with failures: {:?}", report.failed);
    }
    Ok(())
}

async fn run(config: Config, no_collector: bool) -> anyhow::Result<()> {
    tracing::info!("bloxchaser api starting up...");

    let (resolver, store) = build_components(&config)?;
    let state = AppState::new(resolver.clone(), store.clone(), config.networks_cache_ttl);
    let token = CancellationToken::new();

    if !no_collector {
        let collector = Arc::new(Collector::new(resolver, store));
        collector.spawn_interval(config.collection_interval, token.clone());
    }

    let server = http::server::build_http_api(state, config.http_port).await?;
    let server_handle = tokio::spawn(server.run(token.clone().cancelled_owned()));

    wait_for_signal().await;

    tracing::info!("sending shutdown");
    token.cancel();
    server_handle.await??;
    tracing::info!("stopping bloxchaser api");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM channel");
    let mut sigquit = signal(SignalKind::quit()).expect("Failed to setup SIGQUIT channel");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT");
        },
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
        _ = sigquit.recv() => {
            tracing::info!("Received SIGQUIT");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for SIGINT: {err}");
    }
}
