use clap::Parser;

mod cli;
mod coins;
mod collector;
mod config;
mod error;
mod history;
mod http;
mod logging;
mod models;
mod resolver;
mod sources;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::setup_tracing_logger();
    let cli = cli::Cli::parse();
    cli::execute(cli).await
}
