mod cli;
mod config;
mod error;
mod server;

use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use atlas_api::{AtlasClient, Context};
use atlas_core::{BuildInfo, Exporter};

use crate::cli::{Cli, Command};
use crate::config::ExporterConfig;
use crate::error::ExporterError;
use crate::server::AppState;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ExporterError> {
    if let Some(Command::Completions(args)) = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(args.shell, &mut cmd, "atlas-exporter", &mut std::io::stdout());
        return Ok(());
    }

    let config = config::load(&cli.serve)?;
    init_tracing(config.log_filter()?);
    serve(config).await
}

fn init_tracing(level: LevelFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .init();
}

async fn serve(config: ExporterConfig) -> Result<(), ExporterError> {
    let build = BuildInfo::current();
    info!(
        version = build.version,
        commit = build.commit,
        date = build.date,
        "starting atlas-exporter"
    );

    let client = AtlasClient::new(config.client_config())?;
    info!(base_url = %client.base_url(), timeout_secs = config.timeout, "Atlas API client ready");

    let shutdown = CancellationToken::new();
    let root = Context::with_cancellation(shutdown.clone());
    let state = Arc::new(AppState {
        exporter: Exporter::new(Arc::new(client), root, config.scrape_timeout()),
        build,
        metrics_path: config.metrics_path.clone(),
    });

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            server::shutdown_signal().await;
            shutdown.cancel();
        }
    });

    server::serve(&config, state, shutdown).await?;
    info!("shut down cleanly");
    Ok(())
}
