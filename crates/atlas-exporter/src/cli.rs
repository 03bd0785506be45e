//! Clap derive structures for the `atlas-exporter` binary.
//!
//! Every serve option is optional here so the config file can fill gaps;
//! defaults live in `config.rs`. Also pulled into `build.rs` for man pages,
//! so this file may only depend on clap and clap_complete.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// atlas-exporter -- Prometheus exporter for RIPE Atlas
#[derive(Debug, Parser)]
#[command(
    name = "atlas-exporter",
    version,
    about = "Export RIPE Atlas credits, probes, and measurements as Prometheus metrics",
    long_about = "Serves an OpenMetrics endpoint that polls the RIPE Atlas API on every scrape.\n\n\
        Options are read from flags, ATLAS_EXPORTER_* environment variables,\n\
        and an optional TOML file, in that order of precedence."
)]
pub struct Cli {
    #[command(flatten)]
    pub serve: ServeOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Serve Options ────────────────────────────────────────────────────

#[derive(Debug, Default, Args)]
pub struct ServeOpts {
    /// TOML config file
    #[arg(long, env = "ATLAS_EXPORTER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on [default: :8080]
    #[arg(long, env = "ATLAS_EXPORTER_LISTEN_ADDRESS", value_name = "ADDR")]
    pub listen_address: Option<String>,

    /// Path under which metrics are served [default: /metrics]
    #[arg(long, env = "ATLAS_EXPORTER_METRICS_PATH", value_name = "PATH")]
    pub metrics_path: Option<String>,

    /// RIPE Atlas API key
    #[arg(long, env = "ATLAS_EXPORTER_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Per-collector scrape timeout in seconds [default: 60]
    #[arg(long, env = "ATLAS_EXPORTER_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Serve metrics over HTTPS
    #[arg(
        long,
        env = "ATLAS_EXPORTER_TLS_ENABLED",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub tls_enabled: Option<bool>,

    /// PEM certificate chain for HTTPS [default: cert.pem]
    #[arg(long, env = "ATLAS_EXPORTER_TLS_CERT_CHAIN_PATH", value_name = "PATH")]
    pub tls_cert_chain_path: Option<PathBuf>,

    /// PEM private key for HTTPS [default: key.pem]
    #[arg(long, env = "ATLAS_EXPORTER_TLS_KEY_PATH", value_name = "PATH")]
    pub tls_key_path: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error [default: info]
    #[arg(long, env = "ATLAS_EXPORTER_LOG_LEVEL", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Atlas API base URL
    #[arg(long, env = "ATLAS_EXPORTER_BASE_URL", value_name = "URL", hide = true)]
    pub base_url: Option<String>,

    /// Page size for listing endpoints [default: 100]
    #[arg(long, env = "ATLAS_EXPORTER_PAGE_SIZE", value_name = "N")]
    pub page_size: Option<u64>,

    /// Probes whose measurements are fetched concurrently [default: 4]
    #[arg(long, env = "ATLAS_EXPORTER_MEASUREMENT_CONCURRENCY", value_name = "N")]
    pub measurement_concurrency: Option<usize>,
}

// ── Subcommands ──────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
