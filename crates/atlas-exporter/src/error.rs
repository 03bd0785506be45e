//! Startup error types with miette diagnostics.
//!
//! Everything here is fatal: `main` prints the diagnostic and exits 1.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ExporterError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("No RIPE Atlas API token configured")]
    #[diagnostic(
        code(atlas_exporter::missing_token),
        help(
            "Create a key at https://atlas.ripe.net/keys/ and pass it with\n\
             --api-token, ATLAS_EXPORTER_API_TOKEN, or `api_token` in the config file."
        )
    )]
    MissingToken,

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(atlas_exporter::validation))]
    Validation { field: &'static str, reason: String },

    #[error("Configuration file not found: {}", path.display())]
    #[diagnostic(
        code(atlas_exporter::no_config),
        help("Check the --config / ATLAS_EXPORTER_CONFIG path.")
    )]
    ConfigNotFound { path: PathBuf },

    #[error(transparent)]
    #[diagnostic(code(atlas_exporter::config))]
    Config(Box<figment::Error>),

    // ── Startup ──────────────────────────────────────────────────────
    #[error("Could not build the Atlas API client")]
    #[diagnostic(code(atlas_exporter::client))]
    Client(#[from] atlas_api::Error),

    #[error("Could not load TLS material from {} and {}", cert.display(), key.display())]
    #[diagnostic(
        code(atlas_exporter::tls),
        help("Both files must be PEM encoded. Disable HTTPS with --tls-enabled=false.")
    )]
    Tls {
        cert: PathBuf,
        key: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server on {address} failed")]
    #[diagnostic(
        code(atlas_exporter::serve),
        help("Check that the address is free and the process may bind to it.")
    )]
    Serve {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<figment::Error> for ExporterError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

