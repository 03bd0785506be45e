//! Exporter configuration.
//!
//! Layers, lowest precedence first: built-in defaults, the optional TOML
//! file, then flags and `ATLAS_EXPORTER_*` variables (both arrive through
//! clap). The merged result is validated once, before anything starts.

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Format, Serialized, Toml};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use atlas_api::{ClientConfig, DEFAULT_BASE_URL};

use crate::cli::ServeOpts;
use crate::error::ExporterError;

// ── Config struct ───────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub listen_address: String,
    pub metrics_path: String,
    pub api_token: Option<String>,
    /// Per-collector scrape budget, in seconds.
    pub timeout: u64,
    pub tls_enabled: bool,
    pub tls_cert_chain_path: PathBuf,
    pub tls_key_path: PathBuf,
    pub log_level: String,
    pub base_url: String,
    pub page_size: u64,
    pub measurement_concurrency: usize,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: ":8080".into(),
            metrics_path: "/metrics".into(),
            api_token: None,
            timeout: 60,
            tls_enabled: false,
            tls_cert_chain_path: "cert.pem".into(),
            tls_key_path: "key.pem".into(),
            log_level: "info".into(),
            base_url: DEFAULT_BASE_URL.into(),
            page_size: 100,
            measurement_concurrency: 4,
        }
    }
}

// Hand-written so the token never reaches a log line.
impl fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("listen_address", &self.listen_address)
            .field("metrics_path", &self.metrics_path)
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field("timeout", &self.timeout)
            .field("tls_enabled", &self.tls_enabled)
            .field("tls_cert_chain_path", &self.tls_cert_chain_path)
            .field("tls_key_path", &self.tls_key_path)
            .field("log_level", &self.log_level)
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("measurement_concurrency", &self.measurement_concurrency)
            .finish()
    }
}

/// Flag/env values that were actually given; absent ones leave lower layers alone.
#[derive(Serialize)]
struct Overrides<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    listen_address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tls_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tls_cert_chain_path: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tls_key_path: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    measurement_concurrency: Option<usize>,
}

impl<'a> From<&'a ServeOpts> for Overrides<'a> {
    fn from(opts: &'a ServeOpts) -> Self {
        Self {
            listen_address: opts.listen_address.as_deref(),
            metrics_path: opts.metrics_path.as_deref(),
            api_token: opts.api_token.as_deref(),
            timeout: opts.timeout,
            tls_enabled: opts.tls_enabled,
            tls_cert_chain_path: opts.tls_cert_chain_path.as_ref(),
            tls_key_path: opts.tls_key_path.as_ref(),
            log_level: opts.log_level.as_deref(),
            base_url: opts.base_url.as_deref(),
            page_size: opts.page_size,
            measurement_concurrency: opts.measurement_concurrency,
        }
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Merge every layer and validate the result.
pub fn load(opts: &ServeOpts) -> Result<ExporterConfig, ExporterError> {
    let mut figment = Figment::new().merge(Serialized::defaults(ExporterConfig::default()));

    if let Some(path) = &opts.config {
        if !path.is_file() {
            return Err(ExporterError::ConfigNotFound { path: path.clone() });
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: ExporterConfig = figment
        .merge(Serialized::defaults(Overrides::from(opts)))
        .extract()?;
    config.validate()?;
    Ok(config)
}

// ── Validation & derived values ─────────────────────────────────────

impl ExporterConfig {
    /// Reject values that would only fail later, at bind or scrape time.
    pub fn validate(&self) -> Result<(), ExporterError> {
        match &self.api_token {
            Some(token) if !token.trim().is_empty() => {}
            _ => return Err(ExporterError::MissingToken),
        }
        self.log_filter()?;
        self.socket_addr()?;

        if self.timeout == 0 {
            return Err(ExporterError::Validation {
                field: "timeout",
                reason: "must be at least 1 second".into(),
            });
        }
        if !self.metrics_path.starts_with('/') || self.metrics_path == "/" {
            return Err(ExporterError::Validation {
                field: "metrics_path",
                reason: format!("must be an absolute path other than `/`, got `{}`", self.metrics_path),
            });
        }
        if self.metrics_path == "/version" {
            return Err(ExporterError::Validation {
                field: "metrics_path",
                reason: "`/version` is reserved".into(),
            });
        }
        if self.measurement_concurrency == 0 {
            return Err(ExporterError::Validation {
                field: "measurement_concurrency",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// The configured level as a tracing filter.
    pub fn log_filter(&self) -> Result<LevelFilter, ExporterError> {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LevelFilter::TRACE),
            "debug" => Ok(LevelFilter::DEBUG),
            "info" => Ok(LevelFilter::INFO),
            "warn" | "warning" => Ok(LevelFilter::WARN),
            "error" => Ok(LevelFilter::ERROR),
            other => Err(ExporterError::Validation {
                field: "log_level",
                reason: format!("expected trace, debug, info, warn or error, got `{other}`"),
            }),
        }
    }

    /// Resolve `listen_address`; a bare `:PORT` binds every interface.
    pub fn socket_addr(&self) -> Result<SocketAddr, ExporterError> {
        let raw = self.listen_address.trim();
        let candidate = if raw.starts_with(':') {
            format!("0.0.0.0{raw}")
        } else {
            raw.to_owned()
        };

        let invalid = |reason: String| ExporterError::Validation {
            field: "listen_address",
            reason,
        };
        candidate
            .to_socket_addrs()
            .map_err(|e| invalid(format!("`{raw}`: {e}")))?
            .next()
            .ok_or_else(|| invalid(format!("`{raw}` resolved to no address")))
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Client settings; debug and trace levels turn on the request trace.
    pub fn client_config(&self) -> ClientConfig {
        let debug = self
            .log_filter()
            .is_ok_and(|level| level >= LevelFilter::DEBUG);
        ClientConfig {
            base_url: self.base_url.clone(),
            api_token: self.api_token.clone().map(SecretString::from),
            user_agent: format!("atlas-exporter/{}", env!("CARGO_PKG_VERSION")),
            timeout: self.scrape_timeout(),
            page_size: self.page_size,
            measurement_concurrency: self.measurement_concurrency,
            debug,
            ..ClientConfig::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    fn opts_with_token() -> ServeOpts {
        ServeOpts {
            api_token: Some("test-token".into()),
            ..ServeOpts::default()
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&opts_with_token()).unwrap();

        assert_eq!(config.listen_address, ":8080");
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config.timeout, 60);
        assert!(!config.tls_enabled);
        assert_eq!(config.tls_cert_chain_path, PathBuf::from("cert.pem"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.socket_addr().unwrap(), "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn missing_or_blank_token_is_rejected() {
        assert!(matches!(
            load(&ServeOpts::default()),
            Err(ExporterError::MissingToken)
        ));

        let blank = ServeOpts {
            api_token: Some("   ".into()),
            ..ServeOpts::default()
        };
        assert!(matches!(load(&blank), Err(ExporterError::MissingToken)));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let opts = ServeOpts {
            log_level: Some("verbose".into()),
            ..opts_with_token()
        };
        assert!(matches!(
            load(&opts),
            Err(ExporterError::Validation {
                field: "log_level",
                ..
            })
        ));
    }

    #[test]
    fn file_values_sit_between_defaults_and_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_token = \"from-file\"\ntimeout = 15\nmetrics_path = \"/atlas\"\nlog_level = \"debug\""
        )
        .unwrap();

        let opts = ServeOpts {
            config: Some(file.path().to_path_buf()),
            timeout: Some(30),
            ..ServeOpts::default()
        };
        let config = load(&opts).unwrap();

        assert_eq!(config.api_token.as_deref(), Some("from-file"));
        assert_eq!(config.metrics_path, "/atlas");
        assert_eq!(config.timeout, 30);
        assert!(config.client_config().debug);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let opts = ServeOpts {
            config: Some("/nonexistent/atlas-exporter.toml".into()),
            ..opts_with_token()
        };
        assert!(matches!(
            load(&opts),
            Err(ExporterError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn reserved_or_relative_metrics_path_is_rejected() {
        for path in ["metrics", "/", "/version"] {
            let opts = ServeOpts {
                metrics_path: Some(path.into()),
                ..opts_with_token()
            };
            assert!(
                matches!(
                    load(&opts),
                    Err(ExporterError::Validation {
                        field: "metrics_path",
                        ..
                    })
                ),
                "{path}"
            );
        }
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = load(&opts_with_token()).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("test-token"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn client_config_carries_scrape_settings() {
        let config = load(&ServeOpts {
            page_size: Some(25),
            measurement_concurrency: Some(2),
            ..opts_with_token()
        })
        .unwrap();
        let client = config.client_config();

        assert_eq!(client.page_size, 25);
        assert_eq!(client.measurement_concurrency, 2);
        assert_eq!(client.timeout, Duration::from_secs(60));
        assert!(client.user_agent.starts_with("atlas-exporter/"));
        assert!(!client.debug);
    }
}
