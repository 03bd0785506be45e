//! HTTP surface: metrics endpoint, landing page, version string.
//!
//! Served with `axum` on top of `axum-server`, which also terminates TLS
//! when enabled. Shutdown is driven by a `CancellationToken`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

use atlas_core::{BuildInfo, CONTENT_TYPE, Exporter};

use crate::config::ExporterConfig;
use crate::error::ExporterError;

/// Grace period for in-flight requests once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct AppState {
    pub exporter: Exporter,
    pub build: BuildInfo,
    pub metrics_path: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let metrics_path = state.metrics_path.clone();
    Router::new()
        .route("/", get(landing))
        .route("/version", get(version))
        .route(&metrics_path, get(metrics))
        .with_state(state)
}

// ── Handlers ────────────────────────────────────────────────────────

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.exporter.scrape().await;
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

async fn landing(State(state): State<Arc<AppState>>) -> Html<String> {
    let build = &state.build;
    Html(format!(
        "<html>\n\
         <head><title>RIPE Atlas Exporter (Version {version})</title></head>\n\
         <body>\n\
         <h1>RIPE Atlas Exporter</h1>\n\
         <p><a href=\"{path}\">Metrics</a></p>\n\
         <p><a href=\"/version\">Version</a></p>\n\
         </body>\n\
         <footer>Commit: {commit}, Date: {date}, Version: {version}</footer>\n\
         </html>\n",
        version = build.version,
        commit = build.commit,
        date = build.date,
        path = state.metrics_path,
    ))
}

async fn version(State(state): State<Arc<AppState>>) -> String {
    state.build.version_string()
}

// ── Serving ─────────────────────────────────────────────────────────

/// Serve until `shutdown` is cancelled, then drain for up to 10 seconds.
pub async fn serve(
    config: &ExporterConfig,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> Result<(), ExporterError> {
    let addr = config.socket_addr()?;
    let app = router(state).into_make_service();

    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown.cancelled().await;
            info!(grace_secs = SHUTDOWN_GRACE.as_secs(), "draining HTTP server");
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    let serve_error = |source| ExporterError::Serve {
        address: config.listen_address.clone(),
        source,
    };

    if config.tls_enabled {
        let tls = load_tls(config).await?;
        info!(%addr, path = %config.metrics_path, "listening (https)");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await
            .map_err(serve_error)
    } else {
        info!(%addr, path = %config.metrics_path, "listening (http)");
        axum_server::bind(addr)
            .handle(handle)
            .serve(app)
            .await
            .map_err(serve_error)
    }
}

async fn load_tls(config: &ExporterConfig) -> Result<RustlsConfig, ExporterError> {
    // A second install attempt only fails if a provider is already set.
    let _ = rustls::crypto::ring::default_provider().install_default();

    RustlsConfig::from_pem_file(&config.tls_cert_chain_path, &config.tls_key_path)
        .await
        .map_err(|source| ExporterError::Tls {
            cert: config.tls_cert_chain_path.clone(),
            key: config.tls_key_path.clone(),
            source,
        })
}

/// Resolve on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use atlas_api::{AtlasClient, ClientConfig, Context};

    use super::*;

    fn state() -> Arc<AppState> {
        // Nothing listens on port 1; every upstream call fails fast.
        let client = AtlasClient::new(
            ClientConfig::default()
                .with_base_url("http://127.0.0.1:1")
                .with_token("test-token"),
        )
        .unwrap();
        Arc::new(AppState {
            exporter: Exporter::new(
                Arc::new(client),
                Context::background(),
                Duration::from_secs(2),
            ),
            build: BuildInfo {
                version: "1.2.3",
                commit: "abc123",
                date: "2025-07-11",
                rust_version: "1.86.0",
            },
            metrics_path: "/metrics".into(),
        })
    }

    async fn get_path(path: &str) -> (StatusCode, Option<String>, String) {
        let response = router(state())
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn metrics_is_ok_even_when_upstream_is_down() {
        let (status, content_type, body) = get_path("/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(CONTENT_TYPE));
        assert!(body.contains("atlas_exporter_credits 0\n"));
        assert!(body.contains("atlas_exporter_build_info{version=\""));
        assert!(body.ends_with("# EOF\n"));
    }

    #[tokio::test]
    async fn version_reports_build() {
        let (status, _, body) = get_path("/version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1.2.3 (built 2025-07-11 with rustc 1.86.0)");
    }

    #[tokio::test]
    async fn landing_links_metrics_path() {
        let (status, content_type, body) = get_path("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(body.contains("href=\"/metrics\""));
        assert!(body.contains("Commit: abc123"));
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let (status, _, _) = get_path("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
