// Atlas REST API HTTP client
//
// Wraps `reqwest::Client` with token auth, header merging, the optional
// redacted request/response trace, and context-bounded execution. Endpoint
// modules (credits, probes) are inherent methods in separate files.

use std::fmt::Write as _;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::context::Context;
use crate::error::Error;

pub const DEFAULT_BASE_URL: &str = "https://atlas.ripe.net/api/v2";

/// Tracing target for the request/response dump.
pub const TRACE_TARGET: &str = "atlas_api::trace";

const REDACTED: &str = "[redacted]";

// ── Configuration ────────────────────────────────────────────────────

/// Client configuration. Validated once by [`AtlasClient::new`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://atlas.ripe.net/api/v2`. Paths are appended verbatim.
    pub base_url: String,
    pub api_token: Option<SecretString>,
    pub user_agent: String,
    /// Sent with every request; per-call headers override by name.
    pub headers: HeaderMap,
    /// Transport-level timeout for a single request.
    pub timeout: Duration,
    /// Requested page size for listing endpoints (`0` = server default).
    pub page_size: u64,
    /// Upper bound on concurrent per-probe measurement walks.
    pub measurement_concurrency: usize,
    /// Dump requests and responses (token redacted) at DEBUG level.
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_token: None,
            user_agent: format!("atlas-api/{}", env!("CARGO_PKG_VERSION")),
            headers: HeaderMap::new(),
            timeout: Duration::from_secs(60),
            page_size: 100,
            measurement_concurrency: 4,
            debug: false,
        }
    }
}

impl ClientConfig {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// ── Response envelope ────────────────────────────────────────────────

/// Raw response from the API. Status codes are not interpreted here.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: Bytes,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ApiResponse {
    /// Turn a non-2xx response into [`Error::Status`].
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.status.is_success() {
            return Ok(self);
        }
        let body = String::from_utf8_lossy(&self.body);
        let message = if body.trim().is_empty() {
            self.status.to_string()
        } else {
            preview(&body).to_owned()
        };
        Err(Error::Status {
            status: self.status.as_u16(),
            message,
        })
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| {
            let body = String::from_utf8_lossy(&self.body).into_owned();
            Error::Decode {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body,
            }
        })
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the RIPE Atlas REST API.
///
/// Immutable after construction and safe to share (`Arc<AtlasClient>`)
/// between concurrent collectors.
#[derive(Debug, Clone)]
pub struct AtlasClient {
    http: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    user_agent: HeaderValue,
    headers: HeaderMap,
    timeout: Duration,
    page_size: u64,
    measurement_concurrency: usize,
    debug: bool,
}

impl AtlasClient {
    /// Validate `config` and build the underlying HTTP client.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidConfig {
                field: "transport",
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Self::with_http(http, config)
    }

    /// Wrap an existing `reqwest::Client` (its own timeout and TLS settings apply).
    pub fn with_http(http: reqwest::Client, config: ClientConfig) -> Result<Self, Error> {
        if config.timeout.is_zero() {
            return Err(Error::InvalidConfig {
                field: "timeout",
                reason: "must be greater than zero".into(),
            });
        }

        let api_token = match config.api_token {
            Some(token) if token.expose_secret().trim().is_empty() => {
                return Err(Error::InvalidConfig {
                    field: "api_token",
                    reason: "cannot be empty".into(),
                });
            }
            other => other,
        };

        let user_agent =
            HeaderValue::from_str(&config.user_agent).map_err(|e| Error::InvalidConfig {
                field: "user_agent",
                reason: e.to_string(),
            })?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))?;

        Ok(Self {
            http,
            base_url,
            api_token,
            user_agent,
            headers: config.headers,
            timeout: config.timeout,
            page_size: config.page_size,
            measurement_concurrency: config.measurement_concurrency.max(1),
            debug: config.debug,
        })
    }

    /// The API root every path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    pub(crate) fn page_size(&self) -> u64 {
        self.page_size
    }

    pub(crate) fn measurement_concurrency(&self) -> usize {
        self.measurement_concurrency
    }

    /// Fail fast, before any I/O, when no token is configured.
    pub fn require_token(&self) -> Result<(), Error> {
        if self.api_token.is_some() {
            Ok(())
        } else {
            Err(Error::MissingCredential)
        }
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append `path` (which may carry a query string) to the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Merge base and per-call headers, then apply auth, user agent, and
    /// the default content type.
    fn merged_headers(&self, headers: &HeaderMap) -> Result<HeaderMap, Error> {
        let mut merged = self.headers.clone();
        for name in headers.keys() {
            merged.remove(name);
        }
        for (name, value) in headers {
            merged.append(name, value.clone());
        }

        if let Some(token) = &self.api_token {
            let mut value = HeaderValue::from_str(&format!("Key {}", token.expose_secret()))
                .map_err(|e| Error::InvalidConfig {
                    field: "api_token",
                    reason: format!("invalid header value: {e}"),
                })?;
            value.set_sensitive(true);
            merged.insert(AUTHORIZATION, value);
        }

        merged.insert(USER_AGENT, self.user_agent.clone());
        merged
            .entry(CONTENT_TYPE)
            .or_insert_with(|| HeaderValue::from_static("application/json"));

        Ok(merged)
    }

    /// Send a request and return the raw envelope.
    ///
    /// The call is bounded by `ctx`: an elapsed deadline returns
    /// [`Error::Timeout`], cancellation returns [`Error::Cancelled`].
    pub async fn request(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        headers: &HeaderMap,
    ) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        let mut builder = self
            .http
            .request(method, url)
            .headers(self.merged_headers(headers)?);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let request = builder.build().map_err(Error::Transport)?;

        debug!("{} {}", request.method(), request.url());
        if self.debug {
            self.trace(&dump_request(&request));
        }

        let response = ctx
            .run(async {
                let resp = self
                    .http
                    .execute(request)
                    .await
                    .map_err(|e| self.transport_error(e))?;
                let status = resp.status();
                let headers = resp.headers().clone();
                let body = resp.bytes().await.map_err(|e| {
                    if e.is_timeout() {
                        self.transport_error(e)
                    } else {
                        Error::Decode {
                            message: format!("could not read response body: {e}"),
                            body: String::new(),
                        }
                    }
                })?;
                Ok(ApiResponse {
                    body,
                    status,
                    headers,
                })
            })
            .await?;

        if self.debug {
            self.trace(&dump_response(&response));
        }

        Ok(response)
    }

    /// `GET path` with no body or extra headers.
    pub(crate) async fn get(&self, ctx: &Context, path: &str) -> Result<ApiResponse, Error> {
        self.request(ctx, Method::GET, path, None, &HeaderMap::new())
            .await
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout: self.timeout,
            }
        } else {
            Error::Transport(err)
        }
    }

    // ── Debug trace ──────────────────────────────────────────────────

    fn trace(&self, dump: &str) {
        let dump = self.redact(dump);
        debug!(target: TRACE_TARGET, "\n{dump}");
    }

    /// Replace every occurrence of the token in `text`.
    pub(crate) fn redact(&self, text: &str) -> String {
        match &self.api_token {
            Some(token) if !token.expose_secret().is_empty() => {
                text.replace(token.expose_secret(), REDACTED)
            }
            _ => text.to_owned(),
        }
    }
}

fn dump_request(request: &reqwest::Request) -> String {
    let mut out = String::new();
    let url = request.url();
    let target = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    };
    let _ = writeln!(out, "{} {target} HTTP/1.1", request.method());
    if let Some(host) = url.host_str() {
        let _ = writeln!(out, "host: {host}");
    }
    write_headers(&mut out, request.headers());
    if let Some(body) = request.body().and_then(reqwest::Body::as_bytes) {
        let _ = write!(out, "\n{}", String::from_utf8_lossy(body));
    }
    out
}

fn dump_response(response: &ApiResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "HTTP/1.1 {}", response.status);
    write_headers(&mut out, &response.headers);
    let _ = write!(out, "\n{}", String::from_utf8_lossy(&response.body));
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let _ = writeln!(out, "{name}: {}", String::from_utf8_lossy(value.as_bytes()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(token: Option<&str>) -> AtlasClient {
        let mut config = ClientConfig::default().with_base_url("https://example.com/api/v2/");
        if let Some(token) = token {
            config = config.with_token(token);
        }
        AtlasClient::new(config).unwrap()
    }

    #[test]
    fn redact_strips_every_occurrence_of_token() {
        let client = client(Some("s3cr3t-token"));
        let dump = "authorization: Key s3cr3t-token\n\n{\"echo\":\"s3cr3t-token\"}";
        let redacted = client.redact(dump);

        assert!(!redacted.contains("s3cr3t-token"));
        assert_eq!(redacted.matches(REDACTED).count(), 2);
    }

    #[test]
    fn request_dump_contains_auth_header_before_redaction() {
        let client = client(Some("s3cr3t-token"));
        let headers = client.merged_headers(&HeaderMap::new()).unwrap();
        let request = client
            .http
            .get("https://example.com/api/v2/credits")
            .headers(headers)
            .build()
            .unwrap();

        let dump = dump_request(&request);
        assert!(dump.starts_with("GET /api/v2/credits HTTP/1.1"));
        assert!(dump.contains("s3cr3t-token"));
        assert!(!client.redact(&dump).contains("s3cr3t-token"));
    }

    #[test]
    fn per_call_headers_win_over_base_headers() {
        let mut config = ClientConfig::default();
        config
            .headers
            .insert("x-test-header", HeaderValue::from_static("base"));
        config
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let client = AtlasClient::new(config).unwrap();

        let mut call = HeaderMap::new();
        call.insert("x-test-header", HeaderValue::from_static("call"));
        let merged = client.merged_headers(&call).unwrap();

        assert_eq!(merged["x-test-header"], "call");
        assert_eq!(merged[CONTENT_TYPE], "text/plain");
        assert!(merged.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn content_type_defaults_to_json_and_token_header_is_sensitive() {
        let client = client(Some("abc"));
        let merged = client.merged_headers(&HeaderMap::new()).unwrap();

        assert_eq!(merged[CONTENT_TYPE], "application/json");
        assert_eq!(merged[AUTHORIZATION], "Key abc");
        assert!(merged[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn url_appends_path_to_base_without_double_slash() {
        let client = client(None);
        let url = client.url("/probes/my?page=2").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v2/probes/my?page=2");
    }

    #[test]
    fn construction_rejects_blank_token_and_zero_timeout() {
        let blank = AtlasClient::new(ClientConfig::default().with_token("  "));
        assert!(matches!(
            blank,
            Err(Error::InvalidConfig {
                field: "api_token",
                ..
            })
        ));

        let zero = AtlasClient::new(ClientConfig {
            timeout: Duration::ZERO,
            ..ClientConfig::default()
        });
        assert!(matches!(
            zero,
            Err(Error::InvalidConfig {
                field: "timeout",
                ..
            })
        ));
    }

    #[test]
    fn error_for_status_keeps_body_preview() {
        let resp = ApiResponse {
            body: Bytes::from_static(b"{\"detail\":\"Invalid key\"}"),
            status: StatusCode::FORBIDDEN,
            headers: HeaderMap::new(),
        };
        let err = resp.error_for_status().unwrap_err();
        assert!(
            matches!(err, Error::Status { status: 403, ref message } if message.contains("Invalid key"))
        );
    }
}
