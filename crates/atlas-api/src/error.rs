use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `atlas-api` crate.
///
/// Fetch operations wrap lower-level failures in [`Error::Upstream`] so the
/// caller can see which resource (and which page or probe) was being fetched.
/// The classification helpers look through that wrapper.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// No API token configured for an endpoint that requires one.
    #[error("Missing API token -- configure one before calling authenticated endpoints")]
    MissingCredential,

    /// Client configuration rejected at construction time.
    #[error("Invalid client configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, TLS, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The request deadline elapsed before a response arrived.
    #[error("Request timed out after {}s", .timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    /// The owning scope was cancelled (e.g. during shutdown).
    #[error("Request cancelled")]
    Cancelled,

    // ── Response ────────────────────────────────────────────────────
    /// Non-success HTTP status from the API.
    #[error("Atlas API error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    /// Body could not be read or decoded, with the raw body for debugging.
    #[error("Decode error: {message}")]
    Decode { message: String, body: String },

    // ── Context ─────────────────────────────────────────────────────
    /// A fetch operation failed; `operation` names what was being fetched.
    #[error("{operation} failed: {source}")]
    Upstream {
        operation: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Annotate this error with the fetch operation it happened in.
    pub fn context(self, operation: impl Into<String>) -> Self {
        Self::Upstream {
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any `Upstream` annotations.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Upstream { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns `true` if a deadline fired, at any level of wrapping.
    pub fn is_timeout(&self) -> bool {
        match self.root_cause() {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if the request never left because no token was set.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self.root_cause(), Self::MissingCredential)
    }

    /// Returns `true` if the owning scope was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Self::Cancelled)
    }

    /// HTTP status of the failed response, if the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self.root_cause() {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_and_classification_looks_through() {
        let err = Error::Timeout {
            timeout: Duration::from_secs(10),
        }
        .context("list probes (page 2)");

        assert!(err.is_timeout());
        assert!(!err.is_missing_credential());
        assert_eq!(
            err.to_string(),
            "list probes (page 2) failed: Request timed out after 10s"
        );
    }

    #[test]
    fn status_is_reported_through_upstream() {
        let err = Error::Status {
            status: 403,
            message: "forbidden".into(),
        }
        .context("fetch credits");

        assert_eq!(err.status(), Some(403));
        assert!(!err.is_timeout());
    }
}
