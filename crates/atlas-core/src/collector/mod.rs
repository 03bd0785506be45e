// Scrape-time metric collectors
//
// Each collector owns one gauge family. On every scrape it derives its own
// bounded context, calls the API, and turns the result into samples. Fetch
// errors stop here: they are logged and the family degrades to zero or to
// no samples, so a scrape always produces a body.

mod build_info;
mod credits;
mod probe_last_connected;
mod probe_measurements;

use std::fmt;
use std::time::Duration;

use atlas_api::{Context, Error};
use futures_util::future::BoxFuture;
use tracing::error;

pub use build_info::BuildInfoCollector;
pub use credits::CreditsCollector;
pub use probe_last_connected::ProbeLastConnectedCollector;
pub use probe_measurements::{MeasurementKey, ProbeMeasurementsCollector, aggregate};

// ── Metric model ─────────────────────────────────────────────────────

/// Static description of a gauge family. Stable across scrapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Name without the exporter prefix, e.g. `credits`.
    pub name: &'static str,
    pub help: &'static str,
    pub label_names: &'static [&'static str],
}

/// One gauge sample. Label values follow `Descriptor::label_names` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub labels: Vec<(&'static str, String)>,
    pub value: i64,
}

impl Sample {
    /// An unlabelled sample.
    pub fn unlabelled(value: i64) -> Self {
        Self {
            labels: Vec::new(),
            value,
        }
    }

    /// Pair `values` with the descriptor's label names.
    pub fn labelled(descriptor: &Descriptor, values: Vec<String>, value: i64) -> Self {
        debug_assert_eq!(descriptor.label_names.len(), values.len());
        Self {
            labels: descriptor
                .label_names
                .iter()
                .copied()
                .zip(values)
                .collect(),
            value,
        }
    }
}

/// The samples one collector produced for one scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeFamily {
    pub descriptor: Descriptor,
    pub samples: Vec<Sample>,
}

impl GaugeFamily {
    pub fn new(descriptor: Descriptor, samples: Vec<Sample>) -> Self {
        Self {
            descriptor,
            samples,
        }
    }

    /// A family with its descriptor but no samples.
    pub fn empty(descriptor: Descriptor) -> Self {
        Self::new(descriptor, Vec::new())
    }
}

// ── Collector trait ──────────────────────────────────────────────────

/// A source of one gauge family, invoked once per scrape.
///
/// `collect` must not fail: errors are logged and reflected in the samples.
pub trait MetricCollector: fmt::Debug + Send + Sync {
    fn descriptor(&self) -> &Descriptor;

    fn collect<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, GaugeFamily>;
}

/// Log a fetch failure with enough context to tell which timeout fired.
fn log_failure(collector: &'static str, timeout: Duration, err: &Error) {
    error!(
        collector,
        timeout_secs = timeout.as_secs_f64(),
        timed_out = err.is_timeout(),
        error = %err,
        "collection failed"
    );
}

/// Counts saturate at `i64::MAX`.
fn gauge_value(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
