use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use atlas_api::{AtlasClient, Context, ProbeMeasurement};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::debug;

use super::{Descriptor, GaugeFamily, MetricCollector, Sample, gauge_value, log_failure};

const DESCRIPTOR: Descriptor = Descriptor {
    name: "probe_measurements",
    help: "Number of measurements per probe by measurement type and status",
    label_names: &["probe_id", "type", "status"],
};

/// Aggregation key: one gauge sample per distinct key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeasurementKey {
    pub probe_id: u64,
    pub kind: String,
    pub status: String,
}

/// Count measurements per `(probe_id, type, status)`, visiting each record once.
pub fn aggregate(measurements: &[ProbeMeasurement]) -> BTreeMap<MeasurementKey, u64> {
    let mut counts = BTreeMap::new();
    for m in measurements {
        let key = MeasurementKey {
            probe_id: m.probe_id,
            kind: m.measurement_type.clone(),
            status: m.status.clone(),
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Measurement counts per probe, type, and status.
#[derive(Debug, Clone)]
pub struct ProbeMeasurementsCollector {
    client: Arc<AtlasClient>,
    timeout: Duration,
}

impl ProbeMeasurementsCollector {
    pub fn new(client: Arc<AtlasClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl MetricCollector for ProbeMeasurementsCollector {
    fn descriptor(&self) -> &Descriptor {
        &DESCRIPTOR
    }

    fn collect<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, GaugeFamily> {
        async move {
            let ctx = ctx.with_timeout(self.timeout);
            let measurements = match self.client.my_probe_measurements(&ctx).await {
                Ok(measurements) => measurements,
                Err(e) => {
                    log_failure(DESCRIPTOR.name, self.timeout, &e);
                    return GaugeFamily::empty(DESCRIPTOR);
                }
            };

            let counts = aggregate(&measurements);
            debug!(
                measurements = measurements.len(),
                series = counts.len(),
                "collected probe measurements"
            );

            let samples = counts
                .into_iter()
                .map(|(key, count)| {
                    Sample::labelled(
                        &DESCRIPTOR,
                        vec![key.probe_id.to_string(), key.kind, key.status],
                        gauge_value(count),
                    )
                })
                .collect();
            GaugeFamily::new(DESCRIPTOR, samples)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn measurement(probe_id: u64, kind: &str, status: &str) -> ProbeMeasurement {
        ProbeMeasurement {
            probe_id,
            measurement_id: "1".into(),
            measurement_type: kind.into(),
            description: String::new(),
            status: status.into(),
            start_time: None,
            stop_time: None,
            target: String::new(),
        }
    }

    fn key(probe_id: u64, kind: &str, status: &str) -> MeasurementKey {
        MeasurementKey {
            probe_id,
            kind: kind.into(),
            status: status.into(),
        }
    }

    #[test]
    fn aggregate_counts_each_tuple() {
        let counts = aggregate(&[
            measurement(1, "ping", "completed"),
            measurement(1, "ping", "completed"),
            measurement(1, "ping", "error"),
            measurement(2, "traceroute", "completed"),
        ]);

        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&key(1, "ping", "completed")], 2);
        assert_eq!(counts[&key(1, "ping", "error")], 1);
        assert_eq!(counts[&key(2, "traceroute", "completed")], 1);
    }

    #[test]
    fn aggregate_total_equals_record_count() {
        let records: Vec<_> = (0..50_u64)
            .map(|i| {
                let kind = ["ping", "dns", "traceroute"][usize::try_from(i % 3).unwrap_or(0)];
                let status = if i % 2 == 0 { "ongoing" } else { "stopped" };
                measurement(i % 4, kind, status)
            })
            .collect();

        let counts = aggregate(&records);
        assert_eq!(counts.values().sum::<u64>(), 50);
        assert!(counts.len() <= 4 * 3 * 2);
    }

    #[test]
    fn aggregate_of_nothing_is_empty() {
        assert!(aggregate(&[]).is_empty());
    }
}
