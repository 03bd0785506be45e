// OpenMetrics text exposition
//
// Collected families are frozen into a `Snapshot`, registered on a fresh
// `prometheus_client` registry, and rendered with its text encoder. The
// registry only lives for one scrape.

use std::fmt;

use prometheus_client::collector::Collector;
use prometheus_client::encoding::{DescriptorEncoder, EncodeMetric, text};
use prometheus_client::metrics::MetricType;
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::registry::Registry;

use crate::collector::GaugeFamily;

/// Prefix applied to every metric name.
pub const METRIC_PREFIX: &str = "atlas_exporter";

/// Content type of the rendered payload.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Debug)]
struct Snapshot {
    families: Vec<GaugeFamily>,
}

impl Collector for Snapshot {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), fmt::Error> {
        for family in &self.families {
            let desc = &family.descriptor;
            let mut metric = encoder.encode_descriptor(desc.name, desc.help, None, MetricType::Gauge)?;

            match family.samples.as_slice() {
                // An empty label set would render as `name{} value`.
                [only] if only.labels.is_empty() => ConstGauge::new(only.value).encode(metric)?,
                samples => {
                    for sample in samples {
                        let labels: Vec<(&str, String)> = sample
                            .labels
                            .iter()
                            .map(|(name, value)| (*name, escape_label_value(value)))
                            .collect();
                        ConstGauge::new(sample.value).encode(metric.encode_family(&labels)?)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Render `families` as one OpenMetrics text payload, terminated by `# EOF`.
pub fn encode(families: Vec<GaugeFamily>) -> Result<String, fmt::Error> {
    let mut registry = Registry::with_prefix(METRIC_PREFIX);
    registry.register_collector(Box::new(Snapshot { families }));

    let mut body = String::new();
    text::encode(&mut body, &registry)?;
    Ok(body)
}

/// Escape `\`, `"`, and newlines; the text encoder writes label values verbatim.
fn escape_label_value(value: &str) -> String {
    if !value.contains(['\\', '"', '\n']) {
        return value.to_owned();
    }
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}
