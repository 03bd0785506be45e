//! Scrape-time collection pipeline for the RIPE Atlas exporter.
//!
//! - **[`Exporter`]** owns the collector set and renders one OpenMetrics
//!   payload per scrape.
//! - **[`collector`]** holds the four gauge collectors (build info, credits,
//!   probe last-connected, probe measurement counts). Collectors never fail a
//!   scrape; upstream errors degrade to zero or empty families.
//! - **[`exposition`]** adapts collected families onto `prometheus-client`'s
//!   text encoder.

pub mod collector;
pub mod exporter;
pub mod exposition;
pub mod version;

pub use collector::{Descriptor, GaugeFamily, MetricCollector, Sample};
pub use exporter::Exporter;
pub use exposition::{CONTENT_TYPE, METRIC_PREFIX};
pub use version::BuildInfo;
