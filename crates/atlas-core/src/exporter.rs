// Scrape orchestration
//
// `Exporter` owns the collector set and the root context. A scrape runs
// every collector concurrently and renders whatever came back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use atlas_api::{AtlasClient, Context};
use futures_util::future::join_all;
use tracing::{debug, error};

use crate::collector::{
    BuildInfoCollector, CreditsCollector, GaugeFamily, MetricCollector,
    ProbeLastConnectedCollector, ProbeMeasurementsCollector,
};
use crate::exposition;
use crate::version::BuildInfo;

/// The full collection pipeline behind the metrics endpoint.
#[derive(Debug)]
pub struct Exporter {
    root: Context,
    collectors: Vec<Box<dyn MetricCollector>>,
}

impl Exporter {
    /// The standard collector set, each bounded by `scrape_timeout` per scrape.
    pub fn new(client: Arc<AtlasClient>, root: Context, scrape_timeout: Duration) -> Self {
        let collectors: Vec<Box<dyn MetricCollector>> = vec![
            Box::new(BuildInfoCollector::new(BuildInfo::current())),
            Box::new(CreditsCollector::new(Arc::clone(&client), scrape_timeout)),
            Box::new(ProbeLastConnectedCollector::new(
                Arc::clone(&client),
                scrape_timeout,
            )),
            Box::new(ProbeMeasurementsCollector::new(client, scrape_timeout)),
        ];
        Self::with_collectors(root, collectors)
    }

    pub fn with_collectors(root: Context, collectors: Vec<Box<dyn MetricCollector>>) -> Self {
        Self { root, collectors }
    }

    /// The context every scrape derives from. Cancel it to abort in-flight scrapes.
    pub fn root(&self) -> &Context {
        &self.root
    }

    /// Run every collector once, concurrently. Families keep collector order.
    pub async fn gather(&self) -> Vec<GaugeFamily> {
        join_all(self.collectors.iter().map(|c| c.collect(&self.root))).await
    }

    /// Run a full collection cycle and render the payload.
    ///
    /// Never fails: collectors absorb fetch errors, and an encoder failure
    /// degrades to a bare `# EOF`.
    pub async fn scrape(&self) -> String {
        let started = Instant::now();
        let families = self.gather().await;
        let samples: usize = families.iter().map(|f| f.samples.len()).sum();

        let body = exposition::encode(families).unwrap_or_else(|e| {
            error!(error = %e, "failed to encode metrics");
            String::from("# EOF\n")
        });

        debug!(
            samples,
            elapsed_ms = started.elapsed().as_millis(),
            "scrape complete"
        );
        body
    }
}

#[cfg(test)]
mod tests {
    use futures_util::FutureExt;
    use futures_util::future::BoxFuture;

    use super::*;
    use crate::collector::{Descriptor, Sample};

    #[derive(Debug)]
    struct Fixed(Descriptor, i64);

    impl MetricCollector for Fixed {
        fn descriptor(&self) -> &Descriptor {
            &self.0
        }

        fn collect<'a>(&'a self, _ctx: &'a Context) -> BoxFuture<'a, GaugeFamily> {
            async move { GaugeFamily::new(self.0, vec![Sample::unlabelled(self.1)]) }.boxed()
        }
    }

    const A: Descriptor = Descriptor {
        name: "a",
        help: "first",
        label_names: &[],
    };
    const B: Descriptor = Descriptor {
        name: "b",
        help: "second",
        label_names: &[],
    };

    #[tokio::test]
    async fn gather_keeps_collector_order() {
        let exporter = Exporter::with_collectors(
            Context::background(),
            vec![Box::new(Fixed(B, 2)), Box::new(Fixed(A, 1))],
        );

        let names: Vec<_> = exporter
            .gather()
            .await
            .iter()
            .map(|f| f.descriptor.name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn scrape_renders_every_family() {
        let exporter = Exporter::with_collectors(
            Context::background(),
            vec![Box::new(Fixed(A, 1)), Box::new(Fixed(B, 2))],
        );

        let body = exporter.scrape().await;
        assert!(body.contains("atlas_exporter_a 1\n"));
        assert!(body.contains("atlas_exporter_b 2\n"));
        assert!(body.ends_with("# EOF\n"));
    }
}
