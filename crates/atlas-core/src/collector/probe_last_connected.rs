use std::sync::Arc;
use std::time::Duration;

use atlas_api::{AtlasClient, Context};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::debug;

use super::{Descriptor, GaugeFamily, MetricCollector, Sample, log_failure};

const DESCRIPTOR: Descriptor = Descriptor {
    name: "probe_last_connected",
    help: "Last connected time (Unix timestamp) for each probe",
    label_names: &["probe_id", "country_code", "description"],
};

/// One sample per owned probe, valued with its last connection time.
#[derive(Debug, Clone)]
pub struct ProbeLastConnectedCollector {
    client: Arc<AtlasClient>,
    timeout: Duration,
}

impl ProbeLastConnectedCollector {
    pub fn new(client: Arc<AtlasClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl MetricCollector for ProbeLastConnectedCollector {
    fn descriptor(&self) -> &Descriptor {
        &DESCRIPTOR
    }

    fn collect<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, GaugeFamily> {
        async move {
            let ctx = ctx.with_timeout(self.timeout);
            let probes = match self.client.my_probes(&ctx).await {
                Ok(probes) => probes,
                Err(e) => {
                    log_failure(DESCRIPTOR.name, self.timeout, &e);
                    return GaugeFamily::empty(DESCRIPTOR);
                }
            };
            debug!(probes = probes.len(), "collected probe last-connected times");

            let samples = probes
                .into_iter()
                .map(|probe| {
                    Sample::labelled(
                        &DESCRIPTOR,
                        vec![probe.id.to_string(), probe.country_code, probe.description],
                        probe.last_connected,
                    )
                })
                .collect();
            GaugeFamily::new(DESCRIPTOR, samples)
        }
        .boxed()
    }
}
