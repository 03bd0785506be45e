use std::sync::Arc;
use std::time::Duration;

use atlas_api::{AtlasClient, Context};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::debug;

use super::{Descriptor, GaugeFamily, MetricCollector, Sample, log_failure};

const DESCRIPTOR: Descriptor = Descriptor {
    name: "credits",
    help: "Current number of credits available in the Atlas account",
    label_names: &[],
};

/// Current credit balance; `0` when the fetch fails.
#[derive(Debug, Clone)]
pub struct CreditsCollector {
    client: Arc<AtlasClient>,
    timeout: Duration,
}

impl CreditsCollector {
    pub fn new(client: Arc<AtlasClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl MetricCollector for CreditsCollector {
    fn descriptor(&self) -> &Descriptor {
        &DESCRIPTOR
    }

    fn collect<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, GaugeFamily> {
        async move {
            let ctx = ctx.with_timeout(self.timeout);
            let balance = match self.client.credits(&ctx).await {
                Ok(credits) => {
                    debug!(balance = credits.current_balance, "collected credits");
                    credits.current_balance
                }
                Err(e) => {
                    log_failure(DESCRIPTOR.name, self.timeout, &e);
                    0
                }
            };
            GaugeFamily::new(DESCRIPTOR, vec![Sample::unlabelled(balance)])
        }
        .boxed()
    }
}
