// Probe endpoints
//
// `GET /probes/my` lists the account's probes; `GET /probes/{id}/measurements`
// lists the measurements one probe took part in. Both are paginated.

use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::debug;

use crate::client::AtlasClient;
use crate::context::Context;
use crate::error::Error;
use crate::models::{Probe, ProbeMeasurement};

const MY_PROBES_PATH: &str = "/probes/my";

impl AtlasClient {
    /// List every probe owned by the account, across all pages.
    pub async fn my_probes(&self, ctx: &Context) -> Result<Vec<Probe>, Error> {
        self.require_token()?;
        debug!("listing probes");
        self.collect_pages(ctx, MY_PROBES_PATH, "list probes").await
    }

    /// List every measurement `probe_id` took part in, tagged with that id.
    pub async fn probe_measurements(
        &self,
        ctx: &Context,
        probe_id: u64,
    ) -> Result<Vec<ProbeMeasurement>, Error> {
        self.require_token()?;
        debug!(probe_id, "listing probe measurements");

        let mut measurements: Vec<ProbeMeasurement> = self
            .collect_pages(
                ctx,
                &format!("/probes/{probe_id}/measurements"),
                &format!("list measurements for probe {probe_id}"),
            )
            .await?;
        for m in &mut measurements {
            m.probe_id = probe_id;
        }
        Ok(measurements)
    }

    /// List the measurements of every probe the account owns.
    ///
    /// Per-probe walks run concurrently up to the configured limit; results
    /// keep probe order. The first failing probe aborts the whole fetch.
    pub async fn my_probe_measurements(
        &self,
        ctx: &Context,
    ) -> Result<Vec<ProbeMeasurement>, Error> {
        self.require_token()?;
        let probes = self.my_probes(ctx).await?;

        let per_probe: Vec<Vec<ProbeMeasurement>> =
            stream::iter(probes.iter().map(|probe| probe.id).collect::<Vec<u64>>())
                .map(|probe_id| self.probe_measurements(ctx, probe_id))
                .buffered(self.measurement_concurrency())
                .try_collect()
                .await?;

        let measurements: Vec<ProbeMeasurement> = per_probe.into_iter().flatten().collect();
        debug!(
            probes = probes.len(),
            measurements = measurements.len(),
            "collected probe measurements"
        );
        Ok(measurements)
    }
}
