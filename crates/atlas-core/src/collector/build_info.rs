use atlas_api::Context;
use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};

use super::{Descriptor, GaugeFamily, MetricCollector, Sample};
use crate::version::BuildInfo;

const DESCRIPTOR: Descriptor = Descriptor {
    name: "build_info",
    help: "Build information about the Atlas exporter",
    label_names: &["version", "commit", "date", "rust_version"],
};

/// Constant `1`, labelled with the build metadata. Never touches the API.
#[derive(Debug, Clone)]
pub struct BuildInfoCollector {
    info: BuildInfo,
}

impl BuildInfoCollector {
    pub fn new(info: BuildInfo) -> Self {
        Self { info }
    }
}

impl Default for BuildInfoCollector {
    fn default() -> Self {
        Self::new(BuildInfo::current())
    }
}

impl MetricCollector for BuildInfoCollector {
    fn descriptor(&self) -> &Descriptor {
        &DESCRIPTOR
    }

    fn collect<'a>(&'a self, _ctx: &'a Context) -> BoxFuture<'a, GaugeFamily> {
        let sample = Sample::labelled(
            &DESCRIPTOR,
            vec![
                self.info.version.to_owned(),
                self.info.commit.to_owned(),
                self.info.date.to_owned(),
                self.info.rust_version.to_owned(),
            ],
            1,
        );
        future::ready(GaugeFamily::new(DESCRIPTOR, vec![sample])).boxed()
    }
}
