// Credits endpoint
//
// `GET /credits` returns a single snapshot of the account's credit balance
// and spend estimates.

use tracing::debug;

use crate::client::AtlasClient;
use crate::context::Context;
use crate::error::Error;
use crate::models::Credits;

const CREDITS_PATH: &str = "/credits";

impl AtlasClient {
    /// Fetch the current credit snapshot.
    ///
    /// Transport and HTTP failures come back as [`Error::Upstream`]; a body
    /// that does not match the snapshot shape is an [`Error::Decode`].
    pub async fn credits(&self, ctx: &Context) -> Result<Credits, Error> {
        self.require_token()?;
        debug!("fetching credits");

        let resp = self
            .get(ctx, CREDITS_PATH)
            .await
            .and_then(crate::client::ApiResponse::error_for_status)
            .map_err(|e| e.context("fetch credits"))?;

        resp.json()
    }
}
