// Cursor-based pagination over Atlas listing endpoints
//
// Listing endpoints answer with `{ count, next, previous, results }`. The
// `Cursor` tracks how far a walk has progressed; `collect_pages` drives it
// against the client until the listing is exhausted.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::client::AtlasClient;
use crate::context::Context;
use crate::error::Error;
use crate::models::Page;

/// Hard ceiling on pages fetched in one walk.
pub const MAX_PAGES: usize = 1000;

/// Position within a paginated listing.
///
/// `page` is the 1-based page number on the wire; `0` means "not yet
/// positioned" and is left out of the query, so the server serves its first
/// page. `next` carries the server's explicit next-page link when it sent one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    pub count: u64,
    pub page: u64,
    pub per_page: u64,
    pub next: Option<String>,
}

impl Cursor {
    /// The zero cursor with a requested page size.
    pub fn with_per_page(per_page: u64) -> Self {
        Self {
            per_page,
            ..Self::default()
        }
    }

    /// Whether the listing is exhausted.
    ///
    /// An explicit next link always means more data. Otherwise the walk is
    /// done once `page` reaches `count / per_page`; a zero `per_page` counts
    /// as done rather than dividing.
    pub fn is_done(&self) -> bool {
        if self.next.is_some() {
            return false;
        }
        if self.count == 0 || self.per_page == 0 {
            return true;
        }
        self.page >= self.count / self.per_page
    }

    /// The cursor for the following page, or the zero cursor when done.
    #[must_use]
    pub fn next(&self) -> Self {
        if self.is_done() {
            return Self::default();
        }
        Self {
            count: self.count,
            page: self.page + 1,
            per_page: self.per_page,
            next: None,
        }
    }

    /// Record what the server reported for the page this cursor requested.
    ///
    /// An unpositioned request lands on the server's first page, so the
    /// cursor is pinned to page 1 afterwards.
    #[must_use]
    pub fn observe(&self, count: u64, next: Option<String>) -> Self {
        Self {
            count,
            page: self.page.max(1),
            per_page: self.per_page,
            next: next.filter(|link| !link.is_empty()),
        }
    }

    /// `path` with the non-zero cursor fields appended as query parameters.
    pub fn query_uri(&self, path: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if self.page != 0 {
            query.append_pair("page", &self.page.to_string());
        }
        if self.per_page != 0 {
            query.append_pair("per_page", &self.per_page.to_string());
        }
        let query = query.finish();

        if query.is_empty() {
            path.to_owned()
        } else {
            format!("{path}?{query}")
        }
    }
}

impl AtlasClient {
    /// Walk every page of a listing and collect the results.
    ///
    /// All-or-nothing: a failing page aborts the walk and discards what was
    /// gathered so far. Errors are annotated with `operation` and the page.
    pub(crate) async fn collect_pages<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        operation: &str,
    ) -> Result<Vec<T>, Error> {
        let mut all = Vec::new();
        let mut cursor = Cursor::with_per_page(self.page_size());
        let mut fetched = 0_usize;

        loop {
            let uri = cursor.query_uri(path);
            let page: Page<T> = self
                .get(ctx, &uri)
                .await
                .and_then(crate::client::ApiResponse::error_for_status)
                .and_then(|resp| resp.json())
                .map_err(|e| e.context(format!("{operation} (page {})", cursor.page.max(1))))?;

            fetched += 1;
            let received = page.results.len();
            all.extend(page.results);
            cursor = cursor.observe(page.count, page.next);
            debug!(
                operation,
                page = cursor.page,
                received,
                total = cursor.count,
                "fetched page"
            );

            if cursor.is_done() {
                break;
            }
            if received == 0 {
                warn!(
                    operation,
                    page = cursor.page,
                    "empty page before listing end, stopping"
                );
                break;
            }
            if fetched >= MAX_PAGES {
                warn!(operation, pages = fetched, "page limit reached, stopping");
                break;
            }
            cursor = cursor.next();
        }

        Ok(all)
    }
}
