//! Page-by-page collection traversal.
//!
//! The crawler walks a collection strictly in increasing page order and
//! processes each page's items in document order, one at a time. The original
//! site paginates by appending the page number to the collection URL, and it
//! may render an interstitial page with no items before the literal not-found
//! placeholder, so both signals terminate the walk; the not-found marker is
//! checked first.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::download::{DownloadError, DownloadManager, DownloadOutcome};
use crate::parser::{ListItem, PageParser};
use crate::resolver::{AssetResolver, ResolveError};
use crate::session::{HttpSession, SessionError};

/// Default pause after each attempted item, per the site's rate expectations.
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_secs(2);

/// Errors that abort a crawl. Per-item failures never reach this type; they
/// are logged and counted in [`CrawlStats::failed`].
#[derive(Debug, Error)]
pub enum CrawlError {
    /// A listing page fetch failed (transient beyond the retry budget, or a
    /// permanent status).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A listing page body could not be read.
    #[error("failed to read listing page body for {url}: {source}")]
    Body {
        /// The listing page URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// A local write failed; the run halts rather than continue past a
    /// partially-written artifact.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Counters for one crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Listing pages that yielded items.
    pub pages: u32,
    /// Assets fetched and written.
    pub downloaded: u32,
    /// Assets skipped because their target already existed.
    pub skipped: u32,
    /// Items that failed resolution or fetch and were skipped.
    pub failed: u32,
}

enum ItemFailure {
    Resolve(ResolveError),
    Download(DownloadError),
}

/// Drives the traversal: fetch page, parse, resolve and download each item,
/// advance until a termination signal.
pub struct CollectionCrawler {
    session: HttpSession,
    parser: Box<dyn PageParser>,
    resolver: Box<dyn AssetResolver>,
    downloads: DownloadManager,
    item_delay: Duration,
}

impl CollectionCrawler {
    /// Creates a crawler with the default inter-item delay.
    #[must_use]
    pub fn new(
        session: HttpSession,
        parser: Box<dyn PageParser>,
        resolver: Box<dyn AssetResolver>,
        downloads: DownloadManager,
    ) -> Self {
        Self {
            session,
            parser,
            resolver,
            downloads,
            item_delay: DEFAULT_ITEM_DELAY,
        }
    }

    /// Overrides the pause after each attempted item.
    #[must_use]
    pub fn with_item_delay(mut self, item_delay: Duration) -> Self {
        self.item_delay = item_delay;
        self
    }

    /// Crawls the collection at `collection_url` from page 1 until exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError`] on a failed page fetch or a fatal local write
    /// failure. Re-running after an abort restarts from page 1; the dedup
    /// check makes the re-run cheap.
    pub async fn run(&self, collection_url: &str) -> Result<CrawlStats, CrawlError> {
        let base = ensure_trailing_slash(collection_url);
        let mut stats = CrawlStats::default();

        for page in 1u32.. {
            let url = page_url(&base, page);
            debug!(page, url, "fetching listing page");

            let response = self.session.get(&url).await?;
            let html = response.text().await.map_err(|source| CrawlError::Body {
                url: url.clone(),
                source,
            })?;

            // Not-found placeholder takes priority over the empty-item check:
            // the site can render the marker on a page that also has no items.
            if self.parser.is_not_found(&html) {
                info!(page, "not-found placeholder; collection fully consumed");
                break;
            }

            let title = self.parser.collection_title(&html);
            if title.is_none() {
                warn!(page, "no collection title on page; filing under placeholder");
            }

            let items = self.parser.list_items(&html);
            if items.is_empty() {
                info!(page, "no items on page; stopping traversal");
                break;
            }

            info!(page, items = items.len(), "processing listing page");
            stats.pages += 1;

            for item in &items {
                match self.process_item(item, title.as_deref()).await {
                    Ok(DownloadOutcome::Downloaded(path)) => {
                        debug!(id = %item.id, path = %path.display(), "item downloaded");
                        stats.downloaded += 1;
                    }
                    Ok(DownloadOutcome::Skipped(path)) => {
                        info!(id = %item.id, path = %path.display(), "already downloaded; skipping");
                        stats.skipped += 1;
                    }
                    Err(ItemFailure::Download(error)) if error.is_fatal() => {
                        return Err(CrawlError::Download(error));
                    }
                    Err(ItemFailure::Resolve(error)) => {
                        warn!(id = %item.id, %error, "item failed to resolve; skipping");
                        stats.failed += 1;
                    }
                    Err(ItemFailure::Download(error)) => {
                        warn!(id = %item.id, %error, "item failed to download; skipping");
                        stats.failed += 1;
                    }
                }

                if !self.item_delay.is_zero() {
                    tokio::time::sleep(self.item_delay).await;
                }
            }
        }

        Ok(stats)
    }

    async fn process_item(
        &self,
        item: &ListItem,
        title: Option<&str>,
    ) -> Result<DownloadOutcome, ItemFailure> {
        let asset = self
            .resolver
            .resolve(&self.session, item)
            .await
            .map_err(ItemFailure::Resolve)?;
        self.downloads
            .ensure_downloaded(&self.session, &asset, title)
            .await
            .map_err(ItemFailure::Download)
    }
}

fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Page 1 is the collection URL itself; later pages append the page number,
/// matching the site's pagination scheme.
fn page_url(base: &str, page: u32) -> String {
    if page == 1 {
        base.to_string()
    } else {
        format!("{base}{page}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_first_page_is_base() {
        assert_eq!(
            page_url("https://artvee.com/s_collection/666233/", 1),
            "https://artvee.com/s_collection/666233/"
        );
    }

    #[test]
    fn test_page_url_appends_page_number() {
        assert_eq!(
            page_url("https://artvee.com/s_collection/666233/", 3),
            "https://artvee.com/s_collection/666233/3"
        );
    }

    #[test]
    fn test_trailing_slash_added_once() {
        assert_eq!(
            ensure_trailing_slash("https://artvee.com/s_collection/666233"),
            "https://artvee.com/s_collection/666233/"
        );
        assert_eq!(
            ensure_trailing_slash("https://artvee.com/s_collection/666233/"),
            "https://artvee.com/s_collection/666233/"
        );
    }
}
