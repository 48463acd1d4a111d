//! Per-item resolution: listing entry to direct asset URL.
//!
//! Each listed artwork carries an internal identifier but no direct link. The
//! site exposes the link through a quick-view lookup endpoint that answers
//! with a small JSON object; [`QuickViewResolver`] issues that call and pulls
//! out the `flink` field. The trait seam exists so crawler tests can stub
//! resolution without a lookup server.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::parser::ListItem;
use crate::session::{HttpSession, SessionError};

/// Lookup action parameter expected by the quick-view endpoint.
const QUICK_VIEW_ACTION: &str = "woodmart_quick_view2";

/// A directly downloadable asset, plus the names used to file it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Direct binary URL.
    pub url: String,
    /// Artist name carried over from the listing.
    pub artist: String,
    /// Raw reference token carried over from the listing.
    pub reference: String,
}

/// Errors from resolving one listed item. None of them abort the run;
/// the crawler logs and skips the item.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The lookup answered but had no download link field.
    #[error("lookup response for item {id} had no download link field")]
    MissingLink {
        /// Identifier of the item that failed to resolve.
        id: String,
    },

    /// The lookup body was not the expected JSON shape.
    #[error("lookup response for item {id} was malformed: {source}")]
    BadResponse {
        /// Identifier of the item that failed to resolve.
        id: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// Transport failure during the lookup request.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Resolves a listed item into a downloadable asset.
///
/// Uses `async_trait` so the crawler can hold `Box<dyn AssetResolver>`;
/// Rust 2024 native async traits are not object-safe.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Resolver name for logging.
    fn name(&self) -> &str;

    /// Resolves `item` via the authenticated `session`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the item cannot be resolved; the caller
    /// skips the item.
    async fn resolve(
        &self,
        session: &HttpSession,
        item: &ListItem,
    ) -> Result<ResolvedAsset, ResolveError>;
}

#[derive(Debug, Deserialize)]
struct QuickViewReply {
    flink: Option<String>,
}

/// [`AssetResolver`] backed by the site's quick-view lookup endpoint.
#[derive(Debug, Clone)]
pub struct QuickViewResolver {
    lookup_url: String,
}

impl QuickViewResolver {
    /// Creates a resolver for the site at `base_url`.
    #[must_use]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            lookup_url: format!("{}/erica", base_url.as_ref().trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl AssetResolver for QuickViewResolver {
    fn name(&self) -> &str {
        "quick-view"
    }

    async fn resolve(
        &self,
        session: &HttpSession,
        item: &ListItem,
    ) -> Result<ResolvedAsset, ResolveError> {
        let params = [("id", item.id.as_str()), ("action", QUICK_VIEW_ACTION)];
        let response = session.get_with_query(&self.lookup_url, &params).await?;

        let reply: QuickViewReply =
            response
                .json()
                .await
                .map_err(|source| ResolveError::BadResponse {
                    id: item.id.clone(),
                    source,
                })?;

        let Some(url) = reply.flink.filter(|link| !link.is_empty()) else {
            return Err(ResolveError::MissingLink {
                id: item.id.clone(),
            });
        };

        debug!(id = %item.id, url, "resolved download link");
        Ok(ResolvedAsset {
            url,
            artist: item.artist.clone(),
            reference: item.reference.clone(),
        })
    }
}
