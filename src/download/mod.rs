//! Idempotent asset downloads: path derivation, dedup, streamed writes.

mod naming;

pub use naming::{normalize_reference, sanitize_name};

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::resolver::ResolvedAsset;
use crate::session::{HttpSession, SessionError};

/// Directory placed under the output root for all collections.
const IMAGES_DIR: &str = "images";

/// Directory name used when a listing page yields no collection title.
const UNKNOWN_COLLECTION: &str = "Unknown";

/// Result of attempting one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The asset was fetched and written.
    Downloaded(PathBuf),
    /// The target already existed; no network request was made.
    Skipped(PathBuf),
}

/// Errors from one download attempt.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The binary fetch failed (non-2xx or exhausted retries).
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        /// The asset URL.
        url: String,
        /// The underlying session error.
        #[source]
        source: SessionError,
    },

    /// The body stream broke mid-transfer.
    #[error("stream interrupted downloading {url}: {source}")]
    Stream {
        /// The asset URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Local filesystem failure. Fatal for the whole run.
    #[error("IO error writing {path}: {source}")]
    Io {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// True when the run must abort rather than skip the item.
    ///
    /// A local write failure means every later download would likely fail the
    /// same way, and continuing could leave partially-written artifacts.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Streams resolved assets to their deterministic paths, exactly once.
#[derive(Debug, Clone)]
pub struct DownloadManager {
    output_dir: PathBuf,
}

impl DownloadManager {
    /// Creates a manager rooted at `output_dir` (the `images/` tree is created
    /// beneath it on demand).
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Deterministic target path for an asset:
    /// `<output>/images/<Title> Collection/<Artist> - <Reference>.jpg`.
    #[must_use]
    pub fn target_path(&self, collection_title: Option<&str>, asset: &ResolvedAsset) -> PathBuf {
        let title = collection_title
            .map(sanitize_name)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_COLLECTION.to_string());
        let file = format!(
            "{} - {}.jpg",
            sanitize_name(&asset.artist),
            normalize_reference(&asset.reference)
        );
        self.output_dir
            .join(IMAGES_DIR)
            .join(format!("{title} Collection"))
            .join(file)
    }

    /// Downloads `asset` unless its target already exists.
    ///
    /// The existence check runs before any network request, so re-runs over an
    /// unchanged collection are free.
    ///
    /// # Errors
    ///
    /// [`DownloadError::Io`] is fatal for the run; fetch and stream failures
    /// are skippable per-item failures.
    pub async fn ensure_downloaded(
        &self,
        session: &HttpSession,
        asset: &ResolvedAsset,
        collection_title: Option<&str>,
    ) -> Result<DownloadOutcome, DownloadError> {
        let path = self.target_path(collection_title, asset);

        let exists = fs::try_exists(&path)
            .await
            .map_err(|source| io_error(&path, source))?;
        if exists {
            debug!(path = %path.display(), "target exists; skipping download");
            return Ok(DownloadOutcome::Skipped(path));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        let response = session
            .get(&asset.url)
            .await
            .map_err(|source| DownloadError::Fetch {
                url: asset.url.clone(),
                source,
            })?;

        if let Err(error) = write_stream(&path, &asset.url, response).await {
            // Any partial file would satisfy the dedup check on the next run
            // and pin a truncated artifact forever; remove it before
            // surfacing the failure, fatal or not.
            discard_partial(&path).await;
            return Err(error);
        }

        info!(path = %path.display(), url = %asset.url, "downloaded");
        Ok(DownloadOutcome::Downloaded(path))
    }
}

async fn write_stream(
    path: &Path,
    url: &str,
    response: reqwest::Response,
) -> Result<(), DownloadError> {
    let file = File::create(path)
        .await
        .map_err(|source| io_error(path, source))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| DownloadError::Stream {
            url: url.to_string(),
            source,
        })?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|source| io_error(path, source))?;
    }

    writer
        .flush()
        .await
        .map_err(|source| io_error(path, source))
}

async fn discard_partial(path: &Path) {
    if let Err(remove_error) = fs::remove_file(path).await
        && remove_error.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), %remove_error, "failed to remove partial file");
    }
}

fn io_error(path: &Path, source: std::io::Error) -> DownloadError {
    DownloadError::Io {
        path: path.to_path_buf(),
        source,
    }
}
