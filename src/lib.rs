//! Authenticated crawler and downloader for paginated artwork collections.
//!
//! The crate walks a member-only collection page by page, resolves each
//! listed artwork to a direct binary URL via the site's quick-view lookup,
//! and streams each asset to a deterministic local path exactly once.
//!
//! # Architecture
//!
//! - [`session`] - Authenticated HTTP session with bounded transient retry
//! - [`auth`] - Login handshake and credential supply
//! - [`parser`] - Typed field extraction from raw site markup
//! - [`crawler`] - Page-by-page traversal with termination detection
//! - [`resolver`] - Per-item resolution to a direct asset URL
//! - [`download`] - Deterministic paths, dedup, streamed writes
//!
//! The run is strictly sequential: one page at a time, one item at a time,
//! with a fixed pause between items. The session (and its cookie jar) is
//! created once and shared by every request in the run.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod crawler;
pub mod download;
pub mod parser;
pub mod resolver;
pub mod session;

// Re-export commonly used types
pub use auth::{AuthError, Authenticator, CredentialProvider, Credentials, FileCredentialProvider};
pub use crawler::{CollectionCrawler, CrawlError, CrawlStats, DEFAULT_ITEM_DELAY};
pub use download::{DownloadError, DownloadManager, DownloadOutcome, sanitize_name};
pub use parser::{HtmlPageParser, ListItem, PageParser};
pub use resolver::{AssetResolver, QuickViewResolver, ResolveError, ResolvedAsset};
pub use session::{DEFAULT_MAX_RETRIES, HttpSession, RetryPolicy, SessionError};
