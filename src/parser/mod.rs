//! Typed field extraction from raw site markup.
//!
//! The crawler and authenticator never touch HTML directly; they go through
//! the [`PageParser`] trait. [`HtmlPageParser`] is the shipped implementation,
//! built on static regexes targeting the source site's markup. The markup
//! contract is inherently fragile, which is exactly why it lives behind this
//! seam.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// One artwork entry on a listing page, prior to resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Internal identifier carried into the quick-view lookup request.
    pub id: String,
    /// Artist name as rendered on the listing; empty when the markup lacks it.
    pub artist: String,
    /// Raw reference token (the `data-url` slug), later normalized for naming.
    pub reference: String,
}

/// Extracts structured fields from raw documents fetched by the session.
pub trait PageParser: Send + Sync {
    /// One-time anti-forgery token embedded in the login form.
    fn login_nonce(&self, html: &str) -> Option<String>;

    /// Collection title rendered on a listing page.
    fn collection_title(&self, html: &str) -> Option<String>;

    /// True when the page is the site's not-found placeholder.
    fn is_not_found(&self, html: &str) -> bool;

    /// Artwork entries in document order.
    fn list_items(&self, html: &str) -> Vec<ListItem>;
}

static LOGIN_NONCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)<input\s+[^>]*name\s*=\s*["']ihc_login_nonce["'][^>]*value\s*=\s*["']([^"']*)["']"#,
    )
});
static COLLECTION_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)<h1\s+[^>]*class\s*=\s*["'][^"']*entry-title[^"']*["'][^>]*>\s*([^<]+?)\s*</h1>"#,
    )
});
// The site renders its not-found placeholder as a literal "404" inside the
// woodmart title container, even for pages past the end of a collection.
static NOT_FOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)<h4\s+[^>]*class\s*=\s*["'][^"']*woodmart-title-container[^"']*["'][^>]*>\s*404\s*</h4>"#,
    )
});
static ITEM_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?i)<div\s+[^>]*class\s*=\s*["'][^"']*snax-collection-item[^"']*["']"#)
});
static DATA_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)\bdata-id\s*=\s*["']([^"']+)["']"#));
static DATA_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)\bdata-url\s*=\s*["']([^"']+)["']"#));
static ARTIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)woodmart-product-brands-links[^>]*>\s*<a\s+[^>]*>\s*([^<]+?)\s*</a>"#,
    )
});

/// Regex-backed [`PageParser`] for the source site's markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPageParser;

impl HtmlPageParser {
    /// Creates the parser. Stateless; all patterns are compiled once globally.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PageParser for HtmlPageParser {
    fn login_nonce(&self, html: &str) -> Option<String> {
        first_capture(&LOGIN_NONCE_RE, html).filter(|v| !v.is_empty())
    }

    fn collection_title(&self, html: &str) -> Option<String> {
        first_capture(&COLLECTION_TITLE_RE, html).filter(|v| !v.is_empty())
    }

    fn is_not_found(&self, html: &str) -> bool {
        NOT_FOUND_RE.is_match(html)
    }

    fn list_items(&self, html: &str) -> Vec<ListItem> {
        // Slice the document into per-item blocks at each item-container open
        // tag; attribute extraction then stays local to one artwork.
        let starts: Vec<usize> = ITEM_START_RE.find_iter(html).map(|m| m.start()).collect();
        let mut items = Vec::with_capacity(starts.len());

        for (index, &start) in starts.iter().enumerate() {
            let end = starts.get(index + 1).copied().unwrap_or(html.len());
            let block = &html[start..end];

            let Some(id) = first_capture(&DATA_ID_RE, block) else {
                warn!(index, "listing item without data-id attribute; skipping");
                continue;
            };
            let Some(reference) = first_capture(&DATA_URL_RE, block) else {
                warn!(index, "listing item without data-url attribute; skipping");
                continue;
            };
            let artist = match first_capture(&ARTIST_RE, block) {
                Some(artist) => artist,
                None => {
                    warn!(index, "listing item without artist element");
                    String::new()
                }
            };

            items.push(ListItem {
                id,
                artist,
                reference,
            });
        }

        items
    }
}

fn first_capture(regex: &Regex, html: &str) -> Option<String> {
    regex
        .captures(html)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
}
