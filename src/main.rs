//! CLI entry point for the collection downloader.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info};
use url::Url;

use artvee_dl::{
    Authenticator, CollectionCrawler, CredentialProvider, DownloadManager, FileCredentialProvider,
    HtmlPageParser, HttpSession, QuickViewResolver, RetryPolicy,
};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let collection_url = match args.collection_url {
        Some(url) => url,
        None => prompt_line(
            "Enter the URL of your collection, like https://artvee.com/s_collection/666233/: ",
        )?,
    };
    if collection_url.is_empty() {
        bail!("a collection URL is required");
    }
    let base_url = site_base(&collection_url)?;

    let provider = FileCredentialProvider::new(&args.config);
    let credentials = provider
        .credentials()
        .context("failed to obtain credentials")?;

    let session = HttpSession::with_policy(RetryPolicy::with_max_retries(u32::from(
        args.max_retries,
    )))?;
    let parser = HtmlPageParser::new();

    // Authentication is a precondition for everything else; a failure here
    // ends the run before any listing request is issued.
    Authenticator::new(&base_url)
        .authenticate(&session, &parser, &credentials)
        .await
        .context("authentication failed")?;

    let crawler = CollectionCrawler::new(
        session,
        Box::new(parser),
        Box::new(QuickViewResolver::new(&base_url)),
        DownloadManager::new(&args.output_dir),
    )
    .with_item_delay(Duration::from_millis(args.item_delay));

    let stats = crawler.run(&collection_url).await?;

    info!(
        pages = stats.pages,
        downloaded = stats.downloaded,
        skipped = stats.skipped,
        failed = stats.failed,
        "Crawl complete"
    );

    Ok(())
}

/// Derives the site origin (scheme + host) from the collection URL, so the
/// login and lookup endpoints target the same site.
fn site_base(collection_url: &str) -> Result<String> {
    let url = Url::parse(collection_url)
        .with_context(|| format!("invalid collection URL '{collection_url}'"))?;
    let origin = url.origin();
    if !origin.is_tuple() {
        bail!("collection URL '{collection_url}' has no host");
    }
    Ok(origin.ascii_serialization())
}

fn prompt_line(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_base_from_collection_url() {
        let base = site_base("https://artvee.com/s_collection/666233/").unwrap();
        assert_eq!(base, "https://artvee.com");
    }

    #[test]
    fn test_site_base_keeps_port() {
        let base = site_base("http://127.0.0.1:8080/s_collection/1/").unwrap();
        assert_eq!(base, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_site_base_rejects_garbage() {
        assert!(site_base("not a url").is_err());
    }
}
