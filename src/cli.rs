//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use artvee_dl::session::DEFAULT_MAX_RETRIES;

/// Crawl an authenticated artwork collection and download every asset once.
///
/// Walks the collection page by page, resolves each listed artwork to its
/// direct download link, and writes it under `images/`. Assets already on
/// disk are skipped, so re-runs only fetch what is missing.
#[derive(Parser, Debug)]
#[command(name = "artvee-dl")]
#[command(author, version, about)]
pub struct Args {
    /// Collection URL, e.g. https://artvee.com/s_collection/666233/ (prompted for when omitted)
    pub collection_url: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum retry attempts for transient failures (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: u8,

    /// Delay between item downloads in milliseconds (max 60000)
    #[arg(short = 'd', long, default_value_t = 2000, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub item_delay: u64,

    /// Output directory root (the images/ tree is created beneath it)
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Credentials config file (created and filled in on first run)
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["artvee-dl"]).unwrap();
        assert!(args.collection_url.is_none());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(args.item_delay, 2000);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_cli_positional_collection_url() {
        let args =
            Args::try_parse_from(["artvee-dl", "https://artvee.com/s_collection/666233/"]).unwrap();
        assert_eq!(
            args.collection_url.as_deref(),
            Some("https://artvee.com/s_collection/666233/")
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["artvee-dl", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_max_retries_range_enforced() {
        let args = Args::try_parse_from(["artvee-dl", "-r", "5"]).unwrap();
        assert_eq!(args.max_retries, 5);

        let result = Args::try_parse_from(["artvee-dl", "-r", "11"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_item_delay_flag() {
        let args = Args::try_parse_from(["artvee-dl", "--item-delay", "0"]).unwrap();
        assert_eq!(args.item_delay, 0);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["artvee-dl", "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
