//! CLI argument definitions using clap derive

use crate::size::SizeClass;
use clap::{ArgAction, Parser, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// thumbcask - shared thumbnail cache manager
///
/// Resolves the freedesktop.org thumbnail for a file or URL, generating it
/// through the configured backends when the cache has no valid entry.
/// Prints the thumbnail path on success; exits with 1 when no thumbnail
/// could be produced.
#[derive(Parser, Debug)]
#[command(name = "thumbcask")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source file or URL
    #[arg(required_unless_present = "completions")]
    pub source: Option<String>,

    /// Thumbnail size: a tier name (normal, large, x-large, xx-large) or a
    /// pixel count mapped to the smallest covering tier
    #[arg(short, long, value_parser = parse_size)]
    pub size: Option<SizeClass>,

    /// App name for failure memoization; without one, failed attempts are
    /// not recorded
    #[arg(short, long)]
    pub app_name: Option<String>,

    /// Only consult the cache, never generate
    #[arg(short, long)]
    pub lookup_only: bool,

    /// Explicit source mtime in seconds (for URLs and pure lookups)
    #[arg(short, long, requires = "lookup_only")]
    pub mtime: Option<i64>,

    /// Cache root override (default: $XDG_CACHE_HOME/thumbnails)
    #[arg(long, env = "THUMBCASK_CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "plain")]
    pub format: OutputFormat,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "THUMBCASK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

/// Output format for the resolved path
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// The bare path
    Plain,
    /// A JSON object with source and path
    Json,
}

/// Parse a size argument: tier name or pixel count
fn parse_size(s: &str) -> Result<SizeClass, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_bare_source() {
        let cli = Cli::parse_from(["thumbcask", "/tmp/photo.jpg"]);
        assert_eq!(cli.source.as_deref(), Some("/tmp/photo.jpg"));
        assert!(cli.size.is_none());
        assert!(!cli.lookup_only);
    }

    #[test]
    fn cli_parses_size_names_and_pixels() {
        let cli = Cli::parse_from(["thumbcask", "-s", "x-large", "a.png"]);
        assert_eq!(cli.size, Some(SizeClass::XLarge));

        let cli = Cli::parse_from(["thumbcask", "-s", "300", "a.png"]);
        assert_eq!(cli.size, Some(SizeClass::XLarge));

        let cli = Cli::parse_from(["thumbcask", "--size", "128", "a.png"]);
        assert_eq!(cli.size, Some(SizeClass::Normal));
    }

    #[test]
    fn cli_rejects_bad_size() {
        assert!(Cli::try_parse_from(["thumbcask", "-s", "huge", "a.png"]).is_err());
    }

    #[test]
    fn cli_mtime_requires_lookup_only() {
        assert!(Cli::try_parse_from(["thumbcask", "-m", "5", "a.png"]).is_err());

        let cli = Cli::parse_from(["thumbcask", "-l", "-m", "5", "a.png"]);
        assert!(cli.lookup_only);
        assert_eq!(cli.mtime, Some(5));
    }

    #[test]
    fn cli_requires_source_without_completions() {
        assert!(Cli::try_parse_from(["thumbcask"]).is_err());
        let cli = Cli::parse_from(["thumbcask", "--completions", "bash"]);
        assert!(cli.source.is_none());
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["thumbcask", "a.png"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["thumbcask", "-vv", "a.png"]);
        assert_eq!(cli.verbose, 2);
    }
}
