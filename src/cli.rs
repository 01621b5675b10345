use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "multifetch")]
#[command(about = "Fetch many resources concurrently and store them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every URL concurrently and write the payloads to disk
    Fetch(FetchArgs),
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// URLs to fetch; outputs are numbered in this order starting at 1
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Configuration file (defaults to $MULTIFETCH_CONFIG or config/multifetch.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the payloads are written to
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Maximum retrievals in flight; unlimited when omitted
    #[arg(long, short = 'c')]
    pub concurrency: Option<usize>,

    /// Abandon outstanding retrievals after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// File extension for stored payloads, e.g. ".jpg"
    #[arg(long)]
    pub extension: Option<String>,

    /// Write a JSON summary of failed resources to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from([
            "multifetch",
            "fetch",
            "-c",
            "4",
            "--extension",
            ".jpg",
            "https://example.com/a.jpg",
            "https://example.com/b.jpg",
        ])
        .unwrap();

        let Commands::Fetch(args) = cli.command;
        assert_eq!(args.urls.len(), 2);
        assert_eq!(args.concurrency, Some(4));
        assert_eq!(args.extension.as_deref(), Some(".jpg"));
        assert!(args.output_dir.is_none());
    }

    #[test]
    fn test_urls_required() {
        assert!(Cli::try_parse_from(["multifetch", "fetch"]).is_err());
    }
}
