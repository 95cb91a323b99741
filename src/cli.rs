//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download game mods together with their dependencies.
///
/// Resolves the dependency tree of a mod from the mod portal and downloads
/// every archive concurrently, resuming interrupted transfers.
#[derive(Parser, Debug)]
#[command(name = "mod-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Mod page URL, e.g. <https://mods.factorio.com/mod/flib>
    #[arg(required_unless_present = "batch", conflicts_with = "batch")]
    pub url: Option<String>,

    /// File listing mod URLs (JSON object, JSON array, or one URL per line)
    #[arg(short = 'b', long, value_name = "FILE")]
    pub batch: Option<PathBuf>,

    /// Output directory for downloaded archives
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Include optional dependencies of the requested mod
    #[arg(long)]
    pub include_optional: bool,

    /// Include optional dependencies at every depth
    #[arg(long)]
    pub include_optional_all: bool,

    /// Resolve dependencies and print the plan without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum concurrent downloads (1-32)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub concurrency: Option<u8>,

    /// Maximum retries after the first attempt (0-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// Delay between retry attempts in seconds (0-300)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(0..=300))]
    pub retry_delay: Option<u64>,

    /// Always restart downloads instead of resuming `.part` files
    #[arg(long)]
    pub no_resume: bool,

    /// Stop remaining downloads after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Print the summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Record downloaded mods in this JSON registry file
    #[arg(long, value_name = "FILE")]
    pub registry: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
