use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::hasher::DigestAlgorithm;

#[derive(Parser, Debug)]
#[command(name = "dupscan", version)]
#[command(about = "Find files with identical content in a directory")]
pub struct Cli {
    /// Directory to scan for duplicates (not recursive)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Content digest used to compare files of equal size
    #[arg(short, long, value_enum)]
    pub algorithm: Option<DigestAlgorithm>,

    /// Bytes read per chunk while hashing (default: 65536)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Number of parallel threads for hashing (default: hash on one thread)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// TOML file with default settings; flags take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not draw a progress bar while hashing
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
