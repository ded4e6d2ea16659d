pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod hasher;
pub mod report;
pub mod scanner;
pub mod utils;

pub use cli::{Cli, OutputFormat};
pub use config::ScanConfig;
pub use duplicates::{DuplicateSets, group_duplicates_by};
pub use error::ScanError;
pub use hasher::{Digest, DigestAlgorithm, calculate_file_hash, hash_reader};
pub use report::{write_json, write_text};
pub use scanner::{DuplicateScanner, ScanResult, ScanStats, list_files, scan};
pub use utils::{FileEntry, format_human_elapsed};
