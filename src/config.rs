use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::ScanError;
use crate::hasher::{DEFAULT_CHUNK_SIZE, DigestAlgorithm};

/// Settings for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Digest used for the content comparison phase.
    pub algorithm: DigestAlgorithm,
    /// Bytes read per call while hashing.
    pub chunk_size: usize,
    /// Hashing worker threads. `None` hashes on the calling thread.
    pub threads: Option<usize>,
    /// Draw a progress bar while hashing.
    pub show_progress: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            algorithm: DigestAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: None,
            show_progress: false,
        }
    }
}

/// On-disk TOML layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    algorithm: Option<DigestAlgorithm>,
    chunk_size: Option<usize>,
    threads: Option<usize>,
}

impl ScanConfig {
    /// Parses TOML settings on top of the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        config.merge(file);
        Ok(config)
    }

    /// Loads TOML settings from `path` on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from '{}'", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: '{}'", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: '{}'", path.display()))
    }

    /// Builds the effective config: defaults, then the config file named on
    /// the command line (if any), then explicit flags.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(algorithm) = cli.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(chunk_size) = cli.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(threads) = cli.threads {
            config.threads = Some(threads);
        }
        config.show_progress = !cli.no_progress && !cli.quiet;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.chunk_size == 0 {
            return Err(ScanError::InvalidConfig {
                message: "chunk_size must be greater than zero".to_string(),
            });
        }
        if self.threads == Some(0) {
            return Err(ScanError::InvalidConfig {
                message: "threads must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(algorithm) = file.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(chunk_size) = file.chunk_size {
            self.chunk_size = chunk_size;
        }
        if file.threads.is_some() {
            self.threads = file.threads;
        }
    }
}
