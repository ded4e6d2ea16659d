use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::duplicates::DuplicateSets;
use crate::hasher::{Digest, DigestAlgorithm};
use crate::scanner::{ScanResult, ScanStats};

const SEPARATOR_WIDTH: usize = 80;

/// Writes the human-readable report for `sets` found in `dir`.
pub fn write_text<W: Write>(
    out: &mut W,
    dir: &Path,
    sets: &DuplicateSets,
    color: bool,
) -> io::Result<()> {
    if sets.is_empty() {
        let line = format!("No duplicates found in {}.", dir.display());
        if color {
            writeln!(out, "{}", line.green())?;
        } else {
            writeln!(out, "{line}")?;
        }
        return Ok(());
    }

    let header = format!("Found duplicates in {}.", dir.display());
    if color {
        writeln!(out, "{}\n", header.yellow().bold())?;
    } else {
        writeln!(out, "{header}\n")?;
    }

    for (digest, files) in sets.iter() {
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        writeln!(out, "hash: {digest}")?;
        writeln!(out, "size: {} bytes", files[0].size)?;
        writeln!(out, "files: {}", names.join(", "))?;
        writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub directory: String,
    pub scanned_at: String,
    pub algorithm: DigestAlgorithm,
    pub stats: ScanStats,
    pub sets: Vec<JsonSet>,
}

#[derive(Debug, Serialize)]
pub struct JsonSet {
    pub digest: Digest,
    pub size: u64,
    pub files: Vec<String>,
}

impl JsonReport {
    pub fn new(dir: &Path, result: &ScanResult, algorithm: DigestAlgorithm) -> io::Result<Self> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let scanned_at = now.format(&Rfc3339).map_err(io::Error::other)?;
        let sets = result
            .duplicates
            .iter()
            .map(|(digest, files)| JsonSet {
                digest: *digest,
                size: files[0].size,
                files: files.iter().map(|f| f.name.clone()).collect(),
            })
            .collect();
        Ok(Self {
            directory: dir.display().to_string(),
            scanned_at,
            algorithm,
            stats: result.stats,
            sets,
        })
    }
}

/// Writes the scan result as pretty-printed JSON.
pub fn write_json<W: Write>(
    out: &mut W,
    dir: &Path,
    result: &ScanResult,
    algorithm: DigestAlgorithm,
) -> io::Result<()> {
    let report = JsonReport::new(dir, result, algorithm)?;
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}
