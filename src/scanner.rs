use std::fs;
use std::io;
use std::path::Path;

use indicatif::{HumanBytes, HumanCount, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::duplicates::{DuplicateSets, group_duplicates_by};
use crate::error::ScanError;
use crate::hasher::{Digest, calculate_file_hash};
use crate::utils::FileEntry;

/// Counters describing how much work a scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScanStats {
    /// Regular files found in the directory.
    pub files_listed: usize,
    /// Files sharing their size with at least one other file.
    pub size_candidates: usize,
    /// Files whose content was hashed.
    pub files_hashed: usize,
    /// Bytes read while hashing.
    pub bytes_hashed: u64,
}

/// Outcome of [`DuplicateScanner::scan_with_stats`].
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub duplicates: DuplicateSets,
    pub stats: ScanStats,
}

/// Finds files with identical content in a single directory.
///
/// Files are first grouped by size; only files whose size is shared by at
/// least one other file are hashed. The scanner holds no state between
/// calls.
#[derive(Debug, Clone, Default)]
pub struct DuplicateScanner {
    config: ScanConfig,
}

impl DuplicateScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn scan(&self, path: impl AsRef<Path>) -> Result<DuplicateSets, ScanError> {
        self.scan_with_stats(path).map(|result| result.duplicates)
    }

    pub fn scan_with_stats(&self, path: impl AsRef<Path>) -> Result<ScanResult, ScanError> {
        let path = path.as_ref();
        self.config.validate()?;
        info!("Scanning '{}' ({})", path.display(), self.config.algorithm);

        let entries = list_files(path)?;
        let mut stats = ScanStats {
            files_listed: entries.len(),
            ..ScanStats::default()
        };
        info!("Found {} files", HumanCount(entries.len() as u64));

        let size_groups = group_duplicates_by(entries, |entry: &FileEntry| {
            Ok::<_, ScanError>(entry.size)
        })?;
        let candidates: Vec<FileEntry> = size_groups.into_values().flatten().collect();
        stats.size_candidates = candidates.len();

        if candidates.is_empty() {
            info!("No files share a size, nothing to hash");
            return Ok(ScanResult {
                duplicates: DuplicateSets::default(),
                stats,
            });
        }

        let total_bytes: u64 = candidates.iter().map(|entry| entry.size).sum();
        info!(
            "Hashing {} files with shared sizes ({})",
            HumanCount(candidates.len() as u64),
            HumanBytes(total_bytes)
        );

        let hashed = self.hash_candidates(candidates)?;
        stats.files_hashed = hashed.len();
        stats.bytes_hashed = total_bytes;

        let groups = group_duplicates_by(hashed, |(_, digest)| Ok::<_, ScanError>(*digest))?;
        let duplicates = DuplicateSets::from_groups(
            groups
                .into_iter()
                .map(|(digest, pairs)| (digest, pairs.into_iter().map(|(entry, _)| entry).collect()))
                .collect(),
        );

        info!(
            "Found {} duplicate sets, {} duplicate files ({} reclaimable)",
            HumanCount(duplicates.len() as u64),
            HumanCount(duplicates.duplicate_file_count() as u64),
            HumanBytes(duplicates.reclaimable_bytes())
        );

        Ok(ScanResult { duplicates, stats })
    }

    /// Hashes every candidate exactly once, returning pairs in input order.
    fn hash_candidates(
        &self,
        candidates: Vec<FileEntry>,
    ) -> Result<Vec<(FileEntry, Digest)>, ScanError> {
        let total_bytes = candidates.iter().map(|entry| entry.size).sum();
        let progress_bar = self.progress_bar(total_bytes);

        let hash_one = |entry: &FileEntry| {
            let digest =
                calculate_file_hash(entry, self.config.algorithm, self.config.chunk_size);
            progress_bar.inc(entry.size);
            digest
        };

        let digests: Vec<Result<Digest, ScanError>> = match self.config.threads {
            Some(threads) if threads > 1 => {
                match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                    Ok(pool) => {
                        debug!("Hashing on {threads} threads");
                        pool.install(|| candidates.par_iter().map(hash_one).collect())
                    }
                    Err(e) => {
                        warn!("Failed to build hashing thread pool ({e}), hashing serially");
                        hash_serially(&candidates, hash_one)
                    }
                }
            }
            _ => hash_serially(&candidates, hash_one),
        };

        progress_bar.finish_and_clear();

        // Report the first failure in enumeration order, whatever finished first.
        candidates
            .into_iter()
            .zip(digests)
            .map(|(entry, digest)| digest.map(|digest| (entry, digest)))
            .collect()
    }

    fn progress_bar(&self, total_bytes: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total_bytes);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {bytes}/{total_bytes} ETA: {eta}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// Hashes in order, stopping at the first failure.
fn hash_serially<F>(candidates: &[FileEntry], hash_one: F) -> Vec<Result<Digest, ScanError>>
where
    F: Fn(&FileEntry) -> Result<Digest, ScanError>,
{
    let mut digests = Vec::with_capacity(candidates.len());
    for entry in candidates {
        let digest = hash_one(entry);
        let failed = digest.is_err();
        digests.push(digest);
        if failed {
            break;
        }
    }
    digests
}

/// Scans `path` with the default configuration.
pub fn scan(path: impl AsRef<Path>) -> Result<DuplicateSets, ScanError> {
    DuplicateScanner::default().scan(path)
}

/// Lists the regular files directly inside `dir`, with their sizes.
///
/// Symlinks, subdirectories and other non-regular entries are skipped.
/// Entries come back in the order the OS yields them.
pub fn list_files(dir: &Path) -> Result<Vec<FileEntry>, ScanError> {
    let metadata = fs::metadata(dir).map_err(|e| ScanError::from_io(dir, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false);

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ScanError::from_io(path, io::Error::from(e))
        })?;
        if !entry.file_type().is_file() {
            debug!("Skipping non-regular entry: '{}'", entry.path().display());
            continue;
        }
        files.push(file_entry(entry)?);
    }

    Ok(files)
}

fn file_entry(entry: DirEntry) -> Result<FileEntry, ScanError> {
    let size = entry
        .metadata()
        .map_err(|e| ScanError::MetadataUnavailable {
            path: entry.path().to_path_buf(),
            source: io::Error::from(e),
        })?
        .len();
    Ok(FileEntry::new(entry.into_path(), size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) {
        File::create(dir.join(name)).unwrap().write_all(content).unwrap();
    }

    fn names(files: &[FileEntry]) -> Vec<String> {
        let mut names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_list_files_skips_directories() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "a.txt", b"hello");
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_file(&dir.path().join("sub"), "nested.txt", b"hello");

        let files = list_files(dir.path()).unwrap();
        assert_eq!(names(&files), vec!["a.txt"]);
        assert_eq!(files[0].size, 5);
    }

    #[test]
    fn test_list_files_missing_dir() {
        let dir = tempdir().unwrap();
        let err = list_files(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_list_files_on_regular_file() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "a.txt", b"hello");
        let err = list_files(&dir.path().join("a.txt")).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[test]
    fn test_unique_sizes_are_never_hashed() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "one", b"1");
        write_file(dir.path(), "two", b"22");
        write_file(dir.path(), "three", b"333");

        let result = DuplicateScanner::default().scan_with_stats(dir.path()).unwrap();
        assert!(result.duplicates.is_empty());
        assert_eq!(result.stats.files_listed, 3);
        assert_eq!(result.stats.size_candidates, 0);
        assert_eq!(result.stats.files_hashed, 0);
    }

    #[test]
    fn test_same_size_different_content() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "a", b"Hello, World !");
        write_file(dir.path(), "b", b"Hello, World ?");

        let result = DuplicateScanner::default().scan_with_stats(dir.path()).unwrap();
        assert!(result.duplicates.is_empty());
        assert_eq!(result.stats.files_hashed, 2);
        assert_eq!(result.stats.bytes_hashed, 28);
    }

    #[test]
    fn test_empty_files_are_duplicates() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "empty1", b"");
        write_file(dir.path(), "empty2", b"");

        let sets = scan(dir.path()).unwrap();
        assert_eq!(sets.len(), 1);
        let (_, files) = sets.iter().next().unwrap();
        assert_eq!(names(files), vec!["empty1", "empty2"]);
        assert_eq!(files[0].size, 0);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let dir = tempdir().unwrap();
        for i in 0..12 {
            let content = format!("content-{}", i % 4);
            write_file(dir.path(), &format!("f{i:02}"), content.as_bytes());
        }
        write_file(dir.path(), "odd", b"something else");

        let serial = DuplicateScanner::default().scan(dir.path()).unwrap();
        let parallel = DuplicateScanner::new(ScanConfig {
            threads: Some(4),
            ..ScanConfig::default()
        })
        .scan(dir.path())
        .unwrap();

        assert_eq!(serial.len(), 4);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_invalid_config_rejected_before_reading() {
        let scanner = DuplicateScanner::new(ScanConfig {
            chunk_size: 0,
            ..ScanConfig::default()
        });
        let err = scanner.scan("/definitely/not/here").unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig { .. }));
    }

    #[test]
    fn test_unreadable_candidate_fails_whole_scan() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "ok1", b"hello");
        write_file(dir.path(), "ok2", b"hello");
        let candidates = vec![
            FileEntry::new(dir.path().join("ok1"), 5),
            FileEntry::new(dir.path().join("gone1"), 5),
            FileEntry::new(dir.path().join("ok2"), 5),
            FileEntry::new(dir.path().join("gone2"), 5),
        ];

        for threads in [None, Some(4)] {
            let scanner = DuplicateScanner::new(ScanConfig {
                threads,
                ..ScanConfig::default()
            });
            let err = scanner.hash_candidates(candidates.clone()).unwrap_err();
            match err {
                ScanError::Io { path, .. } => {
                    assert!(path.ends_with("gone1"), "{threads:?}: {}", path.display())
                }
                other => panic!("{threads:?}: expected Io error, got {other:?}"),
            }
        }
    }
}
