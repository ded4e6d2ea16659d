use std::fmt;
use std::fs;
use std::io::{self, Read};

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize, Serializer};
use sha2::Digest as _;

use crate::error::ScanError;
use crate::utils::FileEntry;

/// Default read size for streaming a file through the hasher.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Content hash used to compare files of equal size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// BLAKE3, fast and cryptographically strong.
    #[default]
    Blake3,
    /// SHA-256, slower but ubiquitous.
    Sha256,
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blake3 => f.write_str("blake3"),
            Self::Sha256 => f.write_str("sha256"),
        }
    }
}

/// A 256-bit content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Incremental hasher state for one of the supported algorithms.
enum Accumulator {
    Blake3(Box<blake3::Hasher>),
    Sha256(sha2::Sha256),
}

impl Accumulator {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            DigestAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Blake3(hasher) => {
                hasher.update(chunk);
            }
            Self::Sha256(hasher) => hasher.update(chunk),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Blake3(hasher) => Digest(*hasher.finalize().as_bytes()),
            Self::Sha256(hasher) => {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(&hasher.finalize());
                Digest(bytes)
            }
        }
    }
}

/// Streams `reader` through the hasher `chunk_size` bytes at a time.
///
/// Returns the digest together with the number of bytes consumed. The
/// digest does not depend on `chunk_size`.
pub fn hash_reader<R: Read>(
    mut reader: R,
    algorithm: DigestAlgorithm,
    chunk_size: usize,
) -> io::Result<(Digest, u64)> {
    let mut accumulator = Accumulator::new(algorithm);
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        accumulator.update(&buffer[..bytes_read]);
        total_bytes += bytes_read as u64;
    }

    Ok((accumulator.finalize(), total_bytes))
}

/// Hashes the full content of `entry`.
///
/// Fails with [`ScanError::Io`] when the file cannot be opened or read, or
/// when its length no longer matches the size recorded at stat time.
pub fn calculate_file_hash(
    entry: &FileEntry,
    algorithm: DigestAlgorithm,
    chunk_size: usize,
) -> Result<Digest, ScanError> {
    let io_error = |source| ScanError::Io {
        path: entry.path.clone(),
        source,
    };

    let file = fs::File::open(&entry.path).map_err(io_error)?;
    let (digest, total_bytes) = hash_reader(file, algorithm, chunk_size).map_err(io_error)?;

    if total_bytes != entry.size {
        return Err(io_error(io::Error::other(format!(
            "file changed during scan: expected {} bytes, read {}",
            entry.size, total_bytes
        ))));
    }

    debug!("{} '{}': {}", algorithm, entry.path.display(), digest);
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_sha256_known_vector() {
        let (digest, len) = hash_reader(&b"abc"[..], DigestAlgorithm::Sha256, 2).unwrap();
        assert_eq!(len, 3);
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_blake3_matches_one_shot_hash() {
        let data = b"hello world, this is a blake3 test";
        let (digest, _) = hash_reader(&data[..], DigestAlgorithm::Blake3, 5).unwrap();
        assert_eq!(digest.as_bytes(), blake3::hash(data).as_bytes());
    }

    #[test]
    fn test_digest_independent_of_chunk_size() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        for algorithm in [DigestAlgorithm::Blake3, DigestAlgorithm::Sha256] {
            let (reference, _) = hash_reader(&data[..], algorithm, data.len()).unwrap();
            for chunk_size in [1, 7, 4096, DEFAULT_CHUNK_SIZE] {
                let (digest, len) = hash_reader(&data[..], algorithm, chunk_size).unwrap();
                assert_eq!(digest, reference, "{algorithm} chunk {chunk_size}");
                assert_eq!(len, data.len() as u64);
            }
        }
    }

    #[test]
    fn test_empty_input() {
        let (digest, len) = hash_reader(io::empty(), DigestAlgorithm::Blake3, 16).unwrap();
        assert_eq!(len, 0);
        assert_eq!(digest.as_bytes(), blake3::hash(b"").as_bytes());
    }

    #[test]
    fn test_digest_hex_is_64_chars() {
        let (digest, _) = hash_reader(&b"x"[..], DigestAlgorithm::Sha256, 16).unwrap();
        let hex = digest.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_calculate_file_hash_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.bin");
        fs::File::create(&path).unwrap().write_all(b"hello").unwrap();

        let entry = FileEntry::new(path, 5);
        let digest = calculate_file_hash(&entry, DigestAlgorithm::Blake3, 2).unwrap();
        assert_eq!(digest.as_bytes(), blake3::hash(b"hello").as_bytes());
    }

    #[test]
    fn test_calculate_file_hash_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let entry = FileEntry::new(dir.path().join("gone.txt"), 5);
        let err = calculate_file_hash(&entry, DigestAlgorithm::Blake3, 1024).unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }));
    }

    #[test]
    fn test_calculate_file_hash_detects_size_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grown.txt");
        fs::File::create(&path).unwrap().write_all(b"hello!").unwrap();

        let entry = FileEntry::new(path, 5);
        let err = calculate_file_hash(&entry, DigestAlgorithm::Sha256, 1024).unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }));
        assert!(err.to_string().contains("changed during scan"));
    }

    #[test]
    fn test_algorithm_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            algorithm: DigestAlgorithm,
        }
        let parsed: Wrapper = toml::from_str("algorithm = \"sha256\"").unwrap();
        assert_eq!(parsed.algorithm, DigestAlgorithm::Sha256);
    }
}
