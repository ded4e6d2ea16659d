use std::path::PathBuf;

/// Formats a run time for the completion log line, e.g. `1:02.005 (m:ss.mmm)`.
pub fn format_human_elapsed(elapsed: std::time::Duration) -> String {
    let total_secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    let (hours, minutes, seconds) = (total_secs / 3600, total_secs / 60 % 60, total_secs % 60);

    match (hours, minutes) {
        (0, 0) => format!("{seconds}.{millis:03} seconds"),
        (0, _) => format!("{minutes}:{seconds:02}.{millis:03} (m:ss.mmm)"),
        _ => format!("{hours}:{minutes:02}:{seconds:02}.{millis:03} (h:mm:ss.mmm)"),
    }
}

/// A regular file found directly inside the scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Full path used to reopen the file for hashing.
    pub path: PathBuf,
    /// File name as it appears in the directory listing.
    pub name: String,
    /// Size in bytes at stat time.
    pub size: u64,
}

impl FileEntry {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, name, size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_human_elapsed() {
        assert_eq!(format_human_elapsed(Duration::from_millis(1500)), "1.500 seconds");
        assert_eq!(format_human_elapsed(Duration::from_millis(61_005)), "1:01.005 (m:ss.mmm)");
        assert_eq!(format_human_elapsed(Duration::from_secs(3600)), "1:00:00.000 (h:mm:ss.mmm)");
        assert_eq!(
            format_human_elapsed(Duration::from_secs(3723)),
            "1:02:03.000 (h:mm:ss.mmm)"
        );
    }

    #[test]
    fn test_file_entry_name_from_path() {
        let entry = FileEntry::new(PathBuf::from("/tmp/dir/a.txt"), 5);
        assert_eq!(entry.name, "a.txt");
        assert_eq!(entry.size, 5);
    }
}
