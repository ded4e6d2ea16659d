use std::collections::BTreeMap;

use crate::hasher::Digest;
use crate::utils::FileEntry;

/// Groups `items` by the key `key_fn` extracts and keeps only the groups
/// with more than one member.
///
/// Items keep their input order inside each group. The first error from
/// `key_fn` stops grouping and is returned as-is.
pub fn group_duplicates_by<T, K, E, F>(
    items: impl IntoIterator<Item = T>,
    mut key_fn: F,
) -> Result<BTreeMap<K, Vec<T>>, E>
where
    K: Ord,
    F: FnMut(&T) -> Result<K, E>,
{
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        let key = key_fn(&item)?;
        groups.entry(key).or_default().push(item);
    }

    // Filter out groups with only one item (no duplicates)
    groups.retain(|_, group| group.len() > 1);

    Ok(groups)
}

/// Files sharing a content digest, one entry per set of two or more files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateSets {
    sets: BTreeMap<Digest, Vec<FileEntry>>,
}

impl DuplicateSets {
    pub(crate) fn from_groups(sets: BTreeMap<Digest, Vec<FileEntry>>) -> Self {
        debug_assert!(sets.values().all(|files| files.len() > 1));
        Self { sets }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, digest: &Digest) -> Option<&[FileEntry]> {
        self.sets.get(digest).map(Vec::as_slice)
    }

    /// Sets in digest order.
    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &[FileEntry])> {
        self.sets.iter().map(|(digest, files)| (digest, files.as_slice()))
    }

    /// Number of files that are copies of another file (all but one per set).
    pub fn duplicate_file_count(&self) -> usize {
        self.sets.values().map(|files| files.len() - 1).sum()
    }

    /// Bytes freed if every set were reduced to a single file.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.sets
            .values()
            .map(|files| files[0].size * (files.len() - 1) as u64)
            .sum()
    }

    pub fn into_inner(self) -> BTreeMap<Digest, Vec<FileEntry>> {
        self.sets
    }
}

impl<'a> IntoIterator for &'a DuplicateSets {
    type Item = (&'a Digest, &'a Vec<FileEntry>);
    type IntoIter = std::collections::btree_map::Iter<'a, Digest, Vec<FileEntry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.iter()
    }
}
