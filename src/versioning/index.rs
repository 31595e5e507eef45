//! The staging index: the set of paths queued for the next commit, each
//! pointing at the blob that will be written into the tree. Entries can be
//! flagged unmerged when the underlying store reports conflict markers;
//! staging refuses to run while any such entry exists.
//!
//! Persisted as JSON at `.eisen/index.json` and re-read on every repository
//! operation, so external tools can inspect and adjust it between calls.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::versioning::{errors::VersioningError, hash::ObjectHash};

/// One staged path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Blob holding the staged content.
    pub id: ObjectHash,
    /// Set when the store reported this path as updated-but-unmerged.
    #[serde(default)]
    pub unmerged: bool,
}

/// Mapping from relative path to staged entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagingIndex {
    pub entries: BTreeMap<String, IndexEntry>,
}

impl StagingIndex {
    /// Read the index file; a missing file is an empty index.
    pub fn load(path: &Path) -> Result<StagingIndex, VersioningError> {
        match fs::read(path) {
            Ok(raw) => serde_json::from_slice(&raw).map_err(|e| {
                VersioningError::corrupt("index-load", path.display().to_string(), e.to_string())
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StagingIndex::default()),
            Err(e) => Err(VersioningError::io(
                "index-load",
                path.display().to_string(),
                e,
            )),
        }
    }

    /// Persist the index file.
    pub fn save(&self, path: &Path) -> Result<(), VersioningError> {
        let raw = serde_json::to_vec_pretty(self).map_err(|e| {
            VersioningError::corrupt("index-save", path.display().to_string(), e.to_string())
        })?;
        fs::write(path, raw)
            .map_err(|e| VersioningError::io("index-save", path.display().to_string(), e))
    }

    /// Stage `path` at `id`, clearing any conflict flag.
    pub fn stage(&mut self, path: &str, id: ObjectHash) {
        self.entries.insert(
            path.to_string(),
            IndexEntry {
                id,
                unmerged: false,
            },
        );
    }

    /// Remove `path` from the index (a staged deletion).
    pub fn unstage(&mut self, path: &str) {
        self.entries.remove(path);
    }

    /// Flag `path` as carrying unresolved conflict markers.
    pub fn mark_unmerged(&mut self, path: &str, id: ObjectHash) {
        self.entries
            .insert(path.to_string(), IndexEntry { id, unmerged: true });
    }

    /// True when any entry is unmerged.
    pub fn has_conflicts(&self) -> bool {
        self.entries.values().any(|e| e.unmerged)
    }

    /// Blob id staged for `path`, if any.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::hash::HashKind;

    fn blob_id(seed: &[u8]) -> ObjectHash {
        ObjectHash::digest(HashKind::Sha1, seed)
    }

    /// A missing index file loads as empty.
    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let index = StagingIndex::load(&dir.path().join("index.json")).unwrap();
        assert!(index.entries.is_empty());
    }

    /// Entries survive a save/load cycle, conflict flags included.
    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let mut index = StagingIndex::default();
        index.stage("tasks/001-task-a.json", blob_id(b"a"));
        index.mark_unmerged("board.json", blob_id(b"b"));
        index.save(&path).unwrap();

        let loaded = StagingIndex::load(&path).unwrap();
        assert_eq!(loaded.entries.len(), 2);
        assert!(loaded.has_conflicts());
        assert!(!loaded.get("tasks/001-task-a.json").unwrap().unmerged);
    }

    /// Re-staging a conflicted path clears its flag.
    #[test]
    fn test_stage_clears_conflict() {
        let mut index = StagingIndex::default();
        index.mark_unmerged("board.json", blob_id(b"b"));
        assert!(index.has_conflicts());

        index.stage("board.json", blob_id(b"b2"));
        assert!(!index.has_conflicts());
    }

    /// Garbage in the index file is a corruption error, not a panic.
    #[test]
    fn test_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(StagingIndex::load(&path).is_err());
    }
}
