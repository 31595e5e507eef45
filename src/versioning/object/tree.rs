//! The tree object maps names to blobs and subtrees, describing one directory
//! level of the working tree. Wire form is a sequence of entries
//! `<mode> <name>\0<raw hash bytes>`, sorted the way the store sorts
//! directories (a subtree compares as if its name carried a trailing `/`).

use std::fmt::Display;

use bstr::ByteSlice;

use crate::versioning::{
    errors::VersioningError,
    hash::ObjectHash,
    object::{ObjectCodec, ObjectKind},
};

/// Entry modes the store understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryMode {
    Blob,
    Tree,
}

impl EntryMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntryMode::Blob => "100644",
            EntryMode::Tree => "40000",
        }
    }

    pub fn from_mode(mode: &[u8]) -> Result<Self, VersioningError> {
        match mode {
            b"100644" => Ok(EntryMode::Blob),
            b"40000" => Ok(EntryMode::Tree),
            other => Err(VersioningError::corrupt(
                "decode",
                String::from_utf8_lossy(other),
                "unknown tree entry mode",
            )),
        }
    }
}

/// One name inside a tree, pointing at a blob or a subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub id: ObjectHash,
}

impl TreeEntry {
    /// Sort key: subtrees compare as if the name had a trailing slash.
    fn sort_key(&self) -> Vec<u8> {
        let mut key = self.name.as_bytes().to_vec();
        if self.mode == EntryMode::Tree {
            key.push(b'/');
        }
        key
    }
}

/// A directory snapshot: ordered entries addressed by content hash.
#[derive(Eq, Debug, Clone)]
pub struct Tree {
    pub id: ObjectHash,
    pub entries: Vec<TreeEntry>,
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} {} {}", entry.mode.as_str(), entry.id, entry.name)?;
        }
        Ok(())
    }
}

impl Tree {
    /// Build a tree from unordered entries, applying the canonical sort.
    pub fn from_entries(mut entries: Vec<TreeEntry>) -> Tree {
        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Tree {
            id: ObjectHash::default(),
            entries,
        }
    }

    /// Look up a direct child by name.
    pub fn entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

impl ObjectCodec for Tree {
    fn from_bytes(data: &[u8], id: ObjectHash) -> Result<Self, VersioningError> {
        let hash_size = id.kind().size();
        let mut entries = Vec::new();
        let mut rest = data;

        while !rest.is_empty() {
            let space = rest.find_byte(b' ').ok_or_else(|| {
                VersioningError::corrupt("decode", id.to_string(), "tree entry missing mode")
            })?;
            let mode = EntryMode::from_mode(&rest[..space])?;

            let nul = rest.find_byte(b'\x00').ok_or_else(|| {
                VersioningError::corrupt("decode", id.to_string(), "tree entry missing terminator")
            })?;
            if nul < space + 1 {
                return Err(VersioningError::corrupt(
                    "decode",
                    id.to_string(),
                    "tree entry terminator before mode",
                ));
            }
            let name = rest[space + 1..nul].to_str().map_err(|_| {
                VersioningError::corrupt("decode", id.to_string(), "tree entry name is not UTF-8")
            })?;

            if rest.len() < nul + 1 + hash_size {
                return Err(VersioningError::corrupt(
                    "decode",
                    id.to_string(),
                    "tree entry truncated before hash",
                ));
            }
            let entry_id = ObjectHash::from_bytes(id.kind(), &rest[nul + 1..nul + 1 + hash_size])
                .map_err(|e| VersioningError::corrupt("decode", id.to_string(), e))?;

            entries.push(TreeEntry {
                mode,
                name: name.to_string(),
                id: entry_id,
            });
            rest = &rest[nul + 1 + hash_size..];
        }

        Ok(Tree { id, entries })
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Tree
    }

    fn to_data(&self) -> Result<Vec<u8>, VersioningError> {
        let mut data = Vec::new();
        for entry in &self.entries {
            data.extend(entry.mode.as_str().as_bytes());
            data.push(b' ');
            data.extend(entry.name.as_bytes());
            data.push(b'\x00');
            data.extend(entry.id.as_ref());
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::hash::HashKind;

    fn blob_id(seed: &[u8]) -> ObjectHash {
        ObjectHash::digest(HashKind::Sha1, seed)
    }

    /// Encoding and decoding preserves entries and order.
    #[test]
    fn test_round_trip() {
        let tree = Tree::from_entries(vec![
            TreeEntry {
                mode: EntryMode::Blob,
                name: "a.txt".to_string(),
                id: blob_id(b"a"),
            },
            TreeEntry {
                mode: EntryMode::Tree,
                name: "sub".to_string(),
                id: blob_id(b"sub"),
            },
        ]);
        let id = tree.compute_id(HashKind::Sha1).unwrap();
        let decoded = Tree::from_bytes(&tree.to_data().unwrap(), id).unwrap();
        assert_eq!(decoded.entries, tree.entries);
    }

    /// Subtrees sort as if their name ended in a slash.
    #[test]
    fn test_canonical_sort() {
        let tree = Tree::from_entries(vec![
            TreeEntry {
                mode: EntryMode::Blob,
                name: "sub.txt".to_string(),
                id: blob_id(b"1"),
            },
            TreeEntry {
                mode: EntryMode::Tree,
                name: "sub".to_string(),
                id: blob_id(b"2"),
            },
            TreeEntry {
                mode: EntryMode::Blob,
                name: "sub0".to_string(),
                id: blob_id(b"3"),
            },
        ]);
        let names: Vec<&str> = tree.entries.iter().map(|e| e.name.as_str()).collect();
        // "sub/" < "sub." < "sub0" in byte order
        assert_eq!(names, ["sub", "sub.txt", "sub0"]);
    }

    /// Truncated payloads fail to decode instead of panicking.
    #[test]
    fn test_truncated_entry() {
        let tree = Tree::from_entries(vec![TreeEntry {
            mode: EntryMode::Blob,
            name: "a.txt".to_string(),
            id: blob_id(b"a"),
        }]);
        let data = tree.to_data().unwrap();
        let id = tree.compute_id(HashKind::Sha1).unwrap();
        assert!(Tree::from_bytes(&data[..data.len() - 4], id).is_err());
    }

    /// Direct children are reachable by name.
    #[test]
    fn test_entry_lookup() {
        let tree = Tree::from_entries(vec![TreeEntry {
            mode: EntryMode::Blob,
            name: "board.json".to_string(),
            id: blob_id(b"b"),
        }]);
        assert!(tree.entry("board.json").is_some());
        assert!(tree.entry("missing").is_none());
    }
}
