//! Unified diff generation between two commit trees: flattens each tree to a
//! path → blob map, walks the union of paths, and emits Myers-based unified
//! hunks while guarding against binary payloads and pathological inputs.

use std::{collections::BTreeMap, fmt::Write};

use similar::{Algorithm, TextDiff};

use crate::versioning::{
    errors::VersioningError,
    hash::ObjectHash,
    object::{commit::Commit, tree::EntryMode},
    store::ObjectStore,
};

// Safety cap for pathological inputs.
const MAX_DIFF_LINES: usize = 10_000;
const CONTEXT_RADIUS: usize = 3;

/// Flatten a tree (recursively) into `path → blob id`.
pub(crate) fn flatten_tree(
    store: &ObjectStore,
    op: &'static str,
    tree_id: ObjectHash,
    prefix: &str,
    out: &mut BTreeMap<String, ObjectHash>,
) -> Result<(), VersioningError> {
    let tree = store.get_tree(op, tree_id)?;
    for entry in &tree.entries {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{prefix}/{}", entry.name)
        };
        match entry.mode {
            EntryMode::Blob => {
                out.insert(path, entry.id);
            }
            EntryMode::Tree => flatten_tree(store, op, entry.id, &path, out)?,
        }
    }
    Ok(())
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(8000)].contains(&0)
}

fn read_blob(
    store: &ObjectStore,
    id: Option<&ObjectHash>,
) -> Result<Vec<u8>, VersioningError> {
    match id {
        Some(id) => Ok(store.get_blob("diff", *id)?.data),
        None => Ok(Vec::new()),
    }
}

/// Unified patch over the union of paths in two commits' trees.
pub(crate) fn diff_commits(
    store: &ObjectStore,
    old: &Commit,
    new: &Commit,
) -> Result<Vec<u8>, VersioningError> {
    let mut old_blobs = BTreeMap::new();
    let mut new_blobs = BTreeMap::new();
    flatten_tree(store, "diff", old.tree_id, "", &mut old_blobs)?;
    flatten_tree(store, "diff", new.tree_id, "", &mut new_blobs)?;

    let mut paths: Vec<&String> = old_blobs.keys().chain(new_blobs.keys()).collect();
    paths.sort();
    paths.dedup();

    let mut output = String::new();
    for path in paths {
        let old_id = old_blobs.get(path);
        let new_id = new_blobs.get(path);
        if old_id == new_id {
            continue;
        }

        let old_bytes = read_blob(store, old_id)?;
        let new_bytes = read_blob(store, new_id)?;

        let header_err = |e: std::fmt::Error| {
            VersioningError::corrupt("diff", path.clone(), e.to_string())
        };
        writeln!(output, "diff --eisen a/{path} b/{path}").map_err(header_err)?;
        writeln!(
            output,
            "index {}..{}",
            old_id.map_or_else(|| "0000000".to_string(), |id| id.short_str()),
            new_id.map_or_else(|| "0000000".to_string(), |id| id.short_str()),
        )
        .map_err(header_err)?;

        if is_binary(&old_bytes) || is_binary(&new_bytes) {
            writeln!(output, "Binary files a/{path} and b/{path} differ").map_err(header_err)?;
            continue;
        }

        let old_text = String::from_utf8_lossy(&old_bytes);
        let new_text = String::from_utf8_lossy(&new_bytes);

        let total_lines = old_text.lines().count() + new_text.lines().count();
        if total_lines > MAX_DIFF_LINES {
            writeln!(output, "Diff suppressed: {total_lines} lines exceed the cap")
                .map_err(header_err)?;
            continue;
        }

        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_lines(old_text.as_ref(), new_text.as_ref());

        let old_header = if old_id.is_some() {
            format!("a/{path}")
        } else {
            "/dev/null".to_string()
        };
        let new_header = if new_id.is_some() {
            format!("b/{path}")
        } else {
            "/dev/null".to_string()
        };

        write!(
            output,
            "{}",
            diff.unified_diff()
                .context_radius(CONTEXT_RADIUS)
                .header(&old_header, &new_header)
        )
        .map_err(header_err)?;
    }

    Ok(output.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::{
        hash::HashKind,
        object::{
            ObjectCodec, ObjectKind,
            signature::Signature,
            tree::{Tree, TreeEntry},
        },
    };

    fn store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open_or_init(dir.path()).unwrap();
        (dir, store)
    }

    fn commit_with_files(store: &ObjectStore, files: &[(&str, &[u8])]) -> Commit {
        let mut entries = Vec::new();
        for (name, content) in files {
            let id = store.put_raw(ObjectKind::Blob, content).unwrap();
            entries.push(TreeEntry {
                mode: EntryMode::Blob,
                name: name.to_string(),
                id,
            });
        }
        let tree = Tree::from_entries(entries);
        let tree_id = store.put(&tree).unwrap();
        let sig = Signature::now("Test", "test@example.com");
        let mut commit = Commit::new(sig.clone(), sig, tree_id, vec![], "snapshot");
        commit.id = commit.compute_id(HashKind::Sha1).unwrap();
        store.put(&commit).unwrap();
        commit
    }

    /// A changed line produces a unified hunk with both headers.
    #[test]
    fn test_modified_file() {
        let (_dir, store) = store();
        let old = commit_with_files(&store, &[("a.txt", b"one\ntwo\n")]);
        let new = commit_with_files(&store, &[("a.txt", b"one\nthree\n")]);

        let patch = String::from_utf8(diff_commits(&store, &old, &new).unwrap()).unwrap();
        assert!(patch.contains("diff --eisen a/a.txt b/a.txt"));
        assert!(patch.contains("--- a/a.txt"));
        assert!(patch.contains("+++ b/a.txt"));
        assert!(patch.contains("-two"));
        assert!(patch.contains("+three"));
    }

    /// Added files diff against /dev/null.
    #[test]
    fn test_added_file() {
        let (_dir, store) = store();
        let old = commit_with_files(&store, &[]);
        let new = commit_with_files(&store, &[("new.txt", b"hello\n")]);

        let patch = String::from_utf8(diff_commits(&store, &old, &new).unwrap()).unwrap();
        assert!(patch.contains("--- /dev/null"));
        assert!(patch.contains("+hello"));
    }

    /// Identical trees produce an empty patch.
    #[test]
    fn test_no_changes() {
        let (_dir, store) = store();
        let old = commit_with_files(&store, &[("a.txt", b"same\n")]);
        let new = commit_with_files(&store, &[("a.txt", b"same\n")]);
        assert!(diff_commits(&store, &old, &new).unwrap().is_empty());
    }

    /// Binary payloads are reported, not dumped.
    #[test]
    fn test_binary_file() {
        let (_dir, store) = store();
        let old = commit_with_files(&store, &[("blob.bin", &[0u8, 1, 2][..])]);
        let new = commit_with_files(&store, &[("blob.bin", &[0u8, 9, 9][..])]);

        let patch = String::from_utf8(diff_commits(&store, &old, &new).unwrap()).unwrap();
        assert!(patch.contains("Binary files a/blob.bin and b/blob.bin differ"));
        assert!(!patch.contains("@@"));
    }

    /// Nested directories flatten into slash-joined paths.
    #[test]
    fn test_flatten_nested() {
        let (_dir, store) = store();
        let blob = store.put_raw(ObjectKind::Blob, b"x").unwrap();
        let inner = Tree::from_entries(vec![TreeEntry {
            mode: EntryMode::Blob,
            name: "task.json".to_string(),
            id: blob,
        }]);
        let inner_id = store.put(&inner).unwrap();
        let outer = Tree::from_entries(vec![TreeEntry {
            mode: EntryMode::Tree,
            name: "todo".to_string(),
            id: inner_id,
        }]);
        let outer_id = store.put(&outer).unwrap();

        let mut out = BTreeMap::new();
        flatten_tree(&store, "diff", outer_id, "", &mut out).unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["todo/task.json"]);
    }
}
