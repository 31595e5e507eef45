//! The repository handle: a scoped resource owning one working tree, its
//! object store, the author identity, and a reader/writer lock. Readers
//! (`status`, `history*`, `file_history*`, `diff`) take the shared side;
//! writers (`stage`, `commit`) take the exclusive side. Different
//! repositories have independent locks.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::RwLock;

use path_absolutize::Absolutize;

use crate::versioning::{
    diff::{diff_commits, flatten_tree},
    errors::VersioningError,
    hash::ObjectHash,
    history::{CommitRecord, HistoryStream, HistoryWalk, spawn_stream, touches},
    index::StagingIndex,
    object::{
        ObjectKind,
        commit::Commit,
        signature::Signature,
        tree::{EntryMode, Tree, TreeEntry},
    },
    status::{ChangeCode, FileState, WorkingTreeStatus},
    store::{HeadRef, ObjectStore, STORE_DIR},
};

/// Who authors and commits changes through a repository handle.
/// Both fields must be non-empty; validated at open and again at commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub name: String,
    pub email: String,
}

impl AuthorIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> AuthorIdentity {
        AuthorIdentity {
            name: name.into(),
            email: email.into(),
        }
    }

    fn validate(&self, op: &'static str, path: &Path) -> Result<(), VersioningError> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            return Err(VersioningError::config(
                op,
                path.display().to_string(),
                "author identity requires non-empty name and email",
            ));
        }
        Ok(())
    }
}

struct RepoInner {
    workdir: PathBuf,
    store: ObjectStore,
    identity: AuthorIdentity,
    lock: RwLock<()>,
    closed: AtomicBool,
}

/// Handle to one repository. Cloning shares the handle (and its closed
/// state); releasing is explicit via [`Repository::close`] and idempotent.
#[derive(Clone)]
pub struct Repository {
    inner: Arc<RepoInner>,
}

impl Repository {
    /// Open the working tree at `path`, creating the directory and
    /// initializing a fresh store when absent.
    pub fn open(
        path: impl AsRef<Path>,
        identity: AuthorIdentity,
    ) -> Result<Repository, VersioningError> {
        let raw = path.as_ref();
        if raw.as_os_str().is_empty() {
            return Err(VersioningError::config("open", "", "repository path is blank"));
        }
        identity.validate("open", raw)?;

        fs::create_dir_all(raw)
            .map_err(|e| VersioningError::io("open", raw.display().to_string(), e))?;
        let workdir = raw
            .absolutize()
            .map_err(|e| VersioningError::io("open", raw.display().to_string(), e))?
            .to_path_buf();

        let store = ObjectStore::open_or_init(&workdir)?;
        tracing::debug!("opened repository at {}", workdir.display());

        Ok(Repository {
            inner: Arc::new(RepoInner {
                workdir,
                store,
                identity,
                lock: RwLock::new(()),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Absolute path of the working tree.
    pub fn workdir(&self) -> &Path {
        &self.inner.workdir
    }

    fn ensure_open(&self, op: &'static str) -> Result<(), VersioningError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(VersioningError::Closed {
                op,
                path: self.inner.workdir.display().to_string(),
            });
        }
        Ok(())
    }

    /// Release the handle. Idempotent; later calls on any clone fail with
    /// `Closed`.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("closed repository at {}", self.inner.workdir.display());
        }
    }

    /// Snapshot of the working tree. Never mutates.
    pub fn status(&self) -> Result<WorkingTreeStatus, VersioningError> {
        self.ensure_open("status")?;
        let _shared = self.inner.lock.read();

        let states = self.collect_states("status")?;
        Ok(WorkingTreeStatus::classify(
            self.current_branch_name()?,
            &states,
        ))
    }

    fn current_branch_name(&self) -> Result<String, VersioningError> {
        match self.inner.store.head_ref()? {
            HeadRef::Branch(name) => {
                if self.inner.store.read_branch(&name)?.is_some() {
                    Ok(name)
                } else {
                    Ok("HEAD".to_string())
                }
            }
            HeadRef::Detached(_) => Ok("HEAD".to_string()),
        }
    }

    /// Walk the working tree (skipping the store directory) and return
    /// relative slash-joined paths with the blob id their content would get.
    fn worktree_blobs(
        &self,
        op: &'static str,
    ) -> Result<BTreeMap<String, ObjectHash>, VersioningError> {
        let mut out = BTreeMap::new();
        self.walk_dir(op, &self.inner.workdir, "", &mut out)?;
        Ok(out)
    }

    fn walk_dir(
        &self,
        op: &'static str,
        dir: &Path,
        prefix: &str,
        out: &mut BTreeMap<String, ObjectHash>,
    ) -> Result<(), VersioningError> {
        let entries = fs::read_dir(dir)
            .map_err(|e| VersioningError::io(op, dir.display().to_string(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| VersioningError::io(op, dir.display().to_string(), e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if prefix.is_empty() && name == STORE_DIR {
                continue;
            }
            let rel = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            let path = entry.path();
            if path.is_dir() {
                self.walk_dir(op, &path, &rel, out)?;
            } else if path.is_file() {
                let data = fs::read(&path)
                    .map_err(|e| VersioningError::io(op, path.display().to_string(), e))?;
                let id = ObjectHash::from_kind_and_data(
                    self.inner.store.hash_kind(),
                    ObjectKind::Blob,
                    &data,
                );
                out.insert(rel, id);
            }
        }
        Ok(())
    }

    /// Per-path staging/worktree change codes against HEAD and the index.
    fn collect_states(
        &self,
        op: &'static str,
    ) -> Result<BTreeMap<String, FileState>, VersioningError> {
        let store = &self.inner.store;

        let mut head_blobs = BTreeMap::new();
        if let Some(head_id) = store.head_commit()? {
            let head = store.get_commit(op, head_id)?;
            flatten_tree(store, op, head.tree_id, "", &mut head_blobs)?;
        }
        let index = StagingIndex::load(&store.index_path())?;
        let worktree = self.worktree_blobs(op)?;

        let mut paths: Vec<String> = head_blobs
            .keys()
            .chain(index.entries.keys())
            .chain(worktree.keys())
            .cloned()
            .collect();
        paths.sort();
        paths.dedup();

        let mut states = BTreeMap::new();
        for path in paths {
            let in_head = head_blobs.get(&path);
            let in_index = index.get(&path);
            let in_worktree = worktree.get(&path);

            let staging = match in_index {
                Some(entry) if entry.unmerged => ChangeCode::Unmerged,
                Some(entry) => match in_head {
                    None => ChangeCode::Added,
                    Some(head_id) if *head_id != entry.id => ChangeCode::Modified,
                    Some(_) => ChangeCode::Unmodified,
                },
                None => match (in_head, in_worktree) {
                    (Some(_), _) => ChangeCode::Deleted,
                    (None, Some(_)) => ChangeCode::Untracked,
                    (None, None) => ChangeCode::Unmodified,
                },
            };

            let worktree_code = match (in_worktree, in_index) {
                (Some(work_id), Some(entry)) => {
                    if *work_id != entry.id {
                        ChangeCode::Modified
                    } else {
                        ChangeCode::Unmodified
                    }
                }
                (Some(_), None) => ChangeCode::Untracked,
                (None, Some(_)) => ChangeCode::Deleted,
                (None, None) => ChangeCode::Unmodified,
            };

            states.insert(
                path,
                FileState {
                    staging,
                    worktree: worktree_code,
                },
            );
        }
        Ok(states)
    }

    /// Stage the paths selected by `patterns`: `"."` stages every pending
    /// change, shell globs expand against the working tree, anything else is
    /// an exact relative path. Per-pattern failures are logged and skipped;
    /// an aggregated error is returned only when every pattern failed.
    pub fn stage<S: AsRef<str>>(&self, patterns: &[S]) -> Result<(), VersioningError> {
        self.ensure_open("stage")?;
        let _exclusive = self.inner.lock.write();

        let store = &self.inner.store;
        let mut index = StagingIndex::load(&store.index_path())?;
        if index.has_conflicts() {
            return Err(VersioningError::Conflict {
                op: "stage",
                path: self.inner.workdir.display().to_string(),
            });
        }

        let worktree = self.worktree_blobs("stage")?;
        // Pending: paths whose worktree content differs from the index,
        // including deletions of indexed paths.
        let mut pending: Vec<String> = Vec::new();
        for (path, id) in &worktree {
            match index.get(path) {
                Some(entry) if entry.id == *id => {}
                _ => pending.push(path.clone()),
            }
        }
        for path in index.entries.keys() {
            if !worktree.contains_key(path) {
                pending.push(path.clone());
            }
        }
        pending.sort();
        pending.dedup();

        let mut failures = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let outcome = if pattern == "." {
                self.stage_all(&mut index, &pending)
            } else if pattern.contains(['*', '?', '[']) {
                self.stage_glob(&mut index, &pending, pattern)
            } else {
                self.stage_path(&mut index, pattern)
            };

            if let Err(e) = outcome {
                tracing::warn!("stage pattern `{pattern}` skipped: {e}");
                failures.push(format!("`{pattern}`: {e}"));
            }
        }

        index.save(&store.index_path())?;

        if !patterns.is_empty() && failures.len() == patterns.len() {
            return Err(VersioningError::NotFound {
                op: "stage",
                what: format!("every pattern failed ({})", failures.join("; ")),
            });
        }
        Ok(())
    }

    fn stage_all(
        &self,
        index: &mut StagingIndex,
        pending: &[String],
    ) -> Result<(), VersioningError> {
        for path in pending {
            self.stage_path(index, path)?;
        }
        Ok(())
    }

    fn stage_glob(
        &self,
        index: &mut StagingIndex,
        pending: &[String],
        pattern: &str,
    ) -> Result<(), VersioningError> {
        let compiled = glob::Pattern::new(pattern).map_err(|e| {
            VersioningError::config("stage", pattern.to_string(), format!("invalid glob: {e}"))
        })?;

        let matches: Vec<&String> = pending.iter().filter(|p| compiled.matches(p)).collect();
        if matches.is_empty() {
            // Advisory only; a non-matching glob is not a failure.
            tracing::debug!("stage glob `{pattern}` matched no pending paths");
            return Ok(());
        }
        for path in matches {
            self.stage_path(index, path)?;
        }
        Ok(())
    }

    fn stage_path(&self, index: &mut StagingIndex, path: &str) -> Result<(), VersioningError> {
        let abs = self.inner.workdir.join(path);
        if abs.is_file() {
            let data = fs::read(&abs)
                .map_err(|e| VersioningError::io("stage", abs.display().to_string(), e))?;
            let id = self.inner.store.put_raw(ObjectKind::Blob, &data)?;
            index.stage(path, id);
            Ok(())
        } else if index.get(path).is_some() {
            // Deleted from the working tree: stage the deletion.
            index.unstage(path);
            Ok(())
        } else {
            Err(VersioningError::NotFound {
                op: "stage",
                what: path.to_string(),
            })
        }
    }

    /// Record the staged tree as a new commit and advance HEAD. The author
    /// identity held by the handle is validated and stamped at this instant.
    pub fn commit(&self, message: &str) -> Result<ObjectHash, VersioningError> {
        self.ensure_open("commit")?;
        let _exclusive = self.inner.lock.write();

        let identity = &self.inner.identity;
        identity.validate("commit", &self.inner.workdir)?;

        let store = &self.inner.store;
        let index = StagingIndex::load(&store.index_path())?;
        if index.has_conflicts() {
            return Err(VersioningError::Conflict {
                op: "commit",
                path: self.inner.workdir.display().to_string(),
            });
        }

        let entries: Vec<(String, ObjectHash)> = index
            .entries
            .iter()
            .map(|(path, entry)| (path.clone(), entry.id))
            .collect();
        let tree_id = self.write_tree(&entries)?;

        let parent_ids = store.head_commit()?.into_iter().collect();
        let signature = Signature::now(&identity.name, &identity.email);
        let commit = Commit::new(signature.clone(), signature, tree_id, parent_ids, message);
        let id = store.put(&commit)?;

        match store.head_ref()? {
            HeadRef::Branch(name) => store.update_branch(&name, id)?,
            HeadRef::Detached(_) => store.set_head_detached(id)?,
        }

        tracing::debug!("committed {} at {}", id, self.inner.workdir.display());
        Ok(id)
    }

    /// Write the nested tree objects for a flat `path → blob` listing and
    /// return the root tree id.
    fn write_tree(&self, entries: &[(String, ObjectHash)]) -> Result<ObjectHash, VersioningError> {
        #[derive(Default)]
        struct DirNode {
            blobs: Vec<(String, ObjectHash)>,
            dirs: BTreeMap<String, DirNode>,
        }

        fn insert(node: &mut DirNode, path: &str, id: ObjectHash) {
            match path.split_once('/') {
                None => node.blobs.push((path.to_string(), id)),
                Some((dir, rest)) => {
                    insert(node.dirs.entry(dir.to_string()).or_default(), rest, id)
                }
            }
        }

        fn write(node: &DirNode, store: &ObjectStore) -> Result<ObjectHash, VersioningError> {
            let mut tree_entries = Vec::new();
            for (name, id) in &node.blobs {
                tree_entries.push(TreeEntry {
                    mode: EntryMode::Blob,
                    name: name.clone(),
                    id: *id,
                });
            }
            for (name, child) in &node.dirs {
                tree_entries.push(TreeEntry {
                    mode: EntryMode::Tree,
                    name: name.clone(),
                    id: write(child, store)?,
                });
            }
            store.put(&Tree::from_entries(tree_entries))
        }

        let mut root = DirNode::default();
        for (path, id) in entries {
            insert(&mut root, path, *id);
        }
        write(&root, &self.inner.store)
    }

    /// Newest-first history from HEAD. `limit ≤ 0` means unbounded; an
    /// unborn repository yields an empty list.
    pub fn history(&self, limit: i64) -> Result<Vec<CommitRecord>, VersioningError> {
        self.ensure_open("history")?;
        let _shared = self.inner.lock.read();

        let head = self.inner.store.head_commit()?;
        let walk = HistoryWalk::new(self.inner.store.clone(), head, "history")?;

        let mut records = Vec::new();
        for result in walk {
            let commit = result?;
            records.push(CommitRecord::from(&commit));
            if limit > 0 && records.len() as i64 >= limit {
                break;
            }
        }
        Ok(records)
    }

    /// As [`Repository::history`], restricted to commits touching `path`.
    pub fn file_history(
        &self,
        path: &str,
        limit: i64,
    ) -> Result<Vec<CommitRecord>, VersioningError> {
        self.ensure_open("file-history")?;
        let _shared = self.inner.lock.read();

        let store = &self.inner.store;
        let head = store.head_commit()?;
        let walk = HistoryWalk::new(store.clone(), head, "file-history")?;

        let mut records = Vec::new();
        for result in walk {
            let commit = result?;
            if !touches(store, "file-history", &commit, path)? {
                continue;
            }
            records.push(CommitRecord::from(&commit));
            if limit > 0 && records.len() as i64 >= limit {
                break;
            }
        }
        Ok(records)
    }

    /// Lazy newest-first history stream. Finite and non-restartable; drop
    /// the stream to cancel.
    pub fn history_stream(&self) -> Result<HistoryStream, VersioningError> {
        self.ensure_open("history-stream")?;
        let head = {
            let _shared = self.inner.lock.read();
            self.inner.store.head_commit()?
        };
        Ok(spawn_stream(self.inner.store.clone(), head, None))
    }

    /// As [`Repository::history_stream`], restricted to commits touching
    /// `path`.
    pub fn file_history_stream(&self, path: &str) -> Result<HistoryStream, VersioningError> {
        self.ensure_open("file-history-stream")?;
        let head = {
            let _shared = self.inner.lock.read();
            self.inner.store.head_commit()?
        };
        Ok(spawn_stream(
            self.inner.store.clone(),
            head,
            Some(path.to_string()),
        ))
    }

    /// Unified patch between the trees of two commits, identified by their
    /// hex ids.
    pub fn diff(&self, id_a: &str, id_b: &str) -> Result<Vec<u8>, VersioningError> {
        self.ensure_open("diff")?;
        let _shared = self.inner.lock.read();

        let parse = |raw: &str| {
            ObjectHash::from_str(raw).map_err(|_| VersioningError::NotFound {
                op: "diff",
                what: raw.to_string(),
            })
        };
        let store = &self.inner.store;
        let old = store.get_commit("diff", parse(id_a)?)?;
        let new = store.get_commit("diff", parse(id_b)?)?;
        diff_commits(store, &old, &new)
    }
}
