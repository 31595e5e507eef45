//! History traversal: a newest-first walk over the commit graph, the caller
//! facing `CommitRecord`, and the streaming variant fed by a bounded channel.
//!
//! The walk orders commits by committer timestamp with a max-heap, so
//! multi-parent histories interleave chronologically instead of following
//! first parents only. Streams snapshot HEAD up front and then read only
//! immutable objects, so they never hold the repository lock while the
//! consumer is slow.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashSet},
    sync::mpsc,
    thread,
};

use chrono::{DateTime, Utc};

use crate::versioning::{
    errors::VersioningError,
    hash::ObjectHash,
    object::{commit::Commit, tree::EntryMode},
    store::ObjectStore,
};

/// One entry of a history listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
    /// Hex content hash of the commit.
    pub id: ObjectHash,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl From<&Commit> for CommitRecord {
    fn from(commit: &Commit) -> Self {
        CommitRecord {
            id: commit.id,
            author_name: commit.author.name.clone(),
            author_email: commit.author.email.clone(),
            timestamp: commit.author.when(),
            message: commit.message.clone(),
        }
    }
}

/// Heap entry ordering commits newest-first, ties broken by id for
/// deterministic output.
struct QueuedCommit(Commit);

impl PartialEq for QueuedCommit {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for QueuedCommit {}

impl PartialOrd for QueuedCommit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedCommit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .committer
            .timestamp
            .cmp(&other.0.committer.timestamp)
            .then_with(|| self.0.id.cmp(&other.0.id))
    }
}

/// Newest-first iterator over the commit graph reachable from one head.
pub(crate) struct HistoryWalk {
    store: ObjectStore,
    op: &'static str,
    heap: BinaryHeap<QueuedCommit>,
    visited: HashSet<ObjectHash>,
}

impl HistoryWalk {
    pub(crate) fn new(
        store: ObjectStore,
        head: Option<ObjectHash>,
        op: &'static str,
    ) -> Result<HistoryWalk, VersioningError> {
        let mut walk = HistoryWalk {
            store,
            op,
            heap: BinaryHeap::new(),
            visited: HashSet::new(),
        };
        if let Some(id) = head {
            let commit = walk.store.get_commit(op, id)?;
            walk.visited.insert(id);
            walk.heap.push(QueuedCommit(commit));
        }
        Ok(walk)
    }
}

impl Iterator for HistoryWalk {
    type Item = Result<Commit, VersioningError>;

    fn next(&mut self) -> Option<Self::Item> {
        let QueuedCommit(commit) = self.heap.pop()?;

        for parent_id in &commit.parent_ids {
            if self.visited.insert(*parent_id) {
                match self.store.get_commit(self.op, *parent_id) {
                    Ok(parent) => self.heap.push(QueuedCommit(parent)),
                    Err(e) => return Some(Err(e)),
                }
            }
        }

        Some(Ok(commit))
    }
}

/// Blob id at `path` inside the commit's tree, if the path exists.
pub(crate) fn blob_at(
    store: &ObjectStore,
    op: &'static str,
    commit: &Commit,
    path: &str,
) -> Result<Option<ObjectHash>, VersioningError> {
    let mut tree = store.get_tree(op, commit.tree_id)?;
    let segments: Vec<&str> = path.split('/').collect();

    for (depth, segment) in segments.iter().enumerate() {
        let Some(entry) = tree.entry(segment) else {
            return Ok(None);
        };
        let is_last = depth + 1 == segments.len();
        match (entry.mode, is_last) {
            (EntryMode::Blob, true) => return Ok(Some(entry.id)),
            (EntryMode::Tree, false) => tree = store.get_tree(op, entry.id)?,
            _ => return Ok(None),
        }
    }
    Ok(None)
}

/// True when `commit` changes `path` relative to its first parent. A root
/// commit touches every path it contains.
pub(crate) fn touches(
    store: &ObjectStore,
    op: &'static str,
    commit: &Commit,
    path: &str,
) -> Result<bool, VersioningError> {
    let current = blob_at(store, op, commit, path)?;
    let Some(parent_id) = commit.parent_ids.first() else {
        return Ok(current.is_some());
    };
    let parent = store.get_commit(op, *parent_id)?;
    let previous = blob_at(store, op, &parent, path)?;
    Ok(current != previous)
}

/// Lazy, finite, non-restartable sequence of commit records.
///
/// Dropping the stream closes the channel; the producer thread observes the
/// closed channel on its next send and exits without error.
pub struct HistoryStream {
    rx: mpsc::Receiver<CommitRecord>,
}

impl Iterator for HistoryStream {
    type Item = CommitRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

/// Spawn the producer thread for a (possibly path-filtered) history stream.
pub(crate) fn spawn_stream(
    store: ObjectStore,
    head: Option<ObjectHash>,
    path_filter: Option<String>,
) -> HistoryStream {
    let (tx, rx) = mpsc::sync_channel::<CommitRecord>(1);

    let spawned = thread::Builder::new()
        .name("eisenkan-history".to_string())
        .spawn(move || {
            let walk = match HistoryWalk::new(store.clone(), head, "history-stream") {
                Ok(walk) => walk,
                Err(e) => {
                    tracing::warn!("history stream failed to start: {e}");
                    return;
                }
            };

            for result in walk {
                let commit = match result {
                    Ok(commit) => commit,
                    Err(e) => {
                        tracing::warn!("history stream aborted: {e}");
                        return;
                    }
                };

                if let Some(path) = &path_filter {
                    match touches(&store, "history-stream", &commit, path) {
                        Ok(false) => continue,
                        Ok(true) => {}
                        Err(e) => {
                            tracing::warn!("history stream aborted: {e}");
                            return;
                        }
                    }
                }

                if tx.send(CommitRecord::from(&commit)).is_err() {
                    // Consumer dropped the stream; stop producing.
                    return;
                }
            }
        });

    if let Err(e) = spawned {
        tracing::warn!("failed to spawn history stream thread: {e}");
    }
    HistoryStream { rx }
}
