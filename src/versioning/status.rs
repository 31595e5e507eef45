//! Working-tree status: per-file change codes for the staging and worktree
//! slots, and the classification that folds them into the caller-facing
//! snapshot. A file lands in exactly one bucket, priority staged >
//! untracked > modified.

use std::collections::BTreeMap;

/// How one slot (staging or worktree) of a file differs from its baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChangeCode {
    #[default]
    Unmodified,
    Modified,
    Added,
    Deleted,
    Untracked,
    /// Updated but unmerged: the store reported conflict markers.
    Unmerged,
}

/// Staging and worktree change codes for one path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileState {
    /// Index vs HEAD tree.
    pub staging: ChangeCode,
    /// Working tree vs index.
    pub worktree: ChangeCode,
}

/// Snapshot of the working tree as seen by `Repository::status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    /// Branch short name, or `"HEAD"` when detached or unborn without a ref.
    pub current_branch: String,
    pub modified: Vec<String>,
    pub staged: Vec<String>,
    pub untracked: Vec<String>,
    pub has_conflicts: bool,
}

impl WorkingTreeStatus {
    /// Fold per-file states into the bucketed snapshot.
    pub(crate) fn classify(
        current_branch: String,
        states: &BTreeMap<String, FileState>,
    ) -> WorkingTreeStatus {
        let mut status = WorkingTreeStatus {
            current_branch,
            ..Default::default()
        };

        for (path, state) in states {
            if state.staging == ChangeCode::Unmerged {
                status.has_conflicts = true;
            }

            if state.staging != ChangeCode::Unmodified && state.staging != ChangeCode::Untracked {
                status.staged.push(path.clone());
            } else if state.staging == ChangeCode::Untracked
                || state.worktree == ChangeCode::Untracked
            {
                status.untracked.push(path.clone());
            } else if state.worktree != ChangeCode::Unmodified {
                status.modified.push(path.clone());
            }
        }

        status
    }

    /// True when no file differs from HEAD in either slot.
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.staged.is_empty() && self.untracked.is_empty()
    }
}
