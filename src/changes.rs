//! Changed-file sets driving incremental recompilation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The modified and deleted source files known for an incremental run.
///
/// Immutable once constructed. An empty set is a legal "no known changes"
/// signal; "changes unknown" is expressed by passing `Option::None` where a
/// change set is accepted, which makes the incremental compiler fall back to
/// its own snapshot-based change detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    modified: BTreeSet<PathBuf>,
    deleted: BTreeSet<PathBuf>,
}

impl ChangeSet {
    pub fn new(
        modified: impl IntoIterator<Item = PathBuf>,
        deleted: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        Self {
            modified: modified.into_iter().collect(),
            deleted: deleted.into_iter().collect(),
        }
    }

    /// The "no known changes" set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn modified(&self) -> impl Iterator<Item = &Path> {
        self.modified.iter().map(PathBuf::as_path)
    }

    pub fn deleted(&self) -> impl Iterator<Item = &Path> {
        self.deleted.iter().map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.deleted.is_empty()
    }
}
