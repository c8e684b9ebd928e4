//! Snapshot-diff artifact synchronization
//!
//! After a successful incremental compile, the private `classes/` subtree of
//! the cache directory is synchronized into the project's real output
//! directory. A persisted snapshot manifest (`snapshots.bin`) records the
//! size, mtime and content hash of every artifact at the last sync; only
//! artifacts that changed since then are copied, and artifacts that vanished
//! from the cache are removed from the destination.
//!
//! The snapshot file is private to this module and the incremental runner.
//! No other component may interpret it.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::time::UNIX_EPOCH;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use walkdir::WalkDir;

/// Snapshot manifest file name inside the cache directory.
pub const SNAPSHOT_FILE: &str = "snapshots.bin";

/// Classes subtree inside the cache directory.
pub const CACHE_CLASSES_DIR: &str = "classes";

/// Errors from snapshot handling or synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("snapshot file corrupt or unreadable: {0}")]
    Snapshot(String),

    #[error("path is not within cache classes root: {0}")]
    PathNotInRoot(String),
}

/// State of one artifact at the last synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SnapshotEntry {
    size: u64,
    mtime_secs: i64,
    mtime_nanos: u32,
    sha256: String,
}

/// Persisted manifest keyed by path relative to the cache classes root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSnapshot {
    created_at: Option<DateTime<Utc>>,
    entries: BTreeMap<String, SnapshotEntry>,
}

impl CacheSnapshot {
    /// Load from disk. A missing file is an empty snapshot, which makes the
    /// very first sync a full copy.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(SyncError::Io(e)),
        };
        let (snapshot, _) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|e| SyncError::Snapshot(e.to_string()))?;
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| SyncError::Snapshot(e.to_string()))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What one synchronization pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Files copied into the destination.
    pub copied: usize,
    /// Stale files removed from the destination.
    pub deleted: usize,
    /// Files left untouched because the snapshot matched.
    pub unchanged: usize,
}

/// Synchronize the cache classes directory into the real destination.
///
/// Copies every file whose size, mtime or content differs from the recorded
/// snapshot, removes destination files whose cache counterpart is gone, then
/// persists the updated snapshot. A timestamp-only change with identical
/// content refreshes the snapshot without copying.
pub fn sync_dirs(
    cache_classes: &Path,
    destination: &Path,
    snapshot_path: &Path,
) -> Result<SyncReport, SyncError> {
    let previous = CacheSnapshot::load(snapshot_path)?;
    let mut next = CacheSnapshot {
        created_at: Some(Utc::now()),
        entries: BTreeMap::new(),
    };
    let mut report = SyncReport::default();

    fs::create_dir_all(destination)?;

    for entry in WalkDir::new(cache_classes).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let rel = path
            .strip_prefix(cache_classes)
            .map_err(|_| SyncError::PathNotInRoot(path.display().to_string()))?;
        let rel_key = rel.to_string_lossy().to_string();

        let meta = entry.metadata()?;
        let (mtime_secs, mtime_nanos) = match meta.modified()?.duration_since(UNIX_EPOCH) {
            Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
            Err(_) => (0, 0),
        };

        if let Some(prev) = previous.entries.get(&rel_key) {
            if prev.size == meta.len()
                && prev.mtime_secs == mtime_secs
                && prev.mtime_nanos == mtime_nanos
            {
                next.entries.insert(rel_key, prev.clone());
                report.unchanged += 1;
                continue;
            }
        }

        let sha256 = hash_file(path)?;
        let fresh = SnapshotEntry {
            size: meta.len(),
            mtime_secs,
            mtime_nanos,
            sha256,
        };

        let content_unchanged = previous
            .entries
            .get(&rel_key)
            .is_some_and(|prev| prev.sha256 == fresh.sha256);
        if content_unchanged {
            next.entries.insert(rel_key, fresh);
            report.unchanged += 1;
            continue;
        }

        let target = destination.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &target)?;
        report.copied += 1;
        next.entries.insert(rel_key, fresh);
    }

    // Artifacts recorded last time but gone from the cache were deleted by
    // the compiler; drop them from the destination too.
    for stale in previous.entries.keys() {
        if !next.entries.contains_key(stale) {
            let target = destination.join(stale);
            match fs::remove_file(&target) {
                Ok(()) => report.deleted += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(SyncError::Io(e)),
            }
        }
    }

    next.save(snapshot_path)?;
    Ok(report)
}

fn hash_file(path: &Path) -> Result<String, SyncError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let cache_classes = temp.path().join("cache").join(CACHE_CLASSES_DIR);
        let dest = temp.path().join("out");
        let snapshot = temp.path().join("cache").join(SNAPSHOT_FILE);
        fs::create_dir_all(&cache_classes).unwrap();
        (temp, cache_classes, dest, snapshot)
    }

    #[test]
    fn test_first_sync_is_a_full_copy() {
        let (_temp, cache, dest, snapshot) = setup();
        fs::create_dir_all(cache.join("com/example")).unwrap();
        fs::write(cache.join("com/example/A.class"), b"bytecode-a").unwrap();
        fs::write(cache.join("Main.class"), b"bytecode-main").unwrap();

        let report = sync_dirs(&cache, &dest, &snapshot).unwrap();
        assert_eq!(report.copied, 2);
        assert_eq!(report.deleted, 0);
        assert_eq!(
            fs::read(dest.join("com/example/A.class")).unwrap(),
            b"bytecode-a"
        );
        assert!(snapshot.exists());
    }

    #[test]
    fn test_second_sync_without_changes_copies_nothing() {
        let (_temp, cache, dest, snapshot) = setup();
        fs::write(cache.join("A.class"), b"a").unwrap();

        sync_dirs(&cache, &dest, &snapshot).unwrap();
        let report = sync_dirs(&cache, &dest, &snapshot).unwrap();

        assert_eq!(report.copied, 0);
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn test_changed_content_is_recopied() {
        let (_temp, cache, dest, snapshot) = setup();
        fs::write(cache.join("A.class"), b"old").unwrap();
        sync_dirs(&cache, &dest, &snapshot).unwrap();

        fs::write(cache.join("A.class"), b"new and longer").unwrap();
        let report = sync_dirs(&cache, &dest, &snapshot).unwrap();

        assert_eq!(report.copied, 1);
        assert_eq!(fs::read(dest.join("A.class")).unwrap(), b"new and longer");
    }

    #[test]
    fn test_vanished_artifact_is_removed_from_destination() {
        let (_temp, cache, dest, snapshot) = setup();
        fs::write(cache.join("A.class"), b"a").unwrap();
        fs::write(cache.join("B.class"), b"b").unwrap();
        sync_dirs(&cache, &dest, &snapshot).unwrap();
        assert!(dest.join("B.class").exists());

        fs::remove_file(cache.join("B.class")).unwrap();
        let report = sync_dirs(&cache, &dest, &snapshot).unwrap();

        assert_eq!(report.deleted, 1);
        assert!(!dest.join("B.class").exists());
        assert!(dest.join("A.class").exists());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let (_temp, cache, dest, snapshot) = setup();
        fs::write(cache.join("A.class"), b"a").unwrap();
        fs::write(&snapshot, b"not a snapshot").unwrap();

        assert!(matches!(
            sync_dirs(&cache, &dest, &snapshot),
            Err(SyncError::Snapshot(_))
        ));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (_temp, cache, dest, snapshot) = setup();
        fs::write(cache.join("A.class"), b"a").unwrap();
        sync_dirs(&cache, &dest, &snapshot).unwrap();

        let loaded = CacheSnapshot::load(&snapshot).unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
