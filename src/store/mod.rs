//! Document store.
//!
//! An in-memory document store guarded by a `tokio::sync::RwLock`. Readers
//! share the lock; every mutation runs inside a [`Transaction`] holding the
//! write guard, so unique-index checks and the writes that depend on them
//! cannot interleave with another writer.
//!
//! A transaction keeps a copy of the collections taken when it began and
//! restores it when dropped without [`Transaction::commit`]. Committed state
//! is optionally written to a JSON snapshot file.

mod collections;

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

pub use collections::Collections;

/// The shared document store.
#[derive(Debug, Default)]
pub struct DocumentStore {
    collections: RwLock<Collections>,
    snapshot_path: Option<PathBuf>,
}

impl DocumentStore {
    /// Creates an empty store without persistence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store persisted to `path`, loading the snapshot if the file
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file exists but cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref().to_path_buf();
        let collections = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| EngineError::Storage {
                message: format!("failed to parse snapshot '{}': {}", path.display(), e),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Collections::default(),
            Err(e) => {
                return Err(EngineError::Storage {
                    message: format!("failed to read snapshot '{}': {}", path.display(), e),
                });
            }
        };
        info!(path = %path.display(), "Opened document store snapshot");
        Ok(Self {
            collections: RwLock::new(collections),
            snapshot_path: Some(path),
        })
    }

    /// Acquires a shared read guard.
    pub async fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.collections.read().await
    }

    /// Begins a transaction holding the exclusive write guard.
    pub async fn begin(&self) -> Transaction<'_> {
        let guard = self.collections.write().await;
        let backup = Some(guard.clone());
        Transaction {
            guard,
            backup,
            snapshot_path: self.snapshot_path.as_deref(),
        }
    }
}

/// An exclusive unit of work over the collections.
///
/// Dereferences to [`Collections`]. Dropping without committing rolls every
/// change back.
pub struct Transaction<'a> {
    guard: RwLockWriteGuard<'a, Collections>,
    backup: Option<Collections>,
    snapshot_path: Option<&'a Path>,
}

impl Transaction<'_> {
    /// Makes the changes permanent and writes the snapshot, if configured.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the snapshot cannot be written. The changes are
    /// rolled back in that case.
    pub async fn commit(mut self) -> EngineResult<()> {
        if let Some(path) = self.snapshot_path {
            let bytes = serde_json::to_vec(&*self.guard).map_err(|e| EngineError::Storage {
                message: format!("failed to serialize snapshot: {}", e),
            })?;
            tokio::fs::write(path, bytes)
                .await
                .map_err(|e| EngineError::Storage {
                    message: format!("failed to write snapshot '{}': {}", path.display(), e),
                })?;
            debug!(path = %path.display(), "Snapshot written");
        }
        self.backup = None;
        Ok(())
    }

    /// Discards the changes explicitly.
    pub fn rollback(self) {}
}

impl Deref for Transaction<'_> {
    type Target = Collections;

    fn deref(&self) -> &Collections {
        &self.guard
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut Collections {
        &mut self.guard
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Some(backup) = self.backup.take() {
            *self.guard = backup;
        }
    }
}
