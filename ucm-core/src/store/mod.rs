//! Persisted auxiliary stores
//!
//! History and favorites are best-effort data: reading a missing or corrupt
//! file yields an empty store plus a [`PersistenceWarning`], never an error.
//! Every write goes through [`write_atomic`], which holds an advisory lock on a
//! sibling `.lock` file and replaces the target with a fully written temporary
//! file, so concurrent UCM processes never observe a truncated store.

mod favorites;
mod history;

pub use favorites::FavoriteStore;
pub use history::{HistoryStore, DEFAULT_MAX_ENTRIES};

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{PersistenceWarning, StoreError, StoreResult};

/// Advisory lock on `<target>.lock`, released on drop
#[derive(Debug)]
struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    fn open(target: &Path) -> io::Result<(File, PathBuf)> {
        let path = lock_path(target);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        Ok((file, path))
    }

    fn exclusive(target: &Path) -> io::Result<Self> {
        let (file, path) = Self::open(target)?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self { file, path })
    }

    fn shared(target: &Path) -> io::Result<Self> {
        let (file, path) = Self::open(target)?;
        FileExt::lock_shared(&file)?;
        Ok(Self { file, path })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "Failed to release store lock");
        }
    }
}

fn lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}

/// Reads a file under a shared lock
///
/// # Errors
///
/// Returns [`PersistenceWarning::Missing`] if the file does not exist and
/// [`PersistenceWarning::Unreadable`] if it cannot be locked or read.
pub(crate) fn read_locked(path: &Path) -> Result<String, PersistenceWarning> {
    if !path.exists() {
        return Err(PersistenceWarning::Missing(path.to_path_buf()));
    }

    let unreadable = |e: io::Error| PersistenceWarning::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let _guard = LockGuard::shared(path).map_err(unreadable)?;
    fs::read_to_string(path).map_err(unreadable)
}

/// Atomically replaces `path` with `content`
///
/// The parent directory is created if needed. The content is written to a
/// temporary file in the same directory, synced, and renamed over the target
/// while an exclusive lock is held.
///
/// # Errors
///
/// Returns [`StoreError::Lock`] if the lock cannot be acquired and
/// [`StoreError::Write`] if any write or the final rename fails.
pub(crate) fn write_atomic(path: &Path, content: &str) -> StoreResult<()> {
    let write_err = |e: io::Error| StoreError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(write_err)?;

    let _guard = LockGuard::exclusive(path).map_err(|e| StoreError::Lock {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), bytes = content.len(), "Wrote file atomically");
    Ok(())
}

/// Loads a YAML store, falling back to the default value on any problem
pub(crate) fn load_yaml<T>(path: &Path) -> (T, Option<PersistenceWarning>)
where
    T: DeserializeOwned + Default,
{
    let content = match read_locked(path) {
        Ok(content) => content,
        Err(warning) => return (T::default(), Some(warning)),
    };

    if content.trim().is_empty() {
        return (T::default(), None);
    }

    match serde_yaml::from_str::<Option<T>>(&content) {
        Ok(value) => (value.unwrap_or_default(), None),
        Err(e) => (
            T::default(),
            Some(PersistenceWarning::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        ),
    }
}

/// Serializes a value to YAML and writes it atomically
pub(crate) fn save_yaml<T>(path: &Path, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized,
{
    let content = serde_yaml::to_string(value).map_err(|e| StoreError::Serialize(e.to_string()))?;
    write_atomic(path, &content)
}
