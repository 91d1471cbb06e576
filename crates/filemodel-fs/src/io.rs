//! Crash-safe writes of model files
//!
//! A model file is staged next to its target, locked, synced and renamed into
//! place. A staged file that never reaches its target is removed again, so a
//! failed save leaves the previous content and no stray temp files behind.

use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// What a write did to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The file already held exactly these bytes and was left untouched
    Unchanged,
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            tracing::debug!(dir = %parent.display(), "Creating missing directory");
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }
    Ok(())
}

/// Replace `path` with `content` unless the file already holds those bytes.
///
/// Saving an unmodified tree therefore leaves every file, and its
/// modification time, as it was.
pub fn write_if_changed(path: &Path, content: &[u8]) -> Result<WriteOutcome> {
    match fs::read(path) {
        Ok(existing) if existing == content => {
            tracing::trace!(path = %path.display(), "Content unchanged; skipping write");
            return Ok(WriteOutcome::Unchanged);
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(Error::io(path, e)),
    }

    write_atomic(path, content)?;
    Ok(WriteOutcome::Written)
}

/// Write `content` to `path` through a locked temp file and a rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;

    let mut staged = StagedFile::create(path)?;
    staged.write(path, content)?;
    staged.persist(path)
}

/// A temp file beside its target, deleted on drop unless persisted.
struct StagedFile {
    path: PathBuf,
    file: Option<File>,
}

impl StagedFile {
    fn create(target: &Path) -> Result<Self> {
        // Same directory as the target so the rename stays on one filesystem
        let name = format!(
            ".{}.{}.tmp",
            target
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default(),
            std::process::id()
        );
        let path = target.with_file_name(name);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    fn write(&mut self, target: &Path, content: &[u8]) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        file.lock_exclusive().map_err(|_| Error::LockFailed {
            path: target.to_path_buf(),
        })?;
        file.write_all(content).map_err(|e| Error::io(&self.path, e))?;
        file.sync_all().map_err(|e| Error::io(&self.path, e))?;
        file.unlock().map_err(|_| Error::LockFailed {
            path: target.to_path_buf(),
        })
    }

    fn persist(mut self, target: &Path) -> Result<()> {
        // The handle has to be closed before renaming on Windows
        drop(self.file.take());
        fs::rename(&self.path, target).map_err(|e| Error::io(target, e))?;
        self.path = PathBuf::new();
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if !self.path.as_os_str().is_empty() {
            let _ = fs::remove_file(&self.path);
        }
    }
}
