//! Ownership of the temp files a reduction creates.
//!
//! Every resized image lands in a fresh temp file. A file produced in one
//! round is superseded when the next round resizes it again, and the old
//! copy is deleted then. Whatever is still owned when the guard is dropped
//! without [`ScratchFiles::release`] (an error path) is deleted too.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

use crate::error::{Result, ShrinkError};

/// Random characters inserted between the original stem and extension.
const RAND_BYTES: usize = 6;

/// Tracks temp files created during one reduction.
#[derive(Debug)]
pub struct ScratchFiles {
    dir: PathBuf,
    owned: HashSet<PathBuf>,
    keep: bool,
}

impl ScratchFiles {
    /// Guard creating files in `dir`. With `keep`, nothing is ever deleted.
    pub fn new(dir: impl Into<PathBuf>, keep: bool) -> Self {
        Self {
            dir: dir.into(),
            owned: HashSet::new(),
            keep,
        }
    }

    /// Atomically create an empty, uniquely named file for `original`.
    ///
    /// The name keeps the original stem and extension
    /// (`photo.jpg` → `photo-a1B2c3.jpg`). The file is removed on drop
    /// unless handed to [`ScratchFiles::adopt`].
    pub fn create_for(&self, original: &Path) -> Result<NamedTempFile> {
        let stem = original
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "attachment".to_string());
        let suffix = original
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(&suffix)
            .rand_bytes(RAND_BYTES)
            .tempfile_in(&self.dir)
            .map_err(|e| ShrinkError::io(&self.dir, e))
    }

    /// Keep a finished temp file on disk and take ownership of its path.
    pub fn adopt(&mut self, file: NamedTempFile) -> Result<PathBuf> {
        let (_, path) = file
            .keep()
            .map_err(|e| ShrinkError::io(e.file.path(), e.error))?;
        self.owned.insert(path.clone());
        Ok(path)
    }

    /// `true` if `path` was created by this guard and is still owned.
    pub fn owns(&self, path: &Path) -> bool {
        self.owned.contains(path)
    }

    /// A later round replaced `path`. Delete it if this guard created it.
    ///
    /// Paths not created here (the caller's originals) are never touched.
    pub fn supersede(&mut self, path: &Path) {
        if !self.owned.remove(path) {
            return;
        }
        if self.keep {
            debug!(path = %path.display(), "Keeping superseded intermediate");
            return;
        }
        remove_quietly(path);
    }

    /// Hand the files in `outputs` over to the caller and delete anything
    /// else still owned.
    pub fn release<'a>(mut self, outputs: impl IntoIterator<Item = &'a PathBuf>) {
        for path in outputs {
            self.owned.remove(path);
        }
        // Drop removes the remainder.
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        for path in self.owned.drain() {
            remove_quietly(&path);
        }
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed intermediate"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove intermediate"),
    }
}
