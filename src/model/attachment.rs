//! Ordered attachment sequences.
//!
//! Position matters: the `i`-th path of a reduced set always corresponds to
//! the `i`-th path of the input, whether or not that file was resized.

use std::path::{Path, PathBuf};

use crate::error::{Result, ShrinkError};

/// An ordered list of attachment file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct AttachmentSet {
    paths: Vec<PathBuf>,
}

impl AttachmentSet {
    /// Build a set from any iterator of paths, keeping their order.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of attachments.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// `true` if there are no attachments.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Borrow the paths in order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Iterate over the paths in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    /// Consume the set, returning the owned paths.
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }

    /// Sum of the current on-disk sizes of every attachment.
    ///
    /// Fails on the first path whose metadata cannot be read.
    pub fn total_size(&self) -> Result<u64> {
        Self::total_size_of(&self.paths)
    }

    /// [`total_size`](Self::total_size) over a plain slice of paths.
    pub fn total_size_of(paths: &[PathBuf]) -> Result<u64> {
        paths.iter().try_fold(0u64, |acc, p| {
            file_size(p).map(|size| acc.saturating_add(size))
        })
    }
}

impl From<Vec<PathBuf>> for AttachmentSet {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl<'a> IntoIterator for &'a AttachmentSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Current size of a single file in bytes.
pub fn file_size(path: &Path) -> Result<u64> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| ShrinkError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_size_sums_files() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.bin");
        let b = tmp.path().join("b.bin");
        std::fs::write(&a, vec![0u8; 1500]).unwrap();
        std::fs::write(&b, vec![0u8; 500]).unwrap();

        let set = AttachmentSet::new([&a, &b]);
        assert_eq!(set.total_size().unwrap(), 2000);
        assert_eq!(set.paths(), &[a, b]);
    }

    #[test]
    fn test_total_size_empty_is_zero() {
        assert_eq!(AttachmentSet::default().total_size().unwrap(), 0);
    }

    #[test]
    fn test_total_size_missing_file_fails() {
        let set = AttachmentSet::new(["/definitely/not/here.png"]);
        let err = set.total_size().unwrap_err();
        assert!(matches!(err, ShrinkError::FileNotFound(_)));
    }
}
