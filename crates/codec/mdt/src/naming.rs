//! Metadata and blob file naming.
//!
//! A metadata path must contain `.mdt` in its file name. Blob names reuse
//! everything before the marker and replace the rest with `.bNN`, where `NN`
//! is the program header index zero-padded to two digits.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Marker that identifies a metadata file name.
pub const MDT_MARKER: &str = ".mdt";

/// A validated metadata path and the blob names derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdtPath {
    path: PathBuf,
    prefix: String,
}

impl MdtPath {
    /// Validate `path` as a metadata path.
    ///
    /// Only the file name is searched, so a directory called `x.mdt` does not
    /// count. The first occurrence of the marker wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotMdtPath`] if the file name lacks the marker or is
    /// not valid UTF-8.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let prefix = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.find(MDT_MARKER).map(|at| name[..at].to_owned()));

        match prefix {
            Some(prefix) => Ok(Self { path, prefix }),
            None => Err(Error::NotMdtPath { path }),
        }
    }

    /// The metadata file path as given.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the blob file for program header `index`.
    #[must_use]
    pub fn blob_path(&self, index: usize) -> PathBuf {
        self.path.with_file_name(blob_name(&self.prefix, index))
    }
}

/// File name of the blob for `index` given the part before `.mdt`.
fn blob_name(prefix: &str, index: usize) -> String {
    format!("{prefix}.b{index:02}")
}
