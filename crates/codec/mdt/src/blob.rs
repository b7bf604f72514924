//! Per-segment blob storage.
//!
//! The splitter stores every non-empty segment as a blob and the squasher
//! loads ordinary segments back from them. [`BlobDir`] keeps blobs as
//! `.bNN` files next to the metadata file.

use std::fs::File;
use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::naming::MdtPath;

/// Storage for segment payloads keyed by program header index.
pub trait BlobStore {
    /// Human-readable name of the blob for `index`.
    fn name(&self, index: usize) -> String;

    /// Replace the blob for `index` with `payload`.
    ///
    /// # Errors
    ///
    /// Fails if the blob cannot be created or written.
    fn store(&mut self, index: usize, payload: &[u8]) -> Result<()>;

    /// Read up to `max` bytes of the blob for `index`.
    ///
    /// # Errors
    ///
    /// Fails if the blob does not exist or cannot be read.
    fn load(&mut self, index: usize, max: u64) -> Result<Vec<u8>>;
}

/// Blob files beside a metadata file, named by [`MdtPath::blob_path`].
#[derive(Debug, Clone)]
pub struct BlobDir {
    mdt: MdtPath,
}

impl BlobDir {
    /// Blobs derived from `mdt`.
    #[must_use]
    pub fn new(mdt: MdtPath) -> Self {
        Self { mdt }
    }
}

impl BlobStore for BlobDir {
    fn name(&self, index: usize) -> String {
        self.mdt.blob_path(index).display().to_string()
    }

    fn store(&mut self, index: usize, payload: &[u8]) -> Result<()> {
        let path = self.mdt.blob_path(index);
        let mut file = File::create(&path).map_err(Error::open(&path))?;
        file.write_all(payload)
            .map_err(Error::io(format!("writing {}", path.display())))
    }

    fn load(&mut self, index: usize, max: u64) -> Result<Vec<u8>> {
        let path = self.mdt.blob_path(index);
        let file = File::open(&path).map_err(Error::open(&path))?;
        let mut payload = Vec::new();
        file.take(max)
            .read_to_end(&mut payload)
            .map_err(Error::io(format!("reading {}", path.display())))?;
        Ok(payload)
    }
}

/// In-memory blobs for exercising the codec without touching the disk.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryBlobs {
    pub(crate) blobs: std::collections::BTreeMap<usize, Vec<u8>>,
}

#[cfg(test)]
impl BlobStore for MemoryBlobs {
    fn name(&self, index: usize) -> String {
        format!("b{index:02}")
    }

    fn store(&mut self, index: usize, payload: &[u8]) -> Result<()> {
        self.blobs.insert(index, payload.to_vec());
        Ok(())
    }

    fn load(&mut self, index: usize, max: u64) -> Result<Vec<u8>> {
        let Some(blob) = self.blobs.get(&index) else {
            return Err(Error::Open {
                path: self.name(index).into(),
                source: std::io::ErrorKind::NotFound.into(),
            });
        };
        let end = blob.len().min(usize::try_from(max).unwrap_or(usize::MAX));
        Ok(blob[..end].to_vec())
    }
}
