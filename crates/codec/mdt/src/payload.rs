//! Payload sources for reassembly.
//!
//! A segment's bytes come either from the metadata stream (hash segments) or
//! from its blob. [`Payloads::resolve`] is the single place that picks one:
//!
//! 1. Hash segment: read `size` bytes at the hash cursor, then advance the
//!    cursor by `size` whatever the outcome. A full read wins. A read that
//!    returns nothing means the stream does not carry this segment, so the
//!    blob is used. A partial read is corrupt metadata.
//! 2. Segment 0 with the hash type: same rule, but read at the stream origin.
//!    Its copy sits in front of the hash payloads, so the cursor stays put.
//! 3. Everything else: the blob.

use std::fmt;
use std::io::{Read, Seek};

use pil_elf::{SegmentEntry, SegmentKind};

use crate::blob::BlobStore;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::layout::StreamLayout;

/// Where a reassembled payload was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// The hash-payload stream inside the metadata container.
    MetadataStream,
    /// The segment's blob file.
    Blob,
}

impl fmt::Display for PayloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetadataStream => write!(f, "mdt"),
            Self::Blob => write!(f, "blob"),
        }
    }
}

/// Resolves segment payloads against a metadata container and its blobs.
pub struct Payloads<'a, R, B> {
    mdt: &'a mut Image<R>,
    blobs: &'a mut B,
    origin: u64,
    cursor: u64,
}

impl<'a, R: Read + Seek, B: BlobStore> Payloads<'a, R, B> {
    /// Start resolving with the hash cursor at `layout.hash_start`.
    pub fn new(mdt: &'a mut Image<R>, blobs: &'a mut B, layout: &StreamLayout) -> Self {
        Self {
            mdt,
            blobs,
            origin: layout.origin,
            cursor: layout.hash_start,
        }
    }

    /// Current hash cursor: the container offset of the next hash payload.
    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Name of the blob backing segment `index`, for diagnostics.
    #[must_use]
    pub fn blob_name(&self, index: usize) -> String {
        self.blobs.name(index)
    }

    /// Fetch the payload for `entry`, which must be non-empty.
    ///
    /// # Errors
    ///
    /// [`Error::CorruptMetadata`] on a partial hash read, and whatever the
    /// blob store reports for a missing or unreadable blob.
    pub fn resolve(&mut self, entry: &SegmentEntry) -> Result<(Vec<u8>, PayloadSource)> {
        if entry.kind() == SegmentKind::Hash {
            let offset = if entry.index == 0 {
                self.origin
            } else {
                let offset = self.cursor;
                self.cursor = offset.saturating_add(entry.size);
                offset
            };
            if let Some(payload) = self.read_stream(entry, offset)? {
                return Ok((payload, PayloadSource::MetadataStream));
            }
        }

        let payload = self.blobs.load(entry.index, entry.size)?;
        Ok((payload, PayloadSource::Blob))
    }

    /// Read `entry` from the stream at `offset`. `None` when the stream ends
    /// before it.
    fn read_stream(&mut self, entry: &SegmentEntry, offset: u64) -> Result<Option<Vec<u8>>> {
        let payload = self.mdt.read_at(offset, entry.size)?;
        let got = payload.len() as u64;
        if got == entry.size {
            Ok(Some(payload))
        } else if got == 0 {
            Ok(None)
        } else {
            Err(Error::CorruptMetadata {
                index: entry.index,
                offset,
                expected: entry.size,
                got,
            })
        }
    }
}
