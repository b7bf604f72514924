//! What a split or squash did, for the caller to log.

use std::fmt;

use pil_elf::{ElfClass, SegmentEntry};

use crate::layout::StreamLayout;
use crate::payload::PayloadSource;

/// A recoverable condition observed while processing an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The source image ended before a segment's declared size.
    ShortRead {
        /// Program header index.
        index: usize,
        /// Declared segment size.
        expected: u64,
        /// Bytes actually read.
        got: u64,
    },
    /// A blob file holds fewer bytes than its segment declares.
    ShortBlob {
        /// Program header index.
        index: usize,
        /// Blob name.
        blob: String,
        /// Declared segment size.
        expected: u64,
        /// Bytes actually read.
        got: u64,
    },
    /// Segment 0 does not cover the headers, so loaders that locate hash data
    /// by segment 0's size will look in the wrong place.
    UnconventionalLayout {
        /// Where this codec places the first hash payload.
        hash_start: u64,
        /// Where a conventional loader expects it.
        legacy_hash_start: u64,
    },
    /// The metadata container holds bytes past the last stream payload.
    TrailingMetadata {
        /// Offset of the first unexpected byte.
        offset: u64,
        /// Number of unexpected bytes.
        len: u64,
    },
}

impl Warning {
    pub(crate) fn check_layout(layout: &StreamLayout, first: Option<&SegmentEntry>) -> Option<Self> {
        (first.is_some() && !layout.is_conventional()).then_some(Self::UnconventionalLayout {
            hash_start: layout.hash_start,
            legacy_hash_start: layout.legacy_hash_start,
        })
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortRead {
                index,
                expected,
                got,
            } => write!(f, "segment {index} is truncated ({got} of {expected} bytes)"),
            Self::ShortBlob {
                index,
                blob,
                expected,
                got,
            } => write!(
                f,
                "blob {blob} for segment {index} is short ({got} of {expected} bytes)"
            ),
            Self::UnconventionalLayout {
                hash_start,
                legacy_hash_start,
            } => write!(
                f,
                "segment 0 does not cover the ELF headers; hash data starts at \
                 {hash_start:#x}, loaders expect {legacy_hash_start:#x}"
            ),
            Self::TrailingMetadata { offset, len } => {
                write!(f, "{len} unexpected bytes at end of metadata (offset {offset:#x})")
            }
        }
    }
}

/// One non-empty segment handled by the splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRecord {
    /// The program header entry.
    pub entry: SegmentEntry,
    /// Bytes copied from the source image.
    pub copied: u64,
    /// Whether the payload was also appended to the metadata stream.
    pub inline: bool,
    /// Name of the blob the payload was stored in.
    pub blob: String,
}

/// Outcome of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    /// Class of the source image.
    pub class: ElfClass,
    /// Number of program header entries, including empty ones.
    pub entries: usize,
    /// Placement of the metadata stream.
    pub layout: StreamLayout,
    /// Non-empty segments in table order.
    pub segments: Vec<SplitRecord>,
    /// Recoverable problems, in the order they were seen.
    pub warnings: Vec<Warning>,
}

/// One non-empty segment handled by the squasher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashRecord {
    /// The program header entry.
    pub entry: SegmentEntry,
    /// Bytes written to the output image.
    pub copied: u64,
    /// Where the payload came from.
    pub source: PayloadSource,
}

/// Outcome of a squash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashReport {
    /// Class of the metadata container.
    pub class: ElfClass,
    /// Number of program header entries, including empty ones.
    pub entries: usize,
    /// Placement of the metadata stream.
    pub layout: StreamLayout,
    /// Non-empty segments in table order.
    pub segments: Vec<SquashRecord>,
    /// Recoverable problems, in the order they were seen.
    pub warnings: Vec<Warning>,
}
