//! Placement of the metadata stream inside the `.mdt` container.
//!
//! The container holds the header and program header table at their
//! original offsets, followed by a stream of payloads: segment 0 first, then
//! every hash segment in table order.
//!
//! Firmware images normally describe their headers with segment 0 (file
//! offset 0, covering at least the header and table). Loaders rely on that
//! and start reading hash data at segment 0's file size. When an image
//! follows the convention the stream starts at offset 0 and segment 0's
//! bytes coincide with the header region. Otherwise the stream starts right
//! after the table, and the result is flagged as unconventional.

use pil_elf::{ElfHeader, SegmentEntry};

use crate::error::Result;

/// Where the metadata stream and its hash payloads live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLayout {
    /// End of the header and program header table.
    pub table_end: u64,
    /// Container offset of the first stream byte (segment 0's copy).
    pub origin: u64,
    /// Container offset of the first hash payload.
    pub hash_start: u64,
    /// Offset a conventional loader would start reading hash data at.
    pub legacy_hash_start: u64,
}

impl StreamLayout {
    /// Compute the layout from the header and the first table entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Elf`](crate::Error::Elf) if the table end overflows.
    pub fn new(header: &ElfHeader, first: Option<&SegmentEntry>) -> Result<Self> {
        let table_end = header.table_end()?;
        let first_size = first.map_or(0, |entry| entry.size);

        let covers_headers =
            first.is_some_and(|entry| entry.offset == 0 && entry.size >= table_end);
        let origin = if covers_headers { 0 } else { table_end };

        Ok(Self {
            table_end,
            origin,
            hash_start: origin.saturating_add(first_size),
            legacy_hash_start: first_size,
        })
    }

    /// Whether segment 0 overlays the header region, as loaders expect.
    #[must_use]
    pub fn is_conventional(&self) -> bool {
        self.hash_start == self.legacy_hash_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pil_elf::ElfClass;

    use crate::test_image::ImageBuilder;

    fn entry(offset: u64, size: u64) -> SegmentEntry {
        SegmentEntry {
            index: 0,
            offset,
            size,
            type_code: 0,
        }
    }

    #[test]
    fn header_segment_overlays_headers() {
        let header = ImageBuilder::new(ElfClass::Elf32)
            .headers(0)
            .segment(2 << 24, b"hash")
            .header();
        let table_end = 52 + 2 * 32;

        let layout = StreamLayout::new(&header, Some(&entry(0, table_end))).unwrap();
        assert_eq!(layout.table_end, table_end);
        assert_eq!(layout.origin, 0);
        assert_eq!(layout.hash_start, table_end);
        assert!(layout.is_conventional());
    }

    #[test]
    fn oversized_header_segment_is_conventional() {
        let header = ImageBuilder::new(ElfClass::Elf64).headers(0).header();
        let layout = StreamLayout::new(&header, Some(&entry(0, 0x1000))).unwrap();
        assert_eq!(layout.origin, 0);
        assert_eq!(layout.hash_start, 0x1000);
        assert!(layout.is_conventional());
    }

    #[test]
    fn detached_segment_zero_follows_table() {
        let header = ImageBuilder::new(ElfClass::Elf64)
            .segment(0, b"boot")
            .header();
        let table_end = 64 + 56;

        let layout = StreamLayout::new(&header, Some(&entry(table_end, 4))).unwrap();
        assert_eq!(layout.origin, table_end);
        assert_eq!(layout.hash_start, table_end + 4);
        assert_eq!(layout.legacy_hash_start, 4);
        assert!(!layout.is_conventional());
    }

    #[test]
    fn short_header_segment_is_not_trusted() {
        let header = ImageBuilder::new(ElfClass::Elf32)
            .headers(0)
            .segment(0, b"x")
            .header();
        // covers the ELF header but not the table
        let layout = StreamLayout::new(&header, Some(&entry(0, 52))).unwrap();
        assert_eq!(layout.origin, 52 + 64);
        assert!(!layout.is_conventional());
    }

    #[test]
    fn empty_table() {
        let header = ImageBuilder::new(ElfClass::Elf32).header();
        let layout = StreamLayout::new(&header, None).unwrap();
        assert_eq!(layout.origin, 52);
        assert_eq!(layout.hash_start, 52);
        assert_eq!(layout.legacy_hash_start, 0);
    }
}
