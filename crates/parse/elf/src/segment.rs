//! Program header entries and segment classification.
//!
//! [`ProgramHeader`] is the full ELF record. [`SegmentEntry`] is the reduced
//! view the image codec works with: where the payload lives, how large it is,
//! and which [`SegmentKind`] its flags select.

use crate::header::{ElfError, ElfHeader};

/// Segment type code that marks a hash segment.
pub const HASH_SEGMENT_TYPE: u8 = 2;

/// Bit position of the segment type code inside `p_flags`.
const SEGMENT_TYPE_SHIFT: u32 = 24;

/// Mask applied after shifting to extract the segment type code.
const SEGMENT_TYPE_MASK: u32 = 0x7;

/// Extract the 3-bit segment type code from a `p_flags` value.
#[must_use]
#[expect(clippy::cast_possible_truncation, reason = "masked to 3 bits")]
pub fn segment_type_code(p_flags: u32) -> u8 {
    ((p_flags >> SEGMENT_TYPE_SHIFT) & SEGMENT_TYPE_MASK) as u8
}

/// Parsed program header entry, for either class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgramHeader {
    /// Segment type.
    pub p_type: u32,
    /// Segment flags. Bits 24..27 carry the segment type code.
    pub p_flags: u32,
    /// Offset of the segment data in the file.
    pub p_offset: u64,
    /// Virtual address of the segment.
    pub p_vaddr: u64,
    /// Physical address of the segment.
    pub p_paddr: u64,
    /// Size of the segment data in the file.
    pub p_filesz: u64,
    /// Size of the segment in memory.
    pub p_memsz: u64,
    /// Alignment.
    pub p_align: u64,
}

impl ProgramHeader {
    /// Parse one program header entry from `data` using the class and
    /// encoding of `header`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if `data` is shorter than the class's
    /// entry size.
    pub fn parse(header: &ElfHeader, data: &[u8]) -> Result<Self, ElfError> {
        let layout = header.layout();
        if data.len() < layout.phdr_size {
            return Err(ElfError::Truncated);
        }
        let e = header.ident.endian;

        Ok(Self {
            p_type: e.u32(data, layout.p_type),
            p_flags: e.u32(data, layout.p_flags),
            p_offset: layout.word(e, data, layout.p_offset),
            p_vaddr: layout.word(e, data, layout.p_vaddr),
            p_paddr: layout.word(e, data, layout.p_paddr),
            p_filesz: layout.word(e, data, layout.p_filesz),
            p_memsz: layout.word(e, data, layout.p_memsz),
            p_align: layout.word(e, data, layout.p_align),
        })
    }

    /// Serialize this entry into the start of `out` using the class and
    /// encoding of `header`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if `out` is shorter than the class's
    /// entry size.
    pub fn encode_into(&self, header: &ElfHeader, out: &mut [u8]) -> Result<(), ElfError> {
        let layout = header.layout();
        let Some(out) = out.get_mut(..layout.phdr_size) else {
            return Err(ElfError::Truncated);
        };
        let e = header.ident.endian;

        e.put_u32(out, layout.p_type, self.p_type);
        e.put_u32(out, layout.p_flags, self.p_flags);
        layout.put_word(e, out, layout.p_offset, self.p_offset);
        layout.put_word(e, out, layout.p_vaddr, self.p_vaddr);
        layout.put_word(e, out, layout.p_paddr, self.p_paddr);
        layout.put_word(e, out, layout.p_filesz, self.p_filesz);
        layout.put_word(e, out, layout.p_memsz, self.p_memsz);
        layout.put_word(e, out, layout.p_align, self.p_align);
        Ok(())
    }

    /// Reduce this entry to the codec's view of segment `index`.
    #[must_use]
    pub fn entry(&self, index: usize) -> SegmentEntry {
        SegmentEntry {
            index,
            offset: self.p_offset,
            size: self.p_filesz,
            type_code: segment_type_code(self.p_flags),
        }
    }
}

/// How a segment's payload is carried in the split representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Type code 2: payload is relocated into the metadata stream.
    Hash,
    /// Any other type code: payload lives in its blob file.
    Ordinary,
}

impl SegmentKind {
    /// Classify a 3-bit segment type code.
    #[must_use]
    pub fn classify(type_code: u8) -> Self {
        if type_code == HASH_SEGMENT_TYPE {
            Self::Hash
        } else {
            Self::Ordinary
        }
    }
}

/// One program header entry as seen by the image codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentEntry {
    /// Position in the program header table.
    pub index: usize,
    /// File offset of the payload in the monolithic image.
    pub offset: u64,
    /// Size of the payload in the file.
    pub size: u64,
    /// 3-bit segment type code from the flags.
    pub type_code: u8,
}

impl SegmentEntry {
    /// Classification of this segment.
    #[must_use]
    pub fn kind(&self) -> SegmentKind {
        SegmentKind::classify(self.type_code)
    }

    /// Whether the segment carries no file data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Whether the splitter copies this payload into the metadata stream.
    ///
    /// Hash segments always do. Segment 0 does regardless of its type, since
    /// it normally holds the headers the loader needs first.
    #[must_use]
    pub fn travels_with_metadata(&self) -> bool {
        self.index == 0 || self.kind() == SegmentKind::Hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ElfClass;
    use crate::header::tests::make_header;

    fn sample_phdr() -> ProgramHeader {
        ProgramHeader {
            p_type: 1,
            p_flags: 0x0200_0000 | 4,
            p_offset: 0x1000,
            p_vaddr: 0x8b00_0000,
            p_paddr: 0x8b00_0000,
            p_filesz: 0x1a8,
            p_memsz: 0x1000,
            p_align: 0x1000,
        }
    }

    #[test]
    fn type_code_extraction() {
        assert_eq!(segment_type_code(0), 0);
        assert_eq!(segment_type_code(0x0200_0000), 2);
        // only three bits survive
        assert_eq!(segment_type_code(0xff00_0000), 7);
        assert_eq!(segment_type_code(0x0a00_0000), 2);
        assert_eq!(segment_type_code(0x00ff_ffff), 0);
    }

    #[test]
    fn classify_kinds() {
        assert_eq!(SegmentKind::classify(2), SegmentKind::Hash);
        for code in [0, 1, 3, 4, 5, 6, 7] {
            assert_eq!(SegmentKind::classify(code), SegmentKind::Ordinary);
        }
    }

    #[test]
    fn elf32_entry_layout() {
        let hdr = make_header(ElfClass::Elf32, 1);
        let mut buf = [0u8; 32];
        sample_phdr().encode_into(&hdr, &mut buf).expect("fits");

        // p_offset at 4, p_filesz at 16, p_flags at 24
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 0x1000);
        assert_eq!(u32::from_le_bytes(buf[16..20].try_into().unwrap()), 0x1a8);
        assert_eq!(u32::from_le_bytes(buf[24..28].try_into().unwrap()), 0x0200_0004);

        let parsed = ProgramHeader::parse(&hdr, &buf).expect("valid entry");
        assert_eq!(parsed, sample_phdr());
    }

    #[test]
    fn elf64_entry_layout() {
        let hdr = make_header(ElfClass::Elf64, 1);
        let mut buf = [0u8; 56];
        sample_phdr().encode_into(&hdr, &mut buf).expect("fits");

        // p_flags at 4, p_offset at 8, p_filesz at 32
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 0x0200_0004);
        assert_eq!(u64::from_le_bytes(buf[8..16].try_into().unwrap()), 0x1000);
        assert_eq!(u64::from_le_bytes(buf[32..40].try_into().unwrap()), 0x1a8);

        let parsed = ProgramHeader::parse(&hdr, &buf).expect("valid entry");
        assert_eq!(parsed, sample_phdr());
    }

    #[test]
    fn reject_short_entry() {
        let hdr = make_header(ElfClass::Elf64, 1);
        assert_eq!(ProgramHeader::parse(&hdr, &[0u8; 32]), Err(ElfError::Truncated));

        let mut out = [0u8; 40];
        assert_eq!(
            sample_phdr().encode_into(&hdr, &mut out),
            Err(ElfError::Truncated)
        );
    }

    #[test]
    fn entry_view() {
        let entry = sample_phdr().entry(3);
        assert_eq!(entry.index, 3);
        assert_eq!(entry.offset, 0x1000);
        assert_eq!(entry.size, 0x1a8);
        assert_eq!(entry.kind(), SegmentKind::Hash);
        assert!(entry.travels_with_metadata());
        assert!(!entry.is_empty());
    }

    #[test]
    fn segment_zero_always_travels() {
        let phdr = ProgramHeader {
            p_flags: 0x0700_0000,
            p_filesz: 0x34,
            ..ProgramHeader::default()
        };
        assert_eq!(phdr.entry(0).kind(), SegmentKind::Ordinary);
        assert!(phdr.entry(0).travels_with_metadata());
        assert!(!phdr.entry(1).travels_with_metadata());
    }
}
