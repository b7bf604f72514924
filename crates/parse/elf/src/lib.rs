//! Minimal ELF32/ELF64 header model for PIL firmware images.
//!
//! Parses and serializes the file header and program header table from raw
//! byte slices using safe field extraction. No unsafe code, no allocations.
//! Only the magic and the class are validated; everything else is carried
//! as-is so images can be copied verbatim.
//!
//! # Usage
//!
//! ```
//! use pil_elf::{ElfHeader, ProgramHeader};
//!
//! fn list(data: &[u8]) -> Result<(), pil_elf::ElfError> {
//!     let header = ElfHeader::parse(data)?;
//!     for index in 0..header.phdr_count() {
//!         let at = usize::try_from(header.phdr_location(index)?)
//!             .map_err(|_| pil_elf::ElfError::InvalidOffset)?;
//!         let phdr = ProgramHeader::parse(&header, data.get(at..).unwrap_or_default())?;
//!         let _kind = phdr.entry(index).kind();
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

pub mod header;
pub mod segment;

pub use header::{
    EI_NIDENT, ELF_MAGIC, ELFCLASS32, ELFCLASS64, ElfClass, ElfError, ElfHeader, Endian, Ident,
    Layout,
};
pub use segment::{
    HASH_SEGMENT_TYPE, ProgramHeader, SegmentEntry, SegmentKind, segment_type_code,
};
