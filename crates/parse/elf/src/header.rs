//! ELF32/ELF64 file header parsing and serialization.
//!
//! The identification bytes select an [`ElfClass`] and an [`Endian`] once;
//! every later field access goes through the class's [`Layout`] table so
//! callers never branch on the class themselves.

use core::fmt;

/// ELF magic bytes: `\x7fELF`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Size of the `e_ident` array.
pub const EI_NIDENT: usize = 16;

/// Offset of the class byte within `e_ident`.
const EI_CLASS: usize = 4;

/// Offset of the data-encoding byte within `e_ident`.
const EI_DATA: usize = 5;

/// ELF class: 32-bit.
pub const ELFCLASS32: u8 = 1;

/// ELF class: 64-bit.
pub const ELFCLASS64: u8 = 2;

/// ELF data encoding: little-endian.
pub const ELFDATA2LSB: u8 = 1;

/// ELF data encoding: big-endian.
pub const ELFDATA2MSB: u8 = 2;

/// Errors that can occur when parsing an ELF header or program header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfError {
    /// The data does not start with the ELF magic bytes.
    BadMagic,
    /// The class byte is neither `ELFCLASS32` nor `ELFCLASS64`.
    UnsupportedClass(u8),
    /// The input data is too short for the declared structure.
    Truncated,
    /// A table offset or size overflows the address space.
    InvalidOffset,
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "not an ELF file (bad magic)"),
            Self::UnsupportedClass(class) => write!(f, "unsupported ELF class {class}"),
            Self::Truncated => write!(f, "input data truncated"),
            Self::InvalidOffset => write!(f, "invalid header offset or size"),
        }
    }
}

impl core::error::Error for ElfError {}

/// ELF file class, chosen by `e_ident[EI_CLASS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfClass {
    /// `ELFCLASS32`: 52-byte header, 32-byte program headers.
    Elf32,
    /// `ELFCLASS64`: 64-byte header, 56-byte program headers.
    Elf64,
}

impl ElfClass {
    /// Returns the field layout table for this class.
    #[must_use]
    pub fn layout(self) -> &'static Layout {
        match self {
            Self::Elf32 => &ELF32_LAYOUT,
            Self::Elf64 => &ELF64_LAYOUT,
        }
    }

    /// Size of the file header for this class.
    #[must_use]
    pub fn header_size(self) -> usize {
        self.layout().ehdr_size
    }

    /// Size of one program header entry for this class.
    #[must_use]
    pub fn phdr_size(self) -> usize {
        self.layout().phdr_size
    }

    /// The `e_ident[EI_CLASS]` byte for this class.
    #[must_use]
    pub fn ident_byte(self) -> u8 {
        match self {
            Self::Elf32 => ELFCLASS32,
            Self::Elf64 => ELFCLASS64,
        }
    }
}

impl fmt::Display for ElfClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elf32 => write!(f, "ELF32"),
            Self::Elf64 => write!(f, "ELF64"),
        }
    }
}

/// Byte order of multi-byte fields, chosen by `e_ident[EI_DATA]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// `ELFDATA2LSB`.
    Little,
    /// `ELFDATA2MSB`.
    Big,
}

impl Endian {
    /// Read a `u16` from `data` at byte offset `off`.
    ///
    /// # Panics
    ///
    /// Panics if `off + 2 > data.len()`. Callers must bounds-check first.
    pub(crate) fn u16(self, data: &[u8], off: usize) -> u16 {
        let bytes = *data[off..].first_chunk().unwrap();
        match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        }
    }

    /// Read a `u32` from `data` at byte offset `off`.
    pub(crate) fn u32(self, data: &[u8], off: usize) -> u32 {
        let bytes = *data[off..].first_chunk().unwrap();
        match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        }
    }

    /// Read a `u64` from `data` at byte offset `off`.
    pub(crate) fn u64(self, data: &[u8], off: usize) -> u64 {
        let bytes = *data[off..].first_chunk().unwrap();
        match self {
            Self::Little => u64::from_le_bytes(bytes),
            Self::Big => u64::from_be_bytes(bytes),
        }
    }

    pub(crate) fn put_u16(self, data: &mut [u8], off: usize, value: u16) {
        let bytes = match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        };
        data[off..off + 2].copy_from_slice(&bytes);
    }

    pub(crate) fn put_u32(self, data: &mut [u8], off: usize, value: u32) {
        let bytes = match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        };
        data[off..off + 4].copy_from_slice(&bytes);
    }

    pub(crate) fn put_u64(self, data: &mut [u8], off: usize, value: u64) {
        let bytes = match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        };
        data[off..off + 8].copy_from_slice(&bytes);
    }
}

/// A native-word field: 4 bytes in ELF32, 8 bytes in ELF64.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Word(pub(crate) usize);

/// Class-specific sizes and field offsets.
///
/// Only two instances exist, one per [`ElfClass`].
#[derive(Debug)]
pub struct Layout {
    /// Size of the file header.
    pub ehdr_size: usize,
    /// Size of one program header entry.
    pub phdr_size: usize,
    word: usize,
    pub(crate) e_entry: Word,
    pub(crate) e_phoff: Word,
    pub(crate) e_shoff: Word,
    pub(crate) e_flags: usize,
    pub(crate) e_ehsize: usize,
    pub(crate) p_type: usize,
    pub(crate) p_flags: usize,
    pub(crate) p_offset: Word,
    pub(crate) p_vaddr: Word,
    pub(crate) p_paddr: Word,
    pub(crate) p_filesz: Word,
    pub(crate) p_memsz: Word,
    pub(crate) p_align: Word,
}

static ELF32_LAYOUT: Layout = Layout {
    ehdr_size: 52,
    phdr_size: 32,
    word: 4,
    e_entry: Word(24),
    e_phoff: Word(28),
    e_shoff: Word(32),
    e_flags: 36,
    e_ehsize: 40,
    p_type: 0,
    p_offset: Word(4),
    p_vaddr: Word(8),
    p_paddr: Word(12),
    p_filesz: Word(16),
    p_memsz: Word(20),
    p_flags: 24,
    p_align: Word(28),
};

static ELF64_LAYOUT: Layout = Layout {
    ehdr_size: 64,
    phdr_size: 56,
    word: 8,
    e_entry: Word(24),
    e_phoff: Word(32),
    e_shoff: Word(40),
    e_flags: 48,
    e_ehsize: 52,
    p_type: 0,
    p_flags: 4,
    p_offset: Word(8),
    p_vaddr: Word(16),
    p_paddr: Word(24),
    p_filesz: Word(32),
    p_memsz: Word(40),
    p_align: Word(48),
};

impl Layout {
    pub(crate) fn word(&self, endian: Endian, data: &[u8], field: Word) -> u64 {
        if self.word == 4 {
            u64::from(endian.u32(data, field.0))
        } else {
            endian.u64(data, field.0)
        }
    }

    /// Store a native word. ELF32 fields keep the low 32 bits.
    #[expect(clippy::cast_possible_truncation, reason = "ELF32 words are 32 bits wide")]
    pub(crate) fn put_word(&self, endian: Endian, data: &mut [u8], field: Word, value: u64) {
        if self.word == 4 {
            endian.put_u32(data, field.0, value as u32);
        } else {
            endian.put_u64(data, field.0, value);
        }
    }
}

/// The decoded `e_ident` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
    /// File class.
    pub class: ElfClass,
    /// Data encoding.
    pub endian: Endian,
    /// Raw identification bytes, kept for serialization.
    pub bytes: [u8; EI_NIDENT],
}

impl Ident {
    /// Parse and validate the identification bytes.
    ///
    /// Only the magic and the class are validated. An encoding byte other
    /// than `ELFDATA2MSB` decodes as little-endian.
    ///
    /// # Errors
    ///
    /// [`ElfError::BadMagic`] if the magic is missing (including inputs
    /// shorter than the magic), [`ElfError::Truncated`] if fewer than
    /// [`EI_NIDENT`] bytes are available, and [`ElfError::UnsupportedClass`]
    /// for any class byte other than 1 or 2.
    pub fn parse(data: &[u8]) -> Result<Self, ElfError> {
        if data.len() < ELF_MAGIC.len() || data[..4] != ELF_MAGIC {
            return Err(ElfError::BadMagic);
        }
        let Some(bytes) = data.first_chunk::<EI_NIDENT>() else {
            return Err(ElfError::Truncated);
        };

        let class = match bytes[EI_CLASS] {
            ELFCLASS32 => ElfClass::Elf32,
            ELFCLASS64 => ElfClass::Elf64,
            other => return Err(ElfError::UnsupportedClass(other)),
        };
        let endian = if bytes[EI_DATA] == ELFDATA2MSB {
            Endian::Big
        } else {
            Endian::Little
        };

        Ok(Self {
            class,
            endian,
            bytes: *bytes,
        })
    }

    /// Build identification bytes for a fresh header (version 1, SysV ABI).
    #[must_use]
    pub fn new(class: ElfClass, endian: Endian) -> Self {
        let mut bytes = [0u8; EI_NIDENT];
        bytes[..4].copy_from_slice(&ELF_MAGIC);
        bytes[EI_CLASS] = class.ident_byte();
        bytes[EI_DATA] = match endian {
            Endian::Little => ELFDATA2LSB,
            Endian::Big => ELFDATA2MSB,
        };
        bytes[6] = 1;
        Self {
            class,
            endian,
            bytes,
        }
    }
}

/// Parsed ELF file header, for either class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    /// Identification bytes, class and encoding.
    pub ident: Ident,
    /// Object file type.
    pub e_type: u16,
    /// Target machine architecture.
    pub e_machine: u16,
    /// Object file version.
    pub e_version: u32,
    /// Entry point address.
    pub e_entry: u64,
    /// Offset of the program header table in the file.
    pub e_phoff: u64,
    /// Offset of the section header table in the file.
    pub e_shoff: u64,
    /// Processor-specific flags.
    pub e_flags: u32,
    /// Declared size of this header.
    pub e_ehsize: u16,
    /// Declared size of each program header entry.
    pub e_phentsize: u16,
    /// Number of program header entries.
    pub e_phnum: u16,
    /// Size of each section header entry.
    pub e_shentsize: u16,
    /// Number of section header entries.
    pub e_shnum: u16,
    /// Section header string table index.
    pub e_shstrndx: u16,
}

impl ElfHeader {
    /// Parse a full file header from the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns the [`Ident::parse`] errors, or [`ElfError::Truncated`] if
    /// `data` is shorter than the class-specific header size.
    pub fn parse(data: &[u8]) -> Result<Self, ElfError> {
        let ident = Ident::parse(data)?;
        let layout = ident.class.layout();
        if data.len() < layout.ehdr_size {
            return Err(ElfError::Truncated);
        }

        let e = ident.endian;
        let half = |index: usize| e.u16(data, layout.e_ehsize + 2 * index);

        Ok(Self {
            ident,
            e_type: e.u16(data, 16),
            e_machine: e.u16(data, 18),
            e_version: e.u32(data, 20),
            e_entry: layout.word(e, data, layout.e_entry),
            e_phoff: layout.word(e, data, layout.e_phoff),
            e_shoff: layout.word(e, data, layout.e_shoff),
            e_flags: e.u32(data, layout.e_flags),
            e_ehsize: half(0),
            e_phentsize: half(1),
            e_phnum: half(2),
            e_shentsize: half(3),
            e_shnum: half(4),
            e_shstrndx: half(5),
        })
    }

    /// Serialize this header into the start of `out`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if `out` is shorter than
    /// [`ElfHeader::size`].
    pub fn encode_into(&self, out: &mut [u8]) -> Result<(), ElfError> {
        let layout = self.layout();
        let Some(out) = out.get_mut(..layout.ehdr_size) else {
            return Err(ElfError::Truncated);
        };
        let e = self.ident.endian;

        out[..EI_NIDENT].copy_from_slice(&self.ident.bytes);
        e.put_u16(out, 16, self.e_type);
        e.put_u16(out, 18, self.e_machine);
        e.put_u32(out, 20, self.e_version);
        layout.put_word(e, out, layout.e_entry, self.e_entry);
        layout.put_word(e, out, layout.e_phoff, self.e_phoff);
        layout.put_word(e, out, layout.e_shoff, self.e_shoff);
        e.put_u32(out, layout.e_flags, self.e_flags);

        let halves = [
            self.e_ehsize,
            self.e_phentsize,
            self.e_phnum,
            self.e_shentsize,
            self.e_shnum,
            self.e_shstrndx,
        ];
        for (i, value) in halves.into_iter().enumerate() {
            e.put_u16(out, layout.e_ehsize + 2 * i, value);
        }
        Ok(())
    }

    /// File class of this header.
    #[must_use]
    pub fn class(&self) -> ElfClass {
        self.ident.class
    }

    /// Field layout of this header's class.
    #[must_use]
    pub fn layout(&self) -> &'static Layout {
        self.ident.class.layout()
    }

    /// Size of the header in bytes (class-dependent, not `e_ehsize`).
    #[must_use]
    pub fn size(&self) -> usize {
        self.layout().ehdr_size
    }

    /// Offset of the program header table.
    #[must_use]
    pub fn phdr_table_offset(&self) -> u64 {
        self.e_phoff
    }

    /// Number of program header entries.
    #[must_use]
    pub fn phdr_count(&self) -> usize {
        usize::from(self.e_phnum)
    }

    /// Absolute file offset of program header `index`.
    ///
    /// Entries are spaced by the class's fixed entry size; `e_phentsize` is
    /// informational only.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidOffset`] if the offset overflows.
    pub fn phdr_location(&self, index: usize) -> Result<u64, ElfError> {
        (index as u64)
            .checked_mul(self.layout().phdr_size as u64)
            .and_then(|rel| self.e_phoff.checked_add(rel))
            .ok_or(ElfError::InvalidOffset)
    }

    /// End of the region occupied by the header and the full program header
    /// table, whichever extends further.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidOffset`] if the table end overflows.
    pub fn table_end(&self) -> Result<u64, ElfError> {
        let table_end = self.phdr_location(self.phdr_count())?;
        Ok(table_end.max(self.size() as u64))
    }
}
