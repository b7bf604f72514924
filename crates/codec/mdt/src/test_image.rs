//! Synthetic PIL images for unit tests.

use pil_elf::{ElfClass, ElfHeader, Endian, Ident, ProgramHeader};

enum Payload {
    Bytes(Vec<u8>),
    /// Covers the header and program header table, starting at offset 0.
    Headers,
}

/// Builds an image with the program header table right after the header and
/// payloads packed back to back after the table.
pub(crate) struct ImageBuilder {
    class: ElfClass,
    endian: Endian,
    segments: Vec<(u32, Payload)>,
}

impl ImageBuilder {
    pub(crate) fn new(class: ElfClass) -> Self {
        Self {
            class,
            endian: Endian::Little,
            segments: Vec::new(),
        }
    }

    pub(crate) fn big_endian(mut self) -> Self {
        self.endian = Endian::Big;
        self
    }

    /// Add a segment with `p_flags` and file contents `data`.
    pub(crate) fn segment(mut self, flags: u32, data: &[u8]) -> Self {
        self.segments.push((flags, Payload::Bytes(data.to_vec())));
        self
    }

    /// Add a segment spanning the header and table, as firmware images do
    /// for segment 0.
    pub(crate) fn headers(mut self, flags: u32) -> Self {
        self.segments.push((flags, Payload::Headers));
        self
    }

    pub(crate) fn header(&self) -> ElfHeader {
        let layout = self.class.layout();
        ElfHeader {
            ident: Ident::new(self.class, self.endian),
            e_type: 2,
            e_machine: 164,
            e_version: 1,
            e_entry: 0x8b00_0000,
            e_phoff: layout.ehdr_size as u64,
            e_shoff: 0,
            e_flags: 0x73,
            e_ehsize: u16::try_from(layout.ehdr_size).unwrap(),
            e_phentsize: u16::try_from(layout.phdr_size).unwrap(),
            e_phnum: u16::try_from(self.segments.len()).unwrap(),
            e_shentsize: 0,
            e_shnum: 0,
            e_shstrndx: 0,
        }
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let header = self.header();
        let table_end = usize::try_from(header.table_end().unwrap()).unwrap();
        let mut buf = vec![0u8; table_end];
        header.encode_into(&mut buf).unwrap();

        for (index, (flags, payload)) in self.segments.iter().enumerate() {
            let (offset, size) = match payload {
                Payload::Bytes(data) => {
                    let offset = buf.len();
                    buf.extend_from_slice(data);
                    (offset, data.len())
                }
                Payload::Headers => (0, table_end),
            };
            let phdr = ProgramHeader {
                p_type: if *flags == 0 { 0 } else { 1 },
                p_flags: *flags,
                p_offset: offset as u64,
                p_vaddr: 0x8b00_0000 + offset as u64,
                p_paddr: 0x8b00_0000 + offset as u64,
                p_filesz: size as u64,
                p_memsz: size as u64,
                p_align: 0x1000,
            };
            let at = usize::try_from(header.phdr_location(index).unwrap()).unwrap();
            phdr.encode_into(&header, &mut buf[at..]).unwrap();
        }
        buf
    }
}
