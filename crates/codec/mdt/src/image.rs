//! Positioned access to an ELF image on any seekable byte source.
//!
//! Both the monolithic image and the metadata container start with the same
//! header and program header table, so the splitter and the squasher read
//! them through the same [`Image`] wrapper.

use std::io::{Read, Seek, SeekFrom, Write};

use pil_elf::{EI_NIDENT, ElfHeader, Ident, ProgramHeader};

use crate::error::{Error, Result};

/// An ELF image whose header has been read and validated.
#[derive(Debug)]
pub struct Image<R> {
    reader: R,
    header: ElfHeader,
    raw_header: Vec<u8>,
}

/// One program header table entry: its raw bytes and the decoded fields.
#[derive(Debug, Clone)]
pub struct RawEntry {
    /// Absolute offset of the entry in the table.
    pub location: u64,
    /// The entry exactly as stored.
    pub bytes: Vec<u8>,
    /// Decoded entry.
    pub phdr: ProgramHeader,
}

impl<R: Read + Seek> Image<R> {
    /// Read the identification bytes, then the full class-specific header.
    ///
    /// # Errors
    ///
    /// [`Error::Elf`] if the magic or class is wrong or the header is cut
    /// short, [`Error::Io`] if reading fails.
    pub fn parse(mut reader: R) -> Result<Self> {
        let ident = read_at(&mut reader, 0, EI_NIDENT as u64)
            .map_err(Error::io("reading ELF identification"))?;
        let class = Ident::parse(&ident)?.class;

        let raw_header = read_at(&mut reader, 0, class.header_size() as u64)
            .map_err(Error::io("reading ELF header"))?;
        let header = ElfHeader::parse(&raw_header)?;

        Ok(Self {
            reader,
            header,
            raw_header,
        })
    }

    /// The decoded file header.
    #[must_use]
    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// The file header exactly as stored.
    #[must_use]
    pub fn raw_header(&self) -> &[u8] {
        &self.raw_header
    }

    /// Read program header `index` from the table.
    ///
    /// # Errors
    ///
    /// [`Error::Elf`] if the entry lies past the end of the data,
    /// [`Error::Io`] if reading fails.
    pub fn entry(&mut self, index: usize) -> Result<RawEntry> {
        let location = self.header.phdr_location(index)?;
        let size = self.header.layout().phdr_size as u64;
        let bytes = read_at(&mut self.reader, location, size)
            .map_err(Error::io(format!("reading program header {index}")))?;
        let phdr = ProgramHeader::parse(&self.header, &bytes)?;

        Ok(RawEntry {
            location,
            bytes,
            phdr,
        })
    }

    /// Read up to `len` bytes at `offset`. Fewer bytes come back when the
    /// data ends early.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if seeking or reading fails.
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        read_at(&mut self.reader, offset, len)
            .map_err(Error::io(format!("reading {len} bytes at offset {offset:#x}")))
    }

    /// Total length of the underlying data.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if seeking fails.
    pub fn data_len(&mut self) -> Result<u64> {
        self.reader
            .seek(SeekFrom::End(0))
            .map_err(Error::io("measuring image length"))
    }
}

/// Read up to `len` bytes starting at `offset`.
///
/// Stops early at end of data instead of failing, so callers can detect
/// truncation by comparing lengths.
pub(crate) fn read_at<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    len: u64,
) -> std::io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::new();
    reader.take(len).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Write all of `data` at `offset`, extending the destination if needed.
pub(crate) fn write_at<W: Write + Seek>(
    writer: &mut W,
    offset: u64,
    data: &[u8],
) -> std::io::Result<()> {
    writer.seek(SeekFrom::Start(offset))?;
    writer.write_all(data)
}
