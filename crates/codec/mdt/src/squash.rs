//! Metadata container + blobs -> monolithic image.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use crate::blob::{BlobDir, BlobStore};
use crate::error::{Error, Result};
use crate::image::{Image, write_at};
use crate::layout::StreamLayout;
use crate::naming::MdtPath;
use crate::payload::{PayloadSource, Payloads};
use crate::report::{SquashRecord, SquashReport, Warning};

/// Rebuild the monolithic image at `image_path` from `mdt_path` and the
/// `.bNN` blobs beside it.
///
/// The metadata header is validated before the output is created. An
/// existing output file is truncated.
///
/// # Errors
///
/// Any [`Error`]; see [`squash`].
pub fn squash_file(image_path: &Path, mdt_path: &Path) -> Result<SquashReport> {
    let mdt_path = MdtPath::new(mdt_path)?;

    let source = File::open(mdt_path.path()).map_err(Error::open(mdt_path.path()))?;
    let mut mdt = Image::parse(source)?;

    let mut output = File::create(image_path).map_err(Error::open(image_path))?;
    let mut blobs = BlobDir::new(mdt_path);
    squash(&mut mdt, &mut output, &mut blobs)
}

/// Rebuild a monolithic image from the metadata container `mdt` and
/// `blobs`, writing it to `output`.
///
/// The header and table are copied verbatim. Each non-empty segment is
/// written at its original file offset, taken from the metadata stream for
/// hash segments and from its blob otherwise (see [`Payloads::resolve`]).
///
/// # Errors
///
/// [`Error::CorruptMetadata`] if the stream holds part of a hash segment,
/// [`Error::Open`] for a missing blob, [`Error::Elf`] for a malformed
/// table and [`Error::Io`] when reading or writing fails. Output written
/// before the failure is left in place.
pub fn squash<R, W, B>(mdt: &mut Image<R>, output: &mut W, blobs: &mut B) -> Result<SquashReport>
where
    R: Read + Seek,
    W: Write + Seek,
    B: BlobStore,
{
    let header = *mdt.header();
    let entries = header.phdr_count();

    write_at(output, 0, mdt.raw_header()).map_err(Error::io("writing ELF header"))?;

    let first = if entries > 0 {
        Some(mdt.entry(0)?.phdr.entry(0))
    } else {
        None
    };
    let layout = StreamLayout::new(&header, first.as_ref())?;

    let mut warnings: Vec<Warning> = Warning::check_layout(&layout, first.as_ref())
        .into_iter()
        .collect();
    let mut segments = Vec::new();

    let mut tables = Vec::with_capacity(entries);
    for index in 0..entries {
        tables.push(mdt.entry(index)?);
    }
    let mdt_len = mdt.data_len()?;

    let mut payloads = Payloads::new(mdt, blobs, &layout);
    for (index, raw) in tables.into_iter().enumerate() {
        write_at(output, raw.location, &raw.bytes)
            .map_err(Error::io(format!("writing program header {index}")))?;

        let entry = raw.phdr.entry(index);
        if entry.is_empty() {
            continue;
        }

        let (payload, source) = payloads.resolve(&entry)?;
        let copied = payload.len() as u64;
        if source == PayloadSource::Blob && copied != entry.size {
            warnings.push(Warning::ShortBlob {
                index,
                blob: payloads.blob_name(index),
                expected: entry.size,
                got: copied,
            });
        }

        write_at(output, entry.offset, &payload)
            .map_err(Error::io(format!("writing segment {index}")))?;

        segments.push(SquashRecord {
            entry,
            copied,
            source,
        });
    }

    let stream_end = payloads.cursor();
    if mdt_len > stream_end {
        warnings.push(Warning::TrailingMetadata {
            offset: stream_end,
            len: mdt_len - stream_end,
        });
    }

    output.flush().map_err(Error::io("flushing output image"))?;

    Ok(SquashReport {
        class: header.class(),
        entries,
        layout,
        segments,
        warnings,
    })
}
