//! Monolithic image -> metadata container + blobs.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use crate::blob::{BlobDir, BlobStore};
use crate::error::{Error, Result};
use crate::image::{Image, write_at};
use crate::layout::StreamLayout;
use crate::naming::MdtPath;
use crate::report::{SplitRecord, SplitReport, Warning};

/// Split the image at `image_path` into `mdt_path` and its `.bNN` blobs.
///
/// The metadata path is validated before anything is opened, and the image
/// header before the metadata file is created.
///
/// # Errors
///
/// Any [`Error`]; see [`split`].
pub fn split_file(image_path: &Path, mdt_path: &Path) -> Result<SplitReport> {
    let mdt_path = MdtPath::new(mdt_path)?;

    let source = File::open(image_path).map_err(Error::open(image_path))?;
    let mut image = Image::parse(source)?;

    let mut mdt = File::create(mdt_path.path()).map_err(Error::open(mdt_path.path()))?;
    let mut blobs = BlobDir::new(mdt_path);
    split(&mut image, &mut mdt, &mut blobs)
}

/// Split `image` into the metadata container `mdt` and `blobs`.
///
/// The header and every program header entry are copied verbatim to their
/// original offsets. Each non-empty segment is stored as a blob; segment 0
/// and hash segments are also appended to the metadata stream. A segment
/// that ends past the end of the image is kept as far as it goes and
/// reported as [`Warning::ShortRead`].
///
/// # Errors
///
/// [`Error::Elf`] for a malformed table, [`Error::Io`] when reading or
/// writing fails, and whatever the blob store reports.
pub fn split<R, W, B>(image: &mut Image<R>, mdt: &mut W, blobs: &mut B) -> Result<SplitReport>
where
    R: Read + Seek,
    W: Write + Seek,
    B: BlobStore,
{
    let header = *image.header();
    let entries = header.phdr_count();

    write_at(mdt, 0, image.raw_header()).map_err(Error::io("writing ELF header"))?;

    let first = if entries > 0 {
        Some(image.entry(0)?.phdr.entry(0))
    } else {
        None
    };
    let layout = StreamLayout::new(&header, first.as_ref())?;

    let mut warnings: Vec<Warning> = Warning::check_layout(&layout, first.as_ref())
        .into_iter()
        .collect();
    let mut segments = Vec::new();
    let mut stream_end = layout.origin;

    for index in 0..entries {
        let raw = image.entry(index)?;
        write_at(mdt, raw.location, &raw.bytes)
            .map_err(Error::io(format!("writing program header {index}")))?;

        let entry = raw.phdr.entry(index);
        if entry.is_empty() {
            continue;
        }

        let payload = image.read_at(entry.offset, entry.size)?;
        let copied = payload.len() as u64;
        if copied != entry.size {
            warnings.push(Warning::ShortRead {
                index,
                expected: entry.size,
                got: copied,
            });
        }

        blobs.store(index, &payload)?;

        let inline = entry.travels_with_metadata();
        if inline {
            write_at(mdt, stream_end, &payload)
                .map_err(Error::io(format!("appending segment {index} to metadata")))?;
            stream_end += copied;
        }

        segments.push(SplitRecord {
            entry,
            copied,
            inline,
            blob: blobs.name(index),
        });
    }

    mdt.flush().map_err(Error::io("flushing metadata"))?;

    Ok(SplitReport {
        class: header.class(),
        entries,
        layout,
        segments,
        warnings,
    })
}
