//! `pil info`: list the program headers of a monolithic image.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use pil_elf::{SegmentEntry, SegmentKind};
use pil_mdt::{Image, StreamLayout};
use sha2::{Digest, Sha256};

use crate::output::Console;

/// One listed program header.
pub struct EntryInfo {
    /// The program header entry.
    pub entry: SegmentEntry,
    /// SHA-256 of the bytes present in the image, `None` for empty entries.
    pub digest: Option<String>,
    /// Bytes actually present, which is less than the size when truncated.
    pub present: u64,
}

/// Hex-encoded SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Read every entry of the image at `path`.
pub fn inspect(path: &Path) -> Result<(Image<BufReader<File>>, Vec<EntryInfo>)> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut image = Image::parse(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;

    let count = image.header().phdr_count();
    let mut entries = Vec::with_capacity(count);
    for index in 0..count {
        let entry = image.entry(index)?.phdr.entry(index);
        let (digest, present) = if entry.is_empty() {
            (None, 0)
        } else {
            let data = image.read_at(entry.offset, entry.size)?;
            (Some(hash_bytes(&data)), data.len() as u64)
        };
        entries.push(EntryInfo {
            entry,
            digest,
            present,
        });
    }
    Ok((image, entries))
}

fn kind_label(kind: SegmentKind) -> &'static str {
    match kind {
        SegmentKind::Hash => "hash",
        SegmentKind::Ordinary => "load",
    }
}

/// Print the program header listing for `path`.
pub fn cmd_info(console: &Console, path: &Path) -> Result<()> {
    let (image, entries) = inspect(path)?;
    let header = image.header();
    let layout = StreamLayout::new(header, entries.first().map(|e| &e.entry))?;

    println!(
        "{}: {}, {} program headers, table ends at {:#x}",
        path.display(),
        header.class(),
        entries.len(),
        layout.table_end,
    );
    println!(
        "metadata stream origin {:#x}, hash data at {:#x}",
        layout.origin, layout.hash_start,
    );
    println!("  idx  offset      size        type  kind  mdt  sha256");
    for info in &entries {
        let entry = &info.entry;
        let mdt = if entry.travels_with_metadata() { "yes" } else { "no" };
        let digest = info.digest.as_deref().unwrap_or("-");
        println!(
            "  {:>3}  {:#010x}  {:<10}  {:>4}  {:<4}  {:<3}  {digest}",
            entry.index,
            entry.offset,
            entry.size,
            entry.type_code,
            kind_label(entry.kind()),
            mdt,
        );
        if info.digest.is_some() && info.present < entry.size {
            console.warn(format_args!(
                "segment {} is truncated ({} of {} bytes)",
                entry.index, info.present, entry.size
            ));
        }
    }
    if !entries.is_empty() && !layout.is_conventional() {
        console.warn(format_args!(
            "segment 0 does not cover the ELF headers; split hash data will start at {:#x}",
            layout.hash_start
        ));
    }
    Ok(())
}
