//! Split and squash PIL firmware images.
//!
//! A monolithic ELF image is split into a metadata container (`.mdt`) and
//! one blob per non-empty segment (`.b00`, `.b01`, ...). Squashing reverses
//! the split byte for byte.
//!
//! The `.mdt` file carries the ELF header and program header table at their
//! original offsets, followed by a stream holding segment 0 and every hash
//! segment (type code 2 in bits 24..27 of `p_flags`). Loaders read it first
//! to authenticate the image before fetching the blobs.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let report = pil_mdt::split_file(Path::new("adsp.mbn"), Path::new("adsp.mdt"))?;
//! for warning in &report.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! pil_mdt::squash_file(Path::new("adsp-rebuilt.mbn"), Path::new("adsp.mdt"))?;
//! # Ok::<(), pil_mdt::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod blob;
pub mod error;
pub mod image;
pub mod layout;
pub mod naming;
pub mod payload;
pub mod report;
pub mod split;
pub mod squash;

#[cfg(test)]
mod test_image;

pub use blob::{BlobDir, BlobStore};
pub use error::{Error, Result};
pub use image::{Image, RawEntry};
pub use layout::StreamLayout;
pub use naming::{MDT_MARKER, MdtPath};
pub use payload::{PayloadSource, Payloads};
pub use report::{SplitRecord, SplitReport, SquashRecord, SquashReport, Warning};
pub use split::{split, split_file};
pub use squash::{squash, squash_file};
