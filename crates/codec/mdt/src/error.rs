//! Codec error type.

use std::fmt;
use std::io;
use std::path::PathBuf;

use pil_elf::ElfError;

/// Result alias for codec operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Fatal errors raised by the splitter and the squasher.
///
/// Every variant aborts the operation. Recoverable conditions are reported
/// as [`Warning`](crate::Warning)s instead.
#[derive(Debug)]
pub enum Error {
    /// The metadata path does not contain the `.mdt` marker.
    NotMdtPath {
        /// The rejected path.
        path: PathBuf,
    },
    /// A file could not be opened or created.
    Open {
        /// The file that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The header is not a supported ELF header.
    Elf(ElfError),
    /// The metadata stream holds fewer bytes than a hash segment declares.
    CorruptMetadata {
        /// Program header index of the hash segment.
        index: usize,
        /// Stream offset the read started at.
        offset: u64,
        /// Declared segment size.
        expected: u64,
        /// Bytes actually available.
        got: u64,
    },
    /// A read, write or seek failed.
    Io {
        /// What the codec was doing.
        context: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }

    pub(crate) fn open(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Open { path, source }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMdtPath { path } => {
                write!(f, "{} is not a .mdt file", path.display())
            }
            Self::Open { path, .. } => write!(f, "failed to open {}", path.display()),
            Self::Elf(err) => write!(f, "{err}"),
            Self::CorruptMetadata {
                index,
                offset,
                expected,
                got,
            } => write!(
                f,
                "hash segment {index} is truncated in metadata: \
                 {got} of {expected} bytes at offset {offset:#x}"
            ),
            Self::Io { context, .. } => write!(f, "{context}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Io { source, .. } => Some(source),
            Self::NotMdtPath { .. } | Self::Elf(_) | Self::CorruptMetadata { .. } => None,
        }
    }
}

impl From<ElfError> for Error {
    fn from(err: ElfError) -> Self {
        Self::Elf(err)
    }
}
