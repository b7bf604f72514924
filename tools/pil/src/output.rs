//! Console output: split/squash summaries on stdout, warnings on stderr.
//!
//! `-q` keeps stdout silent, the default prints one summary line per
//! command, `-v` adds one line per segment and the time the codec took.
//! Warnings are printed at every level.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use pil_mdt::{SplitRecord, SplitReport, SquashRecord, SquashReport, Warning};

/// How much goes to stdout.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Level {
    /// Nothing; warnings and errors still reach stderr.
    Quiet,
    /// One summary line per command.
    Summary,
    /// Summary plus one line per segment and timings.
    Segments,
}

impl Level {
    /// Level selected by the `-q`/`-v` flags (clap rejects both together).
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Segments,
            (false, false) => Self::Summary,
        }
    }
}

/// Prints command results at a fixed [`Level`].
pub struct Console {
    level: Level,
}

impl Console {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Print one warning to stderr.
    pub fn warn(&self, message: impl fmt::Display) {
        eprintln!("warning: {message}");
    }

    /// Print every warning of a report, in the order they were raised.
    pub fn warnings(&self, warnings: &[Warning]) {
        for warning in warnings {
            self.warn(warning);
        }
    }

    /// Time `label` until the returned guard drops; shown at `-v`.
    pub fn stopwatch(&self, label: &'static str) -> Stopwatch {
        Stopwatch {
            label,
            start: Instant::now(),
            shown: self.level >= Level::Segments,
        }
    }

    pub fn split(&self, image: &Path, mdt: &Path, report: &SplitReport) {
        self.warnings(&report.warnings);
        if self.level >= Level::Segments {
            for record in &report.segments {
                println!("{}", split_line(record));
            }
        }
        if self.level >= Level::Summary {
            println!("{}", split_summary(image, mdt, report));
        }
    }

    pub fn squash(&self, image: &Path, mdt: &Path, report: &SquashReport) {
        self.warnings(&report.warnings);
        if self.level >= Level::Segments {
            for record in &report.segments {
                println!("{}", squash_line(record));
            }
        }
        if self.level >= Level::Summary {
            println!("{}", squash_summary(image, mdt, report));
        }
    }
}

/// Elapsed-time guard from [`Console::stopwatch`].
pub struct Stopwatch {
    label: &'static str,
    start: Instant,
    shown: bool,
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        if self.shown {
            println!("  {}: {:.1?}", self.label, self.start.elapsed());
        }
    }
}

fn split_line(record: &SplitRecord) -> String {
    let entry = &record.entry;
    format!(
        "  segment {:>2}  offset {:#010x}  {:>8} bytes  type {}  -> {}{}",
        entry.index,
        entry.offset,
        record.copied,
        entry.type_code,
        record.blob,
        if record.inline { " (+mdt)" } else { "" },
    )
}

fn squash_line(record: &SquashRecord) -> String {
    let entry = &record.entry;
    format!(
        "  segment {:>2}  offset {:#010x}  {:>8} bytes  type {}  <- {}",
        entry.index, entry.offset, record.copied, entry.type_code, record.source,
    )
}

fn split_summary(image: &Path, mdt: &Path, report: &SplitReport) -> String {
    let inline = report.segments.iter().filter(|r| r.inline).count();
    format!(
        "Split {} ({}, {} entries): {} blobs, {} segments in {}",
        image.display(),
        report.class,
        report.entries,
        report.segments.len(),
        inline,
        mdt.display(),
    )
}

fn squash_summary(image: &Path, mdt: &Path, report: &SquashReport) -> String {
    let written: u64 = report.segments.iter().map(|r| r.copied).sum();
    format!(
        "Squashed {} ({}, {} entries) into {}: {} payload bytes",
        mdt.display(),
        report.class,
        report.entries,
        image.display(),
        written,
    )
}
