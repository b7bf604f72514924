//! Command-line interface definitions for pil.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Split and squash PIL firmware images.
#[derive(Parser)]
#[command(name = "pil", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Print only errors and warnings.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print one line per segment, plus timings.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Split a monolithic image into a .mdt file and .bNN blobs.
    Split(SplitArgs),
    /// Rebuild a monolithic image from a .mdt file and its blobs.
    Squash(SquashArgs),
    /// List the program headers of a monolithic image.
    Info(InfoArgs),
}

/// Arguments for the `split` subcommand.
#[derive(Parser)]
pub struct SplitArgs {
    /// Monolithic image to read.
    pub image: PathBuf,
    /// Metadata file to write; blobs are named after it.
    pub mdt: PathBuf,
}

/// Arguments for the `squash` subcommand.
#[derive(Parser)]
pub struct SquashArgs {
    /// Monolithic image to write.
    pub image: PathBuf,
    /// Metadata file to read; blobs are looked up beside it.
    pub mdt: PathBuf,
}

/// Arguments for the `info` subcommand.
#[derive(Parser)]
pub struct InfoArgs {
    /// Monolithic image to inspect.
    pub image: PathBuf,
}
