//! PIL firmware image tool.
//!
//! Splits a monolithic firmware ELF into the `.mdt` + `.bNN` set that
//! peripheral image loaders consume, and squashes such a set back into a
//! single image.

mod cli;
mod info;
mod output;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use output::{Console, Level};

fn main() -> Result<()> {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors exit 1; --help and --version exit 0.
            let code = i32::from(err.use_stderr());
            if err.use_stderr() {
                eprint!("{err}");
            } else {
                print!("{err}");
            }
            std::process::exit(code);
        }
    };
    let console = Console::new(Level::from_flags(cli.quiet, cli.verbose));

    match cli.command {
        cli::Command::Split(ref args) => cmd_split(&console, &args.image, &args.mdt),
        cli::Command::Squash(ref args) => cmd_squash(&console, &args.image, &args.mdt),
        cli::Command::Info(ref args) => info::cmd_info(&console, &args.image),
    }
}

fn cmd_split(console: &Console, image: &Path, mdt: &Path) -> Result<()> {
    let report = {
        let _t = console.stopwatch("split");
        pil_mdt::split_file(image, mdt)
            .with_context(|| format!("splitting {} into {}", image.display(), mdt.display()))?
    };
    console.split(image, mdt, &report);
    Ok(())
}

fn cmd_squash(console: &Console, image: &Path, mdt: &Path) -> Result<()> {
    let report = {
        let _t = console.stopwatch("squash");
        pil_mdt::squash_file(image, mdt)
            .with_context(|| format!("squashing {} into {}", mdt.display(), image.display()))?
    };
    console.squash(image, mdt, &report);
    Ok(())
}
