use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use mul_toggle::CLIArgs;

fn main() -> Result<()> {
    let args = CLIArgs::parse();
    mul_toggle::init_logger(args.log_level())?;
    let sections = mul_toggle::read_sections(&args.input_paths)?;

    let stdout = io::stdout();
    mul_toggle::report(&sections, stdout.lock())
        .context("Failed to write evaluation report to standard output.")?;

    Ok(())
}
