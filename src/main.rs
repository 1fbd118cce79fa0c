//! Chunkpipe CLI: count words, lines and bytes of a file in parallel.

use anyhow::Result;
use chunkpipe::engine::arg_parser::Cli;
use chunkpipe::engine::handle_run;
use clap::Parser;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
