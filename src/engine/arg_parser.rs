use clap::Parser;
use std::path::PathBuf;

/// Parallel word counter over a bounded producer/consumer pipeline.
#[derive(Clone, Parser)]
#[command(name = "chunkpipe")]
#[command(about = "Count words, lines and bytes of FILE with a chunking producer and a worker pool.")]
pub struct Cli {
    /// File to count.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Worker threads (1-32). Default: available cores.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Queue slots between the reader and the workers.
    #[arg(long, short = 'c', value_parser = clap::value_parser!(usize))]
    pub capacity: Option<usize>,

    /// Target chunk size in bytes (chunks run past it to finish a word).
    #[arg(long, short = 's', value_parser = clap::value_parser!(usize))]
    pub chunk_size: Option<usize>,

    /// Strict mode: fail on the first chunk error instead of skipping it.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub strict: Option<bool>,

    /// Verbose output (debug logs and progress bar).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Print the report as JSON.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub json: Option<bool>,

    /// Read the whole file and split it into per-thread ranges instead of streaming chunks.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub in_memory: Option<bool>,
}
