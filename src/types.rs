//! Public and internal types for the chunkpipe API and pipeline.

use serde::Serialize;
use std::time::Duration;

use crate::pipeline::{Merge, QueueStats};
use crate::utils::config::PipelineDefaults;

/// One unit of work carved out of a byte stream by the [`Chunker`](crate::pipeline::Chunker).
///
/// Owned by exactly one thread at a time: the producer until pushed, then the worker that pops it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    /// Position of this item in production order (0-based).
    pub seq: usize,
    /// Byte offset of `data[0]` in the source stream.
    pub offset: u64,
    pub data: Vec<u8>,
    /// True when the first byte continues a token from the previous item. The chunker extends
    /// every item to a token boundary, so this is false for chunker output; counters still honour it.
    pub starts_inside_token: bool,
}

impl WorkItem {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Word, line and byte totals for a chunk or a whole input. Sums under [`Merge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WordTally {
    pub words: u64,
    pub lines: u64,
    pub bytes: u64,
}

impl Merge for WordTally {
    fn merge(&mut self, other: Self) {
        self.words += other.words;
        self.lines += other.lines;
        self.bytes += other.bytes;
    }
}

/// Full options (CLI and lib).
#[derive(Clone, Debug)]
pub struct Opts {
    /// Worker thread count.
    pub workers: usize,
    /// Queue slot count (backpressure threshold).
    pub capacity: usize,
    /// Target chunk size in bytes. Chunks may run past it to finish a token.
    pub chunk_size: usize,
    /// Strict mode: abort the run on the first item failure instead of skipping it.
    pub strict: bool,
    /// Show progress bar and debug logs.
    pub verbose: bool,
    /// Print the report as JSON (CLI).
    pub json: bool,
    /// Read the whole input and split it into per-thread ranges instead of streaming chunks.
    pub in_memory: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            workers: PipelineDefaults::workers(),
            capacity: PipelineDefaults::QUEUE_CAPACITY,
            chunk_size: PipelineDefaults::CHUNK_SIZE,
            strict: false,
            verbose: false,
            json: false,
            in_memory: false,
        }
    }
}

/// Result of a word count run.
#[derive(Clone, Debug, Serialize)]
pub struct WordCountReport {
    pub tally: WordTally,
    /// Chunks produced (pipeline mode) or ranges counted (in-memory mode).
    pub chunks: usize,
    /// Chunks that failed and were skipped.
    pub skipped: usize,
    pub workers: usize,
    /// Queue stats; `None` in in-memory mode.
    pub queue: Option<QueueStats>,
    #[serde(serialize_with = "serialize_ms")]
    pub elapsed: Duration,
}

fn serialize_ms<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}
