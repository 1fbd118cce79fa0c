//! Parallel word counting over the chunk pipeline.

use anyhow::{Context, Result};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

use crate::engine::parallel::count_in_memory;
use crate::engine::progress::ProgressFn;
use crate::engine::tools::tally_chunk;
use crate::pipeline::{Chunker, Pipeline, PipelineTuning};
use crate::{Opts, WordCountReport, WorkItem};

/// Stream `reader` through chunker → queue → workers and return the merged tally.
/// `on_chunk` is called from workers with each chunk's byte length.
pub fn word_count_reader<R>(
    reader: R,
    opts: &Opts,
    on_chunk: Option<ProgressFn>,
) -> Result<WordCountReport>
where
    R: Read + Send + 'static,
{
    // Both modes honour the same worker bounds.
    let tuning = PipelineTuning {
        strict: opts.strict,
        ..PipelineTuning::new(opts.capacity, opts.workers)?
    };
    if opts.in_memory {
        return word_count_in_memory(reader, opts);
    }
    let chunk_size = opts.chunk_size;
    let pipeline = Pipeline::with_tuning(tuning, move |item: WorkItem| {
        let tally = tally_chunk(&item);
        if let Some(f) = &on_chunk {
            f(item.len());
        }
        Ok(tally)
    });

    let summary = pipeline.run_to_completion(move |feeder| {
        let reader = BufReader::new(reader);
        feeder.feed(Chunker::new(reader, chunk_size))?;
        Ok(())
    })?;

    Ok(WordCountReport {
        tally: summary.total,
        chunks: summary.items_produced,
        skipped: summary.items_skipped,
        workers: summary.workers,
        queue: Some(summary.queue),
        elapsed: summary.elapsed,
    })
}

/// Open `path` (fatal before any thread starts if that fails) and count it.
pub fn word_count_file(
    path: &Path,
    opts: &Opts,
    on_chunk: Option<ProgressFn>,
) -> Result<WordCountReport> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    debug!("Counting {}", path.display());
    word_count_reader(file, opts, on_chunk)
}

/// Read everything, then split the buffer into per-thread ranges.
fn word_count_in_memory<R: Read>(mut reader: R, opts: &Opts) -> Result<WordCountReport> {
    let start = Instant::now();
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).context("read input")?;
    debug!("in-memory read: {} bytes in {:?}", buf.len(), start.elapsed());
    let (tally, ranges) = count_in_memory(&buf, opts.workers)?;
    Ok(WordCountReport {
        tally,
        chunks: ranges,
        skipped: 0,
        workers: opts.workers,
        queue: None,
        elapsed: start.elapsed(),
    })
}
