//! In-memory counting: split one buffer into per-thread ranges and count them on a rayon pool.

use anyhow::{Context, Result};
use log::debug;
use rayon::prelude::*;
use std::ops::Range;

use super::tools::{count_lines, count_words, is_word_byte};
use crate::WordTally;

/// Split `buf` into `parts` contiguous ranges. Interior cut points are pushed forward past any
/// run of word bytes so a word always belongs to the range it starts in. Ranges cover `buf`
/// exactly once; some may be empty when a single word spans several blocks.
pub fn split_ranges(buf: &[u8], parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let block = buf.len() / parts;
    let mut cuts = Vec::with_capacity(parts + 1);
    cuts.push(0);
    for k in 1..parts {
        let prev = cuts[k - 1];
        let mut cut = (k * block).max(prev);
        while cut < buf.len() && cut > 0 && is_word_byte(buf[cut]) && is_word_byte(buf[cut - 1]) {
            cut += 1;
        }
        cuts.push(cut);
    }
    cuts.push(buf.len());
    cuts.windows(2).map(|w| w[0]..w[1]).collect()
}

/// Count `buf` on a dedicated pool of `threads` threads.
pub fn count_in_memory(buf: &[u8], threads: usize) -> Result<(WordTally, usize)> {
    let ranges = split_ranges(buf, threads);
    debug!("in-memory count: {} bytes over {} ranges", buf.len(), ranges.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("{}-range-{}", env!("CARGO_PKG_NAME"), i))
        .build()
        .context("build counting thread pool")?;
    let words: u64 = pool.install(|| {
        ranges
            .par_iter()
            .map(|r| count_words(&buf[r.clone()], false))
            .sum::<u64>()
    });
    let tally = WordTally {
        words,
        lines: count_lines(buf),
        bytes: buf.len() as u64,
    };
    Ok((tally, ranges.len()))
}
