//! Byte-class and counting utilities

use crate::{WordTally, WorkItem};

/// Word characters: ASCII letters and digits. Everything else separates words.
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// Count words in `buf`. When `starts_inside_word` is set, the leading run of word bytes belongs
/// to a word already counted elsewhere and is skipped.
pub fn count_words(buf: &[u8], starts_inside_word: bool) -> u64 {
    let start = if starts_inside_word {
        buf.iter().position(|&b| !is_word_byte(b)).unwrap_or(buf.len())
    } else {
        0
    };
    let mut count = 0_u64;
    let mut in_word = false;
    for &b in &buf[start..] {
        if is_word_byte(b) {
            if !in_word {
                count += 1;
                in_word = true;
            }
        } else {
            in_word = false;
        }
    }
    count
}

/// Count newline bytes.
pub fn count_lines(buf: &[u8]) -> u64 {
    buf.iter().filter(|&&b| b == b'\n').count() as u64
}

/// Words, lines and bytes of one chunk.
pub fn tally_chunk(item: &WorkItem) -> WordTally {
    WordTally {
        words: count_words(&item.data, item.starts_inside_token),
        lines: count_lines(&item.data),
        bytes: item.len() as u64,
    }
}
