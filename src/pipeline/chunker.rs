//! Carve a byte stream into token-safe [`WorkItem`]s.
//!
//! Each item is read up to the target size, then extended one byte at a time while its last byte
//! is a token byte, so no token ever straddles two items.

use std::io::{self, ErrorKind, Read};

use crate::WorkItem;
use crate::engine::tools::is_word_byte;
use crate::utils::config::PipelineDefaults;

pub struct Chunker<R> {
    reader: R,
    target: usize,
    is_token: fn(u8) -> bool,
    prev_ends_in_token: bool,
    offset: u64,
    seq: usize,
    done: bool,
}

impl<R: Read> Chunker<R> {
    /// Chunk `reader` into items of about `target` bytes (minimum 1), splitting on word bytes.
    /// Wrap unbuffered sources in a `BufReader`: boundary extension reads single bytes.
    pub fn new(reader: R, target: usize) -> Self {
        Self {
            reader,
            target: target.max(1),
            is_token: is_word_byte,
            prev_ends_in_token: false,
            offset: 0,
            seq: 0,
            done: false,
        }
    }

    /// Use a different token byte class.
    pub fn with_token_class(mut self, is_token: fn(u8) -> bool) -> Self {
        self.is_token = is_token;
        self
    }

    /// Read the next item. `Ok(None)` at end of stream.
    pub fn next_item(&mut self) -> io::Result<Option<WorkItem>> {
        if self.done {
            return Ok(None);
        }
        let mut data = vec![0_u8; self.target];
        let filled = read_full(&mut self.reader, &mut data)?;
        if filled == 0 {
            self.done = true;
            return Ok(None);
        }
        data.truncate(filled);
        data.reserve(PipelineDefaults::CHUNK_SLACK);

        let mut byte = [0_u8; 1];
        while data.last().is_some_and(|&b| (self.is_token)(b)) {
            if read_one(&mut self.reader, &mut byte)? == 0 {
                self.done = true;
                break;
            }
            data.push(byte[0]);
        }

        let item = WorkItem {
            seq: self.seq,
            offset: self.offset,
            starts_inside_token: self.prev_ends_in_token,
            data,
        };
        self.prev_ends_in_token = item.data.last().is_some_and(|&b| (self.is_token)(b));
        self.offset += item.len() as u64;
        self.seq += 1;
        Ok(Some(item))
    }
}

impl<R: Read> Iterator for Chunker<R> {
    type Item = io::Result<WorkItem>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_item() {
            Ok(item) => item.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` until it is full or the reader hits end of stream. Returns bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_one<R: Read>(reader: &mut R, byte: &mut [u8; 1]) -> io::Result<usize> {
    loop {
        match reader.read(byte) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
