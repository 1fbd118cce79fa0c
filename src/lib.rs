//! Chunkpipe: bounded-queue producer/consumer pipeline with a parallel word counter

pub mod dispatch;
pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod wordcount;

/// Re-export types for API
pub use types::*;

pub use dispatch::{DispatchOpts, serve};
pub use pipeline::{BoundedQueue, Feeder, Merge, Phase, Pipeline, RunSummary};
pub use wordcount::{word_count_file, word_count_reader};

/// Result alias used by public chunkpipe API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
