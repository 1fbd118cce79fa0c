//! Pipeline components: bounded queue, chunker, producer, worker pool, accumulator, coordinator.

pub mod accumulator;
pub mod chunker;
pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod producer;
pub mod queue;
pub mod worker;

pub use accumulator::{Accumulator, Merge};
pub use chunker::Chunker;
pub use context::{PipelineContext, PipelineTuning};
pub use error_handler::check_for_first_error_or_skipped_items;
pub use orchestrator::{Phase, Pipeline, RunSummary};
pub use producer::{Feeder, spawn_producer_thread};
pub use queue::{BoundedQueue, PushError, QueueStats};
pub use worker::{WorkerPool, WorkerReport};
