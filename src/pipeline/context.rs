//! Pipeline context and tuning: shared failure state handed to every worker.

use log::warn;
use std::sync::{Mutex, PoisonError};

use super::queue::BoundedQueue;
use crate::utils::config::PipelineDefaults;

/// Queue size, pool size and failure policy for one run.
#[derive(Clone, Debug)]
pub struct PipelineTuning {
    pub capacity: usize,
    pub workers: usize,
    /// Abort the run on the first item failure instead of skipping the item.
    pub strict: bool,
}

impl PipelineTuning {
    pub fn new(capacity: usize, workers: usize) -> anyhow::Result<Self> {
        if capacity == 0 {
            anyhow::bail!("queue capacity must be at least 1");
        }
        if workers == 0 || workers > PipelineDefaults::MAX_WORKERS {
            anyhow::bail!(
                "worker count must be between 1 and {} (got {})",
                PipelineDefaults::MAX_WORKERS,
                workers
            );
        }
        Ok(Self {
            capacity,
            workers,
            strict: false,
        })
    }
}

/// Failure state shared by workers and read by the coordinator after join.
#[derive(Debug, Default)]
pub struct PipelineContext {
    pub strict: bool,
    pub first_error: Mutex<Option<String>>,
    pub skipped_items: Mutex<Vec<String>>,
}

impl PipelineContext {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            ..Self::default()
        }
    }

    /// Record a failed item. Strict: keep the first message and shut the queue so the producer
    /// and every worker wind down. Otherwise: log and remember it as skipped.
    pub fn item_failed<T>(&self, queue: &BoundedQueue<T>, msg: String) {
        if self.strict {
            self.record_fatal(msg);
            let dropped = queue.close_and_discard();
            log::debug!("strict abort: discarded {} queued items", dropped);
        } else {
            warn!("skipping item: {}", msg);
            self.skipped_items
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(msg);
        }
    }

    /// Keep `msg` unless an earlier error is already recorded.
    pub fn record_fatal(&self, msg: String) {
        self.first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(msg);
    }

    pub fn take_first_error(&self) -> Option<String> {
        self.first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn take_skipped(&self) -> Vec<String> {
        std::mem::take(
            &mut *self
                .skipped_items
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}
