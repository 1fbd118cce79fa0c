use anyhow::Result;
use log::debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::accumulator::{Accumulator, Merge};
use super::context::{PipelineContext, PipelineTuning};
use super::error_handler::check_for_first_error_or_skipped_items;
use super::producer::{Feeder, spawn_producer_thread};
use super::queue::{BoundedQueue, QueueStats};
use super::worker::WorkerPool;

/// Run lifecycle. Only moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Idle,
    Running,
    Draining,
    Joined,
}

/// Everything a finished run hands back. `total` is authoritative: no thread is left alive.
#[derive(Debug)]
pub struct RunSummary<A> {
    pub total: A,
    pub items_produced: usize,
    pub items_processed: usize,
    pub items_skipped: usize,
    /// Failure messages of skipped items (non-strict runs).
    pub skipped: Vec<String>,
    pub queue: QueueStats,
    pub workers: usize,
    pub phase: Phase,
    pub elapsed: Duration,
}

/// Producer → bounded queue → worker pool → accumulator, for one opaque per-item function.
pub struct Pipeline<T, A, F> {
    tuning: PipelineTuning,
    process: Arc<F>,
    phase: Phase,
    _marker: std::marker::PhantomData<fn(T) -> A>,
}

impl<T, A, F> Pipeline<T, A, F>
where
    T: Send + 'static,
    A: Merge,
    F: Fn(T) -> Result<A> + Send + Sync + 'static,
{
    /// `capacity` queue slots, `worker_count` workers, `process` run once per item.
    pub fn new(capacity: usize, worker_count: usize, process: F) -> Result<Self> {
        Ok(Self::with_tuning(
            PipelineTuning::new(capacity, worker_count)?,
            process,
        ))
    }

    pub fn with_tuning(tuning: PipelineTuning, process: F) -> Self {
        Self {
            tuning,
            process: Arc::new(process),
            phase: Phase::Idle,
            _marker: std::marker::PhantomData,
        }
    }

    /// Strict: abort on the first item failure. Default is log-and-skip.
    pub fn strict(mut self, strict: bool) -> Self {
        self.tuning.strict = strict;
        self
    }

    pub fn tuning(&self) -> &PipelineTuning {
        &self.tuning
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(next > self.phase, "phase went backwards");
        debug!("pipeline: {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Run `produce` on its own thread against a fresh queue, drain it with the pool, join
    /// everything, and return the merged total.
    ///
    /// `produce` pushes through the [`Feeder`]; the queue closes when it returns. A producer
    /// error, a strict-mode item failure, or a thread panic fails the whole run.
    pub fn run_to_completion<P>(mut self, produce: P) -> Result<RunSummary<A>>
    where
        P: FnOnce(&mut Feeder<T>) -> Result<()> + Send + 'static,
    {
        let start = Instant::now();
        let PipelineTuning {
            capacity,
            workers,
            strict,
        } = self.tuning;
        debug!(
            "pipeline config: capacity={} workers={} strict={}",
            capacity, workers, strict
        );

        let queue = Arc::new(BoundedQueue::<T>::new(capacity)?);
        let acc = Arc::new(Accumulator::<A>::new());
        let ctx = Arc::new(PipelineContext::new(strict));

        let pool = WorkerPool::spawn(workers, &queue, &acc, &self.process, &ctx)?;
        let producer = match spawn_producer_thread(&queue, produce) {
            Ok(h) => h,
            Err(e) => {
                queue.close_and_discard();
                pool.join();
                return Err(e);
            }
        };
        self.advance(Phase::Running);

        let produced = producer
            .join()
            .map_err(|_| anyhow::anyhow!("producer thread panicked"));
        self.advance(Phase::Draining);
        let produced = match produced.and_then(|r| r) {
            Ok(n) => Some(n),
            Err(e) => {
                // Workers must not keep chewing on input that will be thrown away.
                queue.close_and_discard();
                ctx.record_fatal(format!("{e:#}"));
                None
            }
        };

        let (report, panicked) = pool.join();
        self.advance(Phase::Joined);
        if panicked > 0 {
            ctx.record_fatal(format!("{panicked} worker thread(s) panicked"));
        }

        let skipped = check_for_first_error_or_skipped_items(&ctx)?;
        let produced =
            produced.ok_or_else(|| anyhow::anyhow!("producer failed without a recorded error"))?;
        let acc = Arc::try_unwrap(acc)
            .map_err(|_| anyhow::anyhow!("accumulator still shared after join"))?;
        let summary = RunSummary {
            total: acc.into_inner(),
            items_produced: produced,
            items_processed: report.processed,
            items_skipped: skipped.len(),
            skipped,
            queue: queue.stats(),
            workers,
            phase: self.phase,
            elapsed: start.elapsed(),
        };
        debug!(
            "pipeline joined: {} produced, {} processed, {} skipped in {:?}",
            summary.items_produced, summary.items_processed, summary.items_skipped, summary.elapsed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_tuning() {
        assert!(Pipeline::<u64, u64, _>::new(0, 1, |x: u64| Ok(x)).is_err());
        assert!(Pipeline::<u64, u64, _>::new(1, 0, |x: u64| Ok(x)).is_err());
        assert!(Pipeline::<u64, u64, _>::new(1, 1000, |x: u64| Ok(x)).is_err());
    }

    #[test]
    fn test_phase_starts_idle_and_ends_joined() {
        let p = Pipeline::new(2, 2, |x: u64| Ok(x)).unwrap();
        assert_eq!(p.phase(), Phase::Idle);
        let summary = p
            .run_to_completion(|feeder| {
                feeder.feed((1..=10_u64).map(Ok::<_, std::io::Error>))?;
                Ok(())
            })
            .unwrap();
        assert_eq!(summary.phase, Phase::Joined);
        assert_eq!(summary.total, 55);
        assert_eq!(summary.items_produced, 10);
        assert_eq!(summary.items_processed, 10);
    }
}
