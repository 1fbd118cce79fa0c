use anyhow::{Context, Result};
use log::debug;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::accumulator::{Accumulator, Merge};
use super::context::PipelineContext;
use super::queue::BoundedQueue;

/// What one worker did before it saw the queue empty and closed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub processed: usize,
    pub failed: usize,
}

/// Fixed set of worker threads, created once and joined once.
pub struct WorkerPool {
    handles: Vec<JoinHandle<WorkerReport>>,
}

/// Lives for the whole worker loop. If the thread unwinds outside item processing (a panicking
/// merge), record the failure and shut the queue so the producer cannot block on a queue nobody
/// drains any more.
struct UnwindGuard<'a, T> {
    id: usize,
    queue: &'a BoundedQueue<T>,
    ctx: &'a PipelineContext,
}

impl<T> Drop for UnwindGuard<'_, T> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.ctx
                .record_fatal(format!("worker {} panicked outside item processing", self.id));
            self.queue.close_and_discard();
        }
    }
}

/// Single worker: pop until empty-and-closed, process outside every lock, merge the partial result.
fn worker_loop<T, A, F>(
    id: usize,
    queue: Arc<BoundedQueue<T>>,
    acc: Arc<Accumulator<A>>,
    process: Arc<F>,
    ctx: Arc<PipelineContext>,
) -> WorkerReport
where
    A: Merge,
    F: Fn(T) -> Result<A>,
{
    let _guard = UnwindGuard {
        id,
        queue: &queue,
        ctx: &ctx,
    };
    let mut report = WorkerReport::default();
    while let Some(item) = queue.pop() {
        match panic::catch_unwind(AssertUnwindSafe(|| process(item))) {
            Ok(Ok(partial)) => {
                acc.merge(partial);
                report.processed += 1;
            }
            Ok(Err(e)) => {
                report.failed += 1;
                ctx.item_failed(&queue, format!("{e:#}"));
            }
            Err(payload) => {
                report.failed += 1;
                ctx.item_failed(&queue, format!("panic: {}", panic_message(&*payload)));
            }
        }
    }
    debug!(
        "worker {}: queue drained ({} processed, {} failed)",
        id, report.processed, report.failed
    );
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl WorkerPool {
    /// Spawn `workers` threads draining `queue` into `acc`. If a spawn fails, the queue is
    /// closed, the threads already started are joined, and the error is returned.
    pub fn spawn<T, A, F>(
        workers: usize,
        queue: &Arc<BoundedQueue<T>>,
        acc: &Arc<Accumulator<A>>,
        process: &Arc<F>,
        ctx: &Arc<PipelineContext>,
    ) -> Result<Self>
    where
        T: Send + 'static,
        A: Merge,
        F: Fn(T) -> Result<A> + Send + Sync + 'static,
    {
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let queue_w = Arc::clone(queue);
            let acc_w = Arc::clone(acc);
            let process_w = Arc::clone(process);
            let ctx_w = Arc::clone(ctx);
            let spawned = thread::Builder::new()
                .name(format!("{}-worker-{}", env!("CARGO_PKG_NAME"), id))
                .spawn(move || worker_loop(id, queue_w, acc_w, process_w, ctx_w));
            match spawned {
                Ok(h) => handles.push(h),
                Err(e) => {
                    queue.close_and_discard();
                    Self { handles }.join();
                    return Err(e).with_context(|| format!("spawn worker thread {id}"));
                }
            }
        }
        Ok(Self { handles })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Join every worker. Returns the summed report and how many workers panicked outside
    /// item processing.
    pub fn join(self) -> (WorkerReport, usize) {
        let mut total = WorkerReport::default();
        let mut panicked = 0;
        for h in self.handles {
            match h.join() {
                Ok(r) => {
                    total.processed += r.processed;
                    total.failed += r.failed;
                }
                Err(_) => panicked += 1,
            }
        }
        (total, panicked)
    }
}
