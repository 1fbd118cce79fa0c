//! Producer side: the [`Feeder`] handle and the producer thread.

use anyhow::{Context, Result};
use log::debug;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::queue::{BoundedQueue, PushError};

/// Producer's handle on the queue. Closes the queue on [`finish`](Self::finish) or on drop, so
/// workers always see end of input even if the producer bails out early.
pub struct Feeder<T> {
    queue: Arc<BoundedQueue<T>>,
    pushed: usize,
}

impl<T> Feeder<T> {
    pub(crate) fn new(queue: Arc<BoundedQueue<T>>) -> Self {
        Self { queue, pushed: 0 }
    }

    /// Push one item, blocking while the queue is full.
    pub fn push(&mut self, item: T) -> Result<(), PushError<T>> {
        self.queue.push(item)?;
        self.pushed += 1;
        Ok(())
    }

    /// Push every item from `items`. Stops at the first source error (returned) or when the
    /// queue was closed underneath us (also an error). Returns the number of items pushed so far.
    pub fn feed<I, E>(&mut self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<T, E>>,
        E: Into<anyhow::Error>,
    {
        for item in items {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    let e: anyhow::Error = e.into();
                    return Err(e.context(format!("producing item {}", self.pushed)));
                }
            };
            if self.push(item).is_err() {
                debug!("queue closed after {} items; producer stopping", self.pushed);
                anyhow::bail!("queue closed before the producer finished");
            }
        }
        Ok(self.pushed)
    }

    /// Items pushed so far.
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Close the queue. Returns the number of items pushed.
    pub fn finish(self) -> usize {
        self.pushed
    }
}

impl<T> Drop for Feeder<T> {
    fn drop(&mut self) {
        self.queue.close();
    }
}

/// Spawn the producer thread. `produce` receives the feeder; when it returns (or panics) the
/// feeder is dropped and the queue closed. The join handle yields the produced item count.
pub fn spawn_producer_thread<T, P>(
    queue: &Arc<BoundedQueue<T>>,
    produce: P,
) -> Result<JoinHandle<Result<usize>>>
where
    T: Send + 'static,
    P: FnOnce(&mut Feeder<T>) -> Result<()> + Send + 'static,
{
    let mut feeder = Feeder::new(Arc::clone(queue));
    thread::Builder::new()
        .name(format!("{}-producer", env!("CARGO_PKG_NAME")))
        .spawn(move || {
            produce(&mut feeder)?;
            Ok(feeder.finish())
        })
        .context("spawn producer thread")
}
