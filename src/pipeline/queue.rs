//! Fixed-capacity blocking FIFO shared by the producer and the worker pool.
//!
//! A ring buffer guarded by one mutex plus two condition variables: `not_empty` (workers wait
//! here in [`BoundedQueue::pop`]) and `not_full` (the producer waits here in
//! [`BoundedQueue::push`]). `closed` only ever goes false → true; once the queue is closed and
//! empty, `pop` returns `None` forever.

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Returned by [`BoundedQueue::push`] when the queue was already closed. Hands the item back.
pub struct PushError<T>(pub T);

impl<T> PushError<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PushError { .. }")
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("push on a closed queue")
    }
}

impl<T> std::error::Error for PushError<T> {}

/// Counters observed by the queue over its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Items accepted by `push`.
    pub enqueued: u64,
    /// Items handed out by `pop`.
    pub dequeued: u64,
    /// Pushes that found the queue full and had to wait.
    pub backpressure_events: u64,
    /// Largest `count` ever observed. Never exceeds capacity.
    pub high_water: usize,
}

struct RingState<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
    count: usize,
    closed: bool,
    stats: QueueStats,
}

pub struct BoundedQueue<T> {
    state: Mutex<RingState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue with `capacity` slots. Capacity must be at least 1.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            anyhow::bail!("queue capacity must be at least 1");
        }
        let slots = std::iter::repeat_with(|| None).take(capacity).collect();
        Ok(Self {
            state: Mutex::new(RingState {
                slots,
                head: 0,
                tail: 0,
                count: 0,
                closed: false,
                stats: QueueStats::default(),
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        })
    }

    // Critical sections only move indices and counters, so a poisoned lock still guards
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, RingState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block while the queue is full, then append `item` at the tail and wake one waiting `pop`.
    /// After [`close`](Self::close) the item is returned inside [`PushError`].
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        let mut state = self.lock();
        if state.count == self.capacity && !state.closed {
            state.stats.backpressure_events += 1;
        }
        while state.count == self.capacity && !state.closed {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.closed {
            return Err(PushError(item));
        }
        let tail = state.tail;
        state.slots[tail] = Some(item);
        state.tail = (tail + 1) % self.capacity;
        state.count += 1;
        state.stats.enqueued += 1;
        state.stats.high_water = state.stats.high_water.max(state.count);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Block while the queue is empty and open. Returns `None` once it is empty and closed.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        while state.count == 0 && !state.closed {
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.count == 0 {
            return None;
        }
        let head = state.head;
        let item = state.slots[head].take();
        state.head = (head + 1) % self.capacity;
        state.count -= 1;
        state.stats.dequeued += 1;
        drop(state);
        self.not_full.notify_one();
        item
    }

    /// Mark the queue closed and wake every waiter. Queued items stay poppable.
    /// Calling it again is a no-op.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Close the queue and drop everything still queued. Returns how many items were dropped.
    pub fn close_and_discard(&self) -> usize {
        let mut state = self.lock();
        state.closed = true;
        let dropped = state.count;
        let (head, capacity) = (state.head, self.capacity);
        let pending: Vec<T> = (0..dropped)
            .filter_map(|i| state.slots[(head + i) % capacity].take())
            .collect();
        state.head = state.tail;
        state.count = 0;
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
        // Item destructors run outside the lock.
        drop(pending);
        dropped
    }

    pub fn len(&self) -> usize {
        self.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> QueueStats {
        self.lock().stats
    }
}
