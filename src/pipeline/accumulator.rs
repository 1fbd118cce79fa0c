//! Shared reduction target: one lock-protected total that every worker merges into.

use std::sync::{Mutex, PoisonError};

/// Associative, commutative merge. Workers finish items in any order, so the final total must
/// not depend on merge order. `Default` is the identity.
pub trait Merge: Default + Send + 'static {
    fn merge(&mut self, other: Self);
}

macro_rules! impl_merge_sum {
    ($($t:ty),*) => {
        $(
            impl Merge for $t {
                fn merge(&mut self, other: Self) {
                    *self += other;
                }
            }
        )*
    };
}

impl_merge_sum!(u32, u64, usize, i64, u128);

impl Merge for () {
    fn merge(&mut self, _other: Self) {}
}

impl<A: Merge, B: Merge> Merge for (A, B) {
    fn merge(&mut self, other: Self) {
        self.0.merge(other.0);
        self.1.merge(other.1);
    }
}

pub struct Accumulator<A> {
    total: Mutex<A>,
}

impl<A: Merge> Default for Accumulator<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Merge> Accumulator<A> {
    /// Start at the identity value.
    pub fn new() -> Self {
        Self {
            total: Mutex::new(A::default()),
        }
    }

    /// Fold one partial result into the total. The lock is held only for the merge.
    pub fn merge(&self, partial: A) {
        let mut total = self.total.lock().unwrap_or_else(PoisonError::into_inner);
        total.merge(partial);
    }

    /// Read the final value. Taking `self` means no other thread can still be merging.
    pub fn into_inner(self) -> A {
        self.total
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Merge + Clone> Accumulator<A> {
    /// Copy of the running total (for progress reporting while a run is live).
    pub fn snapshot(&self) -> A {
        self.total
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
