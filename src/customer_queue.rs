//! Thread-safe unbounded FIFO with a blocking, guarded-wait consumer.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// Shared FIFO guarded by one mutex and one "non-empty" condition.
///
/// Both the arrival and the dispatch stage use this type. Termination is the
/// caller's business: there is no close flag, so `pop_blocking` waits for as
/// long as it takes a producer to push.
pub struct CustomerQueue<T> {
    items: Mutex<VecDeque<T>>,
    non_empty: Condvar,
}

impl<T> CustomerQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            non_empty: Condvar::new(),
        }
    }

    /// Append to the tail and wake one blocked consumer.
    pub fn push(&self, item: T) {
        let mut guard = self.items.lock().expect("customer queue mutex poisoned");
        guard.push_back(item);
        self.non_empty.notify_one();
    }

    /// Append to the tail and report the item's 1-based position.
    ///
    /// `on_placed` runs inside the same critical section as the append, so
    /// the position it sees is exactly the queue length before the push plus
    /// one, and nothing can pop the item before the callback has returned.
    pub fn push_placed<F>(&self, item: T, on_placed: F) -> usize
    where
        F: FnOnce(&T, usize),
    {
        let mut guard = self.items.lock().expect("customer queue mutex poisoned");
        let position = guard.len() + 1;
        on_placed(&item, position);
        guard.push_back(item);
        self.non_empty.notify_one();
        position
    }

    /// Block until an item is available, then take the head.
    pub fn pop_blocking(&self) -> T {
        let mut guard = self.items.lock().expect("customer queue mutex poisoned");
        loop {
            if let Some(item) = guard.pop_front() {
                return item;
            }
            // Wait releases the lock and re-acquires it before returning;
            // an empty queue after waking just means we wait again.
            guard = self
                .non_empty
                .wait(guard)
                .expect("customer queue condvar wait failed");
        }
    }

    /// Take the head without blocking.
    pub fn try_pop(&self) -> Option<T> {
        let mut guard = self.items.lock().expect("customer queue mutex poisoned");
        guard.pop_front()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        let guard = self.items.lock().expect("customer queue mutex poisoned");
        guard.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for CustomerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
