use std::sync::{Condvar, Mutex, MutexGuard};


/// A countdown latch that tracks the live workers of a pool.
///
/// The pool arms the latch with [`CountDownLatch::add`] *before* spawning
/// its workers, and every worker calls [`CountDownLatch::count_down`]
/// exactly once on its way out.
/// Only the call that brings the count to zero returns `true`,
/// so the "last worker out" action runs exactly once
/// regardless of how many workers were spawned.
#[derive(Debug, Default)]
pub struct CountDownLatch {
    count: Mutex<usize>,
    zero: Condvar,
}


impl CountDownLatch {
    /// Construct a new latch with the given count.
    pub fn new(count: usize) -> Self {
        Self { count: Mutex::new(count), zero: Condvar::new() }
    }


    /// Add `n` to the count.
    pub fn add(&self, n: usize) {
        *self.lock() += n;
    }


    /// Decrement the count.
    /// Returns `true` iff this call brought the count to zero.
    pub fn count_down(&self) -> bool {
        let mut count = self.lock();
        assert!(*count > 0, "count_down called on an exhausted latch");
        *count -= 1;
        let last = *count == 0;
        if last {
            self.zero.notify_all();
        }
        last
    }


    /// Returns the current count.
    pub fn count(&self) -> usize {
        *self.lock()
    }


    /// Block until the count reaches zero.
    pub fn wait(&self) {
        let mut count = self.lock();
        while *count > 0 {
            count = self.zero.wait(count)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }


    // A poisoned counter is still a valid counter.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}


/// A one-shot flag that threads can block on.
/// Raising it more than once is harmless.
#[derive(Debug, Default)]
pub struct Signal {
    raised: Mutex<bool>,
    cond: Condvar,
}


impl Signal {
    /// Construct a lowered signal.
    pub fn new() -> Self {
        Self::default()
    }


    /// Raise the signal and wake every waiter.
    pub fn raise(&self) {
        let mut raised = self.lock();
        *raised = true;
        self.cond.notify_all();
    }


    /// Returns `true` once the signal is raised.
    pub fn is_raised(&self) -> bool {
        *self.lock()
    }


    /// Block until the signal is raised.
    pub fn wait(&self) {
        let mut raised = self.lock();
        while !*raised {
            raised = self.cond.wait(raised)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }


    fn lock(&self) -> MutexGuard<'_, bool> {
        self.raised.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
