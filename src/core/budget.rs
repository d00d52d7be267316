//! Byte budget accounting shared between the cache and the handles it issues
//!
//! The cache and every handle hold an `Arc<MemoryBudget>`. Handles never see
//! the cache itself; when their buffers go away they only decrement the
//! shared counter, so a handle may safely outlive the cache that created it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed byte budget with an atomic allocated-bytes counter
#[derive(Debug)]
pub struct MemoryBudget {
    /// Maximum bytes that may be charged at any time
    max_bytes: usize,
    /// Bytes currently charged
    allocated: AtomicUsize,
}

impl MemoryBudget {
    /// Create a new budget with nothing allocated
    pub fn new(max_bytes: usize) -> Arc<Self> {
        Arc::new(MemoryBudget {
            max_bytes,
            allocated: AtomicUsize::new(0),
        })
    }

    /// Total budget in bytes
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Bytes currently charged against the budget
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    /// Bytes that can still be charged without eviction
    pub fn available(&self) -> usize {
        self.max_bytes.saturating_sub(self.allocated())
    }

    /// Whether `bytes` more can be charged without exceeding the budget
    pub fn fits(&self, bytes: usize) -> bool {
        bytes <= self.available()
    }

    /// Utilization ratio (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.max_bytes == 0 {
            0.0
        } else {
            self.allocated() as f64 / self.max_bytes as f64
        }
    }

    /// Charge `bytes` against the budget unconditionally.
    ///
    /// Callers make room first; the returned guard gives the bytes back
    /// when released or dropped.
    pub(crate) fn charge(self: &Arc<Self>, bytes: usize) -> Allocation {
        self.allocated.fetch_add(bytes, Ordering::AcqRel);
        Allocation {
            budget: Arc::clone(self),
            bytes,
            released: AtomicBool::new(false),
        }
    }

    fn release(&self, bytes: usize) {
        // Saturate instead of wrapping if accounting ever goes wrong
        let _ = self
            .allocated
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_sub(bytes))
            });
    }
}

/// A charge against a [`MemoryBudget`]
///
/// Released exactly once: either explicitly through [`Allocation::release`]
/// or implicitly on drop. Later releases are no-ops.
#[derive(Debug)]
pub(crate) struct Allocation {
    budget: Arc<MemoryBudget>,
    bytes: usize,
    released: AtomicBool,
}

impl Allocation {
    /// Bytes still charged (zero once released)
    pub(crate) fn outstanding(&self) -> usize {
        if self.released.load(Ordering::Acquire) {
            0
        } else {
            self.bytes
        }
    }

    /// Return the charge to the budget, reporting how many bytes were freed
    pub(crate) fn release(&self) -> usize {
        if self.released.swap(true, Ordering::AcqRel) {
            return 0;
        }
        self.budget.release(self.bytes);
        self.bytes
    }

    /// Fold another outstanding charge into this one
    pub(crate) fn absorb(&mut self, other: Allocation) {
        if !other.released.swap(true, Ordering::AcqRel) {
            self.bytes += other.bytes;
        }
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        self.release();
    }
}
