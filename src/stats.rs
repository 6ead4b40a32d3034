//! Process-wide accounting of native resources.
//!
//! Every native allocation, free, plan construction and plan destruction
//! bumps a relaxed atomic counter. The counters are cheap enough to stay on
//! in release builds and make leaks and double releases visible.

use std::sync::atomic::{AtomicUsize, Ordering};

static BUFFERS_ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static BUFFERS_FREED: AtomicUsize = AtomicUsize::new(0);
static BYTES_LIVE: AtomicUsize = AtomicUsize::new(0);
static PLANS_CREATED: AtomicUsize = AtomicUsize::new(0);
static PLANS_DESTROYED: AtomicUsize = AtomicUsize::new(0);

/// Snapshot of the native resource counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Successful native allocations since process start.
    pub buffers_allocated: usize,
    /// Native frees since process start.
    pub buffers_freed: usize,
    /// Bytes currently held by live buffers.
    pub bytes_live: usize,
    /// Plans returned by the native planner.
    pub plans_created: usize,
    /// Native plans released.
    pub plans_destroyed: usize,
}

impl Stats {
    /// Buffers allocated but not yet freed.
    #[inline]
    pub fn live_buffers(&self) -> usize {
        self.buffers_allocated.saturating_sub(self.buffers_freed)
    }

    /// Plans created but not yet destroyed.
    #[inline]
    pub fn live_plans(&self) -> usize {
        self.plans_created.saturating_sub(self.plans_destroyed)
    }
}

/// Read all counters.
///
/// Each counter is read independently; under concurrent activity the
/// snapshot is not atomic as a whole.
pub fn stats() -> Stats {
    Stats {
        buffers_allocated: BUFFERS_ALLOCATED.load(Ordering::Relaxed),
        buffers_freed: BUFFERS_FREED.load(Ordering::Relaxed),
        bytes_live: BYTES_LIVE.load(Ordering::Relaxed),
        plans_created: PLANS_CREATED.load(Ordering::Relaxed),
        plans_destroyed: PLANS_DESTROYED.load(Ordering::Relaxed),
    }
}

#[inline]
pub(crate) fn record_alloc(bytes: usize) {
    BUFFERS_ALLOCATED.fetch_add(1, Ordering::Relaxed);
    BYTES_LIVE.fetch_add(bytes, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_free(bytes: usize) {
    BUFFERS_FREED.fetch_add(1, Ordering::Relaxed);
    BYTES_LIVE.fetch_sub(bytes, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_plan_created() {
    PLANS_CREATED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_plan_destroyed() {
    PLANS_DESTROYED.fetch_add(1, Ordering::Relaxed);
}
