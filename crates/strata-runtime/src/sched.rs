use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use hashbrown::HashSet;
use strata_edit::RevisionTracker;
use strata_world::ChunkCoord;

/// Scheduling state shared between the foreground and the worker. Every
/// read-modify-write happens under the one lock.
#[derive(Default, Debug)]
pub(crate) struct SchedState {
    queue: VecDeque<ChunkCoord>,
    pub(crate) active: HashSet<ChunkCoord>,
    /// Coordinates that have a render chunk; only these are ever meshed.
    pub(crate) rendered: HashSet<ChunkCoord>,
    pub(crate) revs: RevisionTracker,
}

impl SchedState {
    /// Append unless already queued. Either way the chunk's revision moves
    /// on, so any mesh already in flight for it is stale.
    pub(crate) fn push_back(&mut self, coord: ChunkCoord) {
        self.revs.bump(coord);
        if !self.queue.contains(&coord) {
            self.queue.push_back(coord);
        }
    }

    /// Put `coord` at the head of the queue, moving it if already present.
    pub(crate) fn push_front(&mut self, coord: ChunkCoord) {
        self.revs.bump(coord);
        if let Some(i) = self.queue.iter().position(|c| *c == coord) {
            self.queue.remove(i);
        }
        self.queue.push_front(coord);
    }

    /// Next chunk to mesh along with the revision the mesh will carry.
    pub(crate) fn pop(&mut self) -> Option<(ChunkCoord, u64)> {
        let coord = self.queue.pop_front()?;
        Some((coord, self.revs.rev(coord)))
    }

    /// Drop `coord` from the queue if present.
    pub(crate) fn remove(&mut self, coord: ChunkCoord) {
        self.queue.retain(|c| *c != coord);
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub(crate) fn queue_snapshot(&self) -> Vec<ChunkCoord> {
        self.queue.iter().copied().collect()
    }
}

pub(crate) struct Shared {
    sched: Mutex<SchedState>,
    /// Work taken off a queue whose effects are not visible yet: a mesh
    /// being built, or modifications being applied.
    inflight: AtomicUsize,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            sched: Mutex::new(SchedState::default()),
            inflight: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub(crate) fn sched(&self) -> MutexGuard<'_, SchedState> {
        self.sched.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pop the next mesh job and count it in flight under the same lock.
    pub(crate) fn begin_mesh(&self) -> Option<(ChunkCoord, u64)> {
        let mut sched = self.sched();
        let job = sched.pop()?;
        self.inflight.fetch_add(1, Ordering::SeqCst);
        Some(job)
    }

    pub(crate) fn begin(&self) {
        self.inflight.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn finish(&self) {
        self.inflight.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn inflight(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }
}
