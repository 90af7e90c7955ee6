use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use strata_blocks::BlockRegistry;
use strata_chunk::{WorldData, read_chunk};
use strata_edit::{ModReceiver, affected_chunks};
use strata_mesh_cpu::{MeshBuffers, build_chunk_mesh};
use strata_world::ChunkCoord;

use crate::sched::Shared;

pub(crate) const IDLE_PARK: Duration = Duration::from_millis(2);

pub struct MeshJobOut {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub mesh: Arc<MeshBuffers>,
    pub t_mesh_ms: u32,
}

/// Everything the meshing side needs, cloned into the worker thread.
#[derive(Clone)]
pub(crate) struct MeshCtx {
    pub world: Arc<WorldData>,
    pub reg: Arc<BlockRegistry>,
    pub shared: Arc<Shared>,
    pub mods: ModReceiver,
    pub tx: Sender<MeshJobOut>,
    pub atlas_per_row: u32,
}

impl MeshCtx {
    /// Apply every queued batch in order, then re-queue the render chunks
    /// the writes touched, including face neighbors across chunk edges.
    /// Returns the number of batches applied.
    pub(crate) fn apply_modifications(&self) -> usize {
        if self.mods.pending() == 0 {
            return 0;
        }
        self.shared.begin();
        let applied = self.apply_pending();
        self.shared.finish();
        applied
    }

    fn apply_pending(&self) -> usize {
        let batches = self.mods.drain();
        if batches.is_empty() {
            return 0;
        }
        let width = self.world.dims().chunk_width;
        let mut touched: Vec<ChunkCoord> = Vec::new();
        for batch in &batches {
            for m in batch {
                if self.world.set_voxel(m.pos, m.id).is_none() {
                    continue;
                }
                for c in affected_chunks(m.pos, width) {
                    if !touched.contains(&c) {
                        touched.push(c);
                    }
                }
            }
        }
        let mut sched = self.shared.sched();
        let mut requeued = 0usize;
        for c in touched {
            if sched.rendered.contains(&c) {
                sched.push_back(c);
                requeued += 1;
            }
        }
        drop(sched);
        log::debug!(
            "applied {} modification batch(es); re-queued {} chunk(s)",
            batches.len(),
            requeued
        );
        batches.len()
    }

    /// Mesh the head of the queue and send the result. Returns false when
    /// the queue was empty.
    pub(crate) fn build_next_mesh(&self) -> bool {
        let Some((coord, rev)) = self.shared.begin_mesh() else {
            return false;
        };
        self.mesh_one(coord, rev);
        self.shared.finish();
        true
    }

    fn mesh_one(&self, coord: ChunkCoord, rev: u64) {
        let Some(handle) = self.world.request_chunk(coord, false) else {
            log::warn!("queued chunk ({}, {}) has no data", coord.cx, coord.cz);
            return;
        };
        let t0 = Instant::now();
        let mesh = {
            let chunk = read_chunk(&handle);
            build_chunk_mesh(&chunk, &self.reg, self.world.as_ref(), self.atlas_per_row)
        };
        let t_mesh_ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
        let _ = self.tx.send(MeshJobOut {
            coord,
            rev,
            mesh: Arc::new(mesh),
            t_mesh_ms,
        });
    }
}

/// Background loop: modifications first, then one mesh, otherwise park
/// briefly. The cancel flag is checked once per iteration with no lock held.
pub(crate) fn run_worker(ctx: MeshCtx, cancel: Arc<AtomicBool>) {
    log::debug!("worker started");
    while !cancel.load(Ordering::Acquire) {
        let applied = ctx.apply_modifications();
        let built = ctx.build_next_mesh();
        if applied == 0 && !built {
            thread::park_timeout(IDLE_PARK);
        }
    }
    log::debug!("worker stopped");
}
