//! Chunk activation, creation and mesh queues, and the background worker.
#![forbid(unsafe_code)]

mod sched;
mod worker;

pub use worker::MeshJobOut;

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, unbounded};
use hashbrown::{HashMap, HashSet};
use strata_blocks::{BlockRegistry, VoxelId, ids};
use strata_chunk::{ChunkHandle, ChunkPersistence, WorldData, WorldMeta};
use strata_edit::{ModReceiver, affected_chunks, mod_channel};
use strata_geom::{Vec3, VoxelPos};
use strata_mesh_cpu::MeshBuffers;
use strata_world::{ChunkCoord, TerrainGen, WorldConfig, WorldGenError, WorldSettings};
use thiserror::Error;

use crate::sched::Shared;
use crate::worker::{MeshCtx, run_worker};

/// Render-side record for a created chunk. It keeps a handle to the
/// registry's data so the mesh can be rebuilt after `release_mesh`.
pub struct Chunk {
    pub coord: ChunkCoord,
    pub data: ChunkHandle,
    pub mesh: Option<Arc<MeshBuffers>>,
    pub built_rev: u64,
}

enum Slot {
    Queued,
    Ready(Chunk),
}

/// One update for the render surface. `mesh == None` means drop whatever
/// geometry is held for `coord`.
#[derive(Clone, Debug)]
pub struct DrawItem {
    pub coord: ChunkCoord,
    pub mesh: Option<Arc<MeshBuffers>>,
    pub active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditOutcome {
    pub previous: VoxelId,
    /// The removed block when a solid voxel was mined out to air.
    pub mined: Option<VoxelId>,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditRejected {
    #[error("position {0:?} is outside the world")]
    OutOfBounds(VoxelPos),
    #[error("bedrock at {0:?} cannot be changed")]
    Bedrock(VoxelPos),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DebugReadout {
    pub observer_chunk: Option<ChunkCoord>,
    pub pending_creation: usize,
    pub pending_meshes: usize,
    pub pending_mods: usize,
    pub active_chunks: usize,
    pub loaded_chunks: usize,
    pub dirty_chunks: usize,
}

pub struct WorldRuntime {
    settings: WorldSettings,
    world: Arc<WorldData>,
    shared: Arc<Shared>,
    ctx: MeshCtx,
    res_rx: Receiver<MeshJobOut>,
    slots: HashMap<ChunkCoord, Slot>,
    creation: VecDeque<ChunkCoord>,
    draw: VecDeque<DrawItem>,
    desired: HashSet<ChunkCoord>,
    observer_chunk: Option<ChunkCoord>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl WorldRuntime {
    /// `mods` must be the receiving end of the queue `world` sends flora on.
    pub fn new(
        settings: WorldSettings,
        world: Arc<WorldData>,
        reg: Arc<BlockRegistry>,
        mods: ModReceiver,
    ) -> Self {
        let (tx, res_rx) = unbounded::<MeshJobOut>();
        let shared = Arc::new(Shared::new());
        let ctx = MeshCtx {
            world: Arc::clone(&world),
            reg,
            shared: Arc::clone(&shared),
            mods,
            tx,
            atlas_per_row: settings.atlas_blocks_per_row,
        };
        Self {
            settings,
            world,
            shared,
            ctx,
            res_rx,
            slots: HashMap::new(),
            creation: VecDeque::new(),
            draw: VecDeque::new(),
            desired: HashSet::new(),
            observer_chunk: None,
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Wire a terrain generator, registry and modification queue together
    /// for `meta`. The metadata seed wins over the configured one so a
    /// reloaded world regenerates the same terrain.
    pub fn open(
        config: &WorldConfig,
        meta: WorldMeta,
        store: Arc<dyn ChunkPersistence>,
        reg: Arc<BlockRegistry>,
    ) -> Result<Self, WorldGenError> {
        let terrain = TerrainGen::new(
            config.terrain.clone(),
            config.biomes.clone(),
            config.dims(),
            meta.seed,
        )?;
        let (tx, rx) = mod_channel();
        let world = Arc::new(WorldData::new(meta, Arc::new(terrain), store, tx));
        Ok(Self::new(config.world.clone(), world, reg, rx))
    }

    pub fn world(&self) -> &Arc<WorldData> {
        &self.world
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Centre of the world, fifty voxels below the ceiling.
    pub fn spawn_position(&self) -> Vec3 {
        let dims = self.world.dims();
        let mid = dims.world_voxels() as f32 / 2.0;
        Vec3::new(mid, dims.chunk_height as f32 - 50.0, mid)
    }

    fn chunk_at(&self, pos: Vec3) -> ChunkCoord {
        let p = pos.floor();
        ChunkCoord::from_voxel(p.x, p.z, self.world.dims().chunk_width)
    }

    /// Preload chunk data around `spawn`, run the first view sweep, and
    /// start the worker when multithreading is on.
    pub fn start(&mut self, spawn: Vec3) -> io::Result<()> {
        let centre = self.chunk_at(spawn);
        let r = self.settings.load_distance.max(0);
        let mut loaded = 0usize;
        for cx in centre.cx - r..=centre.cx + r {
            for cz in centre.cz - r..=centre.cz + r {
                if self.world.request_chunk(ChunkCoord::new(cx, cz), true).is_some() {
                    loaded += 1;
                }
            }
        }
        log::info!(
            "preloaded {} chunk(s) around ({}, {})",
            loaded,
            centre.cx,
            centre.cz
        );
        self.sweep(centre);
        if self.settings.multithreading && self.worker.is_none() {
            let ctx = self.ctx.clone();
            let cancel = Arc::clone(&self.cancel);
            let handle = thread::Builder::new()
                .name("strata-worker".into())
                .spawn(move || run_worker(ctx, cancel))?;
            self.worker = Some(handle);
        }
        Ok(())
    }

    /// One foreground tick.
    pub fn update(&mut self, observer: Vec3) {
        let oc = self.chunk_at(observer);
        if self.observer_chunk != Some(oc) {
            self.sweep(oc);
        }
        self.create_next();
        if self.worker.is_none() {
            self.ctx.apply_modifications();
            self.ctx.build_next_mesh();
        } else {
            self.wake_worker();
        }
        self.drain_results();
    }

    fn wake_worker(&self) {
        if let Some(h) = &self.worker {
            h.thread().unpark();
        }
    }

    /// Recompute the desired square around `centre`, queue missing chunks
    /// for creation, and flip activation on the rest.
    fn sweep(&mut self, centre: ChunkCoord) {
        let dims = self.world.dims();
        let r = self.settings.view_distance.max(0);
        let mut desired = HashSet::new();
        for cx in centre.cx - r..=centre.cx + r {
            for cz in centre.cz - r..=centre.cz + r {
                let coord = ChunkCoord::new(cx, cz);
                if dims.chunk_in_bounds(coord) {
                    desired.insert(coord);
                }
            }
        }

        let previous = std::mem::take(&mut self.desired);
        let mut queued = 0usize;
        // Walk outward so the nearest chunks are created first.
        let mut order: Vec<ChunkCoord> = desired.iter().copied().collect();
        order.sort_by_key(|c| (c.chebyshev(centre), c.cx, c.cz));
        for coord in order {
            let ready = self.slots.get(&coord).map(|s| matches!(s, Slot::Ready(_)));
            match ready {
                None => {
                    self.slots.insert(coord, Slot::Queued);
                    self.creation.push_back(coord);
                    queued += 1;
                }
                Some(false) => {}
                Some(true) => self.set_active(coord, true),
            }
        }
        for coord in previous.difference(&desired) {
            if matches!(self.slots.get(coord), Some(Slot::Ready(_))) {
                self.set_active(*coord, false);
            }
        }
        log::debug!(
            "view sweep at ({}, {}): {} desired, {} queued for creation",
            centre.cx,
            centre.cz,
            desired.len(),
            queued
        );
        self.desired = desired;
        self.observer_chunk = Some(centre);
    }

    fn set_active(&mut self, coord: ChunkCoord, active: bool) {
        let Some(Slot::Ready(chunk)) = self.slots.get(&coord) else {
            return;
        };
        let mesh = chunk.mesh.clone();
        let mut sched = self.shared.sched();
        let changed = if active {
            sched.active.insert(coord)
        } else {
            sched.active.remove(&coord)
        };
        if active && mesh.is_none() {
            sched.push_back(coord);
        }
        drop(sched);
        if changed && mesh.is_some() {
            self.draw.push_back(DrawItem {
                coord,
                mesh,
                active,
            });
        }
    }

    /// Turn the oldest creation request into a render chunk.
    fn create_next(&mut self) {
        let Some(coord) = self.creation.pop_front() else {
            return;
        };
        let Some(data) = self.world.request_chunk(coord, true) else {
            self.slots.remove(&coord);
            return;
        };
        self.slots.insert(
            coord,
            Slot::Ready(Chunk {
                coord,
                data,
                mesh: None,
                built_rev: 0,
            }),
        );
        let mut sched = self.shared.sched();
        sched.rendered.insert(coord);
        if self.desired.contains(&coord) {
            sched.active.insert(coord);
        }
        sched.push_back(coord);
    }

    /// Move finished meshes into their chunk records and onto the draw
    /// queue. Results older than the chunk's latest revision are dropped;
    /// a newer build is already queued or running.
    fn drain_results(&mut self) {
        let results: Vec<MeshJobOut> = self.res_rx.try_iter().collect();
        for out in results {
            let mut sched = self.shared.sched();
            if sched.revs.is_stale(out.coord, out.rev) {
                log::trace!(
                    "dropping stale mesh for ({}, {}) rev {}",
                    out.coord.cx,
                    out.coord.cz,
                    out.rev
                );
                continue;
            }
            let active = sched.active.contains(&out.coord);
            drop(sched);
            let Some(Slot::Ready(chunk)) = self.slots.get_mut(&out.coord) else {
                continue;
            };
            chunk.mesh = Some(Arc::clone(&out.mesh));
            chunk.built_rev = out.rev;
            log::trace!(
                "mesh ready for ({}, {}): {} faces in {} ms",
                out.coord.cx,
                out.coord.cz,
                out.mesh.face_count(),
                out.t_mesh_ms
            );
            self.draw.push_back(DrawItem {
                coord: out.coord,
                mesh: Some(out.mesh),
                active,
            });
        }
    }

    /// Player edit: write through the registry and move the owning chunk,
    /// then its affected neighbors, to the head of the mesh queue.
    pub fn edit_voxel(&mut self, pos: VoxelPos, id: VoxelId) -> Result<EditOutcome, EditRejected> {
        if !self.world.in_bounds(pos) {
            return Err(EditRejected::OutOfBounds(pos));
        }
        if pos.y == 0 || self.world.get_voxel(pos) == ids::BEDROCK {
            return Err(EditRejected::Bedrock(pos));
        }
        let previous = self
            .world
            .set_voxel(pos, id)
            .ok_or(EditRejected::OutOfBounds(pos))?;
        let affected = affected_chunks(pos, self.world.dims().chunk_width);
        let mut sched = self.shared.sched();
        // Neighbors first so the owner ends up at the very front.
        for c in affected.iter().skip(1).chain(affected.first()) {
            if sched.rendered.contains(c) {
                sched.push_front(*c);
            }
        }
        drop(sched);
        self.wake_worker();
        let mined = (previous != ids::AIR && id == ids::AIR).then_some(previous);
        log::debug!("edit at {:?}: {} -> {}", pos, previous, id);
        Ok(EditOutcome { previous, mined })
    }

    pub fn drain_draw_queue(&mut self) -> Vec<DrawItem> {
        self.draw.drain(..).collect()
    }

    pub fn is_active(&self, coord: ChunkCoord) -> bool {
        self.shared.sched().active.contains(&coord)
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        match self.slots.get(&coord) {
            Some(Slot::Ready(c)) => Some(c),
            _ => None,
        }
    }

    /// Drop a chunk's render mesh; it is rebuilt the next time the chunk
    /// becomes active.
    pub fn release_mesh(&mut self, coord: ChunkCoord) {
        let Some(Slot::Ready(chunk)) = self.slots.get_mut(&coord) else {
            return;
        };
        if chunk.mesh.take().is_none() {
            return;
        }
        chunk.built_rev = 0;
        let mut sched = self.shared.sched();
        // A queued or in-flight build would re-attach a mesh; cancel the one
        // and make the other stale.
        sched.remove(coord);
        sched.revs.bump(coord);
        // Going inactive lets the next sweep reactivate and requeue it.
        sched.active.remove(&coord);
        drop(sched);
        self.desired.remove(&coord);
        self.draw.push_back(DrawItem {
            coord,
            mesh: None,
            active: false,
        });
    }

    pub fn debug_readout(&self) -> DebugReadout {
        let sched = self.shared.sched();
        DebugReadout {
            observer_chunk: self.observer_chunk,
            pending_creation: self.creation.len(),
            pending_meshes: sched.queued(),
            pending_mods: self.ctx.mods.pending(),
            active_chunks: sched.active.len(),
            loaded_chunks: self.world.chunk_count(),
            dirty_chunks: self.world.dirty_count(),
        }
    }

    /// True once nothing is waiting: no creation, meshing or modification
    /// work, and every active chunk has a mesh.
    pub fn is_idle(&self) -> bool {
        // Order matters: a drained batch or popped job is counted in flight
        // before it leaves its queue, and sent before it stops counting.
        if !self.creation.is_empty() || self.ctx.mods.pending() > 0 {
            return false;
        }
        let sched = self.shared.sched();
        if sched.queued() > 0 || self.shared.inflight() > 0 || !self.res_rx.is_empty() {
            return false;
        }
        sched
            .active
            .iter()
            .all(|c| self.chunk(*c).is_some_and(|ch| ch.mesh.is_some()))
    }

    /// Stop and join the worker. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.cancel.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                log::error!("mesh worker panicked");
            }
        }
    }

    pub fn worker_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for WorldRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
