//! Deferred voxel modifications, edit neighborhoods, and mesh revisions.
#![forbid(unsafe_code)]

mod queue;

pub use queue::{ModReceiver, ModSender, mod_channel};

use hashbrown::HashMap;
use strata_geom::VoxelPos;
use strata_world::ChunkCoord;

/// Chunks whose mesh can change when the voxel at `pos` changes: the owner
/// first, then every chunk sharing a face with it at that voxel.
pub fn affected_chunks(pos: VoxelPos, width: usize) -> Vec<ChunkCoord> {
    let w = width as i32;
    let owner = ChunkCoord::from_voxel(pos.x, pos.z, width);
    let lx = pos.x.rem_euclid(w);
    let lz = pos.z.rem_euclid(w);

    let mut affected = vec![owner];

    let mut offsets_x = vec![0];
    let mut offsets_z = vec![0];
    if lx == 0 {
        offsets_x.push(-1);
    }
    if lx == w - 1 {
        offsets_x.push(1);
    }
    if lz == 0 {
        offsets_z.push(-1);
    }
    if lz == w - 1 {
        offsets_z.push(1);
    }

    // Only face neighbors: a corner voxel touches two chunks, never the diagonal.
    for dx in &offsets_x {
        for dz in &offsets_z {
            if (*dx == 0) == (*dz == 0) {
                continue;
            }
            let key = owner.offset(*dx, *dz);
            if !affected.contains(&key) {
                affected.push(key);
            }
        }
    }
    affected
}

/// Change stamps per chunk, so a finished mesh built from stale data can be
/// recognised and dropped.
#[derive(Default, Debug)]
pub struct RevisionTracker {
    rev: HashMap<ChunkCoord, u64>,
    counter: u64,
}

impl RevisionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change to `coord`; returns the new stamp.
    pub fn bump(&mut self, coord: ChunkCoord) -> u64 {
        self.counter = self.counter.wrapping_add(1).max(1);
        self.rev.insert(coord, self.counter);
        self.counter
    }

    pub fn rev(&self, coord: ChunkCoord) -> u64 {
        self.rev.get(&coord).copied().unwrap_or(0)
    }

    /// True when `rev` was handed out before the latest change to `coord`.
    #[inline]
    pub fn is_stale(&self, coord: ChunkCoord, rev: u64) -> bool {
        rev < self.rev(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const W: usize = 16;

    #[test]
    fn edit_on_negative_x_face_touches_west_neighbor() {
        let mut affected = affected_chunks(VoxelPos::new(32, 40, 37), W);
        assert_eq!(affected[0], ChunkCoord::new(2, 2));
        affected.sort();
        assert_eq!(affected, vec![ChunkCoord::new(1, 2), ChunkCoord::new(2, 2)]);
    }

    #[test]
    fn corner_edit_touches_both_face_neighbors_only() {
        let mut affected = affected_chunks(VoxelPos::new(47, 10, 16), W);
        assert_eq!(affected[0], ChunkCoord::new(2, 1));
        affected.sort();
        assert_eq!(
            affected,
            vec![ChunkCoord::new(2, 0), ChunkCoord::new(2, 1), ChunkCoord::new(3, 1)]
        );
    }

    #[test]
    fn interior_edit_touches_owner_only() {
        assert_eq!(affected_chunks(VoxelPos::new(5, 3, 9), W), vec![ChunkCoord::new(0, 0)]);
    }

    #[test]
    fn older_revisions_are_stale() {
        let mut revs = RevisionTracker::new();
        let c = ChunkCoord::new(3, -1);
        assert_eq!(revs.rev(c), 0);
        assert!(!revs.is_stale(c, 0));
        let r1 = revs.bump(c);
        assert!(!revs.is_stale(c, r1));
        let r2 = revs.bump(c);
        assert!(r2 > r1);
        assert!(revs.is_stale(c, r1));
        assert!(!revs.is_stale(c, r2));
        // stamps are global, so another chunk's bump leaves `c` current
        revs.bump(ChunkCoord::new(0, 0));
        assert!(!revs.is_stale(c, r2));
    }

    proptest! {
        // Owner always first, never duplicated, at most three chunks, all adjacent
        #[test]
        fn affected_set_shape(x in -500i32..500, y in 0i32..128, z in -500i32..500) {
            let pos = VoxelPos::new(x, y, z);
            let affected = affected_chunks(pos, W);
            let owner = ChunkCoord::from_voxel(x, z, W);
            prop_assert_eq!(affected[0], owner);
            prop_assert!(affected.len() <= 3);
            for (i, a) in affected.iter().enumerate() {
                prop_assert!(owner.chebyshev(*a) <= 1);
                prop_assert!(!affected[i + 1..].contains(a));
            }
        }
    }
}
