use std::collections::VecDeque;

use strata_blocks::{VoxelId, ids};
use strata_geom::VoxelPos;

use crate::noise::NoiseField;

/// A pending voxel write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelMod {
    pub pos: VoxelPos,
    pub id: VoxelId,
}

impl VoxelMod {
    #[inline]
    pub const fn new(pos: VoxelPos, id: VoxelId) -> Self {
        Self { pos, id }
    }
}

/// Writes produced by one placement event, applied in order.
pub type ModBatch = VecDeque<VoxelMod>;

const CROWN_RADIUS: i32 = 2;
const CROWN_LAYERS: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloraKind {
    Tree,
    Cactus,
}

impl FloraKind {
    pub fn from_index(i: usize) -> Option<FloraKind> {
        match i {
            0 => Some(FloraKind::Tree),
            1 => Some(FloraKind::Cactus),
            _ => None,
        }
    }

    pub fn generate(
        self,
        origin: VoxelPos,
        min_trunk: i32,
        max_trunk: i32,
        noise: &NoiseField,
    ) -> ModBatch {
        match self {
            FloraKind::Tree => tree(origin, min_trunk, max_trunk, noise),
            FloraKind::Cactus => cactus(origin, min_trunk, max_trunk, noise),
        }
    }
}

/// Shape for the flora kind at `kind` rooted on the surface voxel `origin`.
/// Unknown kinds produce nothing.
pub fn generate_flora(
    kind: usize,
    origin: VoxelPos,
    min_trunk: i32,
    max_trunk: i32,
    noise: &NoiseField,
) -> ModBatch {
    match FloraKind::from_index(kind) {
        Some(k) => k.generate(origin, min_trunk, max_trunk, noise),
        None => ModBatch::new(),
    }
}

fn trunk_height(
    origin: VoxelPos,
    min_trunk: i32,
    max_trunk: i32,
    offset: f32,
    scale: f32,
    noise: &NoiseField,
) -> i32 {
    let n = noise.sample2d(origin.x as f32, origin.z as f32, offset, scale);
    let h = (max_trunk as f32 * n).floor() as i32;
    h.max(min_trunk).min(max_trunk.max(min_trunk))
}

fn tree(origin: VoxelPos, min_trunk: i32, max_trunk: i32, noise: &NoiseField) -> ModBatch {
    let height = trunk_height(origin, min_trunk, max_trunk, 250.0, 3.0, noise);
    let mut out = ModBatch::new();
    for i in 1..height {
        out.push_back(VoxelMod::new(origin.offset(0, i, 0), ids::WOOD));
    }
    for dx in -CROWN_RADIUS..=CROWN_RADIUS {
        for dy in 0..CROWN_LAYERS {
            for dz in -CROWN_RADIUS..=CROWN_RADIUS {
                out.push_back(VoxelMod::new(
                    origin.offset(dx, height + dy, dz),
                    ids::LEAVES,
                ));
            }
        }
    }
    out
}

fn cactus(origin: VoxelPos, min_trunk: i32, max_trunk: i32, noise: &NoiseField) -> ModBatch {
    let height = trunk_height(origin, min_trunk, max_trunk, 23456.0, 2.0, noise);
    let mut out = ModBatch::new();
    for i in 1..height {
        out.push_back(VoxelMod::new(origin.offset(0, i, 0), ids::CACTUS_BODY));
    }
    out.push_back(VoxelMod::new(origin.offset(0, height, 0), ids::CACTUS_TOP));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise() -> NoiseField {
        NoiseField::new(9, 16)
    }

    #[test]
    fn unknown_kind_is_empty() {
        let n = noise();
        assert!(generate_flora(7, VoxelPos::new(3, 50, 3), 5, 12, &n).is_empty());
    }

    #[test]
    fn tree_has_trunk_then_five_by_three_by_five_crown() {
        let n = noise();
        let origin = VoxelPos::new(20, 60, 31);
        let batch = generate_flora(0, origin, 5, 12, &n);
        let wood: Vec<_> = batch.iter().filter(|m| m.id == ids::WOOD).collect();
        let leaves: Vec<_> = batch.iter().filter(|m| m.id == ids::LEAVES).collect();
        assert_eq!(leaves.len(), 75);
        let height = wood.len() as i32 + 1;
        assert!((5..=12).contains(&height), "{height}");
        // trunk first, bottom up, directly above the origin
        for (i, m) in wood.iter().enumerate() {
            assert_eq!(m.pos, origin.offset(0, i as i32 + 1, 0));
        }
        let min_leaf_y = leaves.iter().map(|m| m.pos.y).min().unwrap();
        let max_leaf_y = leaves.iter().map(|m| m.pos.y).max().unwrap();
        assert_eq!(min_leaf_y, origin.y + height);
        assert_eq!(max_leaf_y, origin.y + height + 2);
        assert!(leaves.iter().all(|m| (m.pos.x - origin.x).abs() <= 2 && (m.pos.z - origin.z).abs() <= 2));
    }

    #[test]
    fn cactus_is_capped_column() {
        let n = noise();
        let origin = VoxelPos::new(5, 44, 5);
        let batch = generate_flora(1, origin, 2, 5, &n);
        let top = batch.back().copied().unwrap();
        assert_eq!(top.id, ids::CACTUS_TOP);
        let height = top.pos.y - origin.y;
        assert!((2..=5).contains(&height));
        assert_eq!(batch.len() as i32, height);
        assert!(batch.iter().take(batch.len() - 1).all(|m| m.id == ids::CACTUS_BODY));
    }

    #[test]
    fn trunk_respects_inverted_bounds() {
        let n = noise();
        let h = trunk_height(VoxelPos::new(0, 0, 0), 6, 3, 250.0, 3.0, &n);
        assert_eq!(h, 6);
    }
}
