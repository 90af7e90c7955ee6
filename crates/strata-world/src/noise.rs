use fastnoise_lite::{FastNoiseLite, NoiseType};

/// Returned by every 2D sample whose scale would collapse the field.
pub const FLAT_SAMPLE: f32 = 0.5;

/// Seeded coherent noise addressed in voxel units.
///
/// Positions are nudged by a tenth of a voxel and divided by the cell size
/// (the chunk width) before scaling, so integer voxel coordinates never land
/// on lattice points where gradient noise is always zero. The sampler has no
/// interior state: equal inputs give equal outputs on any thread.
pub struct NoiseField {
    noise: FastNoiseLite,
    cell: f32,
}

impl NoiseField {
    pub fn new(seed: i32, cell: usize) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(1.0));
        Self {
            noise,
            cell: cell.max(1) as f32,
        }
    }

    #[inline]
    fn scaled(&self, p: f32, offset: f32, scale: f32) -> f32 {
        (p + 0.1) / self.cell * scale + offset
    }

    /// 2D sample in `[0, 1]`.
    pub fn sample2d(&self, x: f32, z: f32, offset: f32, scale: f32) -> f32 {
        if scale == 0.0 || !scale.is_finite() {
            return FLAT_SAMPLE;
        }
        let n = self.noise.get_noise_2d(
            self.scaled(x, offset, scale),
            self.scaled(z, offset, scale),
        );
        ((n + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// 3D sample in `[0, 1]` compared against `threshold`.
    pub fn sample3d(&self, x: f32, y: f32, z: f32, offset: f32, scale: f32, threshold: f32) -> bool {
        if scale == 0.0 || !scale.is_finite() {
            return FLAT_SAMPLE > threshold;
        }
        let n = self.noise.get_noise_3d(
            self.scaled(x, offset, scale),
            self.scaled(y, offset, scale),
            self.scaled(z, offset, scale),
        );
        ((n + 1.0) * 0.5).clamp(0.0, 1.0) > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_scale_is_flat() {
        let n = NoiseField::new(7, 16);
        assert_eq!(n.sample2d(3.0, 9.0, 100.0, 0.0), FLAT_SAMPLE);
        assert_eq!(n.sample2d(-300.0, 12.0, 0.0, 0.0), FLAT_SAMPLE);
        assert!(n.sample3d(1.0, 2.0, 3.0, 0.0, 0.0, 0.4));
        assert!(!n.sample3d(1.0, 2.0, 3.0, 0.0, 0.0, 0.5));
    }

    #[test]
    fn samples_stay_in_unit_range() {
        let n = NoiseField::new(1337, 16);
        for x in -40..40 {
            for z in -40..40 {
                let v = n.sample2d(x as f32, z as f32, 1234.0, 0.7);
                assert!((0.0..=1.0).contains(&v), "{v}");
            }
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = NoiseField::new(42, 16);
        let b = NoiseField::new(42, 16);
        for i in 0..200 {
            let x = i as f32 * 1.7;
            let z = i as f32 * -0.3;
            assert_eq!(a.sample2d(x, z, 5.0, 0.15), b.sample2d(x, z, 5.0, 0.15));
            assert_eq!(
                a.sample3d(x, 10.0, z, 5.0, 0.2, 0.5),
                b.sample3d(x, 10.0, z, 5.0, 0.2, 0.5)
            );
        }
    }
}
