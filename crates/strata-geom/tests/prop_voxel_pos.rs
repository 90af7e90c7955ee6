use strata_geom::{Vec3, VoxelPos};
use proptest::prelude::*;

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn small_i32() -> impl Strategy<Value = i32> {
    -100_000i32..=100_000
}

fn frac() -> impl Strategy<Value = f32> {
    0.0f32..0.99
}

#[test]
fn vec3_add_sub_mul() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    let b = Vec3::new(-4.0, 5.0, -6.0);
    let c = a + b;
    assert!(approx_eq(c.x, -3.0, 1e-6) && approx_eq(c.y, 7.0, 1e-6) && approx_eq(c.z, -3.0, 1e-6));
    let d = (c - a) * 2.0;
    assert!(approx_eq(d.x, -8.0, 1e-6) && approx_eq(d.y, 10.0, 1e-6) && approx_eq(d.z, -12.0, 1e-6));
}

proptest! {
    // Any point inside a unit cell floors back to that cell
    #[test]
    fn floor_stays_in_cell(x in small_i32(), y in small_i32(), z in small_i32(),
                           fx in frac(), fy in frac(), fz in frac()) {
        let p = VoxelPos::new(x, y, z);
        let inside = p.to_vec3() + Vec3::new(fx, fy, fz);
        prop_assert_eq!(inside.floor(), p);
    }

    // offset composes additively and converts through tuples unchanged
    #[test]
    fn offset_and_tuple_roundtrip(x in small_i32(), y in small_i32(), z in small_i32(),
                                  dx in -64i32..=64, dz in -64i32..=64) {
        let p = VoxelPos::new(x, y, z);
        let q = p.offset(dx, 0, dz).offset(-dx, 0, -dz);
        prop_assert_eq!(q, p);
        let t: (i32, i32, i32) = p.into();
        prop_assert_eq!(VoxelPos::from(t), p);
    }
}
