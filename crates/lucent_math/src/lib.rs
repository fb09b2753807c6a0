// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::{Interval, HIT_EPSILON};
pub use ray::Ray;
pub use transform::{Mat4Ext, Transform};

/// RGB triple in linear radiance units.
pub type Color = Vec3;

/// Component selector shared by the BVH split and the slab test.
#[inline]
pub fn axis_component(v: Vec3, axis: usize) -> f32 {
    match axis {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}
