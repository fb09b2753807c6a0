use crate::{UVec2, Vec2, Vec3};

/// A ray with a normalized direction and the sample state it was spawned with.
///
/// Secondary rays inherit `time`, `pixel`, `jitter` and `light_sample` from the
/// camera ray through [`Ray::spawn`], so motion blur and area-light sampling
/// stay consistent along a whole path.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Sample time in `[0, 1]`, scales motion-blur vectors.
    pub time: f32,
    /// Pixel this ray was generated for.
    pub pixel: UVec2,
    /// Sub-pixel offset in `[0, 1)²`; the pixel filter weighs by it.
    pub jitter: Vec2,
    /// Position on the unit square used to pick a point on area lights.
    pub light_sample: Vec2,
}

impl Ray {
    /// Create a ray at time zero. `direction` is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            time: 0.0,
            pixel: UVec2::ZERO,
            jitter: Vec2::splat(0.5),
            light_sample: Vec2::splat(0.5),
        }
    }

    pub fn with_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    pub fn with_pixel(mut self, pixel: UVec2, jitter: Vec2) -> Self {
        self.pixel = pixel;
        self.jitter = jitter;
        self
    }

    pub fn with_light_sample(mut self, light_sample: Vec2) -> Self {
        self.light_sample = light_sample;
        self
    }

    /// A secondary ray carrying this ray's sample state.
    pub fn spawn(&self, origin: Vec3, direction: Vec3) -> Ray {
        Ray {
            origin,
            direction: direction.normalize(),
            ..*self
        }
    }

    /// Point along the ray at parameter t: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
