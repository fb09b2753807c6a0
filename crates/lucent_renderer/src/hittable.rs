//! Hittable trait and hit records for local-space shapes.

use lucent_math::{Aabb, Interval, Ray, Vec3};

/// Which triangle faces a query ignores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Culling {
    /// Hit both faces.
    None,
    /// Skip faces whose normal points along the ray.
    Back,
    /// Skip faces whose normal points against the ray. Used when an odd
    /// number of mirroring scales has reversed the winding.
    Front,
}

impl Culling {
    /// The same culling as seen through a handedness-flipping transform.
    pub fn mirrored(self, flip: bool) -> Culling {
        match (self, flip) {
            (Culling::Back, true) => Culling::Front,
            (Culling::Front, true) => Culling::Back,
            (culling, _) => culling,
        }
    }

    /// True when a face with `normal` must be skipped for `direction`.
    #[inline]
    pub fn rejects(self, direction: Vec3, normal: Vec3) -> bool {
        match self {
            Culling::None => false,
            Culling::Back => direction.dot(normal) > 0.0,
            Culling::Front => direction.dot(normal) < 0.0,
        }
    }
}

/// Parameters shared by every intersection test of one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitQuery {
    /// Accepted ray parameters; primitives require `ray_t.min < t < ray_t.max`.
    pub ray_t: Interval,
    /// Face culling for triangles and triangle meshes; spheres ignore it.
    pub culling: Culling,
    /// Stop at the first hit found instead of the nearest one.
    pub any_hit: bool,
}

impl HitQuery {
    /// Nearest hit with back-face culling, as used for camera and reflection rays.
    pub fn closest() -> Self {
        Self {
            ray_t: Interval::ray(f32::INFINITY),
            culling: Culling::Back,
            any_hit: false,
        }
    }

    /// Any occluder closer than `t_max`, both faces.
    pub fn shadow(t_max: f32) -> Self {
        Self {
            ray_t: Interval::ray(t_max),
            culling: Culling::None,
            any_hit: true,
        }
    }

    pub fn with_culling(mut self, culling: Culling) -> Self {
        self.culling = culling;
        self
    }

    pub fn with_range(mut self, ray_t: Interval) -> Self {
        self.ray_t = ray_t;
        self
    }
}

/// Record of an intersection in the shape's own space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalHit {
    /// Ray parameter of the hit.
    pub t: f32,
    /// Hit point in local space.
    pub point: Vec3,
    /// Unit geometric normal in local space (outward for spheres, by winding
    /// for triangles).
    pub normal: Vec3,
}

/// Anything with a distance along the ray; lets the BVH pick the nearer of
/// two hits without knowing what they carry.
pub trait HitDistance {
    fn distance(&self) -> f32;
}

impl HitDistance for LocalHit {
    fn distance(&self) -> f32 {
        self.t
    }
}

/// Nearer of two optional hits; ties go to `b`.
pub fn nearer<H: HitDistance>(a: Option<H>, b: Option<H>) -> Option<H> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if a.distance() < b.distance() {
                Some(a)
            } else {
                Some(b)
            }
        }
        (a, None) => a,
        (None, b) => b,
    }
}

/// Trait for shapes that can be hit by rays in their local space.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this shape within `query.ray_t`.
    fn hit(&self, ray: &Ray, query: &HitQuery) -> Option<LocalHit>;

    /// Local-space axis-aligned bounding box.
    fn bounding_box(&self) -> Aabb;
}
