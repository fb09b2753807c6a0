//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::hittable::{HitQuery, Hittable, LocalHit};
use lucent_math::{Aabb, Ray, Vec3};

/// Determinants inside `(-PARALLEL_EPSILON, PARALLEL_EPSILON)` mean the ray
/// runs parallel to the triangle's plane.
const PARALLEL_EPSILON: f32 = 1e-5;

/// A triangle in its local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Pre-computed face normal (unit length, by winding)
    normal: Vec3,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self { v0, v1, v2, normal }
    }

    pub fn from_vertices([v0, v1, v2]: [Vec3; 3]) -> Self {
        Self::new(v0, v1, v2)
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }
}

impl Hittable for Triangle {
    /// Möller-Trumbore ray-triangle intersection algorithm.
    ///
    /// Barycentric bounds are inclusive, so edges and vertices hit.
    fn hit(&self, ray: &Ray, query: &HitQuery) -> Option<LocalHit> {
        if query.culling.rejects(ray.direction, self.normal) {
            return None;
        }

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let ray_cross_e2 = ray.direction.cross(edge2);
        let det = edge1.dot(ray_cross_e2);

        if det > -PARALLEL_EPSILON && det < PARALLEL_EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self.v0;
        let u = inv_det * s.dot(ray_cross_e2);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let s_cross_e1 = s.cross(edge1);
        let v = inv_det * ray.direction.dot(s_cross_e1);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * edge2.dot(s_cross_e1);
        if !query.ray_t.surrounds(t) {
            return None;
        }

        Some(LocalHit {
            t,
            point: ray.at(t),
            normal: self.normal,
        })
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::enclosing([self.v0, self.v1, self.v2])
    }
}
