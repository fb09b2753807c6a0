//! Sphere primitive for ray tracing.

use crate::hittable::{HitQuery, Hittable, LocalHit};
use lucent_math::{Aabb, Ray, Transform, Vec3};

/// Angular step used to probe the surface around a hit for the world normal.
const NORMAL_PROBE: f32 = 1e-2;

/// A sphere in its local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// World-space normal at the local hit `point` under `transform`.
    ///
    /// Four points around the hit are placed on the sphere along two
    /// tangents, mapped to world space, and the cross product of the two
    /// world chords gives the normal, so non-uniform scale cannot skew it.
    /// The chord orientation depends on the tangent pair and on mirroring;
    /// the sign is taken from `(M⁻¹)ᵗ` applied to the local normal, which
    /// always points out of the surface.
    pub fn world_normal(&self, point: Vec3, transform: &Transform) -> Vec3 {
        let outward = (point - self.center).normalize();
        let (tangent, bitangent) = outward.any_orthonormal_pair();

        let on_surface = |dir: Vec3| {
            transform.point_to_world(self.center + self.radius * dir.normalize())
        };
        let along_tangent = on_surface(outward + NORMAL_PROBE * tangent)
            - on_surface(outward - NORMAL_PROBE * tangent);
        let along_bitangent = on_surface(outward + NORMAL_PROBE * bitangent)
            - on_surface(outward - NORMAL_PROBE * bitangent);

        let normal = along_tangent.cross(along_bitangent).normalize();
        if normal.dot(transform.normal_to_world(outward)) < 0.0 {
            -normal
        } else {
            normal
        }
    }
}

impl Hittable for Sphere {
    /// Closed-form ray-sphere test; the nearer root wins unless it lies
    /// outside `ray_t`, in which case the farther one is tried.
    fn hit(&self, ray: &Ray, query: &HitQuery) -> Option<LocalHit> {
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(ray.direction);
        let b = 2.0 * oc.dot(ray.direction);
        let c = oc.dot(oc) - self.radius * self.radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant <= 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();
        let mut t = (-b - sqrtd) / (2.0 * a);
        if !query.ray_t.surrounds(t) {
            t = (-b + sqrtd) / (2.0 * a);
            if !query.ray_t.surrounds(t) {
                return None;
            }
        }

        let point = ray.at(t);
        Some(LocalHit {
            t,
            point,
            normal: (point - self.center) / self.radius,
        })
    }

    fn bounding_box(&self) -> Aabb {
        let r = Vec3::splat(self.radius.abs());
        Aabb::from_points(self.center - r, self.center + r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hittable::Culling;

    #[test]
    fn test_unit_sphere_head_on() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));

        let hit = sphere.hit(&ray, &HitQuery::closest()).expect("ray should hit");
        assert!((hit.t - 4.0).abs() < 1e-5, "t = {}", hit.t);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);

        let normal = sphere.world_normal(hit.point, &Transform::IDENTITY);
        assert!((normal - Vec3::Z).length() < 1e-4, "normal = {:?}", normal);
    }

    #[test]
    fn test_sphere_miss_and_tangent() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let miss = Ray::new(Vec3::new(0.0, 2.0, 5.0), -Vec3::Z);
        assert!(sphere.hit(&miss, &HitQuery::closest()).is_none());

        // Zero discriminant counts as a miss
        let grazing = Ray::new(Vec3::new(0.0, 1.0, 5.0), -Vec3::Z);
        assert!(sphere.hit(&grazing, &HitQuery::closest()).is_none());
    }

    #[test]
    fn test_hit_from_inside_uses_far_root() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let hit = sphere.hit(&ray, &HitQuery::closest()).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_ignores_culling() {
        // From inside, the far wall's outward normal points along the ray.
        let sphere = Sphere::new(Vec3::ZERO, 2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        for culling in [Culling::None, Culling::Back, Culling::Front] {
            let query = HitQuery::closest().with_culling(culling);
            let hit = sphere.hit(&ray, &query);
            assert!(hit.is_some(), "{:?} culled a sphere hit", culling);
        }
    }

    #[test]
    fn test_sphere_behind_ray() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        assert!(sphere.hit(&ray, &HitQuery::closest()).is_none());
    }

    #[test]
    fn test_shadow_range_excludes_far_hits() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        assert!(sphere.hit(&ray, &HitQuery::shadow(5.0)).is_none());
        assert!(sphere.hit(&ray, &HitQuery::shadow(20.0)).is_some());
    }

    #[test]
    fn test_world_normal_under_non_uniform_scale() {
        // Ellipsoid with semi-axes (2, 1, 1): at local (cos45, sin45, 0) the
        // world point is (√2, √2/2, 0) and the true normal is ∝ (x/4, y, 0).
        let transform = Transform::scaling(Vec3::new(2.0, 1.0, 1.0)).unwrap();
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let local = Vec3::new(1.0, 1.0, 0.0).normalize();

        let normal = sphere.world_normal(local, &transform);
        let world = transform.point_to_world(local);
        let expected = Vec3::new(world.x / 4.0, world.y, 0.0).normalize();
        assert!((normal - expected).length() < 1e-3, "{:?} vs {:?}", normal, expected);
    }

    #[test]
    fn test_world_normal_points_out_when_mirrored() {
        let transform = Transform::scaling(Vec3::new(-1.0, 1.0, 1.0)).unwrap();
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let normal = sphere.world_normal(Vec3::X, &transform);
        assert!((normal - (-Vec3::X)).length() < 1e-3, "normal = {:?}", normal);
    }
}
