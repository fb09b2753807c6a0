//! Placed objects: a local-space shape under a transform, with motion blur.

use crate::hittable::{HitDistance, HitQuery, Hittable, LocalHit};
use crate::mesh::TriangleMesh;
use crate::sphere::Sphere;
use crate::triangle::Triangle;
use lucent_core::{Geometry, MaterialId, MeshId, Object};
use lucent_math::{Aabb, Ray, Transform, Vec3};

/// Index into [`crate::RenderScene::objects`].
pub type ObjectId = usize;

/// Local-space shape of a [`SceneObject`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    Triangle(Triangle),
    Mesh(MeshId),
    /// Shared mesh seen through an instance's resolved transform.
    Instance(MeshId),
}

/// Hit on an object, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldHit {
    /// Distance from the (motion-shifted) ray origin to the hit.
    pub t: f32,
    /// Unit world-space normal.
    pub normal: Vec3,
}

impl HitDistance for WorldHit {
    fn distance(&self) -> f32 {
        self.t
    }
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub shape: Shape,
    pub material: MaterialId,
    pub transform: Transform,
    pub motion_blur: Vec3,
    /// World bounds swept over the full motion vector.
    bbox: Aabb,
}

impl SceneObject {
    /// Build from a loaded object; `meshes` must hold every mesh it references.
    pub fn new(object: &Object, meshes: &[TriangleMesh]) -> Self {
        let shape = match &object.geometry {
            Geometry::Sphere { center, radius } => Shape::Sphere(Sphere::new(*center, *radius)),
            Geometry::Triangle { vertices } => Shape::Triangle(Triangle::from_vertices(*vertices)),
            Geometry::Mesh(id) => Shape::Mesh(*id),
            Geometry::Instance(id) => Shape::Instance(*id),
        };
        let local_bounds = match &shape {
            Shape::Sphere(sphere) => sphere.bounding_box(),
            Shape::Triangle(triangle) => triangle.bounding_box(),
            Shape::Mesh(id) | Shape::Instance(id) => meshes[*id].bounding_box(),
        };
        let bbox = object
            .transform
            .bounds_to_world(&local_bounds)
            .swept(object.motion_blur);

        Self {
            shape,
            material: object.material,
            transform: object.transform,
            motion_blur: object.motion_blur,
            bbox,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Intersect a world-space ray.
    ///
    /// The ray origin is shifted back by `motion_blur * ray.time`, mapped to
    /// local space with `M⁻¹`, tested there, and the hit is re-projected to
    /// world space to measure its distance. Mirroring transforms swap the
    /// culled face and negate triangle normals.
    pub fn hit(&self, ray: &Ray, query: &HitQuery, meshes: &[TriangleMesh]) -> Option<WorldHit> {
        let offset = self.motion_blur * ray.time;
        let local_ray = self.transform.ray_to_local(ray, offset);
        let flipped = self.transform.flips_handedness();
        let sign = if flipped { -1.0 } else { 1.0 };
        let mirrored = query.with_culling(query.culling.mirrored(flipped));

        let (local, normal) = match &self.shape {
            Shape::Sphere(sphere) => {
                let hit = sphere.hit(&local_ray, query)?;
                (hit, sphere.world_normal(hit.point, &self.transform))
            }
            Shape::Triangle(triangle) => {
                let hit = triangle.hit(&local_ray, &mirrored)?;
                (hit, sign * self.transform.normal_to_world(hit.normal))
            }
            Shape::Mesh(id) => {
                let hit = meshes[*id].hit(&local_ray, &mirrored)?;
                (hit, sign * self.transform.normal_to_world(hit.normal))
            }
            Shape::Instance(id) => {
                let hit = meshes[*id].hit(&local_ray, &mirrored)?;
                (hit, sign * self.instance_normal(&hit))
            }
        };

        let world_point = self.transform.point_to_world(local.point);
        Some(WorldHit {
            t: (world_point - (ray.origin - offset)).length(),
            normal,
        })
    }

    /// Normal from the forward-mapped hit point and hit point plus normal.
    fn instance_normal(&self, hit: &LocalHit) -> Vec3 {
        let base = self.transform.point_to_world(hit.point);
        let tip = self.transform.point_to_world(hit.point + hit.normal);
        (tip - base).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucent_core::Mesh;

    fn object(geometry: Geometry, transform: Transform, motion_blur: Vec3) -> Object {
        Object {
            geometry,
            material: 0,
            transform,
            motion_blur,
        }
    }

    fn unit_sphere() -> Geometry {
        Geometry::Sphere {
            center: Vec3::ZERO,
            radius: 1.0,
        }
    }

    fn quad_mesh() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_unit_sphere_hit() {
        let obj = SceneObject::new(&object(unit_sphere(), Transform::IDENTITY, Vec3::ZERO), &[]);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let hit = obj.hit(&ray, &HitQuery::closest(), &[]).unwrap();

        assert!((hit.t - 4.0).abs() < 1e-4, "t = {}", hit.t);
        assert!((hit.normal - Vec3::Z).length() < 1e-3, "normal = {:?}", hit.normal);
    }

    #[test]
    fn test_translated_and_scaled_sphere() {
        let transform = Transform::scaling(Vec3::splat(2.0))
            .unwrap()
            .then(&Transform::translation(Vec3::new(0.0, 0.0, -10.0)));
        let obj = SceneObject::new(&object(unit_sphere(), transform, Vec3::ZERO), &[]);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let hit = obj.hit(&ray, &HitQuery::closest(), &[]).unwrap();

        // Surface at z = -8.
        assert!((hit.t - 8.0).abs() < 1e-4, "t = {}", hit.t);
        assert!((hit.normal - Vec3::Z).length() < 1e-3);
    }

    #[test]
    fn test_world_distance_under_non_uniform_scale() {
        let transform = Transform::scaling(Vec3::new(1.0, 1.0, 3.0)).unwrap();
        let obj = SceneObject::new(&object(unit_sphere(), transform, Vec3::ZERO), &[]);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z);
        let hit = obj.hit(&ray, &HitQuery::closest(), &[]).unwrap();

        assert!((hit.t - 7.0).abs() < 1e-4, "t = {}", hit.t);
    }

    #[test]
    fn test_motion_blur_bounding_box_contains_both_poses() {
        let motion = Vec3::new(3.0, 0.0, -1.0);
        let obj = SceneObject::new(&object(unit_sphere(), Transform::IDENTITY, motion), &[]);

        let rest = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(obj.bounding_box().contains_box(&rest));
        assert!(obj.bounding_box().contains_box(&rest.translate(motion)));
    }

    #[test]
    fn test_motion_blur_shifts_hit_with_time() {
        let motion = Vec3::new(0.0, 0.0, -2.0);
        let obj = SceneObject::new(&object(unit_sphere(), Transform::IDENTITY, motion), &[]);
        let start = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let end = start.with_time(1.0);

        let t0 = obj.hit(&start, &HitQuery::closest(), &[]).unwrap().t;
        let t1 = obj.hit(&end, &HitQuery::closest(), &[]).unwrap().t;
        assert!((t0 - 4.0).abs() < 1e-4);
        assert!((t1 - 6.0).abs() < 1e-4, "t at time 1 = {}", t1);

        // A ray aimed at the end pose misses at the start of the exposure.
        let side = Ray::new(Vec3::new(0.0, 5.0, -2.5), -Vec3::Y);
        assert!(obj.hit(&side, &HitQuery::closest(), &[]).is_none());
        assert!(obj.hit(&side.with_time(1.0), &HitQuery::closest(), &[]).is_some());
    }

    #[test]
    fn test_mesh_and_instance_share_geometry() {
        let meshes = vec![TriangleMesh::new(&quad_mesh(), true)];
        let base = SceneObject::new(
            &object(Geometry::Mesh(0), Transform::IDENTITY, Vec3::ZERO),
            &meshes,
        );
        let instance = SceneObject::new(
            &object(
                Geometry::Instance(0),
                Transform::translation(Vec3::new(5.0, 0.0, 0.0)),
                Vec3::ZERO,
            ),
            &meshes,
        );

        let ray = Ray::new(Vec3::new(5.5, 0.5, 3.0), -Vec3::Z);
        assert!(base.hit(&ray, &HitQuery::closest(), &meshes).is_none());
        let hit = instance.hit(&ray, &HitQuery::closest(), &meshes).unwrap();
        assert!((hit.t - 3.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_mirrored_triangle_flips_normal_and_culling() {
        let vertices = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let mirror = Transform::scaling(Vec3::new(-1.0, 1.0, 1.0)).unwrap();
        let obj = SceneObject::new(
            &object(Geometry::Triangle { vertices }, mirror, Vec3::ZERO),
            &[],
        );

        // The winding now faces -Z in world space.
        let from_below = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);
        let hit = obj.hit(&from_below, &HitQuery::closest(), &[]).unwrap();
        assert!((hit.normal + Vec3::Z).length() < 1e-5, "normal = {:?}", hit.normal);

        let from_above = Ray::new(Vec3::new(0.0, 0.0, 3.0), -Vec3::Z);
        assert!(obj.hit(&from_above, &HitQuery::closest(), &[]).is_none());
    }
}
