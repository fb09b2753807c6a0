//! Triangle meshes with an optional mesh-level BVH.

use crate::bvh::Bvh;
use crate::hittable::{HitQuery, Hittable, LocalHit};
use crate::triangle::Triangle;
use lucent_core::Mesh;
use lucent_math::{Aabb, Ray, Vec3};

/// A mesh ready for intersection in its local space.
///
/// Shared by every object and instance that references the same mesh.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    triangles: Vec<Triangle>,
    /// `None` when the mesh-level BVH is disabled; triangles are then
    /// scanned linearly.
    bvh: Option<Bvh>,
    bbox: Aabb,
}

impl TriangleMesh {
    pub fn new(mesh: &Mesh, use_bvh: bool) -> Self {
        let triangles: Vec<Triangle> = (0..mesh.triangles.len())
            .map(|i| Triangle::from_vertices(mesh.triangle(i)))
            .collect();

        let degenerate = triangles
            .iter()
            .filter(|t| t.normal() == Vec3::ZERO)
            .count();
        if degenerate > 0 {
            log::warn!("Mesh has {} zero-area triangles", degenerate);
        }

        let bvh = use_bvh.then(|| {
            let boxes: Vec<Aabb> = triangles.iter().map(|t| t.bounding_box()).collect();
            Bvh::build(&boxes)
        });

        Self {
            triangles,
            bvh,
            bbox: mesh.bounds,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn has_bvh(&self) -> bool {
        self.bvh.is_some()
    }

    fn hit_linear(&self, ray: &Ray, query: &HitQuery) -> Option<LocalHit> {
        let mut closest: Option<LocalHit> = None;
        for triangle in &self.triangles {
            if let Some(hit) = triangle.hit(ray, query) {
                if query.any_hit {
                    return Some(hit);
                }
                if closest.map_or(true, |c| hit.t < c.t) {
                    closest = Some(hit);
                }
            }
        }
        closest
    }
}

impl Hittable for TriangleMesh {
    fn hit(&self, ray: &Ray, query: &HitQuery) -> Option<LocalHit> {
        match &self.bvh {
            Some(bvh) => bvh.intersect(ray, query.ray_t, query.any_hit, &mut |item, ray_t| {
                self.triangles[item].hit(ray, &query.with_range(ray_t))
            }),
            None => self.hit_linear(ray, query),
        }
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
