//! The scene as the tracer sees it: built shapes, meshes and the BVH.

use lucent_core::{Camera, Light, Material, Scene};
use lucent_math::{Aabb, Color, Ray, Vec3};

use crate::bvh::Bvh;
use crate::config::AccelerationConfig;
use crate::hittable::{nearer, HitDistance, HitQuery};
use crate::mesh::TriangleMesh;
use crate::object::{ObjectId, SceneObject, WorldHit};

/// Nearest hit in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    pub object: ObjectId,
    pub t: f32,
    /// Unit world-space normal.
    pub normal: Vec3,
}

impl SceneHit {
    fn new(object: ObjectId, hit: WorldHit) -> Self {
        Self {
            object,
            t: hit.t,
            normal: hit.normal,
        }
    }
}

impl HitDistance for SceneHit {
    fn distance(&self) -> f32 {
        self.t
    }
}

/// Read-only render state shared by every worker.
#[derive(Debug)]
pub struct RenderScene {
    pub background_color: Color,
    pub shadow_ray_epsilon: f32,
    pub max_recursion_depth: u32,
    pub cameras: Vec<Camera>,
    pub lights: Vec<Light>,
    pub materials: Vec<Material>,
    meshes: Vec<TriangleMesh>,
    objects: Vec<SceneObject>,
    /// Scene-level BVH; `None` falls back to a linear scan.
    bvh: Option<Bvh>,
}

impl RenderScene {
    /// Build meshes, objects and BVHs. Runs once, before any worker starts.
    pub fn build(scene: Scene, acceleration: &AccelerationConfig) -> Self {
        let meshes: Vec<TriangleMesh> = scene
            .meshes
            .iter()
            .map(|mesh| TriangleMesh::new(mesh, acceleration.bvh_low_level))
            .collect();

        let objects: Vec<SceneObject> = scene
            .objects
            .iter()
            .map(|object| SceneObject::new(object, &meshes))
            .collect();

        let bvh = acceleration.bvh_high_level.then(|| {
            let boxes: Vec<Aabb> = objects.iter().map(|o| o.bounding_box()).collect();
            let bvh = Bvh::build(&boxes);
            log::info!(
                "Built scene BVH: {} leaves, {} nodes, depth {}",
                bvh.leaf_count(),
                bvh.node_count(),
                bvh.depth()
            );
            bvh
        });
        if acceleration.bvh_low_level {
            log::debug!("Built {} mesh BVHs", meshes.len());
        }

        Self {
            background_color: scene.background_color,
            shadow_ray_epsilon: scene.shadow_ray_epsilon,
            max_recursion_depth: scene.max_recursion_depth,
            cameras: scene.cameras,
            lights: scene.lights,
            materials: scene.materials,
            meshes,
            objects,
            bvh,
        }
    }

    pub fn material_of(&self, id: ObjectId) -> &Material {
        &self.materials[self.objects[id].material]
    }

    /// Nearest hit (or, for any-hit queries, some hit) along `ray`.
    pub fn intersect(&self, ray: &Ray, query: &HitQuery) -> Option<SceneHit> {
        match &self.bvh {
            Some(bvh) => bvh.intersect(ray, query.ray_t, query.any_hit, &mut |item, ray_t| {
                self.intersect_object(item, ray, &query.with_range(ray_t))
            }),
            None => self.intersect_linear(ray, query),
        }
    }

    fn intersect_linear(&self, ray: &Ray, query: &HitQuery) -> Option<SceneHit> {
        let mut closest = None;
        for id in 0..self.objects.len() {
            let hit = self.intersect_object(id, ray, query);
            if query.any_hit && hit.is_some() {
                return hit;
            }
            closest = nearer(closest, hit);
        }
        closest
    }

    /// Intersect a single object, as done for rays travelling inside it.
    pub fn intersect_object(&self, id: ObjectId, ray: &Ray, query: &HitQuery) -> Option<SceneHit> {
        self.objects[id]
            .hit(ray, query, &self.meshes)
            .map(|hit| SceneHit::new(id, hit))
    }

    /// True when something lies along `ray` closer than `t_max`.
    pub fn occluded(&self, ray: &Ray, t_max: f32) -> bool {
        self.intersect(ray, &HitQuery::shadow(t_max)).is_some()
    }
}
