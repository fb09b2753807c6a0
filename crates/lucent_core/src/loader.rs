//! Scene loading.
//!
//! Reads a JSON [`SceneDescription`], checks every cross reference and
//! converts it into a resolved [`Scene`]. Any malformed reference aborts the
//! load; rendering never sees a partially valid scene.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use lucent_math::{Transform, Vec3};
use thiserror::Error;

use crate::description::{
    CameraDescription, MaterialDescription, MaterialType, MeshDescription,
    MeshInstanceDescription, ProjectionDescription, SceneDescription,
};
use crate::ply::{read_ply, PlyError};
use crate::scene::{
    symmetric_near_plane, Camera, Geometry, Light, Material, MaterialId, MaterialKind, Mesh,
    MeshId, Object, Scene,
};
use crate::transform::TransformError;

/// Errors that can occur during scene loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PLY error in {path}: {source}")]
    Ply {
        path: PathBuf,
        #[source]
        source: PlyError,
    },

    #[error("Transform error in {object}: {source}")]
    Transform {
        object: String,
        #[source]
        source: TransformError,
    },

    #[error("{object} references material {id}, but only {available} exist")]
    MissingMaterial {
        object: String,
        id: usize,
        available: usize,
    },

    #[error("{object} references vertex {id}, but only {available} exist")]
    MissingVertex {
        object: String,
        id: usize,
        available: usize,
    },

    #[error("Duplicate object id {0}")]
    DuplicateObjectId(usize),

    #[error("Mesh instance {instance} has no mesh or instance with base id {base}")]
    UnresolvedBase { instance: usize, base: usize },

    #[error("Mesh instance chain starting at {0} contains a cycle")]
    InstanceCycle(usize),

    #[error("Invalid camera {index}: {message}")]
    InvalidCamera { index: usize, message: String },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Load a scene file. PLY paths inside it are resolved relative to the file.
///
/// # Example
///
/// ```ignore
/// use lucent_core::load_scene;
///
/// let scene = load_scene("scenes/cornell.json")?;
/// println!("{} objects, {} cameras", scene.objects.len(), scene.cameras.len());
/// ```
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<Scene> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    log::info!("Loading scene from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    load_scene_from_string(&contents, name, base_dir)
}

/// Load a scene from JSON text; `base_dir` anchors relative PLY paths.
pub fn load_scene_from_string(json: &str, name: &str, base_dir: &Path) -> LoadResult<Scene> {
    let description: SceneDescription = serde_json::from_str(json)?;
    build_scene(&description, name, base_dir)
}

/// Validate `description` and convert it into a [`Scene`].
pub fn build_scene(
    description: &SceneDescription,
    name: &str,
    base_dir: &Path,
) -> LoadResult<Scene> {
    let mut builder = SceneBuilder {
        description,
        base_dir,
        scene: Scene::new(name),
        mesh_ids: HashMap::new(),
        mesh_transforms: Vec::new(),
    };

    builder.scene.background_color = description.background_color;
    builder.scene.shadow_ray_epsilon = description.shadow_ray_epsilon;
    builder.scene.max_recursion_depth = description.max_recursion_depth;

    builder.load_lights();
    builder.load_cameras()?;
    builder.load_materials();
    builder.load_spheres()?;
    builder.load_triangles()?;
    builder.load_meshes()?;
    builder.load_instances()?;

    let scene = builder.scene;
    log::info!(
        "Loaded scene '{}': {} objects ({} meshes, {} instances, {} triangles), \
         {} materials, {} lights, {} cameras",
        scene.name,
        scene.objects.len(),
        scene.meshes.len(),
        scene.instance_count(),
        scene.triangle_count(),
        scene.materials.len(),
        scene.lights.len(),
        scene.cameras.len()
    );
    if scene.cameras.is_empty() {
        log::warn!("Scene '{}' has no cameras; nothing will be rendered", scene.name);
    }
    Ok(scene)
}

struct SceneBuilder<'a> {
    description: &'a SceneDescription,
    base_dir: &'a Path,
    scene: Scene,
    /// Mesh object id -> index into `scene.meshes`.
    mesh_ids: HashMap<usize, MeshId>,
    /// Own transform and material of each mesh, for instances inheriting them.
    mesh_transforms: Vec<(Transform, MaterialId)>,
}

impl SceneBuilder<'_> {
    fn load_lights(&mut self) {
        let description = self.description;
        let lights = &description.lights;
        self.scene.lights.extend(
            lights
                .ambient
                .iter()
                .map(|l| Light::Ambient {
                    intensity: l.intensity,
                }),
        );
        self.scene.lights.extend(lights.point.iter().map(|l| Light::Point {
            position: l.position,
            intensity: l.intensity,
        }));
        for light in &lights.area {
            let normal = match light.normal.try_normalize() {
                Some(normal) => normal,
                None => {
                    log::warn!("Area light at {:?} has a zero normal; using +Y", light.position);
                    Vec3::Y
                }
            };
            self.scene.lights.push(Light::Area {
                position: light.position,
                normal,
                size: light.size,
                radiance: light.radiance,
            });
        }
    }

    fn load_cameras(&mut self) -> LoadResult<()> {
        let description = self.description;
        for (index, camera) in description.cameras.iter().enumerate() {
            let camera = resolve_camera(index, camera)?;
            self.scene.cameras.push(camera);
        }
        Ok(())
    }

    fn load_materials(&mut self) {
        self.scene
            .materials
            .extend(self.description.materials.iter().map(resolve_material));
    }

    fn material(&self, object: &str, id: usize) -> LoadResult<MaterialId> {
        let available = self.scene.materials.len();
        if id == 0 || id > available {
            return Err(LoadError::MissingMaterial {
                object: object.to_string(),
                id,
                available,
            });
        }
        Ok(id - 1)
    }

    fn vertex(&self, object: &str, id: usize) -> LoadResult<Vec3> {
        let vertices = &self.description.vertices;
        id.checked_sub(1)
            .and_then(|i| vertices.get(i))
            .copied()
            .ok_or_else(|| LoadError::MissingVertex {
                object: object.to_string(),
                id,
                available: vertices.len(),
            })
    }

    fn transform(&self, object: &str, tokens: &str) -> LoadResult<Transform> {
        self.description
            .transformations
            .resolve(tokens)
            .map_err(|source| LoadError::Transform {
                object: object.to_string(),
                source,
            })
    }

    fn load_spheres(&mut self) -> LoadResult<()> {
        let description = self.description;
        for (index, sphere) in description.objects.spheres.iter().enumerate() {
            let label = format!("sphere {}", index + 1);
            if sphere.radius <= 0.0 {
                log::warn!("{} has non-positive radius {}", label, sphere.radius);
            }
            let object = Object {
                geometry: Geometry::Sphere {
                    center: self.vertex(&label, sphere.center_vertex_id)?,
                    radius: sphere.radius,
                },
                material: self.material(&label, sphere.material_id)?,
                transform: self.transform(&label, &sphere.transformations)?,
                motion_blur: sphere.motion_blur,
            };
            self.scene.objects.push(object);
        }
        Ok(())
    }

    fn load_triangles(&mut self) -> LoadResult<()> {
        let description = self.description;
        for (index, triangle) in description.objects.triangles.iter().enumerate() {
            let label = format!("triangle {}", index + 1);
            let [a, b, c] = triangle.indices;
            let vertices = [
                self.vertex(&label, a)?,
                self.vertex(&label, b)?,
                self.vertex(&label, c)?,
            ];
            if (vertices[1] - vertices[0])
                .cross(vertices[2] - vertices[0])
                .length_squared()
                == 0.0
            {
                log::warn!("{} has zero area and will never be hit", label);
            }
            let object = Object {
                geometry: Geometry::Triangle { vertices },
                material: self.material(&label, triangle.material_id)?,
                transform: self.transform(&label, &triangle.transformations)?,
                motion_blur: triangle.motion_blur,
            };
            self.scene.objects.push(object);
        }
        Ok(())
    }

    fn load_meshes(&mut self) -> LoadResult<()> {
        let description = self.description;
        for mesh in &description.objects.meshes {
            let label = format!("mesh {}", mesh.object_id);
            if self.mesh_ids.contains_key(&mesh.object_id) {
                return Err(LoadError::DuplicateObjectId(mesh.object_id));
            }

            let geometry = self.mesh_geometry(&label, mesh)?;
            if geometry.triangles.is_empty() {
                log::warn!("{} has no faces", label);
            }
            let material = self.material(&label, mesh.material_id)?;
            let transform = self.transform(&label, &mesh.transformations)?;

            let mesh_id = self.scene.meshes.len();
            self.scene.meshes.push(geometry);
            self.mesh_ids.insert(mesh.object_id, mesh_id);
            self.mesh_transforms.push((transform, material));
            self.scene.objects.push(Object {
                geometry: Geometry::Mesh(mesh_id),
                material,
                transform,
                motion_blur: mesh.motion_blur,
            });
        }
        Ok(())
    }

    /// Inline faces are remapped from the shared 1-based vertex pool into a
    /// compact local vertex list.
    fn mesh_geometry(&self, label: &str, mesh: &MeshDescription) -> LoadResult<Mesh> {
        if let Some(ply_file) = &mesh.ply_file {
            let path = self.base_dir.join(ply_file);
            let ply = read_ply(&path).map_err(|source| LoadError::Ply { path, source })?;
            return Ok(Mesh::new(ply.positions, ply.triangles));
        }

        let mut remap: HashMap<usize, u32> = HashMap::new();
        let mut positions = Vec::new();
        let mut triangles = Vec::with_capacity(mesh.faces.len());
        for face in &mesh.faces {
            let mut triangle = [0u32; 3];
            for (slot, &id) in triangle.iter_mut().zip(face) {
                *slot = match remap.get(&id).copied() {
                    Some(local) => local,
                    None => {
                        let local = positions.len() as u32;
                        positions.push(self.vertex(label, id)?);
                        remap.insert(id, local);
                        local
                    }
                };
            }
            triangles.push(triangle);
        }
        Ok(Mesh::new(positions, triangles))
    }

    fn load_instances(&mut self) -> LoadResult<()> {
        let description = self.description;
        let instances = &description.objects.mesh_instances;
        let mut by_id: HashMap<usize, &MeshInstanceDescription> = HashMap::new();
        for instance in instances {
            if self.mesh_ids.contains_key(&instance.object_id)
                || by_id.insert(instance.object_id, instance).is_some()
            {
                return Err(LoadError::DuplicateObjectId(instance.object_id));
            }
        }

        for instance in instances {
            let label = format!("mesh instance {}", instance.object_id);
            let (mesh_id, transform) = self.resolve_chain(instance, &by_id)?;
            let material = match instance.material_id {
                Some(id) => self.material(&label, id)?,
                None => self.mesh_transforms[mesh_id].1,
            };
            self.scene.objects.push(Object {
                geometry: Geometry::Instance(mesh_id),
                material,
                transform,
                motion_blur: instance.motion_blur,
            });
        }
        Ok(())
    }

    /// Walk `base_object_id` links until a mesh is reached.
    ///
    /// Transforms accumulate outward: the instance's own transform is applied
    /// last. A node with `reset_transform` contributes its own transform and
    /// ends accumulation, so neither its bases nor the mesh transform apply.
    fn resolve_chain(
        &self,
        instance: &MeshInstanceDescription,
        by_id: &HashMap<usize, &MeshInstanceDescription>,
    ) -> LoadResult<(MeshId, Transform)> {
        let mut transform = Transform::IDENTITY;
        let mut any_reset = false;
        let mut visited = HashSet::from([instance.object_id]);
        let mut current = instance;

        let mesh_id = loop {
            if !any_reset {
                let label = format!("mesh instance {}", current.object_id);
                transform = self
                    .transform(&label, &current.transformations)?
                    .then(&transform);
            }
            any_reset |= current.reset_transform;

            let base = current.base_object_id;
            if let Some(&mesh_id) = self.mesh_ids.get(&base) {
                break mesh_id;
            }
            current = by_id.get(&base).copied().ok_or(LoadError::UnresolvedBase {
                instance: instance.object_id,
                base,
            })?;
            if !visited.insert(current.object_id) {
                return Err(LoadError::InstanceCycle(instance.object_id));
            }
        };

        if !any_reset {
            transform = self.mesh_transforms[mesh_id].0.then(&transform);
        }
        Ok((mesh_id, transform))
    }
}

fn resolve_material(material: &MaterialDescription) -> Material {
    let kind = match material.kind {
        MaterialType::Default => MaterialKind::Matte,
        MaterialType::Mirror => MaterialKind::Mirror {
            reflectance: material.mirror,
        },
        MaterialType::Conductor => MaterialKind::Conductor {
            reflectance: material.mirror,
            refraction_index: material.refraction_index,
            absorption_index: material.absorption_index,
        },
        MaterialType::Dielectric => MaterialKind::Dielectric {
            absorption_coefficient: material.absorption_coefficient,
            refraction_index: material.refraction_index,
        },
    };
    Material {
        kind,
        ambient: material.ambient,
        diffuse: material.diffuse,
        specular: material.specular,
        phong_exponent: material.phong_exponent.filter(|p| *p >= 0.0),
    }
}

fn resolve_camera(index: usize, camera: &CameraDescription) -> LoadResult<Camera> {
    let invalid = |message: &str| LoadError::InvalidCamera {
        index,
        message: message.to_string(),
    };

    let [image_width, image_height] = camera.image_resolution;
    if image_width == 0 || image_height == 0 {
        return Err(invalid("image resolution must be non-zero"));
    }

    let (gaze, near_plane, near_distance) = match &camera.projection {
        ProjectionDescription::NearPlane {
            gaze,
            near_plane,
            near_distance,
        } => (*gaze, *near_plane, *near_distance),
        ProjectionDescription::LookAt {
            gaze_point,
            fov_y,
            near_distance,
        } => (
            *gaze_point - camera.position,
            symmetric_near_plane(*fov_y, *near_distance, image_width, image_height),
            *near_distance,
        ),
    };

    let gaze = gaze.try_normalize().ok_or_else(|| invalid("zero gaze direction"))?;
    if gaze.cross(camera.up).length_squared() < 1e-12 {
        return Err(invalid("up vector is parallel to gaze"));
    }
    if camera.num_samples == 0 {
        log::warn!("Camera {} requests 0 samples; using 1", index);
    }

    Ok(Camera {
        position: camera.position,
        gaze,
        up: camera.up,
        near_plane,
        near_distance,
        image_width,
        image_height,
        image_name: camera.image_name.clone(),
        num_samples: camera.num_samples.max(1),
        focus_distance: camera.focus_distance,
        aperture_size: camera.aperture_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::BVec3;

    fn load(json: &str) -> LoadResult<Scene> {
        load_scene_from_string(json, "test", Path::new("."))
    }

    const BASE: &str = r#"
        "materials": [ { "diffuse": [1, 1, 1] }, { "type": "mirror", "mirror": [0.5, 0.5, 0.5] } ],
        "vertices": [ [0, 0, 0], [1, 0, 0], [0, 1, 0], [5, 5, 5] ],
        "transformations": {
            "translations": [ [1, 0, 0], [0, 10, 0] ],
            "scalings": [ [2, 2, 2], [-1, 1, 1] ]
        }
    "#;

    fn scene_json(objects: &str) -> String {
        format!("{{ {}, \"objects\": {} }}", BASE, objects)
    }

    #[test]
    fn test_load_primitives() {
        let json = scene_json(
            r#"{
                "spheres": [ { "material_id": 2, "center_vertex_id": 4, "radius": 1.5,
                               "transformations": "t1" } ],
                "triangles": [ { "material_id": 1, "indices": [1, 2, 3],
                                 "motion_blur": [0, 0, 1] } ]
            }"#,
        );
        let scene = load(&json).unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.shadow_ray_epsilon, 0.001);

        let sphere = &scene.objects[0];
        assert_eq!(
            sphere.geometry,
            Geometry::Sphere {
                center: Vec3::splat(5.0),
                radius: 1.5
            }
        );
        assert_eq!(sphere.material, 1);
        assert_eq!(sphere.transform.point_to_world(Vec3::ZERO), Vec3::X);
        assert!(matches!(
            scene.materials[1].kind,
            MaterialKind::Mirror { .. }
        ));

        assert_eq!(scene.objects[1].motion_blur, Vec3::Z);
    }

    #[test]
    fn test_inline_mesh_is_remapped() {
        let json = scene_json(
            r#"{ "meshes": [ { "object_id": 1, "material_id": 1,
                               "faces": [ [2, 3, 4], [4, 3, 2] ] } ] }"#,
        );
        let scene = load(&json).unwrap();
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.positions, vec![Vec3::X, Vec3::Y, Vec3::splat(5.0)]);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [2, 1, 0]]);
    }

    #[test]
    fn test_ply_mesh_relative_to_scene() {
        let dir = std::env::temp_dir().join(format!("lucent_ply_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("tri.ply"),
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\n\
             property float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n\
             0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n",
        )
        .unwrap();

        let json = scene_json(
            r#"{ "meshes": [
                { "object_id": 1, "material_id": 1, "ply_file": "tri.ply" }
            ] }"#,
        );
        let scene = load_scene_from_string(&json, "ply", &dir).unwrap();
        assert_eq!(scene.meshes[0].triangles, vec![[0, 1, 2]]);
        assert_eq!(scene.meshes[0].positions[1], Vec3::X);

        let missing = json.replace("tri.ply", "missing.ply");
        assert!(matches!(
            load_scene_from_string(&missing, "ply", &dir),
            Err(LoadError::Ply { .. })
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_references() {
        let json = scene_json(
            r#"{ "spheres": [ { "material_id": 3, "center_vertex_id": 1, "radius": 1 } ] }"#,
        );
        assert!(matches!(
            load(&json),
            Err(LoadError::MissingMaterial { id: 3, available: 2, .. })
        ));

        let json = scene_json(r#"{ "triangles": [ { "material_id": 1, "indices": [1, 2, 9] } ] }"#);
        assert!(matches!(
            load(&json),
            Err(LoadError::MissingVertex { id: 9, .. })
        ));

        let json = scene_json(
            r#"{ "triangles": [
                { "material_id": 1, "indices": [1, 2, 3], "transformations": "r1" }
            ] }"#,
        );
        assert!(matches!(load(&json), Err(LoadError::Transform { .. })));
    }

    const MESH: &str =
        r#"{ "object_id": 1, "material_id": 1, "faces": [ [1, 2, 3] ], "transformations": "s1" }"#;

    fn instance_scene(instances: &str) -> LoadResult<Scene> {
        load(&scene_json(&format!(
            r#"{{ "meshes": [ {} ], "mesh_instances": {} }}"#,
            MESH, instances
        )))
    }

    fn instance_transform(scene: &Scene, object_id_order: usize) -> Transform {
        scene.objects[1 + object_id_order].transform
    }

    #[test]
    fn test_instance_chain_accumulates_transforms() {
        let scene = instance_scene(
            r#"[ { "object_id": 2, "base_object_id": 1, "transformations": "t1" },
                 { "object_id": 3, "base_object_id": 2, "transformations": "t2",
                   "material_id": 2 } ]"#,
        )
        .unwrap();

        // mesh scale 2, then +x
        let first = instance_transform(&scene, 0);
        assert_eq!(first.point_to_world(Vec3::X), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(scene.objects[1].material, 0);
        assert_eq!(scene.objects[1].geometry, Geometry::Instance(0));

        // mesh scale 2, then +x, then +10y
        let second = instance_transform(&scene, 1);
        assert_eq!(second.point_to_world(Vec3::X), Vec3::new(3.0, 10.0, 0.0));
        assert_eq!(scene.objects[2].material, 1);
    }

    #[test]
    fn test_reset_transform_stops_accumulation() {
        let scene = instance_scene(
            r#"[ { "object_id": 2, "base_object_id": 1, "transformations": "t1",
                   "reset_transform": true },
                 { "object_id": 3, "base_object_id": 2, "transformations": "t2" } ]"#,
        )
        .unwrap();

        // reset: only its own translation, no mesh scale
        assert_eq!(
            instance_transform(&scene, 0).point_to_world(Vec3::X),
            Vec3::new(2.0, 0.0, 0.0)
        );
        // the chain stops at the reset node
        assert_eq!(
            instance_transform(&scene, 1).point_to_world(Vec3::X),
            Vec3::new(2.0, 10.0, 0.0)
        );
    }

    #[test]
    fn test_instance_flip_combines_with_mesh() {
        let scene = instance_scene(
            r#"[ { "object_id": 2, "base_object_id": 1, "transformations": "s2" } ]"#,
        )
        .unwrap();
        assert_eq!(instance_transform(&scene, 0).flip(), BVec3::new(true, false, false));
    }

    #[test]
    fn test_instance_errors() {
        assert!(matches!(
            instance_scene(r#"[ { "object_id": 2, "base_object_id": 7 } ]"#),
            Err(LoadError::UnresolvedBase { instance: 2, base: 7 })
        ));
        assert!(matches!(
            instance_scene(
                r#"[ { "object_id": 2, "base_object_id": 3 },
                     { "object_id": 3, "base_object_id": 2 } ]"#
            ),
            Err(LoadError::InstanceCycle(2))
        ));
        assert!(matches!(
            instance_scene(r#"[ { "object_id": 1, "base_object_id": 1 } ]"#),
            Err(LoadError::DuplicateObjectId(1))
        ));
    }

    #[test]
    fn test_cameras() {
        let json = r#"{ "cameras": [
            { "position": [0, 0, 0], "up": [0, 1, 0],
              "image_resolution": [4, 2], "image_name": "a.ppm",
              "projection": { "type": "near_plane", "gaze": [0, 0, -2],
                              "near_plane": [-1, 1, -0.5, 0.5], "near_distance": 1 } },
            { "position": [0, 0, 5], "up": [0, 1, 0],
              "image_resolution": [4, 2], "image_name": "b.ppm",
              "projection": { "type": "look_at", "gaze_point": [0, 0, 0],
                              "fov_y": 90, "near_distance": 2 } }
        ] }"#;
        let scene = load(json).unwrap();
        assert_eq!(scene.cameras[0].gaze, -Vec3::Z);
        assert_eq!(scene.cameras[0].near_plane, [-1.0, 1.0, -0.5, 0.5]);

        let look_at = &scene.cameras[1];
        assert_eq!(look_at.gaze, -Vec3::Z);
        assert!((look_at.near_plane[3] - 2.0).abs() < 1e-5);
        assert!((look_at.near_plane[1] - 4.0).abs() < 1e-5);

        let bad = json.replace("[0, 0, -2]", "[0, 5, 0]");
        assert!(matches!(load(&bad), Err(LoadError::InvalidCamera { index: 0, .. })));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(load("{ \"vertices\": [ [0, 0] ] }"), Err(LoadError::Json(_))));
    }
}
