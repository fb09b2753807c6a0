//! Serialized scene records.
//!
//! These types mirror the on-disk JSON scene file one to one. References
//! between records are 1-based indices into the shared arrays (`vertices`,
//! `materials`, the transform libraries), or object ids for meshes and
//! mesh instances. Nothing here is validated; see [`crate::loader`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The complete contents of a scene file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// Colour returned by primary rays that miss everything (0-255 scale).
    pub background_color: Vec3,

    /// Offset along the surface normal for spawned rays.
    pub shadow_ray_epsilon: f32,

    pub max_recursion_depth: u32,

    pub cameras: Vec<CameraDescription>,
    pub lights: LightsDescription,
    pub materials: Vec<MaterialDescription>,
    pub transformations: TransformLibrary,

    /// Shared vertex pool, referenced 1-based.
    pub vertices: Vec<Vec3>,

    pub objects: ObjectsDescription,
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self {
            background_color: Vec3::ZERO,
            shadow_ray_epsilon: 0.001,
            max_recursion_depth: 0,
            cameras: Vec::new(),
            lights: LightsDescription::default(),
            materials: Vec::new(),
            transformations: TransformLibrary::default(),
            vertices: Vec::new(),
            objects: ObjectsDescription::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraDescription {
    pub position: Vec3,
    pub up: Vec3,
    pub projection: ProjectionDescription,
    /// `[width, height]` in pixels.
    pub image_resolution: [u32; 2],
    pub image_name: String,
    #[serde(default = "default_num_samples")]
    pub num_samples: u32,
    #[serde(default)]
    pub focus_distance: f32,
    #[serde(default)]
    pub aperture_size: f32,
}

fn default_num_samples() -> u32 {
    1
}

/// How the image plane is specified.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectionDescription {
    /// Explicit gaze direction and near plane `[left, right, bottom, top]`.
    NearPlane {
        gaze: Vec3,
        near_plane: [f32; 4],
        near_distance: f32,
    },
    /// Aim at a point with a vertical field of view in degrees.
    LookAt {
        gaze_point: Vec3,
        fov_y: f32,
        near_distance: f32,
    },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsDescription {
    pub ambient: Vec<AmbientLightDescription>,
    pub point: Vec<PointLightDescription>,
    pub area: Vec<AreaLightDescription>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AmbientLightDescription {
    pub intensity: Vec3,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PointLightDescription {
    pub position: Vec3,
    pub intensity: Vec3,
}

/// A square emitter of edge length `size` facing along `normal`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AreaLightDescription {
    pub position: Vec3,
    pub normal: Vec3,
    pub size: f32,
    pub radiance: Vec3,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    #[default]
    Default,
    Mirror,
    Conductor,
    Dielectric,
}

/// Flat material record; which fields matter depends on `type`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDescription {
    #[serde(rename = "type")]
    pub kind: MaterialType,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    /// Absent disables the specular term.
    pub phong_exponent: Option<f32>,
    pub mirror: Vec3,
    pub absorption_coefficient: Vec3,
    pub refraction_index: f32,
    pub absorption_index: f32,
}

/// Named transform entries, referenced by `t<i>`, `s<i>`, `r<i>` and `c<i>` tokens.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformLibrary {
    pub translations: Vec<Vec3>,
    pub scalings: Vec<Vec3>,
    pub rotations: Vec<RotationDescription>,
    /// 4×4 matrices in row-major order.
    pub composites: Vec<[[f32; 4]; 4]>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RotationDescription {
    /// Degrees.
    pub angle: f32,
    pub axis: Vec3,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectsDescription {
    pub spheres: Vec<SphereDescription>,
    pub triangles: Vec<TriangleDescription>,
    pub meshes: Vec<MeshDescription>,
    pub mesh_instances: Vec<MeshInstanceDescription>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SphereDescription {
    pub material_id: usize,
    pub center_vertex_id: usize,
    pub radius: f32,
    #[serde(default)]
    pub transformations: String,
    #[serde(default)]
    pub motion_blur: Vec3,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriangleDescription {
    pub material_id: usize,
    /// 1-based vertex ids.
    pub indices: [usize; 3],
    #[serde(default)]
    pub transformations: String,
    #[serde(default)]
    pub motion_blur: Vec3,
}

/// A triangle mesh given inline (1-based `faces`) or as a PLY file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshDescription {
    pub object_id: usize,
    pub material_id: usize,
    #[serde(default)]
    pub faces: Vec<[usize; 3]>,
    /// Path relative to the scene file; takes precedence over `faces`.
    #[serde(default)]
    pub ply_file: Option<String>,
    #[serde(default)]
    pub transformations: String,
    #[serde(default)]
    pub motion_blur: Vec3,
}

/// Reuses the geometry of a mesh, or of another instance, by object id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshInstanceDescription {
    pub object_id: usize,
    pub base_object_id: usize,
    /// Absent inherits the base mesh's material.
    #[serde(default)]
    pub material_id: Option<usize>,
    #[serde(default)]
    pub reset_transform: bool,
    #[serde(default)]
    pub transformations: String,
    #[serde(default)]
    pub motion_blur: Vec3,
}
