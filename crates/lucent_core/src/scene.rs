//! Resolved scene types.
//!
//! A [`Scene`] is what the loader produces once every reference in the
//! description has been checked: materials and meshes live in arenas and
//! objects point into them by index, transform strings are composed into
//! [`Transform`]s and instance chains are flattened.

use lucent_math::{Aabb, Color, Transform, Vec3};

/// Index into [`Scene::materials`].
pub type MaterialId = usize;

/// Index into [`Scene::meshes`].
pub type MeshId = usize;

/// Everything needed to render: geometry, shading data and cameras.
#[derive(Clone, Debug)]
pub struct Scene {
    pub name: String,
    pub background_color: Color,
    pub shadow_ray_epsilon: f32,
    pub max_recursion_depth: u32,
    pub cameras: Vec<Camera>,
    pub lights: Vec<Light>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub objects: Vec<Object>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            background_color: Color::ZERO,
            shadow_ray_epsilon: 0.001,
            max_recursion_depth: 0,
            cameras: Vec::new(),
            lights: Vec::new(),
            materials: Vec::new(),
            meshes: Vec::new(),
            objects: Vec::new(),
        }
    }

    pub fn instance_count(&self) -> usize {
        self.objects
            .iter()
            .filter(|o| matches!(o.geometry, Geometry::Instance(_)))
            .count()
    }

    pub fn triangle_count(&self) -> usize {
        self.objects
            .iter()
            .map(|o| match o.geometry {
                Geometry::Sphere { .. } => 0,
                Geometry::Triangle { .. } => 1,
                Geometry::Mesh(id) | Geometry::Instance(id) => self.meshes[id].triangles.len(),
            })
            .sum()
    }
}

/// Shared triangle geometry in its own local space.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    /// 0-based indices into `positions`.
    pub triangles: Vec<[u32; 3]>,
    pub bounds: Aabb,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        let bounds = Aabb::enclosing(
            triangles
                .iter()
                .flat_map(|tri| tri.iter().map(|&i| positions[i as usize])),
        );
        Self {
            positions,
            triangles,
            bounds,
        }
    }

    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        self.triangles[index].map(|i| self.positions[i as usize])
    }
}

/// Local-space shape of an object.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Sphere { center: Vec3, radius: f32 },
    Triangle { vertices: [Vec3; 3] },
    Mesh(MeshId),
    /// A mesh reused by an instance; the object's transform is the resolved
    /// chain transform.
    Instance(MeshId),
}

/// A renderable object: a shape, its material and placement.
#[derive(Clone, Debug)]
pub struct Object {
    pub geometry: Geometry,
    pub material: MaterialId,
    pub transform: Transform,
    /// World-space displacement over the exposure; a ray at time `t` sees the
    /// object shifted by `motion_blur * t`.
    pub motion_blur: Vec3,
}

/// Surface reflectance shared by every material kind.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    /// `None` disables the specular lobe.
    pub phong_exponent: Option<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MaterialKind {
    Matte,
    Mirror {
        reflectance: Color,
    },
    Conductor {
        reflectance: Color,
        refraction_index: f32,
        absorption_index: f32,
    },
    Dielectric {
        absorption_coefficient: Color,
        refraction_index: f32,
    },
}

impl Material {
    pub fn matte(ambient: Color, diffuse: Color) -> Self {
        Self {
            kind: MaterialKind::Matte,
            ambient,
            diffuse,
            specular: Color::ZERO,
            phong_exponent: None,
        }
    }

    pub fn with_kind(mut self, kind: MaterialKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_specular(mut self, specular: Color, phong_exponent: f32) -> Self {
        self.specular = specular;
        self.phong_exponent = Some(phong_exponent);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Ambient {
        intensity: Color,
    },
    Point {
        position: Vec3,
        intensity: Color,
    },
    /// Square emitter of edge length `size`, centred at `position`.
    Area {
        position: Vec3,
        normal: Vec3,
        size: f32,
        radiance: Color,
    },
}

/// A pinhole or thin-lens camera with an explicit near plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Unit viewing direction.
    pub gaze: Vec3,
    pub up: Vec3,
    /// `[left, right, bottom, top]` at `near_distance`.
    pub near_plane: [f32; 4],
    pub near_distance: f32,
    pub image_width: u32,
    pub image_height: u32,
    pub image_name: String,
    pub num_samples: u32,
    pub focus_distance: f32,
    pub aperture_size: f32,
}

impl Camera {
    /// Camera looking from `position` along `gaze` with a symmetric frustum of
    /// vertical field of view `fov_y_degrees`.
    pub fn looking(
        position: Vec3,
        gaze: Vec3,
        up: Vec3,
        fov_y_degrees: f32,
        (image_width, image_height): (u32, u32),
    ) -> Self {
        let near_distance = 1.0;
        Self {
            position,
            gaze: gaze.normalize(),
            up,
            near_plane: symmetric_near_plane(
                fov_y_degrees,
                near_distance,
                image_width,
                image_height,
            ),
            near_distance,
            image_width,
            image_height,
            image_name: String::from("image.ppm"),
            num_samples: 1,
            focus_distance: 0.0,
            aperture_size: 0.0,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.image_width as usize * self.image_height as usize
    }
}

/// `[left, right, bottom, top]` of a frustum with vertical field of view
/// `fov_y_degrees`, matching the image aspect ratio.
pub fn symmetric_near_plane(
    fov_y_degrees: f32,
    near_distance: f32,
    image_width: u32,
    image_height: u32,
) -> [f32; 4] {
    let top = near_distance * (fov_y_degrees.to_radians() / 2.0).tan();
    let right = top * image_width as f32 / image_height.max(1) as f32;
    [-right, right, -top, top]
}
