//! Lucent Renderer - CPU Whitted-style ray tracing
//!
//! Turns a loaded [`lucent_core::Scene`] into images:
//!
//! - **Geometry**: spheres, triangles and shared triangle meshes under affine
//!   transforms, with motion blur and instancing
//! - **Acceleration**: median-split BVHs over objects and over mesh triangles
//! - **Shading**: ambient, Blinn-Phong direct light with shadow rays, and
//!   recursive mirror, conductor and dielectric terms
//! - **Sampling**: per-pixel jitter, time, aperture and area-light samples,
//!   box or Gaussian reconstruction, clamp tone mapping
//! - **Scheduling**: serial, thread-queue and rayon bucket strategies
//!
//! # Example
//!
//! ```ignore
//! use std::sync::atomic::AtomicBool;
//! use lucent_renderer::{render, LogObserver, RenderConfig, RenderScene};
//!
//! let config = RenderConfig::default();
//! let scene = RenderScene::build(lucent_core::load_scene("scene.json")?, &config.acceleration);
//! let image = render(&scene, 0, &config, &LogObserver, &AtomicBool::new(false))?;
//! ```

mod bucket;
mod bvh;
mod camera;
mod config;
mod export;
mod filter;
mod hittable;
mod light;
mod material;
mod mesh;
mod object;
mod observer;
mod renderer;
mod sampling;
mod scene;
mod scheduler;
mod sphere;
mod tracer;
mod triangle;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::{Bvh, BvhNode, NodeId};
pub use camera::CameraRays;
pub use config::{
    AccelerationConfig, ConfigError, ConfigResult, ImageFormat, MaterialsConfig, OutputConfig,
    RenderConfig, SamplingConfig, ScheduleStrategy, SchedulingConfig, ShadingConfig,
};
pub use export::{export, output_path, write_png, write_ppm, ExportError, ExportResult};
pub use filter::{clamp_to_rgb8, filter, gaussian_weight, FilterKind, PixelSample};
pub use hittable::{Culling, HitDistance, HitQuery, Hittable, LocalHit};
pub use light::{sample_light, Illumination};
pub use material::{conductor_fresnel, reflect, refract, Refraction};
pub use mesh::TriangleMesh;
pub use object::{ObjectId, SceneObject, Shape, WorldHit};
pub use observer::{LogObserver, NullObserver, RenderObserver, Stage};
pub use renderer::{render, ImageBuffer, PixelRenderer, RenderError, RenderResult};
pub use sampling::{generate_1d, generate_2d, radical_inverse, SamplerKind};
pub use scene::{RenderScene, SceneHit};
pub use scheduler::{render_buckets, render_serial, render_thread_queue};
pub use sphere::Sphere;
pub use tracer::Tracer;
pub use triangle::Triangle;

/// Re-export common math types from lucent_math
pub use lucent_math::{Aabb, Color, Interval, Ray, Transform, Vec3};
