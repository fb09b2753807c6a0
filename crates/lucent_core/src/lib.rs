//! Lucent Core - scene description and loading.
//!
//! This crate provides:
//!
//! - **Scene description**: serde records mirroring the JSON scene file
//! - **Scene types**: `Scene`, `Object`, `Mesh`, `Material`, `Light`, `Camera`
//! - **Loading**: reference validation, transform strings, instance chains and PLY meshes
//!
//! # Example
//!
//! ```ignore
//! use lucent_core::load_scene;
//!
//! let scene = load_scene("scene.json")?;
//! println!("Loaded {} objects, {} instances",
//!     scene.objects.len(),
//!     scene.instance_count());
//! ```

pub mod description;
pub mod loader;
pub mod ply;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use description::SceneDescription;
pub use loader::{build_scene, load_scene, load_scene_from_string, LoadError, LoadResult};
pub use ply::{parse_ply, read_ply, PlyError, PlyMesh, PlyResult};
pub use scene::{
    Camera, Geometry, Light, Material, MaterialId, MaterialKind, Mesh, MeshId, Object, Scene,
};
pub use transform::{TransformError, TransformResult};
