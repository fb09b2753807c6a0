//! Render configuration.
//!
//! Loaded from JSON; every field has a default so a partial file (or none)
//! works. Defaults enable every shading term, material and BVH level.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::FilterKind;
use crate::sampling::SamplerKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub sampling: SamplingConfig,
    pub shading: ShadingConfig,
    pub materials: MaterialsConfig,
    pub acceleration: AccelerationConfig,
    pub scheduling: SchedulingConfig,
    pub output: OutputConfig,
}

impl RenderConfig {
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        log::info!("Loaded render config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub pixel: SamplerKind,
    pub time: SamplerKind,
    pub aperture: SamplerKind,
    pub area_light: SamplerKind,
    pub filter: FilterKind,
    /// Standard deviation of the Gaussian filter, in pixels.
    pub gaussian_sigma: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            pixel: SamplerKind::Jittered,
            time: SamplerKind::Jittered,
            aperture: SamplerKind::Jittered,
            area_light: SamplerKind::Jittered,
            filter: FilterKind::Box,
            gaussian_sigma: 0.5,
        }
    }
}

/// Direct-lighting terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    pub ambient: bool,
    pub diffuse: bool,
    pub specular: bool,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            ambient: true,
            diffuse: true,
            specular: true,
        }
    }
}

/// Recursive contribution of each material class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialsConfig {
    pub mirror: bool,
    pub conductor: bool,
    pub dielectric: bool,
}

impl Default for MaterialsConfig {
    fn default() -> Self {
        Self {
            mirror: true,
            conductor: true,
            dielectric: true,
        }
    }
}

/// BVH levels; disabled levels fall back to linear scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelerationConfig {
    /// Scene-wide BVH over objects.
    pub bvh_high_level: bool,
    /// Per-mesh BVH over triangles.
    pub bvh_low_level: bool,
}

impl Default for AccelerationConfig {
    fn default() -> Self {
        Self {
            bvh_high_level: true,
            bvh_low_level: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStrategy {
    /// Row-major on the calling thread.
    Serial,
    /// Fixed worker pool pulling pixels from a shared queue.
    #[default]
    ThreadQueue,
    /// Spiral-ordered tiles rendered with rayon.
    Buckets,
}

/// Worker count used when hardware concurrency is unknown.
pub const FALLBACK_THREADS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub strategy: ScheduleStrategy,
    /// 0 picks the hardware concurrency.
    pub threads: usize,
    pub bucket_size: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            strategy: ScheduleStrategy::ThreadQueue,
            threads: 0,
            bucket_size: crate::bucket::DEFAULT_BUCKET_SIZE,
        }
    }
}

impl SchedulingConfig {
    pub fn worker_count(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_THREADS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    #[default]
    Ppm,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Ppm => "ppm",
            ImageFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: ImageFormat,
}
