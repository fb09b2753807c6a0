//! Per-pixel sampling and the render entry point.
//!
//! Every pixel draws its pixel, time, aperture and area-light samples from
//! an RNG seeded by camera and pixel, so an image comes out the same under
//! every scheduling strategy.

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use lucent_math::{Color, UVec2, Vec2};

use crate::camera::CameraRays;
use crate::config::{RenderConfig, SamplingConfig, ScheduleStrategy};
use crate::filter::{clamp_to_rgb8, filter, PixelSample};
use crate::observer::{RenderObserver, Stage};
use crate::sampling::{generate_2d, shuffled_1d, shuffled_2d};
use crate::scene::RenderScene;
use crate::scheduler;
use crate::tracer::Tracer;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("Camera {index} does not exist (scene has {count})")]
    UnknownCamera { index: usize, count: usize },

    #[error("Render of camera {0} was cancelled")]
    Cancelled(usize),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Linear RGB image, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Clamp tone mapping to 8-bit RGB.
    pub fn tone_map(&self) -> Vec<[u8; 3]> {
        self.pixels.iter().map(|&c| clamp_to_rgb8(c)).collect()
    }
}

/// Everything a worker needs to shade pixels of one camera.
pub struct PixelRenderer<'a> {
    tracer: Tracer<'a>,
    rays: CameraRays,
    sampling: &'a SamplingConfig,
    camera_index: usize,
    samples: usize,
    width: u32,
    height: u32,
}

impl<'a> PixelRenderer<'a> {
    pub fn new(
        scene: &'a RenderScene,
        camera_index: usize,
        config: &'a RenderConfig,
    ) -> RenderResult<Self> {
        let camera = scene
            .cameras
            .get(camera_index)
            .ok_or(RenderError::UnknownCamera {
                index: camera_index,
                count: scene.cameras.len(),
            })?;

        Ok(Self {
            tracer: Tracer::new(scene, config),
            rays: CameraRays::new(camera),
            sampling: &config.sampling,
            camera_index,
            samples: camera.num_samples.max(1) as usize,
            width: camera.image_width,
            height: camera.image_height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Trace and filter every sample of `pixel`.
    pub fn render_pixel(&self, pixel: UVec2) -> Color {
        let mut rng = StdRng::seed_from_u64(self.pixel_seed(pixel));
        let n = self.samples;
        let sampling = self.sampling;

        let jitters = generate_2d(sampling.pixel, n, &mut rng);
        let times = shuffled_1d(sampling.time, n, &mut rng);
        let apertures = if self.rays.has_depth_of_field() {
            shuffled_2d(sampling.aperture, n, &mut rng)
        } else {
            vec![Vec2::splat(0.5); n]
        };
        let light_samples = shuffled_2d(sampling.area_light, n, &mut rng);

        let samples: Vec<PixelSample> = (0..n)
            .map(|i| {
                let ray = self
                    .rays
                    .ray(pixel, jitters[i], apertures[i], times[i])
                    .with_light_sample(light_samples[i]);
                PixelSample {
                    color: self.tracer.trace(&ray),
                    offset: jitters[i],
                }
            })
            .collect();

        filter(sampling.filter, sampling.gaussian_sigma, &samples)
    }

    fn pixel_seed(&self, pixel: UVec2) -> u64 {
        let index = pixel.y as u64 * self.width as u64 + pixel.x as u64;
        ((self.camera_index as u64) << 40) ^ index
    }
}

/// Render camera `camera_index` of `scene` with the configured strategy.
///
/// `cancel` is checked before each pixel (or bucket); once set, the render
/// stops and reports [`RenderError::Cancelled`].
pub fn render(
    scene: &RenderScene,
    camera_index: usize,
    config: &RenderConfig,
    observer: &dyn RenderObserver,
    cancel: &AtomicBool,
) -> RenderResult<ImageBuffer> {
    let renderer = PixelRenderer::new(scene, camera_index, config)?;
    let mut image = ImageBuffer::new(renderer.width(), renderer.height());

    let stage = Stage::Render {
        camera: camera_index,
    };
    observer.stage_started(stage);
    let start = Instant::now();

    let scheduling = &config.scheduling;
    let completed = match scheduling.strategy {
        ScheduleStrategy::Serial => {
            scheduler::render_serial(&renderer, &mut image, observer, cancel)
        }
        ScheduleStrategy::ThreadQueue => scheduler::render_thread_queue(
            &renderer,
            &mut image,
            scheduling.worker_count(),
            observer,
            cancel,
        ),
        ScheduleStrategy::Buckets => scheduler::render_buckets(
            &renderer,
            &mut image,
            scheduling.bucket_size,
            scheduling.worker_count(),
            observer,
            cancel,
        ),
    };

    if !completed {
        log::warn!("Render of camera {} cancelled", camera_index);
        return Err(RenderError::Cancelled(camera_index));
    }
    observer.stage_finished(stage, start.elapsed());
    Ok(image)
}
