//! Pixel scheduling strategies.
//!
//! All three fill the same [`ImageBuffer`]; they differ only in how pixels
//! are handed to threads. Each returns `false` when `cancel` stopped it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rayon::prelude::*;

use lucent_math::{Color, UVec2};

use crate::bucket::{generate_buckets, render_bucket, BucketResult};
use crate::observer::RenderObserver;
use crate::renderer::{ImageBuffer, PixelRenderer};

/// How often the thread-queue status thread reports progress.
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Row-major on the calling thread.
pub fn render_serial(
    renderer: &PixelRenderer,
    image: &mut ImageBuffer,
    observer: &dyn RenderObserver,
    cancel: &AtomicBool,
) -> bool {
    let total = renderer.pixel_count();
    for y in 0..renderer.height() {
        for x in 0..renderer.width() {
            if cancel.load(Ordering::Relaxed) {
                return false;
            }
            image.set(x, y, renderer.render_pixel(UVec2::new(x, y)));
        }
        observer.progress((y as usize + 1) * renderer.width() as usize, total);
    }
    true
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fixed pool of `threads` workers popping pixels from one shared FIFO.
///
/// A status thread reads the queue length once per second and reports
/// progress until the workers are done.
pub fn render_thread_queue(
    renderer: &PixelRenderer,
    image: &mut ImageBuffer,
    threads: usize,
    observer: &dyn RenderObserver,
    cancel: &AtomicBool,
) -> bool {
    let total = renderer.pixel_count();
    let queue: Mutex<VecDeque<UVec2>> = Mutex::new(
        (0..renderer.height())
            .flat_map(|y| (0..renderer.width()).map(move |x| UVec2::new(x, y)))
            .collect(),
    );
    let queue = &queue;
    let (done_tx, done_rx) = mpsc::channel::<()>();

    std::thread::scope(|scope| {
        let status = scope.spawn(move || loop {
            match done_rx.recv_timeout(STATUS_INTERVAL) {
                Err(RecvTimeoutError::Timeout) => {
                    let remaining = lock(queue).len();
                    observer.progress(total - remaining, total);
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        let workers: Vec<_> = (0..threads.max(1))
            .map(|_| {
                scope.spawn(move || {
                    let mut finished: Vec<(UVec2, Color)> = Vec::new();
                    loop {
                        if cancel.load(Ordering::Relaxed) {
                            break;
                        }
                        let Some(pixel) = lock(queue).pop_front() else {
                            break;
                        };
                        finished.push((pixel, renderer.render_pixel(pixel)));
                    }
                    finished
                })
            })
            .collect();

        for worker in workers {
            match worker.join() {
                Ok(finished) => {
                    for (pixel, color) in finished {
                        image.set(pixel.x, pixel.y, color);
                    }
                }
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }

        drop(done_tx);
        if status.join().is_err() {
            log::warn!("Status thread panicked");
        }
    });

    // Workers only stop early on cancel, leaving pixels queued.
    let completed = lock(queue).is_empty();
    if completed {
        observer.progress(total, total);
    }
    completed
}

/// Spiral-ordered buckets rendered on a rayon pool of `threads` threads.
pub fn render_buckets(
    renderer: &PixelRenderer,
    image: &mut ImageBuffer,
    bucket_size: u32,
    threads: usize,
    observer: &dyn RenderObserver,
    cancel: &AtomicBool,
) -> bool {
    let buckets = generate_buckets(renderer.width(), renderer.height(), bucket_size);
    let total = renderer.pixel_count();
    let done = AtomicUsize::new(0);

    let render_all = || -> Vec<Option<BucketResult>> {
        buckets
            .par_iter()
            .map(|bucket| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let pixels = render_bucket(bucket, renderer);
                let finished = done.fetch_add(pixels.len(), Ordering::Relaxed) + pixels.len();
                observer.progress(finished, total);
                Some(BucketResult::new(*bucket, pixels))
            })
            .collect()
    };

    let results = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(render_all),
        Err(err) => {
            log::warn!(
                "Could not build a {}-thread pool ({}); using the global pool",
                threads,
                err
            );
            render_all()
        }
    };

    let mut completed = true;
    for result in results {
        let Some(result) = result else {
            completed = false;
            continue;
        };
        for (pixel, color) in result.bucket.pixels().zip(result.pixels) {
            image.set(pixel.x, pixel.y, color);
        }
    }
    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccelerationConfig, RenderConfig};
    use crate::scene::RenderScene;
    use lucent_core::{Camera, Scene};
    use lucent_math::Vec3;

    /// Remembers the highest progress count reported.
    #[derive(Default)]
    struct MaxProgress {
        done: AtomicUsize,
        total: AtomicUsize,
    }

    impl RenderObserver for MaxProgress {
        fn progress(&self, done: usize, total: usize) {
            self.done.fetch_max(done, Ordering::Relaxed);
            self.total.store(total, Ordering::Relaxed);
        }
    }

    fn empty_scene(width: u32, height: u32) -> RenderScene {
        let mut scene = Scene::new("empty");
        scene.background_color = Vec3::new(1.0, 2.0, 3.0);
        scene
            .cameras
            .push(Camera::looking(Vec3::ZERO, -Vec3::Z, Vec3::Y, 60.0, (width, height)));
        RenderScene::build(scene, &AccelerationConfig::default())
    }

    #[test]
    fn test_every_strategy_fills_every_pixel() {
        let scene = empty_scene(13, 5);
        let config = RenderConfig::default();
        let renderer = PixelRenderer::new(&scene, 0, &config).unwrap();
        let cancel = AtomicBool::new(false);

        for run in 0..3 {
            let observer = MaxProgress::default();
            let mut image = ImageBuffer::new(13, 5);
            let completed = match run {
                0 => render_serial(&renderer, &mut image, &observer, &cancel),
                1 => render_thread_queue(&renderer, &mut image, 4, &observer, &cancel),
                _ => render_buckets(&renderer, &mut image, 4, 2, &observer, &cancel),
            };
            assert!(completed);
            assert!(image.pixels.iter().all(|&c| c == Vec3::new(1.0, 2.0, 3.0)), "run {}", run);
            assert_eq!(observer.done.load(Ordering::Relaxed), 65);
            assert_eq!(observer.total.load(Ordering::Relaxed), 65);
        }
    }

    #[test]
    fn test_more_threads_than_pixels() {
        let scene = empty_scene(2, 1);
        let config = RenderConfig::default();
        let renderer = PixelRenderer::new(&scene, 0, &config).unwrap();
        let mut image = ImageBuffer::new(2, 1);
        let cancel = AtomicBool::new(false);

        assert!(render_thread_queue(
            &renderer,
            &mut image,
            16,
            &crate::observer::NullObserver,
            &cancel
        ));
        assert_eq!(image.get(1, 0), Vec3::new(1.0, 2.0, 3.0));
    }
}
