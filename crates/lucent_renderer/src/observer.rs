//! Render progress reporting.
//!
//! Observers are passed into the renderer instead of living in a global, so
//! tests can stay silent and the binary can log.

use std::time::Duration;

/// A timed phase of a render run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Building meshes, objects and BVHs.
    Build,
    /// Tracing every pixel of one camera.
    Render { camera: usize },
    /// Writing one camera's image.
    Export { camera: usize },
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Build => write!(f, "build"),
            Stage::Render { camera } => write!(f, "render camera {}", camera),
            Stage::Export { camera } => write!(f, "export camera {}", camera),
        }
    }
}

/// Receives stage timings and pixel progress. Called from worker threads.
pub trait RenderObserver: Send + Sync {
    fn stage_started(&self, _stage: Stage) {}

    fn stage_finished(&self, _stage: Stage, _elapsed: Duration) {}

    /// `done` of `total` pixels are finished.
    fn progress(&self, _done: usize, _total: usize) {}
}

/// Reports through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RenderObserver for LogObserver {
    fn stage_started(&self, stage: Stage) {
        log::info!("Starting {}", stage);
    }

    fn stage_finished(&self, stage: Stage, elapsed: Duration) {
        log::info!("Finished {} in {:.2?}", stage, elapsed);
    }

    fn progress(&self, done: usize, total: usize) {
        let percent = if total == 0 {
            100.0
        } else {
            100.0 * done as f64 / total as f64
        };
        log::info!("{}/{} pixels ({:.1}%)", done, total, percent);
    }
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl RenderObserver for NullObserver {}
