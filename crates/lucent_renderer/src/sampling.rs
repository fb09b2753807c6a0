//! Sample-pattern generators over the unit square and unit interval.
//!
//! Every generator returns points in `[0, 1)`. A single sample is always
//! placed at the centre, so one-sample renders are deterministic.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use lucent_math::Vec2;

/// Which point set a sampler draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    /// Cell centres of a regular grid.
    Uniform,
    /// Independent uniform random points.
    Random,
    /// One random point per grid cell.
    #[default]
    Jittered,
    /// Jittered points that are also stratified per row and column.
    MultiJittered,
    /// Halton sequence in bases 2 and 3.
    Halton,
    /// Hammersley point set.
    Hammersley,
}

/// `n` points in the unit square.
pub fn generate_2d<R: Rng + ?Sized>(kind: SamplerKind, n: usize, rng: &mut R) -> Vec<Vec2> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![Vec2::splat(0.5)];
    }

    match kind {
        SamplerKind::Uniform => grid(n, |_| 0.5, rng),
        SamplerKind::Random => (0..n).map(|_| Vec2::new(rng.gen(), rng.gen())).collect(),
        SamplerKind::Jittered => grid(n, |rng| rng.gen(), rng),
        SamplerKind::MultiJittered => multi_jittered(n, rng),
        SamplerKind::Halton => (1..=n)
            .map(|i| Vec2::new(radical_inverse(i, 2), radical_inverse(i, 3)))
            .collect(),
        SamplerKind::Hammersley => (0..n)
            .map(|i| Vec2::new((i as f32 + 0.5) / n as f32, radical_inverse(i, 2)))
            .collect(),
    }
}

/// `n` values in the unit interval.
pub fn generate_1d<R: Rng + ?Sized>(kind: SamplerKind, n: usize, rng: &mut R) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![0.5];
    }

    let stratum = |i: usize, offset: f32| (i as f32 + offset) / n as f32;
    match kind {
        SamplerKind::Uniform | SamplerKind::Hammersley => (0..n).map(|i| stratum(i, 0.5)).collect(),
        SamplerKind::Random => (0..n).map(|_| rng.gen()).collect(),
        SamplerKind::Jittered | SamplerKind::MultiJittered => {
            (0..n).map(|i| stratum(i, rng.gen())).collect()
        }
        SamplerKind::Halton => (1..=n).map(|i| radical_inverse(i, 2)).collect(),
    }
}

/// Shuffled point set, used for the secondary dimensions of a pixel so they
/// do not correlate with the pixel positions.
pub fn shuffled_2d<R: Rng + ?Sized>(kind: SamplerKind, n: usize, rng: &mut R) -> Vec<Vec2> {
    let mut points = generate_2d(kind, n, rng);
    points.shuffle(rng);
    points
}

pub fn shuffled_1d<R: Rng + ?Sized>(kind: SamplerKind, n: usize, rng: &mut R) -> Vec<f32> {
    let mut values = generate_1d(kind, n, rng);
    values.shuffle(rng);
    values
}

/// Columns and rows of the smallest near-square grid with at least `n` cells.
fn grid_shape(n: usize) -> (usize, usize) {
    let columns = (n as f32).sqrt().ceil() as usize;
    let rows = n.div_ceil(columns);
    (columns, rows)
}

fn grid<R, F>(n: usize, mut offset: F, rng: &mut R) -> Vec<Vec2>
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> f32,
{
    let (columns, rows) = grid_shape(n);
    let mut points = Vec::with_capacity(columns * rows);
    for j in 0..rows {
        for i in 0..columns {
            let x = (i as f32 + offset(rng)) / columns as f32;
            let y = (j as f32 + offset(rng)) / rows as f32;
            points.push(Vec2::new(x, y));
        }
    }
    points.truncate(n);
    points
}

fn multi_jittered<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Vec2> {
    let (columns, rows) = grid_shape(n);
    let (m, k) = (columns as f32, rows as f32);

    // Canonical arrangement: cell (i, j) holds sub-cell (j, i).
    let mut points = Vec::with_capacity(columns * rows);
    for j in 0..rows {
        for i in 0..columns {
            let x = (i as f32 + (j as f32 + rng.gen::<f32>()) / k) / m;
            let y = (j as f32 + (i as f32 + rng.gen::<f32>()) / m) / k;
            points.push(Vec2::new(x, y));
        }
    }

    // Swapping x within a column and y within a row keeps both strata.
    for i in 0..columns {
        for j in 0..rows {
            let other = rng.gen_range(j..rows);
            let (a, b) = (j * columns + i, other * columns + i);
            let x = points[a].x;
            points[a].x = points[b].x;
            points[b].x = x;
        }
    }
    for j in 0..rows {
        for i in 0..columns {
            let other = rng.gen_range(i..columns);
            let (a, b) = (j * columns + i, j * columns + other);
            let y = points[a].y;
            points[a].y = points[b].y;
            points[b].y = y;
        }
    }

    points.truncate(n);
    points
}

/// Van der Corput radical inverse of `i` in `base`.
pub fn radical_inverse(mut i: usize, base: usize) -> f32 {
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut result = 0.0f64;
    while i > 0 {
        result += (i % base) as f64 * factor;
        i /= base;
        factor *= inv_base;
    }
    result.min(1.0 - f64::EPSILON) as f32
}
