//! Pixel reconstruction filters and tone mapping.

use serde::{Deserialize, Serialize};

use lucent_math::{Color, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Plain mean of the samples.
    #[default]
    Box,
    /// Gaussian weights centred on the pixel centre.
    Gaussian,
}

/// One traced sample of a pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub color: Color,
    /// Position within the pixel, `[0, 1)²`.
    pub offset: Vec2,
}

/// Weight of a sample at `offset` under a Gaussian of deviation `sigma`.
#[inline]
pub fn gaussian_weight(offset: Vec2, sigma: f32) -> f32 {
    let d = offset - Vec2::splat(0.5);
    (-d.length_squared() / (2.0 * sigma * sigma)).exp()
}

/// Reconstruct one pixel from its samples. No samples give black.
pub fn filter(kind: FilterKind, sigma: f32, samples: &[PixelSample]) -> Color {
    if samples.is_empty() {
        return Color::ZERO;
    }

    match kind {
        FilterKind::Box => {
            samples.iter().map(|s| s.color).sum::<Color>() / samples.len() as f32
        }
        FilterKind::Gaussian => {
            let (sum, weights) = samples.iter().fold((Color::ZERO, 0.0), |(sum, weights), s| {
                let w = gaussian_weight(s.offset, sigma);
                (sum + s.color * w, weights + w)
            });
            if weights > 0.0 {
                sum / weights
            } else {
                Color::ZERO
            }
        }
    }
}

/// Clamp each channel to `[0, 255]` and quantise.
#[inline]
pub fn clamp_to_rgb8(color: Color) -> [u8; 3] {
    let c = color.clamp(Color::ZERO, Color::splat(255.0));
    [c.x as u8, c.y as u8, c.z as u8]
}
