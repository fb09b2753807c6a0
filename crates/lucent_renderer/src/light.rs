//! Light sampling for direct illumination.

use lucent_core::Light;
use lucent_math::{Color, Vec2, Vec3};

/// A point on a light as seen from a shading point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Illumination {
    pub position: Vec3,
    /// Intensity before inverse-square falloff.
    pub intensity: Color,
}

/// Sample `light` for the shading point `point`.
///
/// `sample` in `[0, 1)²` selects the position on an area light. Ambient
/// lights have no position and return `None`.
pub fn sample_light(light: &Light, point: Vec3, sample: Vec2) -> Option<Illumination> {
    match light {
        Light::Ambient { .. } => None,
        Light::Point {
            position,
            intensity,
        } => Some(Illumination {
            position: *position,
            intensity: *intensity,
        }),
        Light::Area {
            position,
            normal,
            size,
            radiance,
        } => {
            let (tangent, bitangent) = normal.any_orthonormal_pair();
            let on_light = *position
                + (sample.x - 0.5) * size * tangent
                + (sample.y - 0.5) * size * bitangent;
            let to_light = (on_light - point).normalize_or_zero();
            let cos_light = normal.dot(-to_light).max(0.0);
            Some(Illumination {
                position: on_light,
                intensity: *radiance * (size * size * cos_light),
            })
        }
    }
}
