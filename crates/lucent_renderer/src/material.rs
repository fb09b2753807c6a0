//! Reflection and refraction helpers for the recursive material terms.

use lucent_math::Vec3;

/// Mirror `d` about the plane with normal `n`.
#[inline]
pub fn reflect(d: Vec3, n: Vec3) -> Vec3 {
    d - 2.0 * d.dot(n) * n
}

/// Fresnel reflectance of a conductor with complex index `n + ik`,
/// averaged over s and p polarisation.
pub fn conductor_fresnel(cos_theta: f32, n: f32, k: f32) -> f32 {
    let cos2 = cos_theta * cos_theta;
    let nk2 = n * n + k * k;
    let two_n_cos = 2.0 * n * cos_theta;

    let rs = (nk2 - two_n_cos + cos2) / (nk2 + two_n_cos + cos2);
    let rp = (nk2 * cos2 - two_n_cos + 1.0) / (nk2 * cos2 + two_n_cos + 1.0);
    (rs + rp) / 2.0
}

/// Transmission through a dielectric interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refraction {
    /// Unit direction of the transmitted ray.
    pub direction: Vec3,
    /// Fresnel reflectance `Fr`.
    pub reflectance: f32,
    /// `Ft = 1 - Fr`.
    pub transmittance: f32,
}

/// Snell refraction of `d` at a surface with normal `n` (facing the incoming
/// ray) going from index `n1` into index `n2`.
///
/// Returns `None` on total internal reflection.
pub fn refract(d: Vec3, n: Vec3, n1: f32, n2: f32) -> Option<Refraction> {
    let cos_theta = (-d).dot(n).clamp(-1.0, 1.0);
    let eta = n1 / n2;
    let cos_phi2 = 1.0 - eta * eta * (1.0 - cos_theta * cos_theta);
    if cos_phi2 <= 0.0 {
        return None;
    }
    let cos_phi = cos_phi2.sqrt();

    let r_parallel = (n2 * cos_theta - n1 * cos_phi) / (n2 * cos_theta + n1 * cos_phi);
    let r_perpendicular = (n1 * cos_theta - n2 * cos_phi) / (n1 * cos_theta + n2 * cos_phi);
    let reflectance = (r_parallel * r_parallel + r_perpendicular * r_perpendicular) / 2.0;

    let direction = (eta * d + (eta * cos_theta - cos_phi) * n).normalize();
    Some(Refraction {
        direction,
        reflectance,
        transmittance: 1.0 - reflectance,
    })
}
