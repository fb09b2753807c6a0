//! Camera ray generation.

use lucent_core::Camera;
use lucent_math::{Ray, UVec2, Vec2, Vec3};

/// Ray generator for one camera, with its image-plane basis precomputed.
#[derive(Debug, Clone)]
pub struct CameraRays {
    position: Vec3,
    gaze: Vec3,
    /// Image-plane right and up vectors.
    u: Vec3,
    v: Vec3,
    /// Top-left corner of the near plane.
    top_left: Vec3,
    /// Near-plane extent of one pixel along `u` and `-v`.
    pixel_width: f32,
    pixel_height: f32,
    focus_distance: f32,
    aperture_size: f32,
}

impl CameraRays {
    pub fn new(camera: &Camera) -> Self {
        let gaze = camera.gaze.normalize();
        let u = gaze.cross(camera.up).normalize();
        let v = u.cross(gaze);
        let [left, right, bottom, top] = camera.near_plane;

        let center = camera.position + gaze * camera.near_distance;
        Self {
            position: camera.position,
            gaze,
            u,
            v,
            top_left: center + left * u + top * v,
            pixel_width: (right - left) / camera.image_width.max(1) as f32,
            pixel_height: (top - bottom) / camera.image_height.max(1) as f32,
            focus_distance: camera.focus_distance,
            aperture_size: camera.aperture_size,
        }
    }

    pub fn has_depth_of_field(&self) -> bool {
        self.aperture_size > 0.0
    }

    /// Ray through `pixel` (column, row from the top) at sub-pixel offset
    /// `jitter`, leaving the lens at `aperture` and sampling `time`.
    pub fn ray(&self, pixel: UVec2, jitter: Vec2, aperture: Vec2, time: f32) -> Ray {
        let s_u = (pixel.x as f32 + jitter.x) * self.pixel_width;
        let s_v = (pixel.y as f32 + jitter.y) * self.pixel_height;
        let on_plane = self.top_left + s_u * self.u - s_v * self.v;
        let direction = on_plane - self.position;

        let ray = if self.has_depth_of_field() {
            let unit = direction.normalize();
            let focus_point = self.position + unit * (self.focus_distance / unit.dot(self.gaze));
            let origin = self.position
                + (aperture.x - 0.5) * self.aperture_size * self.u
                + (aperture.y - 0.5) * self.aperture_size * self.v;
            Ray::new(origin, focus_point - origin)
        } else {
            Ray::new(self.position, direction)
        };

        ray.with_time(time).with_pixel(pixel, jitter)
    }
}
