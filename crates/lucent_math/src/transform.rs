// Affine transforms for scene objects.
//
// glam::Mat4 already provides transform_point3(), transform_vector3() and
// inverse(); Transform caches the inverse and inverse-transpose once so the
// per-ray work is just matrix-vector products.

use crate::{Aabb, BVec3, Mat4, Ray, Vec3};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }
        Aabb::enclosing(aabb.corners().map(|corner| self.transform_point3(corner)))
    }
}

/// A 4×4 affine matrix `M` with its cached inverse and inverse-transpose.
///
/// `flip` records, per axis, whether an odd number of negative scale factors
/// has been applied. A transform that flips an odd number of axes reverses
/// triangle winding, so shading normals are negated to stay consistent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Mat4,
    inverse: Mat4,
    inverse_transpose: Mat4,
    flip: BVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        matrix: Mat4::IDENTITY,
        inverse: Mat4::IDENTITY,
        inverse_transpose: Mat4::IDENTITY,
        flip: BVec3::FALSE,
    };

    /// Wraps `matrix`; returns `None` when it is not invertible.
    pub fn new(matrix: Mat4) -> Option<Self> {
        let det = matrix.determinant();
        if !det.is_finite() || det.abs() < f32::EPSILON * f32::EPSILON {
            return None;
        }
        let inverse = matrix.inverse();
        Some(Self {
            matrix,
            inverse,
            inverse_transpose: inverse.transpose(),
            flip: BVec3::FALSE,
        })
    }

    pub fn translation(offset: Vec3) -> Self {
        let matrix = Mat4::from_translation(offset);
        Self {
            matrix,
            inverse: Mat4::from_translation(-offset),
            inverse_transpose: Mat4::from_translation(-offset).transpose(),
            flip: BVec3::FALSE,
        }
    }

    /// Non-uniform scale. Negative factors mark their axis as flipped.
    pub fn scaling(factors: Vec3) -> Option<Self> {
        let flip = factors.cmplt(Vec3::ZERO);
        Self::new(Mat4::from_scale(factors)).map(|t| t.with_flip(flip))
    }

    /// Rotation of `degrees` around `axis` (normalized here).
    pub fn rotation(degrees: f32, axis: Vec3) -> Option<Self> {
        let axis = axis.try_normalize()?;
        Self::new(Mat4::from_axis_angle(axis, degrees.to_radians()))
    }

    /// Arbitrary matrix given in row-major order. A negative determinant
    /// is recorded as a flip of the x axis.
    pub fn composite(rows: [[f32; 4]; 4]) -> Option<Self> {
        let matrix = Mat4::from_cols_array_2d(&rows).transpose();
        let mirrored = matrix.determinant() < 0.0;
        Self::new(matrix).map(|t| t.with_flip(BVec3::new(mirrored, false, false)))
    }

    pub fn with_flip(mut self, flip: BVec3) -> Self {
        self.flip = flip;
        self
    }

    /// `outer ∘ self`: apply this transform first, then `outer`.
    /// Flip flags combine by parity.
    pub fn then(&self, outer: &Transform) -> Transform {
        let matrix = outer.matrix * self.matrix;
        let inverse = self.inverse * outer.inverse;
        Transform {
            matrix,
            inverse,
            inverse_transpose: inverse.transpose(),
            flip: self.flip ^ outer.flip,
        }
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    pub fn inverse(&self) -> &Mat4 {
        &self.inverse
    }

    pub fn inverse_transpose(&self) -> &Mat4 {
        &self.inverse_transpose
    }

    pub fn flip(&self) -> BVec3 {
        self.flip
    }

    /// True when an odd number of axes are flipped.
    pub fn flips_handedness(&self) -> bool {
        self.flip.x ^ self.flip.y ^ self.flip.z
    }

    #[inline]
    pub fn point_to_world(&self, p: Vec3) -> Vec3 {
        self.matrix.transform_point3(p)
    }

    #[inline]
    pub fn point_to_local(&self, p: Vec3) -> Vec3 {
        self.inverse.transform_point3(p)
    }

    #[inline]
    pub fn vector_to_world(&self, v: Vec3) -> Vec3 {
        self.matrix.transform_vector3(v)
    }

    /// Direction into local space. Not normalized, so local ray parameters
    /// map onto the same points as world ones.
    #[inline]
    pub fn vector_to_local(&self, v: Vec3) -> Vec3 {
        self.inverse.transform_vector3(v)
    }

    /// Local normal to a unit world normal through `(M⁻¹)ᵗ`.
    #[inline]
    pub fn normal_to_world(&self, n: Vec3) -> Vec3 {
        self.inverse_transpose.transform_vector3(n).normalize()
    }

    /// Map a world ray into local space after shifting its origin by
    /// `-offset` (the motion-blur displacement at the ray's time).
    ///
    /// The local direction keeps the scale of `M⁻¹`, so a parameter `t` names
    /// the same point in both spaces.
    pub fn ray_to_local(&self, ray: &Ray, offset: Vec3) -> Ray {
        Ray {
            origin: self.point_to_local(ray.origin - offset),
            direction: self.vector_to_local(ray.direction),
            ..*ray
        }
    }

    pub fn bounds_to_world(&self, local: &Aabb) -> Aabb {
        self.matrix.transform_aabb(local)
    }
}
