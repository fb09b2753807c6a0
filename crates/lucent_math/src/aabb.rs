use crate::{axis_component, Interval, Ray, Vec3};

/// Axis-aligned bounding box stored as its min/max corners.
///
/// Boxes built through [`Aabb::from_points`] are padded so no extent is
/// thinner than `MIN_EXTENT`; axis-aligned triangles stay hittable by the
/// slab test that way.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

const MIN_EXTENT: f32 = 0.0001;

impl Aabb {
    /// Box spanning two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let mut aabb = Self {
            min: a.min(b),
            max: a.max(b),
        };
        aabb.pad_to_minimums();
        aabb
    }

    /// Smallest box containing every point of the iterator.
    pub fn enclosing<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut min = Vec3::INFINITY;
        let mut max = Vec3::NEG_INFINITY;
        for p in points {
            min = min.min(p);
            max = max.max(p);
        }
        if min.x > max.x {
            return Aabb::EMPTY;
        }
        Aabb::from_points(min, max)
    }

    pub fn surrounding(a: &Aabb, b: &Aabb) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn axis_interval(&self, axis: usize) -> Interval {
        Interval::new(axis_component(self.min, axis), axis_component(self.max, axis))
    }

    /// `min + max` along `axis`: twice the centroid, used as the BVH sort key.
    pub fn axis_sum(&self, axis: usize) -> f32 {
        axis_component(self.min + self.max, axis)
    }

    /// Slab test against the ray parameter range `ray_t`.
    ///
    /// Intersects the x/y/z parameter intervals and rejects the box when they
    /// are disjoint or the whole overlap lies outside `ray_t`.
    pub fn hit(&self, ray: &Ray, mut ray_t: Interval) -> bool {
        let inv_dir = ray.direction.recip();
        for axis in 0..3 {
            let adinv = axis_component(inv_dir, axis);
            let origin = axis_component(ray.origin, axis);
            let mut t0 = (axis_component(self.min, axis) - origin) * adinv;
            let mut t1 = (axis_component(self.max, axis) - origin) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max < ray_t.min {
                return false;
            }
        }
        true
    }

    fn pad_to_minimums(&mut self) {
        let size = self.max - self.min;
        for axis in 0..3 {
            if axis_component(size, axis) < MIN_EXTENT {
                self.min[axis] -= MIN_EXTENT / 2.0;
                self.max[axis] += MIN_EXTENT / 2.0;
            }
        }
    }

    pub fn translate(&self, offset: Vec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Union of the box at rest and the box swept by `motion`.
    pub fn swept(&self, motion: Vec3) -> Aabb {
        Aabb::surrounding(self, &self.translate(motion))
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn contains_box(&self, other: &Aabb) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };
}
