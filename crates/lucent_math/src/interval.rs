/// Minimum parametric distance accepted as a hit; rejects self-intersections.
pub const HIT_EPSILON: f32 = 1e-5;

/// A closed range of ray parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// The range a primitive hit must fall into: `(HIT_EPSILON, t_max)`.
    pub fn ray(t_max: f32) -> Self {
        Self::new(HIT_EPSILON, t_max)
    }

    /// Exclusive membership.
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }
}
