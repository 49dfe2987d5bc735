//! Homogeneous four component vector, as produced by a projection.

use crate::math::vec3::Vec3;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Vec4 {
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Extends a point with `w = 1`.
    pub const fn from_point(p: Vec3) -> Self {
        Self::new(p.x, p.y, p.z, 1.0)
    }

    /// Extends a direction with `w = 0`, so translations do not apply to it.
    pub const fn from_direction(d: Vec3) -> Self {
        Self::new(d.x, d.y, d.z, 0.0)
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn dot(self, other: Vec4) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn lerp(self, other: Vec4, t: f64) -> Vec4 {
        Vec4::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
            self.w + (other.w - self.w) * t,
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }
}
