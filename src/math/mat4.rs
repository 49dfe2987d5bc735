//! 4x4 homogeneous transformation matrices.
//!
//! Matrices act on column vectors: `m * v`. Composition therefore reads right to left,
//! `a * b` is the transform that applies `b` first and `a` second. The scene graph relies
//! on this: `world(child) = world(parent) * local(child)`.

use crate::math::vec3::Vec3;
use crate::math::vec4::Vec4;
use std::ops::Mul;

/// Homogeneous `w` values smaller than this are treated as "at the camera plane".
pub const W_EPSILON: f64 = 1e-9;

/// A matrix counts as singular when the determinant of its upper 3x3 block is smaller than
/// this fraction of the product of the block's row lengths, which bounds the determinant.
const SINGULAR_EPSILON: f64 = 1e-12;

/// A 4x4 matrix stored row-major, `m[row][col]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    pub m: [[f64; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_rows(m: [[f64; 4]; 4]) -> Self {
        Self { m }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translation(v: Vec3) -> Self {
        let mut res = Self::IDENTITY;
        res.m[0][3] = v.x;
        res.m[1][3] = v.y;
        res.m[2][3] = v.z;
        res
    }

    pub fn scale(v: Vec3) -> Self {
        let mut res = Self::IDENTITY;
        res.m[0][0] = v.x;
        res.m[1][1] = v.y;
        res.m[2][2] = v.z;
        res
    }

    /// Counter-clockwise rotation around the X axis by `angle` radians (right-handed).
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, -s, 0.0],
            [0.0, s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [c, -s, 0.0, 0.0],
            [s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Combined rotation from Euler angles (radians).
    ///
    /// Applies roll (`z`) first, then pitch (`x`), then yaw (`y`): `Ry * Rx * Rz`.
    pub fn rotation(euler: Vec3) -> Self {
        Self::rotation_y(euler.y) * Self::rotation_x(euler.x) * Self::rotation_z(euler.z)
    }

    /// OpenGL style perspective projection.
    ///
    /// Maps the view space frustum looking down `-Z` to clip space, where after the
    /// perspective divide `near` lands on NDC `z = -1` and `far` on `z = 1`.
    /// The clip space `w` equals the view space distance in front of the camera.
    pub fn perspective(fov_y: f64, aspect: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (fov_y / 2.0).tan();
        Self::from_rows([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [
                0.0,
                0.0,
                (far + near) / (near - far),
                2.0 * far * near / (near - far),
            ],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// View matrix for a camera at `eye` looking at `target`.
    ///
    /// Returns `None` if `eye == target` or `up` is parallel to the viewing direction.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Option<Self> {
        let forward = (target - eye).normalized();
        let side = forward.cross(up).normalized();
        if forward == Vec3::ZERO || side == Vec3::ZERO {
            return None;
        }
        let up = side.cross(forward);
        Some(Self::from_rows([
            [side.x, side.y, side.z, -side.dot(eye)],
            [up.x, up.y, up.z, -up.dot(eye)],
            [-forward.x, -forward.y, -forward.z, forward.dot(eye)],
            [0.0, 0.0, 0.0, 1.0],
        ]))
    }

    pub fn transpose(&self) -> Self {
        let mut res = Self::IDENTITY;
        for row in 0..4 {
            for col in 0..4 {
                res.m[row][col] = self.m[col][row];
            }
        }
        res
    }

    /// Applies the matrix to `p` extended with `w = 1`, without the perspective divide.
    pub fn transform_homogeneous(&self, p: Vec3) -> Vec4 {
        *self * Vec4::from_point(p)
    }

    /// Applies the matrix to the point `p` and divides by the resulting `w`.
    ///
    /// Returns `None` if `w` is (nearly) zero or the result is not finite. Such a point is
    /// on the camera plane or the matrix is degenerate; callers treat it as clipped.
    pub fn transform_point(&self, p: Vec3) -> Option<Vec3> {
        let h = self.transform_homogeneous(p);
        if h.w.abs() < W_EPSILON {
            return None;
        }
        let res = h.xyz() / h.w;
        res.is_finite().then_some(res)
    }

    /// Applies the matrix to the direction `d`, ignoring translation.
    pub fn transform_vector(&self, d: Vec3) -> Vec3 {
        (*self * Vec4::from_direction(d)).xyz()
    }

    /// The inverse-transpose of the upper 3x3 block, embedded in an identity matrix.
    ///
    /// Normals must be transformed with this rather than with the matrix itself, otherwise
    /// they stop being perpendicular to their surface under non-uniform scale.
    /// Returns `None` for singular matrices (e.g. a zero scale on some axis).
    pub fn normal_matrix(&self) -> Option<Self> {
        let a = &self.m;
        // cofactors of the upper 3x3 block
        let c00 = a[1][1] * a[2][2] - a[1][2] * a[2][1];
        let c01 = a[1][2] * a[2][0] - a[1][0] * a[2][2];
        let c02 = a[1][0] * a[2][1] - a[1][1] * a[2][0];
        let c10 = a[0][2] * a[2][1] - a[0][1] * a[2][2];
        let c11 = a[0][0] * a[2][2] - a[0][2] * a[2][0];
        let c12 = a[0][1] * a[2][0] - a[0][0] * a[2][1];
        let c20 = a[0][1] * a[1][2] - a[0][2] * a[1][1];
        let c21 = a[0][2] * a[1][0] - a[0][0] * a[1][2];
        let c22 = a[0][0] * a[1][1] - a[0][1] * a[1][0];

        let det = a[0][0] * c00 + a[0][1] * c01 + a[0][2] * c02;
        let bound = (0..3)
            .map(|r| Vec3::new(a[r][0], a[r][1], a[r][2]).length())
            .product::<f64>();
        if !det.is_finite() || det.abs() <= SINGULAR_EPSILON * bound {
            return None;
        }
        let inv_det = 1.0 / det;
        // inverse = adjugate / det = cofactor^T / det, so its transpose is cofactor / det
        Some(Self::from_rows([
            [c00 * inv_det, c01 * inv_det, c02 * inv_det, 0.0],
            [c10 * inv_det, c11 * inv_det, c12 * inv_det, 0.0],
            [c20 * inv_det, c21 * inv_det, c22 * inv_det, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]))
    }

    /// Determinant of the upper 3x3 block. Negative for transforms that mirror.
    pub fn determinant3(&self) -> f64 {
        let a = &self.m;
        a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1]) - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
            + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0])
    }

    pub fn is_finite(&self) -> bool {
        self.m.iter().flatten().all(|v| v.is_finite())
    }

    /// Returns true if every entry differs by at most `epsilon`.
    pub fn approx_eq(&self, other: &Mat4, epsilon: f64) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Mat4;

    fn mul(self, other: Mat4) -> Self::Output {
        let mut res = Mat4 { m: [[0.0; 4]; 4] };
        for row in 0..4 {
            for col in 0..4 {
                res.m[row][col] = (0..4).map(|k| self.m[row][k] * other.m[k][col]).sum();
            }
        }
        res
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Self::Output {
        let row = |r: [f64; 4]| r[0] * v.x + r[1] * v.y + r[2] * v.z + r[3] * v.w;
        Vec4::new(row(self.m[0]), row(self.m[1]), row(self.m[2]), row(self.m[3]))
    }
}
