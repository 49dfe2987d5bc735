//! Clip space culling and clipping.
//!
//! Vertices are in homogeneous clip space as produced by
//! [`Mat4::perspective`](crate::math::Mat4::perspective): a point is inside the view frustum iff
//! `-w <= x, y, z <= w`. Polygons are clipped against the near and far planes exactly. The
//! side planes are widened to a guard band of [`GUARD_BAND`] times the frustum, so that only
//! very large triangles get cut there and everything else is left to the rasterizer's
//! bounding box clamp.
//!
//! Near plane clipping also guarantees `w >= near > 0` for every surviving vertex, which
//! keeps the perspective divide away from zero.

use crate::math::{Vec3, Vec4};
use smallvec::SmallVec;

/// Lateral clip planes sit at `|x|, |y| = GUARD_BAND * w`.
pub const GUARD_BAND: f64 = 4.0;

/// A vertex in clip space with the attributes interpolated across its triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipVertex {
    pub clip: Vec4,
    /// World space position.
    pub world: Vec3,
    /// World space unit normal.
    pub normal: Vec3,
    /// Float color.
    pub color: Vec3,
}

impl ClipVertex {
    /// Interpolates all attributes linearly. Clip space is pre-divide, so this is the
    /// perspective-correct interpolation for points along an edge.
    pub fn lerp(&self, other: &ClipVertex, t: f64) -> ClipVertex {
        ClipVertex {
            clip: self.clip.lerp(other.clip, t),
            world: self.world.lerp(other.world, t),
            normal: self.normal.lerp(other.normal, t),
            color: self.color.lerp(other.color, t),
        }
    }
}

/// A convex polygon, a triangle grows by at most one vertex per clip plane.
pub type ClipPolygon = SmallVec<[ClipVertex; 9]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Plane {
    Near,
    Far,
    Left,
    Right,
    Bottom,
    Top,
}

const PLANES: [Plane; 6] = [
    Plane::Near,
    Plane::Far,
    Plane::Left,
    Plane::Right,
    Plane::Bottom,
    Plane::Top,
];

impl Plane {
    /// Signed distance of `v` to the plane, non-negative on the inside. The side planes are
    /// scaled by `band`.
    fn distance(self, v: Vec4, band: f64) -> f64 {
        match self {
            Plane::Near => v.z + v.w,
            Plane::Far => v.w - v.z,
            Plane::Left => v.x + band * v.w,
            Plane::Right => band * v.w - v.x,
            Plane::Bottom => v.y + band * v.w,
            Plane::Top => band * v.w - v.y,
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Bitmask of the frustum planes `v` lies outside of. Zero means inside.
pub fn outcode(v: Vec4) -> u8 {
    PLANES
        .iter()
        .filter(|plane| plane.distance(v, 1.0) < 0.0)
        .fold(0, |code, plane| code | plane.bit())
}

/// True if all `points` lie outside the same frustum plane, so nothing spanned by them can
/// be visible.
pub fn all_outside(points: impl IntoIterator<Item = Vec4>) -> bool {
    points.into_iter().fold(u8::MAX, |code, p| code & outcode(p)) != 0
}

/// Clips `polygon` in place against the near and far planes and the guard band.
///
/// `scratch` is working memory; its contents are overwritten. Afterwards `polygon` holds
/// the visible part (fewer than three vertices if nothing is left).
pub fn clip_polygon(polygon: &mut ClipPolygon, scratch: &mut ClipPolygon) {
    for plane in PLANES {
        if polygon.len() < 3 {
            polygon.clear();
            return;
        }
        if polygon.iter().all(|v| plane.distance(v.clip, GUARD_BAND) >= 0.0) {
            continue;
        }
        scratch.clear();
        for i in 0..polygon.len() {
            let current = polygon[i];
            let next = polygon[(i + 1) % polygon.len()];
            let d_current = plane.distance(current.clip, GUARD_BAND);
            let d_next = plane.distance(next.clip, GUARD_BAND);
            if d_current >= 0.0 {
                scratch.push(current);
            }
            if (d_current >= 0.0) != (d_next >= 0.0) {
                let t = d_current / (d_current - d_next);
                scratch.push(current.lerp(&next, t));
            }
        }
        std::mem::swap(polygon, scratch);
    }
    if polygon.len() < 3 {
        polygon.clear();
    }
}

/// Clips the segment `a`-`b` to the view frustum (no guard band, lines have no fill rule
/// to protect). Returns `None` if nothing is visible.
pub fn clip_segment(a: &ClipVertex, b: &ClipVertex) -> Option<(ClipVertex, ClipVertex)> {
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for plane in PLANES {
        let da = plane.distance(a.clip, 1.0);
        let db = plane.distance(b.clip, 1.0);
        match (da >= 0.0, db >= 0.0) {
            (true, true) => {}
            (false, false) => return None,
            (true, false) => t1 = t1.min(da / (da - db)),
            (false, true) => t0 = t0.max(da / (da - db)),
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((a.lerp(b, t0), a.lerp(b, t1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f64, y: f64, z: f64, w: f64) -> ClipVertex {
        ClipVertex {
            clip: Vec4::new(x, y, z, w),
            world: Vec3::new(x, y, z),
            normal: Vec3::Z,
            color: Vec3::ONE,
        }
    }

    fn clip(vertices: &[ClipVertex]) -> ClipPolygon {
        let mut polygon: ClipPolygon = vertices.iter().copied().collect();
        let mut scratch = ClipPolygon::new();
        clip_polygon(&mut polygon, &mut scratch);
        polygon
    }

    #[test]
    fn test_inside_triangle_is_untouched() {
        let tri = [
            vertex(0.0, 0.0, 0.0, 1.0),
            vertex(0.5, 0.0, 0.0, 1.0),
            vertex(0.0, 0.5, 0.0, 1.0),
        ];
        assert_eq!(&clip(&tri)[..], &tri[..]);
    }

    #[test]
    fn test_behind_near_plane_is_removed() {
        let tri = [
            vertex(0.0, 0.0, -2.0, 1.0),
            vertex(0.5, 0.0, -2.0, 1.0),
            vertex(0.0, 0.5, -2.0, 1.0),
        ];
        assert!(clip(&tri).is_empty());
    }

    #[test]
    fn test_near_plane_cut_produces_quad_on_plane() {
        // one vertex in front of the near plane, two behind it
        let tri = [
            vertex(0.0, 0.0, 0.0, 1.0),
            vertex(0.5, 0.0, -3.0, 1.0),
            vertex(0.0, 0.5, -3.0, 1.0),
        ];
        let polygon = clip(&tri);
        assert_eq!(polygon.len(), 3);
        let tri = [
            vertex(0.0, 0.0, -3.0, 1.0),
            vertex(0.5, 0.0, 0.0, 1.0),
            vertex(0.0, 0.5, 0.0, 1.0),
        ];
        let polygon = clip(&tri);
        assert_eq!(polygon.len(), 4);
        for v in &polygon {
            assert!(v.clip.z + v.clip.w >= -1e-12);
            assert!(v.clip.w > 0.0);
        }
        // attributes follow the cut
        assert!(polygon.iter().any(|v| (v.world.z + 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_guard_band_only_cuts_huge_triangles() {
        let modest = [
            vertex(-3.0, -3.0, 0.0, 1.0),
            vertex(3.0, -3.0, 0.0, 1.0),
            vertex(0.0, 3.0, 0.0, 1.0),
        ];
        assert_eq!(clip(&modest).len(), 3);
        let huge = [
            vertex(-100.0, -1.0, 0.0, 1.0),
            vertex(100.0, -1.0, 0.0, 1.0),
            vertex(0.0, 1.0, 0.0, 1.0),
        ];
        let polygon = clip(&huge);
        assert!(polygon.len() >= 3);
        for v in &polygon {
            assert!(v.clip.x.abs() <= GUARD_BAND * v.clip.w + 1e-9);
        }
    }

    #[test]
    fn test_outcodes() {
        assert_eq!(outcode(Vec4::new(0.0, 0.0, 0.0, 1.0)), 0);
        assert!(all_outside([
            Vec4::new(2.0, 0.0, 0.0, 1.0),
            Vec4::new(3.0, 5.0, 0.0, 1.0),
            Vec4::new(1.5, -5.0, 0.0, 1.0),
        ]));
        // outside different planes, may still cross the frustum
        assert!(!all_outside([
            Vec4::new(2.0, 0.0, 0.0, 1.0),
            Vec4::new(-2.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        ]));
    }

    #[test]
    fn test_clip_segment() {
        let a = vertex(-2.0, 0.0, 0.0, 1.0);
        let b = vertex(2.0, 0.0, 0.0, 1.0);
        let (ca, cb) = clip_segment(&a, &b).unwrap();
        assert!((ca.clip.x + 1.0).abs() < 1e-12);
        assert!((cb.clip.x - 1.0).abs() < 1e-12);
        let c = vertex(2.0, 3.0, 0.0, 1.0);
        assert!(clip_segment(&b, &c).is_none());
    }
}
