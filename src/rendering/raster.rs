//! Triangle scan conversion.
//!
//! Vertices are snapped to a grid of [`SUBPIXEL`] steps per pixel and all coverage math is
//! done with exact integer edge functions. Pixels are sampled at their centers. A center that
//! lies exactly on an edge belongs to the triangle only if that edge is a top or a left edge,
//! so two triangles sharing an edge never both cover, or both miss, a pixel on it.

use crate::math::Vec3;
use crate::rendering::clip::ClipVertex;

/// Subpixel steps per pixel.
pub const SUBPIXEL: i64 = 16;

/// A vertex after the perspective divide and viewport transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenVertex {
    /// Horizontal pixel coordinate, `0.0` is the left edge of the buffer.
    pub x: f64,
    /// Vertical pixel coordinate, `0.0` is the top edge of the buffer.
    pub y: f64,
    /// Depth in `[0, 1]`, `0.0` on the near plane.
    pub depth: f64,
    /// `1 / w`, for perspective-correct interpolation.
    pub inv_w: f64,
}

impl ScreenVertex {
    /// Projects a clipped vertex onto a `width` by `height` pixel buffer.
    ///
    /// Returns `None` for vertices on or behind the camera plane, which clipping normally
    /// already removed.
    pub fn from_clip(v: &ClipVertex, width: usize, height: usize) -> Option<Self> {
        let w = v.clip.w;
        if w <= 0.0 || !v.clip.is_finite() {
            return None;
        }
        let inv_w = 1.0 / w;
        let ndc = v.clip.xyz() * inv_w;
        Some(Self {
            x: (ndc.x + 1.0) * 0.5 * width as f64,
            y: (1.0 - ndc.y) * 0.5 * height as f64,
            depth: (ndc.z + 1.0) * 0.5,
            inv_w,
        })
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.depth.is_finite() && self.inv_w.is_finite()
    }
}

/// A pixel covered by a triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fragment {
    pub x: usize,
    pub y: usize,
    /// Interpolated depth, linear in screen space.
    pub depth: f64,
    /// Barycentric weights of the triangle's vertices, in the order they were passed in.
    /// Screen space linear, sums to 1.
    pub linear: [f64; 3],
    /// Perspective-correct barycentric weights, sums to 1.
    pub perspective: [f64; 3],
}

impl Fragment {
    /// Perspective-correct interpolation of a per-vertex attribute.
    pub fn interpolate(&self, values: [Vec3; 3]) -> Vec3 {
        values[0] * self.perspective[0] + values[1] * self.perspective[1] + values[2] * self.perspective[2]
    }
}

fn snap(v: f64) -> i64 {
    (v * SUBPIXEL as f64).round() as i64
}

/// Twice the signed area of `a, b, p`. Positive if `p` lies to the right of `a -> b` in the
/// y-down screen space.
#[inline]
fn edge(a: (i64, i64), b: (i64, i64), p: (i64, i64)) -> i64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

/// For a triangle with positive [`edge`] area: whether `a -> b` is a top edge (horizontal,
/// with the triangle below it) or a left edge.
#[inline]
fn is_top_left(a: (i64, i64), b: (i64, i64)) -> bool {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    (dy == 0 && dx > 0) || dy < 0
}

/// Calls `f` for every pixel of a `width` by `height` buffer whose center the triangle covers.
///
/// Both windings are accepted. Degenerate triangles cover nothing. Returns the number of
/// covered pixels.
pub fn rasterize_triangle(
    vertices: &[ScreenVertex; 3],
    width: usize,
    height: usize,
    mut f: impl FnMut(&Fragment),
) -> usize {
    if width == 0 || height == 0 || !vertices.iter().all(ScreenVertex::is_finite) {
        return 0;
    }
    let mut p = vertices.map(|v| (snap(v.x), snap(v.y)));
    // p[i] is vertices[order[i]]
    let mut order = [0, 1, 2];
    let mut area = edge(p[0], p[1], p[2]);
    if area == 0 {
        return 0;
    }
    if area < 0 {
        p.swap(1, 2);
        order.swap(1, 2);
        area = -area;
    }

    let min_x = p[0].0.min(p[1].0).min(p[2].0);
    let max_x = p[0].0.max(p[1].0).max(p[2].0);
    let min_y = p[0].1.min(p[1].1).min(p[2].1);
    let max_y = p[0].1.max(p[1].1).max(p[2].1);
    let (w, h) = (width as i64, height as i64);
    if max_x < 0 || max_y < 0 || min_x >= w * SUBPIXEL || min_y >= h * SUBPIXEL {
        return 0;
    }
    let x0 = min_x.div_euclid(SUBPIXEL).clamp(0, w - 1);
    let x1 = max_x.div_euclid(SUBPIXEL).clamp(0, w - 1);
    let y0 = min_y.div_euclid(SUBPIXEL).clamp(0, h - 1);
    let y1 = max_y.div_euclid(SUBPIXEL).clamp(0, h - 1);

    // edge i is opposite vertex i
    let edges = [(p[1], p[2]), (p[2], p[0]), (p[0], p[1])];
    let bias = edges.map(|(a, b)| if is_top_left(a, b) { 0 } else { -1 });
    let step_x = edges.map(|(a, b)| (a.1 - b.1) * SUBPIXEL);
    let step_y = edges.map(|(a, b)| (b.0 - a.0) * SUBPIXEL);
    let start = (x0 * SUBPIXEL + SUBPIXEL / 2, y0 * SUBPIXEL + SUBPIXEL / 2);
    let mut row = edges.map(|(a, b)| edge(a, b, start));

    let depth = order.map(|i| vertices[i].depth);
    let inv_w = order.map(|i| vertices[i].inv_w);
    let area = area as f64;

    let mut covered = 0;
    for y in y0..=y1 {
        let mut e = row;
        for x in x0..=x1 {
            if e[0] + bias[0] >= 0 && e[1] + bias[1] >= 0 && e[2] + bias[2] >= 0 {
                let l = e.map(|v| v as f64 / area);
                let pw = [l[0] * inv_w[0], l[1] * inv_w[1], l[2] * inv_w[2]];
                let pw_sum = pw[0] + pw[1] + pw[2];
                let mut fragment = Fragment {
                    x: x as usize,
                    y: y as usize,
                    depth: l[0] * depth[0] + l[1] * depth[1] + l[2] * depth[2],
                    linear: [0.0; 3],
                    perspective: [0.0; 3],
                };
                for i in 0..3 {
                    fragment.linear[order[i]] = l[i];
                    fragment.perspective[order[i]] = if pw_sum > 0.0 { pw[i] / pw_sum } else { l[i] };
                }
                f(&fragment);
                covered += 1;
            }
            for i in 0..3 {
                e[i] += step_x[i];
            }
        }
        for i in 0..3 {
            row[i] += step_y[i];
        }
    }
    covered
}
