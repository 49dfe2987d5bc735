//! Builders for common primitive meshes.
//!
//! All shapes are centered on the origin, wound counter-clockwise when seen from outside and
//! carry the given color as their material color.

use crate::math::Vec3;
use crate::scene::mesh::{Material, Mesh, Vertex};
use std::f64::consts::{PI, TAU};

/// Appends a quad centered at `center`, spanning `u * half_u` and `v * half_v`.
/// The quad faces `u x v`.
fn push_quad(
    vertices: &mut Vec<Vertex>,
    triangles: &mut Vec<[u32; 3]>,
    center: Vec3,
    (u, half_u): (Vec3, f64),
    (v, half_v): (Vec3, f64),
) {
    let normal = u.cross(v).normalized();
    let base = vertices.len() as u32;
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    for (su, sv) in corners {
        let position = center + u * (su * half_u) + v * (sv * half_v);
        let uv = [(su + 1.0) / 2.0, (sv + 1.0) / 2.0];
        vertices.push(Vertex::new(position, normal).with_uv(uv));
    }
    triangles.push([base, base + 1, base + 2]);
    triangles.push([base, base + 2, base + 3]);
}

/// An axis aligned cube with edge length `size`.
///
/// Every face has its own four vertices so flat faces get crisp normals.
pub fn cube(size: f64, color: [u8; 3]) -> Mesh {
    let h = size / 2.0;
    let (x, y, z) = (Vec3::X, Vec3::Y, Vec3::Z);
    // (normal, u, v) with u x v == normal
    let faces = [
        (x, y, z),
        (-x, z, y),
        (y, z, x),
        (-y, x, z),
        (z, x, y),
        (-z, y, x),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut triangles = Vec::with_capacity(12);
    for (normal, u, v) in faces {
        push_quad(&mut vertices, &mut triangles, normal * h, (u, h), (v, h));
    }
    Mesh::from_valid_parts(vertices, triangles).with_material(Material::with_color(color))
}

/// A flat rectangle in the XZ plane facing `+Y`, `width` along X and `depth` along Z.
pub fn plane(width: f64, depth: f64, color: [u8; 3]) -> Mesh {
    let mut vertices = Vec::with_capacity(4);
    let mut triangles = Vec::with_capacity(2);
    push_quad(
        &mut vertices,
        &mut triangles,
        Vec3::ZERO,
        (Vec3::Z, depth / 2.0),
        (Vec3::X, width / 2.0),
    );
    Mesh::from_valid_parts(vertices, triangles).with_material(Material::with_color(color))
}

/// A UV sphere with smooth normals.
///
/// `segments` is the number of slices around the Y axis (at least 3), `rings` the number of
/// stacks from pole to pole (at least 2).
pub fn uv_sphere(radius: f64, segments: usize, rings: usize, color: [u8; 3]) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let stride = segments + 1;

    let mut vertices = Vec::with_capacity((rings + 1) * stride);
    for ring in 0..=rings {
        let v = ring as f64 / rings as f64;
        let theta = v * PI;
        for segment in 0..=segments {
            let u = segment as f64 / segments as f64;
            let phi = u * TAU;
            let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            vertices.push(Vertex::new(normal * radius, normal).with_uv([u, v]));
        }
    }

    let mut triangles = Vec::with_capacity(2 * segments * rings);
    for ring in 0..rings {
        for segment in 0..segments {
            let a = (ring * stride + segment) as u32;
            let b = a + stride as u32;
            let c = b + 1;
            let d = a + 1;
            // a and d coincide at the north pole, b and c at the south pole
            if ring != 0 {
                triangles.push([a, d, b]);
            }
            if ring != rings - 1 {
                triangles.push([d, c, b]);
            }
        }
    }
    Mesh::from_valid_parts(vertices, triangles).with_material(Material::with_color(color))
}
