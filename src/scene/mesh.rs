//! Triangle meshes and their surface material.

use crate::config::ShadingMode;
use crate::error::{Error, Result};
use crate::math::Vec3;

/// A single mesh vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    /// Should be unit length. The renderer renormalizes after transforming, so a sloppy
    /// normal only costs accuracy, and a zero normal falls back to the face normal.
    pub normal: Vec3,
    pub uv: Option<[f64; 2]>,
    /// Replaces the material color at this vertex. Colors are blended across the triangle.
    pub color: Option<[u8; 3]>,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            uv: None,
            color: None,
        }
    }

    pub fn with_uv(self, uv: [f64; 2]) -> Self {
        Self {
            uv: Some(uv),
            ..self
        }
    }

    pub fn with_color(self, color: [u8; 3]) -> Self {
        Self {
            color: Some(color),
            ..self
        }
    }
}

/// Surface properties used by the shading model.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Base color, used where vertices carry no color.
    pub color: [u8; 3],
    /// Strength of the specular highlight in Phong mode.
    pub specular: f64,
    /// Specular exponent in Phong mode. Higher is a tighter highlight.
    pub shininess: f64,
    /// Overrides the renderer's shading mode for this mesh.
    pub shading: Option<ShadingMode>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [200, 200, 200],
            specular: 0.5,
            shininess: 32.0,
            shading: None,
        }
    }
}

impl Material {
    pub fn with_color(color: [u8; 3]) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box containing all `points`, or `None` if there are none.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
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
}

/// An indexed triangle mesh.
///
/// Triangles are counter-clockwise when seen from their front side. The vertex and index
/// data are fixed after construction; moving a mesh around is done through the
/// [`SceneNode`](crate::scene::node::SceneNode) it is attached to.
#[derive(Clone, Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    triangles: Vec<[u32; 3]>,
    material: Material,
    bounds: Option<Aabb>,
}

impl Mesh {
    /// Creates a mesh, rejecting triangles that reference out-of-range vertices.
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        let vertex_count = vertices.len();
        for (triangle, indices) in triangles.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(Error::InvalidIndex {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(Self::from_valid_parts(vertices, triangles))
    }

    /// Builds a mesh whose indices are known to be in range.
    pub(crate) fn from_valid_parts(vertices: Vec<Vertex>, triangles: Vec<[u32; 3]>) -> Self {
        debug_assert!(triangles.iter().flatten().all(|&i| (i as usize) < vertices.len()));
        let bounds = Aabb::from_points(vertices.iter().map(|v| v.position));
        Self {
            vertices,
            triangles,
            material: Material::default(),
            bounds,
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    /// Local space bounding box, `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Replaces all vertex normals with smooth, area weighted face normals.
    pub fn recompute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];
        for &[a, b, c] in &self.triangles {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let pa = self.vertices[a].position;
            // not normalized: longer cross products weigh larger triangles more
            let face = (self.vertices[b].position - pa).cross(self.vertices[c].position - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = normal.normalized();
        }
    }
}
