//! Scene nodes and their local transforms.

use crate::lighting::Light;
use crate::math::{Mat4, Vec3};
use crate::scene::NodeId;
use crate::scene::mesh::Mesh;
use smallvec::SmallVec;
use std::f64::consts::TAU;

/// Position, rotation and scale of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians: pitch around X, yaw around Y, roll around Z.
    /// See [`Mat4::rotation`] for the order they are applied in.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// The local matrix: scale first, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::translation(self.position) * Mat4::rotation(self.rotation) * Mat4::scale(self.scale)
    }
}

/// A node in the [`SceneGraph`](crate::scene::SceneGraph).
///
/// Holds a local [`Transform`] and optionally a mesh and a light, which are placed in the
/// world by the node's world transform. The movement methods only ever touch the transform,
/// so animating a node never rebuilds its mesh.
#[derive(Clone, Debug)]
pub struct SceneNode {
    name: String,
    pub transform: Transform,
    mesh: Option<Mesh>,
    light: Option<Light>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            mesh: None,
            light: None,
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.light = Some(light);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        self.mesh.as_mut()
    }

    pub fn set_mesh(&mut self, mesh: Option<Mesh>) {
        self.mesh = mesh;
    }

    pub fn light(&self) -> Option<&Light> {
        self.light.as_ref()
    }

    pub fn light_mut(&mut self) -> Option<&mut Light> {
        self.light.as_mut()
    }

    pub fn set_light(&mut self, light: Option<Light>) {
        self.light = light;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    pub fn translate_by(&mut self, delta: Vec3) {
        self.transform.position += delta;
    }

    /// Adds `delta` (radians) to the rotation, keeping each angle within `[0, 2pi)`.
    pub fn rotate_by(&mut self, delta: Vec3) {
        let r = self.transform.rotation + delta;
        self.transform.rotation = Vec3::new(r.x.rem_euclid(TAU), r.y.rem_euclid(TAU), r.z.rem_euclid(TAU));
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.transform.rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_applies_scale_rotation_translation_in_order() {
        let node = SceneNode::new("n")
            .with_position(Vec3::new(10.0, 0.0, 0.0))
            .with_rotation(Vec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2))
            .with_scale(Vec3::new(2.0, 1.0, 1.0));
        let p = node.local_matrix().transform_point(Vec3::X).unwrap();
        // scaled to (2, 0, 0), rotated to (0, 2, 0), moved to (10, 2, 0)
        assert!(p.approx_eq(Vec3::new(10.0, 2.0, 0.0), 1e-12));
    }

    #[test]
    fn test_rotate_by_wraps() {
        let mut node = SceneNode::new("n");
        node.rotate_by(Vec3::new(-0.5, 7.0, TAU));
        let r = node.transform.rotation;
        assert!((r.x - (TAU - 0.5)).abs() < 1e-12);
        assert!((r.y - (7.0 - TAU)).abs() < 1e-12);
        assert!(r.z.abs() < 1e-12);
    }

    #[test]
    fn test_movement_keeps_mesh_untouched() {
        let mesh = crate::scene::shapes::cube(1.0, [255, 0, 0]);
        let before = mesh.vertices().to_vec();
        let mut node = SceneNode::new("cube").with_mesh(mesh);
        node.translate_by(Vec3::new(1.0, 2.0, 3.0));
        node.rotate_by(Vec3::splat(0.3));
        node.set_scale(Vec3::splat(4.0));
        assert_eq!(node.mesh().unwrap().vertices(), &before[..]);
    }
}
