//! The viewpoint a frame is rendered from.

use crate::error::{Error, Result};
use crate::math::{Mat4, Vec3};
use std::f64::consts::TAU;

/// How a [`Camera`] is pointed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Orientation {
    /// Euler angles in radians: pitch around X, yaw around Y, roll around Z.
    /// All zero looks down `-Z` with `+Y` up.
    Euler(Vec3),
    /// Always faces `target`, keeping `up` as close to screen-up as possible.
    LookAt { target: Vec3, up: Vec3 },
}

/// A perspective camera.
///
/// The camera is not part of the scene graph, the host moves it between frames like any
/// scene node. View space is right-handed and looks down `-Z`.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    position: Vec3,
    orientation: Orientation,
    fov_degrees: f64,
    near: f64,
    far: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Orientation::Euler(Vec3::ZERO),
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Creates a camera at the origin looking down `-Z`.
    ///
    /// `fov_degrees` is the vertical field of view and must lie strictly between 0 and 180.
    /// The clip planes must satisfy `0 < near < far`.
    pub fn new(fov_degrees: f64, near: f64, far: f64) -> Result<Self> {
        validate_fov(fov_degrees)?;
        validate_clip_planes(near, far)?;
        Ok(Self {
            fov_degrees,
            near,
            far,
            ..Self::default()
        })
    }

    /// Creates a default camera at `position` facing `target`.
    pub fn looking_at(position: Vec3, target: Vec3, up: Vec3) -> Result<Self> {
        let mut camera = Self::default().with_position(position);
        camera.look_at(target, up)?;
        Ok(camera)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, euler: Vec3) -> Self {
        self.orientation = Orientation::Euler(euler);
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn fov_degrees(&self) -> f64 {
        self.fov_degrees
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn translate_by(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Switches to Euler orientation.
    pub fn set_rotation(&mut self, euler: Vec3) {
        self.orientation = Orientation::Euler(euler);
    }

    /// Adds to the Euler angles, wrapping them into `[0, 2pi)`. A look-at camera keeps
    /// facing its target.
    pub fn rotate_by(&mut self, delta: Vec3) {
        if let Orientation::Euler(euler) = self.orientation {
            let r = euler + delta;
            self.orientation = Orientation::Euler(Vec3::new(
                r.x.rem_euclid(TAU),
                r.y.rem_euclid(TAU),
                r.z.rem_euclid(TAU),
            ));
        }
    }

    /// Points the camera at `target`. Fails if the camera sits on the target or `up` is
    /// parallel to the viewing direction.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) -> Result<()> {
        if Mat4::look_at(self.position, target, up).is_none() {
            return Err(Error::InvalidConfig(format!(
                "cannot look at {target:?} from {:?} with up {up:?}",
                self.position
            )));
        }
        self.orientation = Orientation::LookAt { target, up };
        Ok(())
    }

    pub fn set_fov(&mut self, fov_degrees: f64) -> Result<()> {
        validate_fov(fov_degrees)?;
        self.fov_degrees = fov_degrees;
        Ok(())
    }

    pub fn set_clip_planes(&mut self, near: f64, far: f64) -> Result<()> {
        validate_clip_planes(near, far)?;
        self.near = near;
        self.far = far;
        Ok(())
    }

    /// World to view space.
    pub fn view_matrix(&self) -> Mat4 {
        match self.orientation {
            Orientation::Euler(euler) => {
                Mat4::rotation_z(-euler.z)
                    * Mat4::rotation_x(-euler.x)
                    * Mat4::rotation_y(-euler.y)
                    * Mat4::translation(-self.position)
            }
            Orientation::LookAt { target, up } => {
                // the camera may have been moved onto its target since look_at was called
                Mat4::look_at(self.position, target, up).unwrap_or_else(|| {
                    log::trace!("degenerate look-at, falling back to looking down -Z");
                    Mat4::translation(-self.position)
                })
            }
        }
    }

    /// View to clip space for an output `aspect` ratio (width / height).
    pub fn projection_matrix(&self, aspect: f64) -> Mat4 {
        Mat4::perspective(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    /// Unit vector the camera looks along, in world space.
    pub fn forward(&self) -> Vec3 {
        match self.orientation {
            Orientation::Euler(euler) => Mat4::rotation(euler).transform_vector(-Vec3::Z),
            Orientation::LookAt { target, .. } => (target - self.position).normalized(),
        }
    }
}

fn validate_fov(fov_degrees: f64) -> Result<()> {
    if !fov_degrees.is_finite() || fov_degrees <= 0.0 || fov_degrees >= 180.0 {
        return Err(Error::InvalidConfig(format!(
            "field of view must be between 0 and 180 degrees, got {fov_degrees}"
        )));
    }
    Ok(())
}

fn validate_clip_planes(near: f64, far: f64) -> Result<()> {
    if !near.is_finite() || !far.is_finite() || near <= 0.0 || far <= near {
        return Err(Error::InvalidConfig(format!(
            "clip planes must satisfy 0 < near < far, got near {near} and far {far}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(Camera::new(0.0, 0.1, 10.0).is_err());
        assert!(Camera::new(180.0, 0.1, 10.0).is_err());
        assert!(Camera::new(f64::NAN, 0.1, 10.0).is_err());
        assert!(Camera::new(60.0, 0.0, 10.0).is_err());
        assert!(Camera::new(60.0, 5.0, 5.0).is_err());
        assert!(Camera::new(60.0, 0.1, f64::INFINITY).is_err());
        let mut camera = Camera::new(60.0, 0.1, 10.0).unwrap();
        assert!(camera.set_fov(-3.0).is_err());
        assert_eq!(camera.fov_degrees(), 60.0);
    }

    #[test]
    fn test_euler_view_is_inverse_of_camera_placement() {
        let euler = Vec3::new(0.3, -1.2, 0.4);
        let camera = Camera::default()
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(euler);
        let placement = Mat4::translation(camera.position()) * Mat4::rotation(euler);
        assert!((camera.view_matrix() * placement).approx_eq(&Mat4::IDENTITY, 1e-12));
    }

    #[test]
    fn test_yawed_camera_sees_positive_z() {
        let camera = Camera::default()
            .with_position(Vec3::new(0.0, 0.0, -5.0))
            .with_rotation(Vec3::new(0.0, PI, 0.0));
        assert!(camera.forward().approx_eq(Vec3::Z, 1e-12));
        let origin = camera.view_matrix().transform_point(Vec3::ZERO).unwrap();
        assert!(origin.approx_eq(Vec3::new(0.0, 0.0, -5.0), 1e-12));
    }

    #[test]
    fn test_look_at() {
        let mut camera = Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y).unwrap();
        assert!(camera.forward().approx_eq(-Vec3::Z, 1e-12));
        assert!(camera.look_at(Vec3::new(0.0, 10.0, 5.0), Vec3::Y).is_err());
        // moving onto the target still yields a usable matrix
        camera.set_position(Vec3::ZERO);
        assert!(camera.view_matrix().is_finite());
    }
}
