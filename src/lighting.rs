//! Light sources and the local illumination model.
//!
//! Lights are a closed set of variants behind the [`Light`] enum, so the per-pixel shading
//! loop dispatches with a `match` instead of through a vtable.
//!
//! The shading model is the classic ambient + diffuse (+ specular for Phong) sum:
//!
//! ```text
//! color = ambient * albedo
//!       + sum over lights of  max(0, N.L) * radiance * albedo
//!       + sum over lights of  specular * max(0, R.V)^shininess * radiance   (Phong only)
//! ```

use crate::error::{Error, Result};
use crate::math::{Mat4, Vec3};
use crate::rendering::color;
use crate::scene::mesh::Material;

/// Distances to point and spot lights are clamped to at least this, so a surface touching the
/// light never divides by zero.
pub const MIN_LIGHT_DISTANCE: f64 = 1e-3;

/// Distance falloff `1 / (constant + linear * d + quadratic * d^2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    pub constant: f64,
    pub linear: f64,
    pub quadratic: f64,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.1,
            quadratic: 0.02,
        }
    }
}

impl Attenuation {
    /// Creates an attenuation curve that strictly decreases with distance.
    pub fn new(constant: f64, linear: f64, quadratic: f64) -> Result<Self> {
        let finite = constant.is_finite() && linear.is_finite() && quadratic.is_finite();
        if !finite || constant <= 0.0 || linear < 0.0 || quadratic < 0.0 || linear + quadratic <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "attenuation ({constant}, {linear}, {quadratic}) must have a positive constant \
                 and non-negative linear/quadratic terms, not both zero"
            )));
        }
        Ok(Self {
            constant,
            linear,
            quadratic,
        })
    }

    pub fn factor(&self, distance: f64) -> f64 {
        let d = distance.max(MIN_LIGHT_DISTANCE);
        1.0 / (self.constant + self.linear * d + self.quadratic * d * d)
    }
}

/// A light infinitely far away, shining along `direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    /// The direction the light travels in, e.g. `(0, -1, 0)` shines straight down.
    pub direction: Vec3,
    pub color: [u8; 3],
    pub intensity: f64,
}

/// A light radiating from a point in all directions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: [u8; 3],
    pub intensity: f64,
    pub attenuation: Attenuation,
}

/// A point light restricted to a cone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    /// The direction the cone points in.
    pub direction: Vec3,
    pub color: [u8; 3],
    pub intensity: f64,
    pub attenuation: Attenuation,
    /// Half-angle of the fully lit inner cone, in radians.
    pub inner_angle: f64,
    /// Half-angle of the outer cone, in radians. Nothing outside it is lit.
    pub outer_angle: f64,
}

impl SpotLight {
    /// Fraction of light reaching `point`: 1 inside the inner cone, 0 outside the outer cone
    /// and linear in the angle's cosine in between.
    pub fn cone_factor(&self, point: Vec3) -> f64 {
        let to_point = (point - self.position).normalized();
        let cos_theta = self.direction.normalized().dot(to_point);
        let cos_inner = self.inner_angle.cos();
        let cos_outer = self.outer_angle.cos();
        if cos_theta >= cos_inner {
            1.0
        } else if cos_theta < cos_outer {
            0.0
        } else {
            (cos_theta - cos_outer) / (cos_inner - cos_outer)
        }
    }
}

/// Light arriving at a surface point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Illumination {
    /// Unit vector from the surface towards the light.
    pub direction: Vec3,
    /// Incoming light color, already scaled by intensity and falloff.
    pub radiance: Vec3,
    /// `max(0, N.L)`.
    pub diffuse: f64,
    /// `max(0, R.V)` with `R` the light direction mirrored about the normal.
    /// Zero whenever the surface faces away from the light.
    pub reflection: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl Light {
    pub fn directional(direction: Vec3, color: [u8; 3], intensity: f64) -> Self {
        Light::Directional(DirectionalLight {
            direction: direction.normalized(),
            color,
            intensity,
        })
    }

    /// A point light with the default [`Attenuation`].
    pub fn point(position: Vec3, color: [u8; 3], intensity: f64) -> Self {
        Light::Point(PointLight {
            position,
            color,
            intensity,
            attenuation: Attenuation::default(),
        })
    }

    /// A spot light with the default [`Attenuation`]. Cone angles are half-angles in degrees.
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        color: [u8; 3],
        intensity: f64,
        inner_degrees: f64,
        outer_degrees: f64,
    ) -> Result<Self> {
        if !(0.0..180.0).contains(&inner_degrees)
            || !(0.0..180.0).contains(&outer_degrees)
            || inner_degrees > outer_degrees
        {
            return Err(Error::InvalidConfig(format!(
                "spot light cone angles must satisfy 0 <= inner ({inner_degrees}) <= outer ({outer_degrees}) < 180"
            )));
        }
        if direction.normalized() == Vec3::ZERO {
            return Err(Error::InvalidConfig(
                "spot light direction must not be zero".to_string(),
            ));
        }
        Ok(Light::Spot(SpotLight {
            position,
            direction: direction.normalized(),
            color,
            intensity,
            attenuation: Attenuation::default(),
            inner_angle: inner_degrees.to_radians(),
            outer_angle: outer_degrees.to_radians(),
        }))
    }

    /// Replaces the attenuation of point and spot lights. Directional lights are unaffected.
    pub fn with_attenuation(self, attenuation: Attenuation) -> Self {
        match self {
            Light::Directional(_) => self,
            Light::Point(light) => Light::Point(PointLight {
                attenuation,
                ..light
            }),
            Light::Spot(light) => Light::Spot(SpotLight {
                attenuation,
                ..light
            }),
        }
    }

    pub fn color(&self) -> [u8; 3] {
        match self {
            Light::Directional(light) => light.color,
            Light::Point(light) => light.color,
            Light::Spot(light) => light.color,
        }
    }

    pub fn intensity(&self) -> f64 {
        match self {
            Light::Directional(light) => light.intensity,
            Light::Point(light) => light.intensity,
            Light::Spot(light) => light.intensity,
        }
    }

    /// Computes the light arriving at `point` on a surface with unit `normal`, seen along
    /// `view_direction` (unit vector from the surface towards the viewer).
    pub fn illuminate(&self, point: Vec3, normal: Vec3, view_direction: Vec3) -> Illumination {
        let base = color::to_float(self.color()) * self.intensity();
        let (direction, radiance) = match self {
            Light::Directional(light) => ((-light.direction).normalized(), base),
            Light::Point(light) => {
                let to_light = light.position - point;
                let falloff = light.attenuation.factor(to_light.length());
                (to_light.normalized(), base * falloff)
            }
            Light::Spot(light) => {
                let to_light = light.position - point;
                let falloff = light.attenuation.factor(to_light.length()) * light.cone_factor(point);
                (to_light.normalized(), base * falloff)
            }
        };
        let n_dot_l = normal.dot(direction);
        let (diffuse, reflection) = if n_dot_l > 0.0 {
            let reflected = (-direction).reflect(normal);
            (n_dot_l, reflected.dot(view_direction).max(0.0))
        } else {
            (0.0, 0.0)
        };
        Illumination {
            direction,
            radiance,
            diffuse,
            reflection,
        }
    }

    /// Moves the light from its node's local space into world space.
    ///
    /// Returns `None` when `world` collapses the light's position or direction, e.g. a zero
    /// scale or a projective matrix.
    pub fn to_world(&self, world: &Mat4) -> Option<Light> {
        let direction = |d: Vec3| {
            let d = world.transform_vector(d).normalized();
            (d != Vec3::ZERO && d.is_finite()).then_some(d)
        };
        let light = match *self {
            Light::Directional(light) => Light::Directional(DirectionalLight {
                direction: direction(light.direction)?,
                ..light
            }),
            Light::Point(light) => Light::Point(PointLight {
                position: world.transform_point(light.position)?,
                ..light
            }),
            Light::Spot(light) => Light::Spot(SpotLight {
                position: world.transform_point(light.position)?,
                direction: direction(light.direction)?,
                ..light
            }),
        };
        Some(light)
    }
}

/// Everything about a fragment the shading model needs.
#[derive(Clone, Copy, Debug)]
pub struct Surface {
    pub position: Vec3,
    /// Unit normal facing the viewer's side of the surface.
    pub normal: Vec3,
    /// Base color as a float color.
    pub albedo: Vec3,
}

/// Per-frame inputs shared by every fragment.
#[derive(Clone, Copy, Debug)]
pub struct ShadingContext<'a> {
    /// World space lights.
    pub lights: &'a [Light],
    pub ambient: Vec3,
    /// World space camera position, for the specular term.
    pub eye: Vec3,
}

/// Ambient + diffuse lighting, as used for flat shading.
pub fn shade_diffuse(ctx: &ShadingContext, surface: &Surface) -> Vec3 {
    let view_direction = (ctx.eye - surface.position).normalized();
    let mut total = ctx.ambient.hadamard(surface.albedo);
    for light in ctx.lights {
        let incoming = light.illuminate(surface.position, surface.normal, view_direction);
        total += incoming.radiance.hadamard(surface.albedo) * incoming.diffuse;
    }
    total
}

/// Ambient + diffuse + specular lighting.
pub fn shade_phong(ctx: &ShadingContext, surface: &Surface, material: &Material) -> Vec3 {
    let view_direction = (ctx.eye - surface.position).normalized();
    let mut total = ctx.ambient.hadamard(surface.albedo);
    for light in ctx.lights {
        let incoming = light.illuminate(surface.position, surface.normal, view_direction);
        if incoming.diffuse <= 0.0 {
            continue;
        }
        total += incoming.radiance.hadamard(surface.albedo) * incoming.diffuse;
        if incoming.reflection > 0.0 {
            total += incoming.radiance * (material.specular * incoming.reflection.powf(material.shininess));
        }
    }
    total
}
