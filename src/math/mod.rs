//! Vector and matrix math used throughout the pipeline.
//!
//! All math is done in `f64`. Matrices act on column vectors, see [`mat4`] for the
//! composition convention.

pub mod mat4;
pub mod vec3;
pub mod vec4;

pub use mat4::Mat4;
pub use vec3::Vec3;
pub use vec4::Vec4;
