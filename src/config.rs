//! Renderer configuration.
//!
//! [`RenderConfig`] can be built in code or deserialized with serde; missing fields fall back
//! to their defaults.
//!
//! ```rust
//! use teng3d::config::{RenderConfig, ShadingMode};
//!
//! let config = RenderConfig {
//!     columns: 80,
//!     rows: 24,
//!     shading: ShadingMode::Phong,
//!     ..RenderConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest accepted terminal dimension, in characters.
pub const MAX_DIMENSION: usize = 4096;

/// How triangles are turned into pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadingMode {
    /// Only triangle edges are drawn, unlit.
    Wireframe,
    /// One normal and one color per triangle.
    #[default]
    Flat,
    /// Per-pixel interpolated normals with a specular term.
    Phong,
}

impl FromStr for ShadingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wireframe" => Ok(ShadingMode::Wireframe),
            "flat" => Ok(ShadingMode::Flat),
            "phong" => Ok(ShadingMode::Phong),
            other => Err(Error::InvalidConfig(format!(
                "unknown shading mode '{other}', expected one of wireframe, flat, phong"
            ))),
        }
    }
}

impl fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShadingMode::Wireframe => "wireframe",
            ShadingMode::Flat => "flat",
            ShadingMode::Phong => "phong",
        };
        f.write_str(name)
    }
}

/// Output and shading settings of a [`Renderer`](crate::rendering::renderer::Renderer).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output width in terminal characters. One character is one pixel wide.
    pub columns: usize,
    /// Output height in terminal characters. One character is two pixels tall.
    pub rows: usize,
    /// Shading mode for meshes that do not override it in their material.
    pub shading: ShadingMode,
    /// Color of pixels not covered by any geometry.
    pub background: [u8; 3],
    /// Ambient light color, added to every lit surface regardless of light sources.
    pub ambient: [u8; 3],
    /// Skip triangles facing away from the camera.
    pub backface_culling: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            columns: 80,
            rows: 24,
            shading: ShadingMode::Flat,
            background: [12, 12, 20],
            ambient: [50, 50, 60],
            backface_culling: true,
        }
    }
}

impl RenderConfig {
    /// Creates a default configuration with the given resolution in characters.
    pub fn with_resolution(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    /// Checks that the configuration describes a renderable output.
    pub fn validate(&self) -> Result<()> {
        validate_resolution(self.columns, self.rows)
    }

    /// Width of the pixel buffer.
    pub fn pixel_width(&self) -> usize {
        self.columns
    }

    /// Height of the pixel buffer, two pixels per character row.
    pub fn pixel_height(&self) -> usize {
        self.rows * 2
    }
}

pub(crate) fn validate_resolution(columns: usize, rows: usize) -> Result<()> {
    if columns == 0 || rows == 0 {
        return Err(Error::InvalidConfig(format!(
            "resolution must be at least 1x1 characters, got {columns}x{rows}"
        )));
    }
    if columns > MAX_DIMENSION || rows > MAX_DIMENSION {
        return Err(Error::InvalidConfig(format!(
            "resolution {columns}x{rows} exceeds the maximum of {MAX_DIMENSION}x{MAX_DIMENSION}"
        )));
    }
    Ok(())
}
