//! Color conversion between 8-bit terminal colors and the float colors used for shading.
//!
//! Terminal colors are plain `[u8; 3]` RGB triples. Shading works on [`Vec3`]s with
//! components in `0.0..=1.0` (values above 1 are allowed and clamp on quantization).

use crate::math::Vec3;

/// Converts an 8-bit RGB color to a float color in `0.0..=1.0`.
pub fn to_float(color: [u8; 3]) -> Vec3 {
    Vec3::new(
        color[0] as f64 / 255.0,
        color[1] as f64 / 255.0,
        color[2] as f64 / 255.0,
    )
}

/// Quantizes a float color to 8-bit RGB, clamping out of range (and NaN) components.
pub fn quantize(color: Vec3) -> [u8; 3] {
    let channel = |c: f64| {
        if c.is_nan() {
            0
        } else {
            (c * 255.0).round().clamp(0.0, 255.0) as u8
        }
    };
    [channel(color.x), channel(color.y), channel(color.z)]
}

/// Perceived brightness (Rec. 709 luma) of a color, in `0.0..=255.0`.
pub fn luminance(color: [u8; 3]) -> f64 {
    0.2126 * color[0] as f64 + 0.7152 * color[1] as f64 + 0.0722 * color[2] as f64
}
