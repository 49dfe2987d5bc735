//! Turning a scene into terminal output.
//!
//! **Sub-modules:**
//!
//! *   [`renderer`](crate::rendering::renderer): The [`Renderer`](renderer::Renderer) running the per-frame pipeline.
//! *   [`clip`](crate::rendering::clip): Frustum culling and clipping in homogeneous clip space.
//! *   [`raster`](crate::rendering::raster): Fixed-point triangle scan conversion.
//! *   [`framebuffer`](crate::rendering::framebuffer): The color and depth buffers frames are drawn into.
//! *   [`encoder`](crate::rendering::encoder): Half-block truecolor encoding of a finished frame.
//! *   [`color`](crate::rendering::color): Conversion between 8-bit and float colors.
//!
//! **Rendering Process (Simplified):**
//!
//! 1.  Build a [`SceneGraph`](crate::scene::SceneGraph) and a [`Camera`](crate::scene::camera::Camera).
//! 2.  Create a [`Renderer`](renderer::Renderer) for the terminal size.
//! 3.  Call [`Renderer::render`](renderer::Renderer::render) once per frame and write the
//!     returned string to the terminal, or use
//!     [`Renderer::render_to`](renderer::Renderer::render_to) to write it directly.
//! 4.  Move nodes around between frames.

pub mod clip;
pub mod color;
pub mod encoder;
pub mod framebuffer;
pub mod raster;
pub mod renderer;
