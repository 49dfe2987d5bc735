//! The color and depth buffers a frame is rasterized into.
//!
//! A [`FrameBuffer`] is a grid of `width` by `height` pixels, each carrying an RGB color and
//! a depth value. Depth is in `[0, 1]` with smaller values closer to the camera; cleared
//! pixels have infinite depth so the first fragment always wins.
//!
//! Pixels are square and twice as dense vertically as terminal rows, see
//! [`encoder`](crate::rendering::encoder) for how pairs of rows become one line of text.

use std::fmt;
use std::fmt::{Debug, Formatter};
use std::ops::Index;

/// A 2D color + depth buffer.
///
/// # Example
///
/// ```rust
/// use teng3d::rendering::framebuffer::FrameBuffer;
///
/// let mut buffer = FrameBuffer::new(4, 2, [0, 0, 0]);
/// assert!(buffer.depth_test_and_set(1, 1, 0.5, [255, 0, 0]));
/// // farther fragments lose
/// assert!(!buffer.depth_test_and_set(1, 1, 0.7, [0, 255, 0]));
/// assert_eq!(buffer[(1, 1)], [255, 0, 0]);
/// ```
#[derive(Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    colors: Vec<[u8; 3]>,
    depth: Vec<f64>,
}

impl Debug for FrameBuffer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "FrameBuffer {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl FrameBuffer {
    /// Creates a cleared buffer.
    pub fn new(width: usize, height: usize, background: [u8; 3]) -> Self {
        Self {
            width,
            height,
            colors: vec![background; width * height],
            depth: vec![f64::INFINITY; width * height],
        }
    }

    /// Resets every pixel to `background` at infinite depth.
    pub fn clear(&mut self, background: [u8; 3]) {
        self.colors.fill(background);
        self.depth.fill(f64::INFINITY);
    }

    /// Resizes the buffer, mangling any existing pixel data.
    ///
    /// Only use this before a [`clear`](Self::clear), which the renderer does every frame.
    pub fn resize_discard(&mut self, width: usize, height: usize) {
        self.colors.resize(width * height, [0, 0, 0]);
        self.depth.resize(width * height, f64::INFINITY);
        self.width = width;
        self.height = height;
    }

    #[inline]
    fn get_index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Color at `(x, y)`, or `None` if out of bounds.
    pub fn color(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        self.get_index(x, y).map(|idx| self.colors[idx])
    }

    /// Depth at `(x, y)`, or `None` if out of bounds.
    pub fn depth(&self, x: usize, y: usize) -> Option<f64> {
        self.get_index(x, y).map(|idx| self.depth[idx])
    }

    /// Writes a fragment if it is strictly closer than what the pixel already holds.
    ///
    /// Returns whether the fragment was written. Out of bounds fragments are discarded.
    #[inline]
    pub fn depth_test_and_set(&mut self, x: usize, y: usize, depth: f64, color: [u8; 3]) -> bool {
        let Some(idx) = self.get_index(x, y) else {
            return false;
        };
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.colors[idx] = color;
            true
        } else {
            false
        }
    }

    /// Only the depth test part of [`depth_test_and_set`](Self::depth_test_and_set), for
    /// skipping shading of hidden fragments.
    #[inline]
    pub fn passes_depth_test(&self, x: usize, y: usize, depth: f64) -> bool {
        self.get_index(x, y).is_some_and(|idx| depth < self.depth[idx])
    }

    /// Colors of row `y`, left to right.
    pub fn row(&self, y: usize) -> &[[u8; 3]] {
        &self.colors[y * self.width..(y + 1) * self.width]
    }

    /// Iterates over all rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[[u8; 3]]> {
        // chunks panics on a zero chunk size
        self.colors.chunks(self.width.max(1)).take(self.height)
    }

    /// Iterates over all pixel colors along with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, [u8; 3])> + '_ {
        self.colors.iter().enumerate().map(|(idx, color)| {
            let x = idx % self.width;
            let y = idx / self.width;
            (x, y, *color)
        })
    }
}

impl Index<(usize, usize)> for FrameBuffer {
    type Output = [u8; 3];

    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.colors[y * self.width + x]
    }
}
