//! Turning a [`FrameBuffer`] into terminal output.
//!
//! Every character cell shows two vertically stacked pixels. A cell whose pixels differ is
//! printed as an upper half block `▀` with the top pixel as foreground and the bottom pixel
//! as background color. A cell whose pixels match is printed as a full block `█` with only
//! its foreground set, which leaves the background untouched and often saves an escape
//! sequence.
//!
//! Colors are 24-bit truecolor and only sent when they change, so runs of equal colors cost
//! one escape sequence. Rows are separated with a move to the start of the next line rather
//! than a newline, which behaves the same in raw mode. Every frame ends with a color reset.

use crate::rendering::framebuffer::FrameBuffer;
use crossterm::queue;
use crossterm::style::{Color, Colors, Print, ResetColor, SetColors};
use std::io;
use std::io::Write;

pub const UPPER_HALF_BLOCK: char = '▀';
pub const FULL_BLOCK: char = '█';

fn rgb(color: [u8; 3]) -> Color {
    Color::Rgb {
        r: color[0],
        g: color[1],
        b: color[2],
    }
}

/// Writes one frame to `sink` and flushes it.
///
/// The output starts wherever the cursor currently is; callers usually move it to the top
/// left first.
pub fn encode_into<W: Write>(sink: &mut W, frame: &FrameBuffer) -> io::Result<()> {
    let rows = frame.height().div_ceil(2);
    // unknown until the first cell sets them
    let mut last_fg: Option<[u8; 3]> = None;
    let mut last_bg: Option<[u8; 3]> = None;

    for row in 0..rows {
        let top = frame.row(row * 2);
        // an odd height leaves the last row without a bottom half, draw it as full blocks
        let bottom = if row * 2 + 1 < frame.height() {
            frame.row(row * 2 + 1)
        } else {
            top
        };
        for (&upper, &lower) in top.iter().zip(bottom) {
            let glyph = if upper == lower {
                FULL_BLOCK
            } else {
                UPPER_HALF_BLOCK
            };
            let foreground = (last_fg != Some(upper)).then(|| rgb(upper));
            let background = (glyph == UPPER_HALF_BLOCK && last_bg != Some(lower)).then(|| rgb(lower));
            if foreground.is_some() || background.is_some() {
                queue!(
                    sink,
                    SetColors(Colors {
                        foreground,
                        background,
                    })
                )?;
            }
            last_fg = Some(upper);
            if glyph == UPPER_HALF_BLOCK {
                last_bg = Some(lower);
            }
            queue!(sink, Print(glyph))?;
        }
        if row + 1 < rows {
            queue!(sink, crossterm::cursor::MoveToNextLine(1))?;
        }
    }
    queue!(sink, ResetColor)?;
    sink.flush()
}

/// Encodes frames into strings, reusing one output buffer.
#[derive(Debug, Default)]
pub struct HalfBlockEncoder {
    buffer: Vec<u8>,
}

impl HalfBlockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `frame` into a single string ready to be written to the terminal.
    pub fn encode(&mut self, frame: &FrameBuffer) -> io::Result<String> {
        self.buffer.clear();
        encode_into(&mut self.buffer, frame)?;
        std::str::from_utf8(&self.buffer)
            .map(str::to_owned)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];

    fn frame(width: usize, height: usize, pixels: &[(usize, usize, [u8; 3])]) -> FrameBuffer {
        let mut frame = FrameBuffer::new(width, height, BLUE);
        for &(x, y, color) in pixels {
            frame.depth_test_and_set(x, y, 0.0, color);
        }
        frame
    }

    fn glyphs(output: &str) -> usize {
        output
            .chars()
            .filter(|&c| c == UPPER_HALF_BLOCK || c == FULL_BLOCK)
            .count()
    }

    #[test]
    fn test_uniform_frame_sets_color_once() {
        let output = HalfBlockEncoder::new().encode(&frame(6, 4, &[])).unwrap();
        assert_eq!(glyphs(&output), 12);
        assert_eq!(output.chars().filter(|&c| c == FULL_BLOCK).count(), 12);
        assert_eq!(output.matches("38;2;0;0;255").count(), 1);
        // backgrounds never needed
        assert!(!output.contains("48;2;"));
    }

    #[test]
    fn test_half_block_carries_both_colors() {
        let output = HalfBlockEncoder::new().encode(&frame(1, 2, &[(0, 0, RED)])).unwrap();
        assert!(output.contains("38;2;255;0;0"));
        assert!(output.contains("48;2;0;0;255"));
        assert_eq!(output.chars().filter(|&c| c == UPPER_HALF_BLOCK).count(), 1);
    }

    #[test]
    fn test_runs_coalesce_and_changes_are_emitted() {
        // red over blue for the first three cells, then plain blue
        let pixels = [(0, 0, RED), (1, 0, RED), (2, 0, RED)];
        let output = HalfBlockEncoder::new().encode(&frame(5, 2, &pixels)).unwrap();
        assert_eq!(output.matches("38;2;255;0;0").count(), 1);
        assert_eq!(output.matches("48;2;0;0;255").count(), 1);
        assert_eq!(output.matches("38;2;0;0;255").count(), 1);
    }

    #[test]
    fn test_rows_and_reset() {
        let output = HalfBlockEncoder::new().encode(&frame(3, 6, &[])).unwrap();
        // three rows, two separators
        assert_eq!(output.matches("\x1b[1E").count(), 2);
        assert!(output.ends_with("\x1b[0m"));
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_encoder_buffer_is_reused_between_frames() {
        let mut encoder = HalfBlockEncoder::new();
        let first = encoder.encode(&frame(4, 4, &[(1, 1, RED)])).unwrap();
        let second = encoder.encode(&frame(4, 4, &[(1, 1, RED)])).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_odd_height_draws_last_row_as_full_blocks() {
        let output = HalfBlockEncoder::new().encode(&frame(2, 3, &[(0, 0, RED)])).unwrap();
        assert_eq!(glyphs(&output), 4);
    }
}
