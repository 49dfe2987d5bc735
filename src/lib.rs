#![doc = include_str!("../README.md")]

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{cursor, execute};
use std::io;
use std::io::{Stdout, Write, stdout};

pub mod config;
pub mod error;
pub mod lighting;
pub mod math;
pub mod rendering;
pub mod scene;
pub mod util;

pub use config::{RenderConfig, ShadingMode};
pub use error::{Error, Result};
pub use rendering::renderer::{FrameStats, Renderer};
pub use scene::{NodeId, SceneGraph};

/// Prepares the terminal for full screen frames.
///
/// Switches to the alternate screen, enables raw mode and hides the cursor.
pub fn terminal_setup() -> io::Result<()> {
    let mut stdout = stdout();

    execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    enable_raw_mode()?;
    // don't print cursor
    execute!(stdout, cursor::Hide)?;

    Ok(())
}

/// Undoes everything [`terminal_setup`] did.
pub fn terminal_cleanup() -> io::Result<()> {
    let mut stdout = stdout();
    execute!(stdout, crossterm::style::ResetColor)?;
    execute!(stdout, cursor::Show)?;
    execute!(
        stdout,
        crossterm::terminal::Clear(crossterm::terminal::ClearType::All)
    )?;

    disable_raw_mode()?;

    execute!(stdout, crossterm::terminal::LeaveAlternateScreen)?;

    Ok(())
}

/// Installs a panic handler that restores the terminal before printing the panic.
///
/// Without this, the panic message would not be displayed properly because we're in raw mode
/// and in the alternate screen.
pub fn install_panic_handler() {
    let old_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |pinfo| {
        // nothing left to do if this fails as well
        let _ = terminal_cleanup();
        eprintln!("{}", pinfo);
        old_hook(pinfo);
    }));
}

/// Buffered stdout writer that _only_ writes on an explicit flush.
///
/// A frame is tens of kilobytes of escape sequences. Handing it to the terminal in one write
/// avoids tearing, which a `BufWriter` flushing whenever its buffer fills up would cause.
pub struct CustomBufWriter {
    buf: Vec<u8>,
    stdout: Stdout,
}

impl Default for CustomBufWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomBufWriter {
    pub fn new() -> Self {
        Self {
            buf: vec![],
            stdout: stdout(),
        }
    }
}

impl Write for CustomBufWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut lock = self.stdout.lock();
        lock.write_all(&self.buf)?;
        lock.flush()?;
        self.buf.clear();
        Ok(())
    }
}
