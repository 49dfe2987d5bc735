//! Common utility functions.

/// Runs a function for each coordinate on the line from `start` to `end`, both inclusive.
///
/// Besides the coordinate, `f` receives how far along the line it is, from `0.0` at `start`
/// to `1.0` at `end`, so callers can interpolate per-endpoint attributes like depth.
pub fn for_coord_in_line(
    (start_x, start_y): (i64, i64),
    (end_x, end_y): (i64, i64),
    mut f: impl FnMut(i64, i64, f64),
) {
    let dx = (end_x - start_x).abs();
    let dy = (end_y - start_y).abs();
    let sx = if start_x < end_x { 1 } else { -1 };
    let sy = if start_y < end_y { 1 } else { -1 };
    // the major axis advances exactly once per step
    let steps = dx.max(dy);
    let mut err = dx - dy;
    let mut x = start_x;
    let mut y = start_y;
    let mut step = 0;
    loop {
        let t = if steps == 0 { 0.0 } else { step as f64 / steps as f64 };
        f(x, y, t);
        if x == end_x && y == end_y {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
        step += 1;
    }
}

/// Accumulates frame time and hands it out in fixed-size steps, so animation advances at the
/// same rate no matter how fast frames are rendered.
///
/// # Example
/// ```
/// use teng3d::util::FixedUpdateRunner;
///
/// let mut runner = FixedUpdateRunner::new_from_rate_per_second(60.0);
/// let dt = 0.1; // from the frame loop
/// runner.fuel(dt);
/// while runner.has_gas() {
///     runner.consume();
///     // advance the animation by one fixed step
/// }
/// ```
pub struct FixedUpdateRunner {
    dt_accumulator: f64,
    fixed_dt: f64,
}

impl FixedUpdateRunner {
    /// Creates a runner that consumes `fixed_dt` seconds per step.
    pub fn new(fixed_dt: f64) -> Self {
        Self {
            dt_accumulator: 0.0,
            fixed_dt,
        }
    }

    /// Creates a runner that consumes `1.0 / rate` seconds per step.
    pub fn new_from_rate_per_second(rate: f64) -> Self {
        Self::new(1.0 / rate)
    }

    /// Length of one step in seconds.
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    pub fn fuel(&mut self, dt: f64) {
        self.dt_accumulator += dt;
    }

    pub fn has_gas(&self) -> bool {
        self.dt_accumulator >= self.fixed_dt
    }

    pub fn consume(&mut self) {
        self.dt_accumulator -= self.fixed_dt;
    }

    /// Steps that could be consumed right now.
    pub fn available_ticks(&self) -> u64 {
        (self.dt_accumulator / self.fixed_dt).floor() as u64
    }
}
