//! Inertial motion after a fling: exponential friction decay, stopped by the
//! image edges.

use std::time::Duration;

/// Inclusive range of window origins a fling may move through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Bounds {
    /// Creates bounds, raising each max to its min if needed.
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x: max_x.max(min_x),
            min_y,
            max_y: max_y.max(min_y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Axis {
    position: f64,
    velocity: f64,
    min: f64,
    max: f64,
}

impl Axis {
    fn new(origin: i32, velocity: f32, min: i32, max: i32, stop_speed: f64) -> Self {
        let (min, max) = (f64::from(min), f64::from(max));
        let position = f64::from(origin).clamp(min, max);
        let mut axis = Self {
            position,
            velocity: f64::from(velocity),
            min,
            max,
        };
        let pushing_out = (position <= min && axis.velocity < 0.0)
            || (position >= max && axis.velocity > 0.0);
        if pushing_out || !axis.velocity.is_finite() || axis.velocity.abs() < stop_speed {
            axis.velocity = 0.0;
        }
        axis
    }

    fn is_settled(&self) -> bool {
        self.velocity == 0.0
    }

    /// Advances by `dt` seconds using the closed form of `dv/dt = -k v`.
    fn step(&mut self, dt: f64, friction: f64, stop_speed: f64) {
        if self.is_settled() {
            return;
        }
        let decay = (-friction * dt).exp();
        self.position += self.velocity * (1.0 - decay) / friction;
        self.velocity *= decay;

        if self.position <= self.min {
            self.position = self.min;
            self.velocity = 0.0;
        } else if self.position >= self.max {
            self.position = self.max;
            self.velocity = 0.0;
        } else if self.velocity.abs() < stop_speed {
            self.velocity = 0.0;
        }
    }

    fn offset(&self) -> i32 {
        self.position.round() as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MotionState {
    Idle,
    Running { x: Axis, y: Axis },
}

/// Fling simulator: Idle until [`start`](Self::start), Running while ticks move
/// the origin, Idle again once both axes settle or on [`cancel`](Self::cancel).
#[derive(Debug, Clone)]
pub struct InertialMotion {
    state: MotionState,
    friction: f64,
    stop_speed: f64,
}

impl InertialMotion {
    /// `friction` is the velocity decay rate per second, `stop_speed` the
    /// speed (pixels per second) below which an axis settles.
    pub fn new(friction: f32, stop_speed: f32) -> Self {
        Self {
            state: MotionState::Idle,
            friction: f64::from(friction).max(f64::EPSILON),
            stop_speed: f64::from(stop_speed).max(0.0),
        }
    }

    /// Starts a fling from `origin` with `velocity` in pixels per second.
    ///
    /// Returns `false` and stays idle when there is nothing to animate: every
    /// axis is either too slow or already at the bound it is moving toward.
    pub fn start(&mut self, origin: (i32, i32), velocity: (f32, f32), bounds: Bounds) -> bool {
        let x = Axis::new(origin.0, velocity.0, bounds.min_x, bounds.max_x, self.stop_speed);
        let y = Axis::new(origin.1, velocity.1, bounds.min_y, bounds.max_y, self.stop_speed);

        if x.is_settled() && y.is_settled() {
            log::trace!("fling from {origin:?} with {velocity:?} has nothing to do");
            self.state = MotionState::Idle;
            return false;
        }

        log::trace!("fling from {origin:?} with {velocity:?} within {bounds:?}");
        self.state = MotionState::Running { x, y };
        true
    }

    /// Advances the motion by `dt`.
    ///
    /// Returns the new origin while running (including the final, settled
    /// position), or `None` when idle.
    pub fn tick(&mut self, dt: Duration) -> Option<(i32, i32)> {
        let MotionState::Running { mut x, mut y } = self.state else {
            return None;
        };

        let dt = dt.as_secs_f64();
        x.step(dt, self.friction, self.stop_speed);
        y.step(dt, self.friction, self.stop_speed);
        let offset = (x.offset(), y.offset());

        self.state = if x.is_settled() && y.is_settled() {
            log::trace!("fling settled at {offset:?}");
            MotionState::Idle
        } else {
            MotionState::Running { x, y }
        };
        Some(offset)
    }

    /// Stops any running motion, discarding the remaining distance.
    pub fn cancel(&mut self) {
        if self.is_running() {
            log::trace!("fling cancelled");
        }
        self.state = MotionState::Idle;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, MotionState::Running { .. })
    }

    /// Current velocity, zero when idle.
    pub fn velocity(&self) -> (f32, f32) {
        match self.state {
            MotionState::Idle => (0.0, 0.0),
            MotionState::Running { x, y } => (x.velocity as f32, y.velocity as f32),
        }
    }

    /// Current origin, if running.
    pub fn position(&self) -> Option<(i32, i32)> {
        match self.state {
            MotionState::Idle => None,
            MotionState::Running { x, y } => Some((x.offset(), y.offset())),
        }
    }
}
