//! Gesture interpreters.
//!
//! Input arrives as abstract [`InputEvent`]s. A [`GestureDispatcher`] routes
//! each event to the handlers registered for its [`EventKind`]; every handler
//! is an independent closure that mutates the viewport or the fling
//! simulator through a [`GestureContext`].
//!
//! ```
//! use bigimg_view::gesture::{EventKind, GestureContext, GestureDispatcher, InputEvent};
//! use bigimg_view::{ImageExtent, InertialMotion, OutputSurface, ViewConfig, Viewport};
//!
//! let config = ViewConfig::default();
//! let mut viewport =
//!     Viewport::layout(OutputSurface::new(500, 800), ImageExtent::new(1000, 2000), &config)
//!         .unwrap();
//! let mut motion = InertialMotion::new(config.friction, config.min_fling_velocity);
//!
//! let mut gestures = GestureDispatcher::with_default_interpreters();
//! gestures.on(EventKind::DoubleTap, |_, _| {
//!     println!("double tap");
//!     false
//! });
//!
//! let mut ctx = GestureContext { viewport: &mut viewport, motion: &mut motion };
//! assert!(gestures.dispatch(&mut ctx, &InputEvent::DoubleTap));
//! assert_eq!(viewport.scale(), 1.5);
//! ```

use crate::motion::InertialMotion;
use crate::viewport::Viewport;
use std::fmt;

/// Toolkit-independent input events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A finger (or button) went down.
    Down,
    /// Incremental drag; the delta is the scroll distance, i.e. previous
    /// pointer position minus current one.
    Move { dx: f32, dy: f32 },
    /// The finger lifted with the given pointer velocity (pixels/second).
    Up { vx: f32, vy: f32 },
    /// Incremental pinch step; `> 1` spreads, `< 1` contracts.
    Pinch { factor: f32 },
    DoubleTap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Down,
    Move,
    Up,
    Pinch,
    DoubleTap,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Down => EventKind::Down,
            Self::Move { .. } => EventKind::Move,
            Self::Up { .. } => EventKind::Up,
            Self::Pinch { .. } => EventKind::Pinch,
            Self::DoubleTap => EventKind::DoubleTap,
        }
    }
}

/// State a gesture handler may mutate.
pub struct GestureContext<'a> {
    pub viewport: &'a mut Viewport,
    pub motion: &'a mut InertialMotion,
}

/// A gesture handler; returns `true` when the view needs to be redrawn.
pub type Handler = Box<dyn FnMut(&mut GestureContext<'_>, &InputEvent) -> bool>;

/// Routes input events to the handlers registered for their kind.
#[derive(Default)]
pub struct GestureDispatcher {
    handlers: Vec<(EventKind, Handler)>,
}

impl fmt::Debug for GestureDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|(kind, _)| kind))
            .finish()
    }
}

impl GestureDispatcher {
    /// A dispatcher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher with touch-down, drag, fling, pinch and double-tap
    /// interpreters registered.
    pub fn with_default_interpreters() -> Self {
        let mut dispatcher = Self::new();
        dispatcher
            .on(EventKind::Down, touch_down())
            .on(EventKind::Move, drag())
            .on(EventKind::Up, fling())
            .on(EventKind::Pinch, pinch())
            .on(EventKind::DoubleTap, double_tap());
        dispatcher
    }

    /// Registers `handler` for events of `kind`. Handlers run in
    /// registration order.
    pub fn on(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&mut GestureContext<'_>, &InputEvent) -> bool + 'static,
    ) -> &mut Self {
        self.handlers.push((kind, Box::new(handler)));
        self
    }

    /// Runs every handler registered for the event's kind. Returns `true` if
    /// any of them asked for a redraw.
    pub fn dispatch(&mut self, ctx: &mut GestureContext<'_>, event: &InputEvent) -> bool {
        let kind = event.kind();
        let mut redraw = false;
        for (_, handler) in self.handlers.iter_mut().filter(|(k, _)| *k == kind) {
            redraw |= handler(ctx, event);
        }
        redraw
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Stops inertial motion as soon as a finger touches down.
pub fn touch_down() -> impl FnMut(&mut GestureContext<'_>, &InputEvent) -> bool {
    |ctx, _| {
        ctx.motion.cancel();
        false
    }
}

/// Pans by the raw scroll distance of each move event.
pub fn drag() -> impl FnMut(&mut GestureContext<'_>, &InputEvent) -> bool {
    |ctx, event| match *event {
        InputEvent::Move { dx, dy } => ctx.viewport.pan(dx, dy),
        _ => false,
    }
}

/// Starts inertial motion opposite to the finger's release velocity.
pub fn fling() -> impl FnMut(&mut GestureContext<'_>, &InputEvent) -> bool {
    |ctx, event| {
        let InputEvent::Up { vx, vy } = *event else {
            return false;
        };
        let window = ctx.viewport.window();
        ctx.motion.start(
            (window.left, window.top),
            (-vx, -vy),
            ctx.viewport.fling_bounds(),
        )
    }
}

/// Adds `factor - 1` to the current scale for each pinch step.
pub fn pinch() -> impl FnMut(&mut GestureContext<'_>, &InputEvent) -> bool {
    |ctx, event| match *event {
        InputEvent::Pinch { factor } if factor.is_finite() && factor > 0.0 => {
            let scale = ctx.viewport.scale() + (factor - 1.0);
            ctx.viewport.set_scale(scale)
        }
        _ => false,
    }
}

/// Toggles between the fit scale and full zoom.
pub fn double_tap() -> impl FnMut(&mut GestureContext<'_>, &InputEvent) -> bool {
    |ctx, _| ctx.viewport.toggle_zoom()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::geometry::{ImageExtent, OutputSurface, Rect};
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    struct Fixture {
        viewport: Viewport,
        motion: InertialMotion,
        gestures: GestureDispatcher,
    }

    impl Fixture {
        fn new() -> Self {
            let config = ViewConfig::default();
            Self {
                viewport: Viewport::layout(
                    OutputSurface::new(500, 800),
                    ImageExtent::new(1000, 2000),
                    &config,
                )
                .unwrap(),
                motion: InertialMotion::new(config.friction, config.min_fling_velocity),
                gestures: GestureDispatcher::with_default_interpreters(),
            }
        }

        fn send(&mut self, event: InputEvent) -> bool {
            let mut ctx = GestureContext {
                viewport: &mut self.viewport,
                motion: &mut self.motion,
            };
            self.gestures.dispatch(&mut ctx, &event)
        }
    }

    #[test]
    fn drag_pans_by_raw_distance() {
        let mut fixture = Fixture::new();
        fixture.viewport.set_scale(1.0);
        assert!(fixture.send(InputEvent::Move { dx: 40.0, dy: 120.0 }));
        assert_eq!(fixture.viewport.window(), Rect::new(40, 120, 540, 920));
    }

    #[test]
    fn pinch_adds_factor_delta_to_scale() {
        let mut fixture = Fixture::new();
        assert!(fixture.send(InputEvent::Pinch { factor: 1.2 }));
        assert_relative_eq!(fixture.viewport.scale(), 0.7, epsilon = 1e-6);
        assert_eq!(fixture.viewport.window().width(), 714);
    }

    #[test]
    fn pinch_ignores_invalid_factors() {
        let mut fixture = Fixture::new();
        assert!(!fixture.send(InputEvent::Pinch { factor: f32::NAN }));
        assert!(!fixture.send(InputEvent::Pinch { factor: -2.0 }));
        assert_relative_eq!(fixture.viewport.scale(), 0.5);
    }

    #[test]
    fn double_tap_toggles_between_fit_and_full_zoom() {
        let mut fixture = Fixture::new();
        fixture.send(InputEvent::DoubleTap);
        assert_relative_eq!(fixture.viewport.scale(), 1.5);
        fixture.send(InputEvent::DoubleTap);
        assert_relative_eq!(fixture.viewport.scale(), 0.5);
    }

    #[test]
    fn fling_moves_against_finger_velocity() {
        let mut fixture = Fixture::new();
        fixture.viewport.set_origin(200, 600);

        // Finger flicks up and to the left: content scrolls toward larger offsets.
        assert!(fixture.send(InputEvent::Up { vx: -600.0, vy: -900.0 }));
        assert!(fixture.motion.is_running());
        let (vx, vy) = fixture.motion.velocity();
        assert!(vx > 0.0 && vy > 0.0);

        let (x, y) = fixture.motion.tick(Duration::from_millis(16)).unwrap();
        assert!(x > 200 && y > 600);
    }

    #[test]
    fn fling_toward_origin_edge_is_a_no_op() {
        let mut fixture = Fixture::new();
        assert!(!fixture.send(InputEvent::Up { vx: 100.0, vy: 0.0 }));
        assert!(!fixture.motion.is_running());
    }

    #[test]
    fn touch_down_cancels_running_fling() {
        let mut fixture = Fixture::new();
        fixture.viewport.set_origin(200, 600);
        fixture.send(InputEvent::Up { vx: 800.0, vy: 800.0 });
        assert!(fixture.motion.is_running());

        assert!(!fixture.send(InputEvent::Down));
        assert!(!fixture.motion.is_running());
    }

    #[test]
    fn custom_handlers_run_alongside_defaults() {
        let mut fixture = Fixture::new();
        let taps = Rc::new(Cell::new(0));
        let counter = Rc::clone(&taps);
        fixture.gestures.on(EventKind::DoubleTap, move |_, _| {
            counter.set(counter.get() + 1);
            false
        });

        assert!(fixture.send(InputEvent::DoubleTap));
        assert_eq!(taps.get(), 1);
        assert_relative_eq!(fixture.viewport.scale(), 1.5);
    }

    #[test]
    fn events_without_handlers_are_ignored() {
        let mut fixture = Fixture::new();
        fixture.gestures = GestureDispatcher::new();
        assert!(fixture.gestures.is_empty());
        assert!(!fixture.send(InputEvent::DoubleTap));
        assert_relative_eq!(fixture.viewport.scale(), 0.5);
    }
}
