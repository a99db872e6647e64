//! The large-image view: owns the viewport, the gesture interpreters, the
//! fling simulator and the last decoded frame.

use crate::config::ViewConfig;
use crate::decoder::{BufferPool, PixelBuffer, RegionDecoder};
use crate::error::{DecodeError, ViewError};
use crate::geometry::{ImageExtent, OutputSurface, Rect};
use crate::gesture::{GestureContext, GestureDispatcher, InputEvent};
use crate::motion::InertialMotion;
use crate::transform::{RenderTransform, derive_transform};
use crate::viewport::Viewport;
use std::time::Duration;

/// Free buffers kept for reuse; one is on screen while the next decodes.
const POOLED_BUFFERS: usize = 2;

/// A decoded window ready to blit.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub pixels: &'a PixelBuffer,
    /// The source rectangle the pixels were decoded from.
    pub window: Rect,
    pub transform: RenderTransform,
}

/// A window to decode, handed to an asynchronous decoder.
#[derive(Debug)]
pub struct FrameRequest {
    /// Window revision the request was made for.
    pub revision: u64,
    pub window: Rect,
    /// Buffer to decode into, if the pool had one of the right size.
    pub target: Option<PixelBuffer>,
}

/// Outcome of [`BigImageView::finish_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The decoded pixels are now the current frame.
    Presented,
    /// The window changed while decoding; the result was discarded.
    Stale,
}

#[derive(Debug)]
struct Presented {
    buffer: PixelBuffer,
    window: Rect,
    transform: RenderTransform,
}

/// Pans and zooms a large image, decoding only the visible window.
///
/// Without an open image every gesture and tick is a no-op.
#[derive(Debug)]
pub struct BigImageView {
    config: ViewConfig,
    extent: Option<ImageExtent>,
    viewport: Option<Viewport>,
    motion: InertialMotion,
    gestures: GestureDispatcher,
    pool: BufferPool,
    presented: Option<Presented>,
    /// Bumped whenever the window changes.
    revision: u64,
    presented_revision: Option<u64>,
    failed_revision: Option<u64>,
    in_flight: Option<u64>,
}

impl BigImageView {
    /// Creates a view with the default gesture interpreters and no image.
    pub fn new(config: ViewConfig) -> Self {
        Self::with_gestures(config, GestureDispatcher::with_default_interpreters())
    }

    pub fn with_gestures(config: ViewConfig, gestures: GestureDispatcher) -> Self {
        Self {
            motion: InertialMotion::new(config.friction, config.min_fling_velocity),
            pool: BufferPool::new(config.pixel_format, POOLED_BUFFERS),
            config,
            extent: None,
            viewport: None,
            gestures,
            presented: None,
            revision: 0,
            presented_revision: None,
            failed_revision: None,
            in_flight: None,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Registers additional gesture handlers.
    pub fn gestures_mut(&mut self) -> &mut GestureDispatcher {
        &mut self.gestures
    }

    /// Opens an image of the given size. The viewport is created by the next
    /// [`layout`](Self::layout).
    pub fn set_image(&mut self, extent: ImageExtent) {
        log::debug!("image set: {}x{}", extent.width, extent.height);
        self.reset();
        self.extent = Some(extent);
    }

    /// Enters the no-image state, e.g. after the image failed to open.
    pub fn clear_image(&mut self) {
        self.reset();
        self.extent = None;
    }

    pub fn has_image(&self) -> bool {
        self.extent.is_some()
    }

    pub fn extent(&self) -> Option<ImageExtent> {
        self.extent
    }

    /// Lays the image out on `surface`, returning the fit-to-width scale.
    ///
    /// The viewport is (re)created when there is none yet or the surface size
    /// changed; an unchanged surface keeps the current window.
    pub fn layout(&mut self, surface: OutputSurface) -> Result<f32, ViewError> {
        let extent = self.extent.ok_or(ViewError::NoImage)?;
        if let Some(viewport) = &self.viewport
            && viewport.surface() == surface
        {
            return Ok(viewport.original_scale());
        }

        let viewport = Viewport::layout(surface, extent, &self.config)?;
        let original_scale = viewport.original_scale();
        self.motion.cancel();
        self.viewport = Some(viewport);
        self.bump_revision();
        Ok(original_scale)
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// The current window, if an image is laid out.
    pub fn window(&self) -> Option<Rect> {
        self.viewport.as_ref().map(Viewport::window)
    }

    /// Feeds one input event through the gesture interpreters.
    ///
    /// Returns `true` when the caller should schedule a redraw.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        let Some(viewport) = self.viewport.as_mut() else {
            return false;
        };
        let before = (viewport.window(), viewport.scale());
        let mut ctx = GestureContext {
            viewport,
            motion: &mut self.motion,
        };
        let requested = self.gestures.dispatch(&mut ctx, &event);
        let changed = (ctx.viewport.window(), ctx.viewport.scale()) != before;
        if changed {
            self.bump_revision();
        }
        requested || changed
    }

    /// Advances inertial motion by `dt`. Returns `true` if the window moved.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(viewport) = self.viewport.as_mut() else {
            return false;
        };
        let Some((left, top)) = self.motion.tick(dt) else {
            return false;
        };
        let moved = viewport.set_origin(left, top);
        if moved {
            self.bump_revision();
        }
        moved
    }

    /// Whether a fling is still running and ticks should keep coming.
    pub fn is_animating(&self) -> bool {
        self.motion.is_running()
    }

    /// Revision of the current window; changes whenever the window does.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the current window still has to be decoded.
    ///
    /// A window whose decode failed is not retried until it changes.
    pub fn needs_redraw(&self) -> bool {
        self.viewport.is_some()
            && self.presented_revision != Some(self.revision)
            && self.failed_revision != Some(self.revision)
    }

    /// Starts decoding the current window.
    ///
    /// Returns `None` when nothing needs decoding or a request is already in
    /// flight. The result must be passed to [`finish_frame`](Self::finish_frame).
    pub fn begin_frame(&mut self) -> Option<FrameRequest> {
        if self.in_flight.is_some() || !self.needs_redraw() {
            return None;
        }
        let window = self.window()?;
        let target = self.pool.checkout(window.width(), window.height());
        self.in_flight = Some(self.revision);
        Some(FrameRequest {
            revision: self.revision,
            window,
            target,
        })
    }

    /// Completes a request started by [`begin_frame`](Self::begin_frame).
    ///
    /// Results for an outdated window are discarded. On a decode failure the
    /// viewport and the previous frame are left untouched and the error is
    /// returned; the request's target buffer went to the decoder and is not
    /// returned to the pool, so the next request allocates.
    pub fn finish_frame(
        &mut self,
        revision: u64,
        result: Result<PixelBuffer, DecodeError>,
    ) -> Result<FrameStatus, ViewError> {
        if self.in_flight == Some(revision) {
            self.in_flight = None;
        }

        if revision != self.revision {
            log::debug!("discarding decode for stale revision {revision}");
            if let Ok(buffer) = result {
                self.pool.restore(buffer);
            }
            return Ok(FrameStatus::Stale);
        }

        let buffer = match result {
            Ok(buffer) => buffer,
            Err(err) => {
                log::warn!("decode failed for revision {revision}: {err}");
                self.failed_revision = Some(revision);
                return Err(err.into());
            }
        };

        let Some(viewport) = &self.viewport else {
            self.pool.restore(buffer);
            return Ok(FrameStatus::Stale);
        };
        let window = viewport.window();
        let Some(transform) = derive_transform(window, viewport.surface()) else {
            self.pool.restore(buffer);
            return Ok(FrameStatus::Stale);
        };

        let previous = self.presented.replace(Presented {
            buffer,
            window,
            transform,
        });
        if let Some(previous) = previous {
            self.pool.restore(previous.buffer);
        }
        self.presented_revision = Some(revision);
        self.failed_revision = None;
        Ok(FrameStatus::Presented)
    }

    /// Decodes the current window if needed and returns the frame to draw.
    ///
    /// On failure the previous frame stays current and the error is
    /// returned; with no image laid out this returns `Ok(None)`.
    pub fn redraw<D: RegionDecoder + ?Sized>(
        &mut self,
        decoder: &mut D,
    ) -> Result<Option<Frame<'_>>, ViewError> {
        if let Some(request) = self.begin_frame() {
            let result = decoder.decode_region(request.window, request.target);
            self.finish_frame(request.revision, result)?;
        }
        Ok(self.frame())
    }

    /// The last successfully decoded frame.
    pub fn frame(&self) -> Option<Frame<'_>> {
        self.presented.as_ref().map(|presented| Frame {
            pixels: &presented.buffer,
            window: presented.window,
            transform: presented.transform,
        })
    }

    fn bump_revision(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn reset(&mut self) {
        self.motion.cancel();
        self.viewport = None;
        if let Some(presented) = self.presented.take() {
            self.pool.restore(presented.buffer);
        }
        self.presented_revision = None;
        self.failed_revision = None;
        self.in_flight = None;
        self.bump_revision();
    }
}
