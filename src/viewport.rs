//! The source-space window currently shown on the output surface.

use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::geometry::{ImageExtent, OutputSurface, Rect, clamp, to_i32};
use crate::motion::Bounds;

/// Window into the source image plus the scale it is drawn at.
///
/// The window is stored as a top-left anchor and an unsigned size; the right
/// and bottom edges are derived, so the rectangle can never be inverted. The
/// size is only written by [`Viewport::layout`] and by scale changes; panning
/// and inertial motion move the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    extent: ImageExtent,
    surface: OutputSurface,
    left: i32,
    top: i32,
    width: u32,
    height: u32,
    scale: f32,
    original_scale: f32,
    max_zoom: f32,
    double_tap_threshold: f32,
}

impl Viewport {
    /// Creates the viewport for a fresh layout pass.
    ///
    /// The fit-to-width scale is `surface.width / extent.width`; the window
    /// starts at the origin, covering the smaller of surface and image on
    /// each axis.
    pub fn layout(
        surface: OutputSurface,
        extent: ImageExtent,
        config: &ViewConfig,
    ) -> Result<Self, ViewError> {
        if surface.width == 0 || surface.height == 0 || extent.is_empty() {
            return Err(ViewError::DegenerateLayout { surface, extent });
        }

        let original_scale = surface.width as f32 / extent.width as f32;
        let mut viewport = Self {
            extent,
            surface,
            left: 0,
            top: 0,
            width: surface.width.min(extent.width),
            height: surface.height.min(extent.height),
            scale: original_scale,
            original_scale,
            max_zoom: config.max_zoom,
            double_tap_threshold: config.double_tap_threshold,
        };
        viewport.apply(viewport.window());

        log::debug!(
            "layout {}x{} surface over {}x{} image: original scale {original_scale:.4}",
            surface.width,
            surface.height,
            extent.width,
            extent.height
        );
        Ok(viewport)
    }

    /// The current window in source pixels.
    pub fn window(&self) -> Rect {
        Rect::from_size(self.left, self.top, self.width, self.height)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// The fit-to-width scale computed at layout time.
    pub fn original_scale(&self) -> f32 {
        self.original_scale
    }

    /// Current zoom as a multiple of the fit-to-width scale.
    pub fn zoom_factor(&self) -> f32 {
        self.scale / self.original_scale
    }

    pub fn min_scale(&self) -> f32 {
        self.original_scale
    }

    pub fn max_scale(&self) -> f32 {
        self.original_scale * self.max_zoom
    }

    pub fn extent(&self) -> ImageExtent {
        self.extent
    }

    pub fn surface(&self) -> OutputSurface {
        self.surface
    }

    /// Moves the window by `(dx, dy)` source pixels, keeping its size.
    ///
    /// Fractional parts are truncated toward zero. Returns `true` if the
    /// window moved.
    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        if !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        let moved = self.window().offset(dx as i32, dy as i32);
        self.apply(moved)
    }

    /// Moves the window's top-left corner to `(left, top)`, keeping its size.
    pub fn set_origin(&mut self, left: i32, top: i32) -> bool {
        self.apply(Rect::from_size(left, top, self.width, self.height))
    }

    /// Sets the scale, clamped to `[original_scale, original_scale * max_zoom]`.
    ///
    /// The window is resized around its top-left corner to
    /// `surface / scale` and clamped back into the image. Returns `true` if
    /// the window or the scale changed.
    pub fn set_scale(&mut self, scale: f32) -> bool {
        if !scale.is_finite() {
            return false;
        }
        let scale = scale.clamp(self.min_scale(), self.max_scale());
        let (width, height) = self.size_for_scale(scale);
        let scale_changed = scale != self.scale;
        self.scale = scale;
        let window_changed = self.apply(Rect::from_size(self.left, self.top, width, height));
        scale_changed || window_changed
    }

    /// Double-tap behavior: zoom fully in from near the fit scale, otherwise
    /// back out to the fit scale.
    pub fn toggle_zoom(&mut self) -> bool {
        let target = if self.scale < self.original_scale * self.double_tap_threshold {
            self.max_scale()
        } else {
            self.original_scale
        };
        self.set_scale(target)
    }

    /// Range of top-left positions that keep the current window inside the
    /// image.
    pub fn fling_bounds(&self) -> Bounds {
        let max_left = self.extent.width.saturating_sub(self.width);
        let max_top = self.extent.height.saturating_sub(self.height);
        Bounds::new(0, to_i32(max_left), 0, to_i32(max_top))
    }

    fn size_for_scale(&self, scale: f32) -> (u32, u32) {
        let width = ((self.surface.width as f32 / scale).round() as u32).max(1);
        let height = ((self.surface.height as f32 / scale).round() as u32).max(1);
        (width, height)
    }

    fn apply(&mut self, window: Rect) -> bool {
        let clamped = clamp(window, self.extent);
        if clamped == self.window() {
            return false;
        }
        self.left = clamped.left;
        self.top = clamped.top;
        self.width = clamped.width();
        self.height = clamped.height();
        true
    }
}
