//! Scale mapping a decoded window onto the output surface.

use crate::geometry::{OutputSurface, Rect};

/// Uniform scale applied when blitting a decoded window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransform {
    pub scale: f32,
}

impl RenderTransform {
    /// On-screen size of a `width` x `height` buffer drawn with this transform.
    pub fn dest_size(&self, width: u32, height: u32) -> (f32, f32) {
        (width as f32 * self.scale, height as f32 * self.scale)
    }

    /// Maps a surface position back to source-image pixels for a window.
    pub fn surface_to_source(&self, window: Rect, x: f32, y: f32) -> (f32, f32) {
        (
            window.left as f32 + x / self.scale,
            window.top as f32 + y / self.scale,
        )
    }
}

/// Derives the draw scale for `window`: `surface.width / window.width`.
///
/// The height ratio follows from the aspect-locked window and is not computed
/// separately. Returns `None` for an empty window.
pub fn derive_transform(window: Rect, surface: OutputSurface) -> Option<RenderTransform> {
    let width = window.width();
    if width == 0 || surface.width == 0 {
        return None;
    }
    Some(RenderTransform {
        scale: surface.width as f32 / width as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scale_comes_from_width_only() {
        let surface = OutputSurface::new(500, 800);
        let transform = derive_transform(Rect::new(0, 0, 500, 800), surface).unwrap();
        assert_relative_eq!(transform.scale, 1.0);

        let zoomed = derive_transform(Rect::new(40, 90, 373, 1000), surface).unwrap();
        assert_relative_eq!(zoomed.scale, 500.0 / 333.0);
    }

    #[test]
    fn empty_window_has_no_transform() {
        let surface = OutputSurface::new(500, 800);
        assert_eq!(derive_transform(Rect::new(10, 10, 10, 50), surface), None);
    }

    #[test]
    fn dest_size_and_inverse_mapping() {
        let transform = RenderTransform { scale: 2.0 };
        assert_eq!(transform.dest_size(250, 400), (500.0, 800.0));

        let window = Rect::new(100, 200, 350, 600);
        let (sx, sy) = transform.surface_to_source(window, 50.0, 80.0);
        assert_relative_eq!(sx, 125.0);
        assert_relative_eq!(sy, 240.0);
    }
}
