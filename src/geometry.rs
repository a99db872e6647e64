//! Source-space rectangles, image/surface sizes and the clamp rule that keeps
//! a window inside the image.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of the opened source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageExtent {
    pub width: u32,
    pub height: u32,
}

impl ImageExtent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The whole image as a rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::from_size(0, 0, self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Size of the output surface the renderer draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSurface {
    pub width: u32,
    pub height: u32,
}

impl OutputSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in source-image pixels, edges exclusive on the right/bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Builds a rectangle from its top-left corner and size.
    pub fn from_size(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            right: left.saturating_add(to_i32(width)),
            bottom: top.saturating_add(to_i32(height)),
        }
    }

    /// Width, or 0 for an inverted rectangle.
    pub fn width(&self) -> u32 {
        span(self.left, self.right)
    }

    /// Height, or 0 for an inverted rectangle.
    pub fn height(&self) -> u32 {
        span(self.top, self.bottom)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Returns the rectangle moved by `(dx, dy)`, size unchanged.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left.saturating_add(dx),
            top: self.top.saturating_add(dy),
            right: self.right.saturating_add(dx),
            bottom: self.bottom.saturating_add(dy),
        }
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }
}

/// Clamps `rect` into `extent`, shifting it back inside while keeping its size.
///
/// Each axis is handled independently. An axis whose span is at least as large
/// as the image is pinned to `[0, image_span]` instead of shifted, so the
/// result is never inverted. The function is idempotent.
pub fn clamp(rect: Rect, extent: ImageExtent) -> Rect {
    let (left, right) = clamp_axis(rect.left, rect.right, extent.width);
    let (top, bottom) = clamp_axis(rect.top, rect.bottom, extent.height);
    Rect {
        left,
        top,
        right,
        bottom,
    }
}

/// Far edge first, then near edge; the near edge wins.
fn clamp_axis(start: i32, end: i32, limit: u32) -> (i32, i32) {
    let limit = to_i32(limit);
    let size = to_i32(span(start, end));

    if size >= limit {
        return (0, limit);
    }

    let (mut start, mut end) = (start, start.saturating_add(size));
    if end > limit {
        end = limit;
        start = limit - size;
    }
    if start < 0 {
        start = 0;
        end = size;
    }
    (start, end)
}

fn span(start: i32, end: i32) -> u32 {
    u32::try_from(i64::from(end) - i64::from(start)).unwrap_or(0)
}

/// Saturating conversion for image-sized values.
pub(crate) fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent() -> ImageExtent {
        ImageExtent::new(1000, 2000)
    }

    fn assert_inside(rect: Rect, extent: ImageExtent) {
        assert!(0 <= rect.left && rect.left <= rect.right, "{rect:?}");
        assert!(rect.right <= extent.width as i32, "{rect:?}");
        assert!(0 <= rect.top && rect.top <= rect.bottom, "{rect:?}");
        assert!(rect.bottom <= extent.height as i32, "{rect:?}");
    }

    #[test]
    fn rect_inside_is_unchanged() {
        let rect = Rect::new(100, 200, 600, 1000);
        assert_eq!(clamp(rect, extent()), rect);
    }

    #[test]
    fn overflow_bottom_right_shifts_back() {
        let rect = Rect::new(700, 1900, 1200, 2700);
        assert_eq!(clamp(rect, extent()), Rect::new(500, 1200, 1000, 2000));
    }

    #[test]
    fn underflow_top_left_shifts_forward() {
        let rect = Rect::new(-50, -300, 450, 500);
        assert_eq!(clamp(rect, extent()), Rect::new(0, 0, 500, 800));
    }

    #[test]
    fn oversized_axis_pins_to_image() {
        let rect = Rect::new(-10, 300, 1400, 500);
        assert_eq!(clamp(rect, extent()), Rect::new(0, 300, 1000, 500));

        let tall = Rect::new(0, 40, 10, 2500);
        assert_eq!(clamp(tall, extent()), Rect::new(0, 0, 10, 2000));
    }

    #[test]
    fn zero_sized_image_gives_empty_rect() {
        let empty = ImageExtent::new(0, 0);
        let clamped = clamp(Rect::new(5, 5, 50, 50), empty);
        assert_eq!(clamped, Rect::new(0, 0, 0, 0));
        assert!(clamped.is_empty());
    }

    #[test]
    fn inverted_rect_collapses_instead_of_flipping() {
        let clamped = clamp(Rect::new(300, 300, 100, 100), extent());
        assert_inside(clamped, extent());
        assert_eq!(clamped.width(), 0);
    }

    #[test]
    fn clamp_is_idempotent_and_bounded() {
        let extents = [
            ImageExtent::new(1000, 2000),
            ImageExtent::new(1, 1),
            ImageExtent::new(0, 40),
            ImageExtent::new(333, 17),
        ];
        for extent in extents {
            for left in (-1500..1500).step_by(250) {
                for top in (-2500..2500).step_by(500) {
                    for (w, h) in [(0, 0), (10, 10), (500, 800), (1000, 2000), (3000, 10)] {
                        let once = clamp(Rect::from_size(left, top, w, h), extent);
                        assert_inside(once, extent);
                        assert_eq!(clamp(once, extent), once);
                    }
                }
            }
        }
    }

    #[test]
    fn offset_keeps_size() {
        let rect = Rect::from_size(10, 20, 30, 40).offset(-15, 5);
        assert_eq!(rect, Rect::new(-5, 25, 25, 65));
        assert_eq!((rect.width(), rect.height()), (30, 40));
    }
}
