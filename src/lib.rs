//! Pan and zoom over images too large to decode at once.
//!
//! A [`BigImageView`] keeps a window into the source image, moves it in
//! response to touch-like [`InputEvent`]s (drag, fling, pinch, double-tap) and
//! asks a [`RegionDecoder`] for exactly the pixels inside that window. Each
//! decoded [`Frame`] comes with the uniform scale that maps it onto the
//! output surface.
//!
//! ```
//! use bigimg_view::{BigImageView, ImageExtent, InputEvent, OutputSurface, ViewConfig};
//!
//! let mut view = BigImageView::new(ViewConfig::default());
//! view.set_image(ImageExtent::new(1000, 2000));
//! let fit = view.layout(OutputSurface::new(500, 800)).unwrap();
//! assert_eq!(fit, 0.5);
//!
//! view.handle(InputEvent::Pinch { factor: 1.2 });
//! assert_eq!(view.window().unwrap().width(), 714);
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod motion;
pub mod transform;
pub mod view;
pub mod viewport;

pub use config::ViewConfig;
pub use decoder::{BufferPool, ImageRegionDecoder, PixelBuffer, PixelFormat, RegionDecoder};
pub use error::{ConfigError, DecodeError, OpenError, ViewError};
pub use geometry::{ImageExtent, OutputSurface, Rect, clamp};
pub use gesture::{EventKind, GestureContext, GestureDispatcher, InputEvent};
pub use motion::{Bounds, InertialMotion};
pub use transform::{RenderTransform, derive_transform};
pub use view::{BigImageView, Frame, FrameRequest, FrameStatus};
pub use viewport::Viewport;
