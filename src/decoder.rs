//! Region decoding: the decoder seam, decoded pixel buffers and the buffer
//! pool that recycles them between frames.

use crate::error::{DecodeError, OpenError};
use crate::geometry::{ImageExtent, Rect};
use image::{DynamicImage, ImageReader, RgbaImage};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Pixel layout of decoded buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8 bits per channel, non-premultiplied RGBA.
    #[default]
    Rgba8888,
    /// 16-bit little-endian 5-6-5 RGB without alpha, half the memory of RGBA.
    Rgb565,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8888 => 4,
            Self::Rgb565 => 2,
        }
    }
}

/// Decoded pixels for exactly one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocates a zeroed buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            data: vec![0; len],
        }
    }

    /// Reuses `target` when it has the requested size and format, otherwise
    /// allocates a new buffer.
    pub fn reuse_or_alloc(
        target: Option<Self>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Self {
        match target {
            Some(buffer) if buffer.matches(width, height, format) => buffer,
            Some(buffer) => {
                log::debug!(
                    "reallocating pixel buffer {}x{} -> {width}x{height}",
                    buffer.width,
                    buffer.height
                );
                Self::new(width, height, format)
            }
            None => Self::new(width, height, format),
        }
    }

    pub fn matches(&self, width: u32, height: u32, format: PixelFormat) -> bool {
        self.width == width && self.height == height && self.format == format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// The pixels as RGBA8, converting if the buffer is stored as RGB565.
    pub fn to_rgba8(&self) -> Cow<'_, [u8]> {
        match self.format {
            PixelFormat::Rgba8888 => Cow::Borrowed(&self.data),
            PixelFormat::Rgb565 => Cow::Owned(
                self.data
                    .chunks_exact(2)
                    .flat_map(|px| {
                        let [r, g, b] = rgb565_to_rgb(u16::from_le_bytes([px[0], px[1]]));
                        [r, g, b, u8::MAX]
                    })
                    .collect(),
            ),
        }
    }
}

/// Packs an 8-bit RGB triple into RGB565.
pub fn rgb_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3)
}

/// Expands RGB565 to 8-bit RGB, replicating high bits into the low ones.
pub fn rgb565_to_rgb(value: u16) -> [u8; 3] {
    let r = ((value >> 11) & 0x1f) as u8;
    let g = ((value >> 5) & 0x3f) as u8;
    let b = (value & 0x1f) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// Something that can decode an arbitrary rectangle of a large image.
pub trait RegionDecoder {
    /// Dimensions of the whole image.
    fn extent(&self) -> ImageExtent;

    /// Decodes exactly `region`.
    ///
    /// `target` is reused when its size and format match the region,
    /// otherwise a new buffer is allocated. On failure `target` is dropped.
    fn decode_region(
        &mut self,
        region: Rect,
        target: Option<PixelBuffer>,
    ) -> Result<PixelBuffer, DecodeError>;
}

/// Free pixel buffers of one format, checked out per frame and restored after
/// the blit.
#[derive(Debug)]
pub struct BufferPool {
    format: PixelFormat,
    capacity: usize,
    free: Vec<PixelBuffer>,
}

impl BufferPool {
    pub fn new(format: PixelFormat, capacity: usize) -> Self {
        Self {
            format,
            capacity: capacity.max(1),
            free: Vec::new(),
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Switches the pool to a new format, dropping buffers of the old one.
    pub fn set_format(&mut self, format: PixelFormat) {
        if self.format != format {
            self.format = format;
            self.free.clear();
        }
    }

    /// Takes a free buffer of exactly `width` x `height`, if there is one.
    pub fn checkout(&mut self, width: u32, height: u32) -> Option<PixelBuffer> {
        let index = self
            .free
            .iter()
            .position(|buffer| buffer.matches(width, height, self.format))?;
        Some(self.free.swap_remove(index))
    }

    /// Returns a buffer to the pool; the oldest buffer is dropped when full.
    pub fn restore(&mut self, buffer: PixelBuffer) {
        if buffer.format != self.format {
            return;
        }
        if self.free.len() >= self.capacity {
            self.free.remove(0);
        }
        self.free.push(buffer);
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn clear(&mut self) {
        self.free.clear();
    }
}

/// Region decoder backed by the `image` crate.
///
/// Opening only reads the header. The pixel data is decoded on the first
/// region request and regions are copied out of it afterwards.
pub struct ImageRegionDecoder {
    path: Option<PathBuf>,
    extent: ImageExtent,
    format: PixelFormat,
    pixels: Option<RgbaImage>,
}

impl std::fmt::Debug for ImageRegionDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRegionDecoder")
            .field("path", &self.path)
            .field("extent", &self.extent)
            .field("format", &self.format)
            .field("decoded", &self.pixels.is_some())
            .finish()
    }
}

impl ImageRegionDecoder {
    /// Opens an image file and reads its dimensions.
    pub fn open(path: impl AsRef<Path>, format: PixelFormat) -> Result<Self, OpenError> {
        let path = path.as_ref();
        let io_error = |source| OpenError::Io {
            path: path.to_path_buf(),
            source,
        };

        let (width, height) = ImageReader::open(path)
            .map_err(io_error)?
            .with_guessed_format()
            .map_err(io_error)?
            .into_dimensions()
            .map_err(|source| OpenError::Header {
                path: path.to_path_buf(),
                source,
            })?;

        let extent = ImageExtent::new(width, height);
        if extent.is_empty() {
            return Err(OpenError::EmptyImage {
                path: path.to_path_buf(),
                extent,
            });
        }

        log::debug!("opened {} ({width}x{height})", path.display());
        Ok(Self {
            path: Some(path.to_path_buf()),
            extent,
            format,
            pixels: None,
        })
    }

    /// Wraps an already decoded image.
    pub fn from_image(image: DynamicImage, format: PixelFormat) -> Self {
        let pixels = image.into_rgba8();
        Self {
            path: None,
            extent: ImageExtent::new(pixels.width(), pixels.height()),
            format,
            pixels: Some(pixels),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    fn source(&mut self) -> Result<&RgbaImage, DecodeError> {
        if self.pixels.is_none() {
            let Some(path) = &self.path else {
                return Err(DecodeError::EmptyRegion(self.extent.bounds()));
            };
            let image = ImageReader::open(path)
                .and_then(|reader| reader.with_guessed_format())
                .map_err(image::ImageError::IoError)?
                .decode()?;
            let actual = ImageExtent::new(image.width(), image.height());
            if actual != self.extent {
                return Err(DecodeError::SizeChanged {
                    expected: self.extent,
                    actual,
                });
            }
            log::debug!("decoded pixel data of {}", path.display());
            self.pixels = Some(image.into_rgba8());
        }
        self.pixels
            .as_ref()
            .ok_or_else(|| DecodeError::EmptyRegion(self.extent.bounds()))
    }
}

impl RegionDecoder for ImageRegionDecoder {
    fn extent(&self) -> ImageExtent {
        self.extent
    }

    fn decode_region(
        &mut self,
        region: Rect,
        target: Option<PixelBuffer>,
    ) -> Result<PixelBuffer, DecodeError> {
        if region.is_empty() {
            return Err(DecodeError::EmptyRegion(region));
        }
        let extent = self.extent;
        if !extent.bounds().contains_rect(&region) {
            return Err(DecodeError::OutOfBounds { region, extent });
        }

        let format = self.format;
        let (width, height) = (region.width(), region.height());
        let source = self.source()?;
        let mut buffer = PixelBuffer::reuse_or_alloc(target, width, height, format);

        let src_stride = source.width() as usize * 4;
        let row_start = region.left as usize * 4;
        let row_len = width as usize * 4;
        let dst_stride = buffer.stride();
        let raw = source.as_raw();

        for (row, dst) in buffer
            .data_mut()
            .chunks_exact_mut(dst_stride)
            .enumerate()
        {
            let offset = (region.top as usize + row) * src_stride + row_start;
            let Some(src) = raw.get(offset..offset + row_len) else {
                return Err(DecodeError::OutOfBounds { region, extent });
            };
            match format {
                PixelFormat::Rgba8888 => dst.copy_from_slice(src),
                PixelFormat::Rgb565 => {
                    for (out, px) in dst.chunks_exact_mut(2).zip(src.chunks_exact(4)) {
                        out.copy_from_slice(&rgb_to_rgb565(px[0], px[1], px[2]).to_le_bytes());
                    }
                }
            }
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 7, 255]))
    }

    fn write_png(dir: &Path, name: &str, image: &RgbaImage) -> PathBuf {
        let path = dir.join(name);
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn open_reads_extent_without_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "big.png", &gradient(12, 9));

        let decoder = ImageRegionDecoder::open(&path, PixelFormat::Rgba8888).unwrap();
        assert_eq!(decoder.extent(), ImageExtent::new(12, 9));
        assert!(decoder.pixels.is_none());
        assert_eq!(decoder.path(), Some(path.as_path()));
    }

    #[test]
    fn open_reports_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ImageRegionDecoder::open(dir.path().join("nope.png"), PixelFormat::Rgba8888);
        assert!(matches!(missing, Err(OpenError::Io { .. })));

        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"definitely not a png").unwrap();
        let err = ImageRegionDecoder::open(&corrupt, PixelFormat::Rgba8888).unwrap_err();
        assert!(matches!(err, OpenError::Header { .. }), "{err}");
    }

    #[test]
    fn file_shrunk_after_open_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "big.png", &gradient(12, 9));
        let mut decoder = ImageRegionDecoder::open(&path, PixelFormat::Rgba8888).unwrap();

        write_png(dir.path(), "big.png", &gradient(4, 4));
        let err = decoder.decode_region(Rect::new(0, 0, 12, 9), None).unwrap_err();
        assert!(
            matches!(
                err,
                DecodeError::SizeChanged {
                    expected: ImageExtent { width: 12, height: 9 },
                    actual: ImageExtent { width: 4, height: 4 },
                }
            ),
            "{err}"
        );
        assert!(decoder.pixels.is_none());
    }

    #[test]
    fn decodes_exactly_the_requested_region() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "big.png", &gradient(12, 9));
        let mut decoder = ImageRegionDecoder::open(&path, PixelFormat::Rgba8888).unwrap();

        let buffer = decoder.decode_region(Rect::new(3, 2, 7, 5), None).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (4, 3));
        assert_eq!(buffer.data().len(), 4 * 3 * 4);
        assert_eq!(&buffer.data()[..4], &[30, 20, 7, 255]);
        let last = &buffer.data()[buffer.data().len() - 4..];
        assert_eq!(last, &[60, 40, 7, 255]);
    }

    #[test]
    fn reuses_matching_target_and_replaces_mismatched_one() {
        let mut decoder = ImageRegionDecoder::from_image(
            DynamicImage::ImageRgba8(gradient(12, 9)),
            PixelFormat::Rgba8888,
        );

        let first = decoder.decode_region(Rect::new(0, 0, 4, 4), None).unwrap();
        let ptr = first.data().as_ptr();
        let second = decoder.decode_region(Rect::new(5, 5, 9, 9), Some(first)).unwrap();
        assert_eq!(second.data().as_ptr(), ptr);
        assert_eq!(&second.data()[..4], &[50, 50, 7, 255]);

        let third = decoder.decode_region(Rect::new(0, 0, 6, 2), Some(second)).unwrap();
        assert_eq!((third.width(), third.height()), (6, 2));
    }

    #[test]
    fn rejects_empty_and_out_of_bounds_regions() {
        let mut decoder = ImageRegionDecoder::from_image(
            DynamicImage::ImageRgba8(gradient(12, 9)),
            PixelFormat::Rgba8888,
        );

        let empty = decoder.decode_region(Rect::new(4, 4, 4, 8), None);
        assert!(matches!(empty, Err(DecodeError::EmptyRegion(_))));

        let outside = decoder.decode_region(Rect::new(8, 0, 13, 4), None);
        assert!(matches!(outside, Err(DecodeError::OutOfBounds { .. })));

        let negative = decoder.decode_region(Rect::new(-1, 0, 3, 4), None);
        assert!(matches!(negative, Err(DecodeError::OutOfBounds { .. })));
    }

    #[test]
    fn decodes_rgb565() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([255, 128, 8, 255]));
        let mut decoder =
            ImageRegionDecoder::from_image(DynamicImage::ImageRgba8(image), PixelFormat::Rgb565);

        let buffer = decoder.decode_region(Rect::new(0, 0, 2, 1), None).unwrap();
        assert_eq!(buffer.format(), PixelFormat::Rgb565);
        assert_eq!(buffer.data().len(), 4);

        let packed = u16::from_le_bytes([buffer.data()[0], buffer.data()[1]]);
        assert_eq!(packed, rgb_to_rgb565(255, 128, 8));
        assert_eq!(&buffer.to_rgba8()[..4], &[255, 130, 8, 255]);
    }

    #[test]
    fn rgb565_round_trips_extremes() {
        assert_eq!(rgb565_to_rgb(rgb_to_rgb565(0, 0, 0)), [0, 0, 0]);
        assert_eq!(rgb565_to_rgb(rgb_to_rgb565(255, 255, 255)), [255, 255, 255]);
    }

    #[test]
    fn pool_hands_out_matching_buffers_only() {
        let mut pool = BufferPool::new(PixelFormat::Rgba8888, 2);
        assert!(pool.checkout(10, 10).is_none());

        pool.restore(PixelBuffer::new(10, 10, PixelFormat::Rgba8888));
        pool.restore(PixelBuffer::new(20, 10, PixelFormat::Rgba8888));
        pool.restore(PixelBuffer::new(10, 10, PixelFormat::Rgb565));
        assert_eq!(pool.len(), 2);

        assert!(pool.checkout(30, 30).is_none());
        let buffer = pool.checkout(10, 10).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (10, 10));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn pool_drops_oldest_when_full() {
        let mut pool = BufferPool::new(PixelFormat::Rgba8888, 1);
        pool.restore(PixelBuffer::new(1, 1, PixelFormat::Rgba8888));
        pool.restore(PixelBuffer::new(2, 2, PixelFormat::Rgba8888));
        assert!(pool.checkout(1, 1).is_none());
        assert!(pool.checkout(2, 2).is_some());

        pool.restore(PixelBuffer::new(2, 2, PixelFormat::Rgba8888));
        pool.set_format(PixelFormat::Rgb565);
        assert!(pool.is_empty());
    }
}
