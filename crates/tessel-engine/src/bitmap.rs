//! Host-memory pixel storage backing an `Image`.
//!
//! GPU textures are allocated at power-of-two sizes, so the backing store is
//! rounded up to match and only its top-left corner is visible. Pixel access
//! goes through the visible region; uploads send the whole backing store.

use image::error::{ImageError, LimitError, LimitErrorKind};
use image::{GenericImage, GenericImageView, ImageResult, RgbaImage, SubImage};

use crate::coords::PixelRect;

pub use image::Rgba;

/// Rounds `x` up to the next power of two. `0` rounds to `1`; `None` when
/// the result does not fit in a `u32`.
#[inline]
pub fn round_to_power_of_two(x: u32) -> Option<u32> {
    x.checked_next_power_of_two()
}

/// RGBA8 bitmap with a power-of-two backing store.
#[derive(Debug, Clone)]
pub struct Bitmap {
    store: RgbaImage,
    width: u32,
    height: u32,
}

impl Bitmap {
    /// Allocates a transparent bitmap of `width × height` visible pixels.
    ///
    /// Returns `None` when either side has no power-of-two backing size
    /// (above 2^31).
    pub fn new(width: u32, height: u32) -> Option<Self> {
        let store = RgbaImage::new(round_to_power_of_two(width)?, round_to_power_of_two(height)?);
        Some(Self { store, width, height })
    }

    /// Decodes PNG bytes into a bitmap sized to the decoded image.
    pub fn decode(bytes: &[u8]) -> ImageResult<Self> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let mut bitmap = Self::new(decoded.width(), decoded.height()).ok_or_else(|| {
            ImageError::Limits(LimitError::from_kind(LimitErrorKind::DimensionError))
        })?;
        bitmap.blit(&decoded, 0, 0);
        Ok(bitmap)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Visible region in bitmap pixels.
    #[inline]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.width, self.height)
    }

    /// Dimensions of the power-of-two backing store.
    #[inline]
    pub fn backing_size(&self) -> (u32, u32) {
        self.store.dimensions()
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the visible region.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if self.bounds().contains(x, y) {
            Some(*self.store.get_pixel(x, y))
        } else {
            None
        }
    }

    /// Writes one pixel. Writes outside the visible region are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, px: Rgba<u8>) {
        if self.bounds().contains(x, y) {
            self.store.put_pixel(x, y, px);
        }
    }

    /// Fills the visible region with `px`. Padding is left untouched.
    pub fn fill(&mut self, px: Rgba<u8>) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.store.put_pixel(x, y, px);
            }
        }
    }

    /// Copies `src` with its top-left corner at `(x, y)`, clipped to the
    /// visible region.
    pub fn blit(&mut self, src: &RgbaImage, x: u32, y: u32) {
        let mut visible = self.store.sub_image(0, 0, self.width, self.height);
        image::imageops::replace(&mut *visible, src, i64::from(x), i64::from(y));
    }

    /// Read-only view of the visible region.
    pub fn view(&self) -> SubImage<&RgbaImage> {
        self.store.view(0, 0, self.width, self.height)
    }

    /// Raw RGBA bytes of the full backing store, row-major, padding included.
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        self.store.as_raw()
    }
}
