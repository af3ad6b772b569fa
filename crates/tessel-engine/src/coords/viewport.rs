use super::Point;

/// Pixels per point used by the desktop shim when the host gives no better
/// answer.
pub const DEFAULT_PIXELS_PER_PT: f32 = 72.0;

/// Viewport size in logical points.
///
/// This is the basis the affine solver uses to map point coordinates into
/// normalized device space.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// Drawable size in device pixels plus the pixels-per-point scale.
///
/// Owned by the windowing layer and updated on every resize.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geometry {
    pub width_px: u32,
    pub height_px: u32,
    pub pixels_per_pt: f32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width_px: 0,
            height_px: 0,
            pixels_per_pt: DEFAULT_PIXELS_PER_PT,
        }
    }
}

impl Geometry {
    #[inline]
    pub const fn new(width_px: u32, height_px: u32, pixels_per_pt: f32) -> Self {
        Self { width_px, height_px, pixels_per_pt }
    }

    /// Drawable extent in points.
    #[inline]
    pub fn viewport(self) -> Viewport {
        Viewport::new(
            self.width_px as f32 / self.pixels_per_pt,
            self.height_px as f32 / self.pixels_per_pt,
        )
    }

    #[inline]
    pub fn px_to_pt(self, x_px: f32, y_px: f32) -> Point {
        Point::new(x_px / self.pixels_per_pt, y_px / self.pixels_per_pt)
    }

    #[inline]
    pub fn pt_to_px(self, p: Point) -> (f32, f32) {
        (p.x * self.pixels_per_pt, p.y * self.pixels_per_pt)
    }

    /// Returns true if `scale` can be used as a pixels-per-point factor.
    #[inline]
    pub fn is_valid_scale(scale: f32) -> bool {
        scale.is_finite() && scale > 0.0
    }
}
