/// Axis-aligned rectangle in bitmap pixels (top-left origin).
///
/// Used to select the source region of an image. Dimensions are unsigned, so
/// a rectangle can be empty but never inverted.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle anchored at the origin.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn min(self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// Exclusive bottom-right corner.
    #[inline]
    pub fn max(self) -> (u32, u32) {
        (
            self.x.saturating_add(self.width),
            self.y.saturating_add(self.height),
        )
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, x: u32, y: u32) -> bool {
        let (x1, y1) = self.max();
        x >= self.x && y >= self.y && x < x1 && y < y1
    }

    /// True if `other` lies entirely inside `self`. Empty rectangles anchored
    /// inside (or on the edge of) `self` are contained.
    #[inline]
    pub fn contains_rect(self, other: PixelRect) -> bool {
        let (ax1, ay1) = self.max();
        let (bx1, by1) = other.max();
        other.x >= self.x && other.y >= self.y && bx1 <= ax1 && by1 <= ay1
    }

    #[inline]
    pub fn intersect(self, other: PixelRect) -> Option<PixelRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let (ax1, ay1) = self.max();
        let (bx1, by1) = other.max();
        let x1 = ax1.min(bx1);
        let y1 = ay1.min(by1);

        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(PixelRect::new(x0, y0, x1 - x0, y1 - y0))
        }
    }
}
