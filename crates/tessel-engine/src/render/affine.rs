//! Affine transforms mapping the canonical unit quad onto a destination
//! parallelogram (position) and onto a source sub-rectangle (texture).
//!
//! We draw a parallelogram PQRS, given by three of its corners, onto the
//! framebuffer ABCD:
//!
//! ```text
//!     A +---------------+ B
//!       |  P +-----+ Q  |
//!       |    |     |    |
//!       |  S +-----+ R  |
//!     D +---------------+ C
//! ```
//!
//! In point space ABCD spans `(0, 0)..(W, H)` with +Y down. In normalized
//! device space it is `(-1, +1), (+1, +1), (-1, -1), (+1, -1)` with +Y up.
//! An affine map fixed by A→P, B→Q and D→S also sends C to R, because affine
//! maps preserve parallel lines. R is never needed as input.

use crate::coords::{PixelRect, Point, Viewport};

/// Unit quad positions in triangle-strip order: top-left, top-right,
/// bottom-left, bottom-right.
pub const QUAD_POSITIONS: [[f32; 2]; 4] = [[-1.0, 1.0], [1.0, 1.0], [-1.0, -1.0], [1.0, -1.0]];

/// Unit quad texture coordinates, matching `QUAD_POSITIONS` corner for corner.
pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

/// 2D affine transform stored as the top two rows of a 3×3 matrix.
///
/// ```text
///     [ m[0][0] m[0][1] m[0][2] ]
///     [ m[1][0] m[1][1] m[1][2] ]
///     [    0       0       1    ]
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine {
    pub m: [[f32; 3]; 2],
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine { m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] };

    #[inline]
    pub const fn new(m: [[f32; 3]; 2]) -> Self {
        Self { m }
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        let [r0, r1] = self.m;
        Point::new(
            r0[0] * p.x + r0[1] * p.y + r0[2],
            r1[0] * p.x + r1[1] * p.y + r1[2],
        )
    }

    /// Determinant of the linear part. Zero means the transform collapses the
    /// quad onto a line or point.
    #[inline]
    pub fn determinant(&self) -> f32 {
        self.m[0][0] * self.m[1][1] - self.m[0][1] * self.m[1][0]
    }

    #[inline]
    pub fn is_singular(&self) -> bool {
        self.determinant() == 0.0
    }

    /// Column-major 3×3 with each column padded to a `vec4`, the layout of a
    /// WGSL `mat3x3<f32>` in a uniform buffer.
    pub fn to_mat3_columns(&self) -> [[f32; 4]; 3] {
        let [r0, r1] = self.m;
        [
            [r0[0], r1[0], 0.0, 0.0],
            [r0[1], r1[1], 0.0, 0.0],
            [r0[2], r1[2], 1.0, 0.0],
        ]
    }
}

/// Solves for the transform taking the unit quad onto the parallelogram with
/// corners `top_left`, `top_right` and `bottom_left`, all in points relative
/// to `viewport`.
///
/// The constraints `a × A = P`, `a × B = Q`, `a × D = S` give six equations
/// in six unknowns:
///
/// ```text
///     -a00 + a01 + a02 = 2*px2        -a10 + a11 + a12 = 2*py2
///     +a00 + a01 + a02 = 2*qx2        +a10 + a11 + a12 = 2*qy2
///     -a00 - a01 + a02 = 2*sx2        -a10 - a11 + a12 = 2*sy2
/// ```
///
/// where `px2` is half of P.x in device space. Differences and sums of the
/// half coordinates solve it exactly.
pub fn position_transform(
    viewport: Viewport,
    top_left: Point,
    top_right: Point,
    bottom_left: Point,
) -> Affine {
    let half = |p: Point| {
        (
            -0.5 + p.x / viewport.width,
            0.5 - p.y / viewport.height,
        )
    };
    let (px2, py2) = half(top_left);
    let (qx2, qy2) = half(top_right);
    let (sx2, sy2) = half(bottom_left);

    Affine::new([
        [qx2 - px2, px2 - sx2, qx2 + sx2],
        [qy2 - py2, py2 - sy2, qy2 + sy2],
    ])
}

/// Solves for the transform taking unit UVs onto `src`, a pixel rectangle of
/// a bitmap whose visible region starts at `visible_origin` inside a texture
/// of `texture_size`.
///
/// Texture space is `(0, 0)..(1, 1)` with +Y down and the source rectangle is
/// always axis aligned, so `qy = py` and `sx = px`:
///
/// ```text
///       0 +   0 + a02 = px        0 +   0 + a12 = py
///     a00 +   0 + a02 = qx      a10 +   0 + a12 = py
///       0 + a01 + a02 = px        0 + a11 + a12 = sy
/// ```
pub fn uv_transform(texture_size: (u32, u32), visible_origin: (u32, u32), src: PixelRect) -> Affine {
    let w = texture_size.0 as f32;
    let h = texture_size.1 as f32;
    let (ox, oy) = (visible_origin.0 as f32, visible_origin.1 as f32);
    let (x0, y0) = src.min();
    let (x1, y1) = src.max();

    let px = (x0 as f32 - ox) / w;
    let py = (y0 as f32 - oy) / h;
    let qx = (x1 as f32 - ox) / w;
    let sy = (y1 as f32 - oy) / h;

    Affine::new([
        [qx - px, 0.0, px],
        [0.0, sy - py, py],
    ])
}
