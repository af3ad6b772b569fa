use anyhow::{Context, Result};

use tessel_engine::bitmap::{Bitmap, Rgba};
use tessel_engine::coords::{PixelRect, Point};
use tessel_engine::core::{App, AppControl, FrameCtx};
use tessel_engine::device::GpuInit;
use tessel_engine::input::{TouchEvent, TouchKind};
use tessel_engine::logging::{init_logging, LoggingConfig};
use tessel_engine::paint::Color;
use tessel_engine::render::Image;
use tessel_engine::window::{Runtime, RuntimeConfig};

const PATTERN_SIZE: u32 = 100;
const PRESSED_TINT: Color = Color::rgb(1.0, 0.55, 0.45);

/// Spins a sheared copy of a bitmap around the last touch point, with an
/// untransformed thumbnail of its top-left quarter in the corner.
struct Hello {
    source: Option<Bitmap>,
    image: Option<Image>,
    center: Option<Point>,
    angle: f32,
    tint: Color,
}

impl Hello {
    fn new(source: Option<Bitmap>) -> Self {
        Self {
            source,
            image: None,
            center: None,
            angle: 0.0,
            tint: Color::WHITE,
        }
    }
}

fn checkerboard() -> Option<Bitmap> {
    let mut bitmap = Bitmap::new(PATTERN_SIZE, PATTERN_SIZE)?;
    for y in 0..PATTERN_SIZE {
        for x in 0..PATTERN_SIZE {
            let on = ((x / 10) + (y / 10)) % 2 == 0;
            let shade = (255 * x / PATTERN_SIZE) as u8;
            let px = if on {
                Rgba([shade, 96, 255 - shade, 255])
            } else {
                Rgba([240, 240, 240, 255])
            };
            bitmap.put_pixel(x, y, px);
        }
    }
    Some(bitmap)
}

impl App for Hello {
    fn start(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let Some(bitmap) = self.source.take().or_else(checkerboard) else {
            log::error!("cannot allocate {PATTERN_SIZE}x{PATTERN_SIZE} pattern");
            return AppControl::Exit;
        };
        let image = match Image::from_bitmap(&ctx.render, bitmap) {
            Ok(image) => image,
            Err(err) => {
                log::error!("cannot create image: {err}");
                return AppControl::Exit;
            }
        };
        image.upload(ctx.render.queue);
        log::info!("image {}x{} ready", image.width(), image.height());

        self.image = Some(image);
        AppControl::Continue
    }

    fn touch(&mut self, event: TouchEvent) {
        match event.kind {
            TouchKind::Start => {
                self.center = Some(event.location);
                self.tint = PRESSED_TINT;
            }
            TouchKind::Move => self.center = Some(event.location),
            TouchKind::End => self.tint = Color::WHITE,
        }
    }

    fn draw(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let Some(image) = self.image.as_ref() else {
            return AppControl::Continue;
        };

        let vp = ctx.viewport();
        let center = self
            .center
            .unwrap_or(Point::new(vp.width / 2.0, vp.height / 2.0));
        self.angle += ctx.time.dt * 0.8;
        ctx.set_tint(self.tint);

        // Half-extents of the parallelogram: `u` along its top edge, `v` down
        // its left edge, sheared toward `u`.
        let half = vp.width.min(vp.height) * 0.3;
        let (sin, cos) = self.angle.sin_cos();
        let u = Point::new(cos, sin) * half;
        let v = Point::new(-sin, cos) * half + u * 0.3;

        image.draw(
            &ctx.render,
            &mut ctx.target,
            center - u - v,
            center + u - v,
            center - u + v,
            image.bounds(),
        );

        let quarter = PixelRect::from_size(image.width() / 2, image.height() / 2);
        let thumb = vp.width.min(vp.height) * 0.2;
        image.draw(
            &ctx.render,
            &mut ctx.target,
            Point::new(0.0, 0.0),
            Point::new(thumb, 0.0),
            Point::new(0.0, thumb),
            quarter,
        );

        AppControl::Continue
    }
}

fn load_source() -> Result<Option<Bitmap>> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(None);
    };
    let bytes = std::fs::read(&path).with_context(|| format!("failed to read {path}"))?;
    let bitmap = Bitmap::decode(&bytes).with_context(|| format!("failed to decode {path}"))?;
    Ok(Some(bitmap))
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let source = load_source()?;
    let config = RuntimeConfig {
        title: "hello".to_string(),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, GpuInit::default(), Hello::new(source))
}
