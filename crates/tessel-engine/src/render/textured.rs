use std::rc::Rc;

use crate::bitmap::Bitmap;
use crate::coords::{PixelRect, Point};
use crate::render::affine::{position_transform, uv_transform};
use crate::render::quad::DrawUniform;
use crate::render::readback::read_texture_rgba8;
use crate::render::{QuadRenderer, RenderCtx, RenderError, RenderTarget};

/// Texture format of every image. Bitmap bytes are sRGB encoded.
pub const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// A host bitmap paired with a GPU texture of its backing-store size.
///
/// Edit pixels through `bitmap_mut`, push them with `upload`, then `draw` any
/// number of times. The texture is not refreshed implicitly.
pub struct Image {
    bitmap: Bitmap,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    renderer: Rc<QuadRenderer>,
}

impl Image {
    /// Allocates a transparent `width × height` image.
    ///
    /// Triggers the one-shot renderer initialization on first use. The texture
    /// content is undefined until the first `upload`.
    pub fn new(ctx: &RenderCtx<'_>, width: u32, height: u32) -> Result<Self, RenderError> {
        let bitmap = Bitmap::new(width, height).ok_or_else(|| RenderError::TextureTooLarge {
            width: u64::from(width).next_power_of_two(),
            height: u64::from(height).next_power_of_two(),
            max: ctx.device.limits().max_texture_dimension_2d,
        })?;
        Self::from_bitmap(ctx, bitmap)
    }

    /// Wraps an existing bitmap, e.g. one produced by `Bitmap::decode`.
    ///
    /// Fails with `TextureTooLarge` when the backing store exceeds the
    /// device's 2D texture limit.
    pub fn from_bitmap(ctx: &RenderCtx<'_>, bitmap: Bitmap) -> Result<Self, RenderError> {
        let (tex_w, tex_h) = bitmap.backing_size();
        let max = ctx.device.limits().max_texture_dimension_2d;
        if tex_w > max || tex_h > max {
            return Err(RenderError::TextureTooLarge {
                width: tex_w.into(),
                height: tex_h.into(),
                max,
            });
        }

        let renderer = ctx.quad_renderer()?;

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tessel image texture"),
            size: wgpu::Extent3d {
                width: tex_w,
                height: tex_h,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: IMAGE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = renderer.texture_bind_group(ctx.device, &view);

        log::debug!(
            "image {}x{} allocated with {tex_w}x{tex_h} texture",
            bitmap.width(),
            bitmap.height()
        );

        Ok(Self {
            bitmap,
            texture,
            bind_group,
            renderer,
        })
    }

    #[inline]
    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    #[inline]
    pub fn bitmap_mut(&mut self) -> &mut Bitmap {
        &mut self.bitmap
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    #[inline]
    pub fn bounds(&self) -> PixelRect {
        self.bitmap.bounds()
    }

    /// Texture dimensions, equal to the bitmap's backing-store size.
    #[inline]
    pub fn texture_size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    /// Copies the whole backing store, padding included, into the texture.
    pub fn upload(&self, queue: &wgpu::Queue) {
        let (w, h) = self.texture_size();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            self.bitmap.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Draws the `src` rectangle of this image onto the parallelogram with
    /// the given corners, in points. The fourth corner is implied.
    ///
    /// `src` must lie inside `bounds()`; anything else samples undefined
    /// texels. Degenerate corners draw nothing visible but are not an error.
    pub fn draw(
        &self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        src: PixelRect,
    ) {
        if !ctx.viewport.is_valid() {
            log::trace!("image draw skipped: empty viewport {:?}", ctx.viewport);
            return;
        }

        let mvp = position_transform(ctx.viewport, top_left, top_right, bottom_left);
        let uvp = uv_transform(self.texture_size(), (0, 0), src);
        let uniform = DrawUniform::new(mvp, uvp, self.renderer.tint());

        self.renderer
            .draw_quad(ctx.device, target, &uniform, &self.bind_group);
    }

    /// Reads the texture back into tightly packed RGBA bytes covering the
    /// full backing store.
    pub fn read_back(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<u8>, RenderError> {
        read_texture_rgba8(device, queue, &self.texture)
    }

    /// Frees the GPU texture now instead of when the last reference drops.
    pub fn release(self) {
        log::debug!("releasing image {}x{}", self.width(), self.height());
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Rgba;
    use crate::coords::Viewport;
    use crate::device::HeadlessGpu;
    use crate::paint::Color;
    use crate::render::RendererCell;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const TARGET: u32 = 8;

    fn headless() -> Option<HeadlessGpu> {
        match HeadlessGpu::new() {
            Ok(gpu) => Some(gpu),
            Err(err) => {
                eprintln!("skipping GPU test: {err}");
                None
            }
        }
    }

    fn ctx<'a>(gpu: &'a HeadlessGpu, cell: &'a RendererCell) -> RenderCtx<'a> {
        RenderCtx::new(
            gpu.device(),
            gpu.queue(),
            IMAGE_FORMAT,
            Viewport::new(TARGET as f32, TARGET as f32),
            1.0,
            cell,
        )
    }

    fn offscreen(device: &wgpu::Device) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test target"),
            size: wgpu::Extent3d {
                width: TARGET,
                height: TARGET,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: IMAGE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    fn solid(ctx: &RenderCtx<'_>, px: Rgba<u8>) -> Image {
        let mut img = Image::new(ctx, 4, 4).unwrap();
        img.bitmap_mut().fill(px);
        img.upload(ctx.queue);
        img
    }

    fn texel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
        let i = ((y * TARGET + x) * 4) as usize;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    }

    fn render(gpu: &HeadlessGpu, f: impl FnOnce(&mut RenderTarget<'_>)) -> Vec<u8> {
        let target = offscreen(gpu.device());
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        f(&mut RenderTarget::new(&mut encoder, &view));
        gpu.queue().submit(std::iter::once(encoder.finish()));
        read_texture_rgba8(gpu.device(), gpu.queue(), &target).unwrap()
    }

    fn full_viewport() -> (Point, Point, Point) {
        let s = TARGET as f32;
        (Point::new(0.0, 0.0), Point::new(s, 0.0), Point::new(0.0, s))
    }

    #[test]
    fn upload_then_read_back_round_trips() {
        let Some(gpu) = headless() else { return };
        let cell = RendererCell::new();
        let ctx = ctx(&gpu, &cell);

        let mut img = Image::new(&ctx, 3, 2).unwrap();
        assert_eq!(img.texture_size(), (4, 2));
        img.bitmap_mut().put_pixel(0, 0, RED);
        img.bitmap_mut().put_pixel(2, 1, GREEN);
        img.upload(ctx.queue);

        let pixels = img.read_back(ctx.device, ctx.queue).unwrap();
        assert_eq!(pixels.as_slice(), img.bitmap().as_raw());
    }

    #[test]
    fn upload_overwrites_previous_contents() {
        let Some(gpu) = headless() else { return };
        let cell = RendererCell::new();
        let ctx = ctx(&gpu, &cell);

        let mut img = solid(&ctx, RED);
        img.bitmap_mut().fill(GREEN);
        img.upload(ctx.queue);

        let pixels = img.read_back(ctx.device, ctx.queue).unwrap();
        assert!(pixels.chunks(4).all(|p| p == GREEN.0));
    }

    #[test]
    fn full_viewport_draw_covers_target() {
        let Some(gpu) = headless() else { return };
        let cell = RendererCell::new();
        let ctx = ctx(&gpu, &cell);
        let img = solid(&ctx, RED);

        let (tl, tr, bl) = full_viewport();
        let pixels = render(&gpu, |target| img.draw(&ctx, target, tl, tr, bl, img.bounds()));

        assert!(pixels.chunks(4).all(|p| p == RED.0));
    }

    #[test]
    fn draws_in_one_encoder_keep_their_own_transforms() {
        let Some(gpu) = headless() else { return };
        let cell = RendererCell::new();
        let ctx = ctx(&gpu, &cell);
        let red = solid(&ctx, RED);
        let green = solid(&ctx, GREEN);

        let s = TARGET as f32;
        let h = s / 2.0;
        let pixels = render(&gpu, |target| {
            red.draw(&ctx, target, Point::new(0.0, 0.0), Point::new(h, 0.0), Point::new(0.0, s), red.bounds());
            green.draw(&ctx, target, Point::new(h, 0.0), Point::new(s, 0.0), Point::new(h, s), green.bounds());
        });

        assert_eq!(texel(&pixels, 1, 4), RED.0);
        assert_eq!(texel(&pixels, 6, 4), GREEN.0);
    }

    #[test]
    fn degenerate_draw_is_not_an_error() {
        let Some(gpu) = headless() else { return };
        let cell = RendererCell::new();
        let ctx = ctx(&gpu, &cell);
        let img = solid(&ctx, RED);

        let p = Point::new(2.0, 2.0);
        let pixels = render(&gpu, |target| img.draw(&ctx, target, p, p, Point::new(2.0, 6.0), img.bounds()));

        // Nothing covered: the zero-initialized target is unchanged.
        assert!(pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn tint_multiplies_texels() {
        let Some(gpu) = headless() else { return };
        let cell = RendererCell::new();
        let ctx = ctx(&gpu, &cell);
        let img = solid(&ctx, RED);
        ctx.quad_renderer().unwrap().set_tint(Color::BLACK);

        let (tl, tr, bl) = full_viewport();
        let pixels = render(&gpu, |target| img.draw(&ctx, target, tl, tr, bl, img.bounds()));

        assert!(pixels.chunks(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn release_frees_texture() {
        let Some(gpu) = headless() else { return };
        let cell = RendererCell::new();
        let ctx = ctx(&gpu, &cell);
        let img = solid(&ctx, RED);
        img.release();
        assert!(cell.is_initialized());
    }

    #[test]
    fn image_over_texture_limit_is_rejected() {
        let Some(gpu) = headless() else { return };
        let cell = RendererCell::new();
        let ctx = ctx(&gpu, &cell);
        let max = gpu.device().limits().max_texture_dimension_2d;

        let err = Image::new(&ctx, max + 1, 1).err();
        assert_eq!(
            err,
            Some(RenderError::TextureTooLarge {
                width: u64::from(max + 1).next_power_of_two(),
                height: 1,
                max,
            })
        );
        // Rejected before the renderer is built.
        assert!(!cell.is_initialized());

        // A bitmap exactly at the limit still fits.
        assert!(Image::new(&ctx, max, 1).is_ok());
    }

    #[test]
    fn image_without_power_of_two_backing_is_rejected() {
        let Some(gpu) = headless() else { return };
        let cell = RendererCell::new();
        let ctx = ctx(&gpu, &cell);
        let err = Image::new(&ctx, (1 << 31) + 1, 1).err();
        assert!(matches!(
            err,
            Some(RenderError::TextureTooLarge { width: 0x1_0000_0000, height: 1, .. })
        ));
    }
}
