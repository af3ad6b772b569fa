use std::cell::{Cell, OnceCell};
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::paint::Color;
use crate::render::affine::{Affine, QUAD_POSITIONS, QUAD_UVS};
use crate::render::{RenderError, RenderTarget};

// ── per-draw uniform ──────────────────────────────────────────────────────

/// Uniform block layout (112 bytes):
///
///  offset  0  mvp   mat3x3<f32>  (3 columns padded to vec4)
///  offset 48  uvp   mat3x3<f32>
///  offset 96  tint  vec4<f32>
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct DrawUniform {
    pub mvp: [[f32; 4]; 3],
    pub uvp: [[f32; 4]; 3],
    pub tint: [f32; 4],
}

impl DrawUniform {
    pub(super) fn new(mvp: Affine, uvp: Affine, tint: Color) -> Self {
        Self {
            mvp: mvp.to_mat3_columns(),
            uvp: uvp.to_mat3_columns(),
            tint: tint.to_array(),
        }
    }
}

fn draw_uniform_min_binding_size() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64)
}

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const UV_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];

// ── renderer ──────────────────────────────────────────────────────────────

/// Shared GPU state for drawing textured quads.
///
/// Holds one pipeline built for a single color format, the static unit-quad
/// position and UV buffers, the sampler, and the bind-group layouts every
/// `Image` binds against. Created once per `RendererCell` and shared through
/// `Rc`; it is never torn down while images reference it.
///
/// The tint is global: every draw through this renderer multiplies sampled
/// texels by it unless it is exactly opaque white.
pub struct QuadRenderer {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    position_vbo: wgpu::Buffer,
    uv_vbo: wgpu::Buffer,
    sampler: wgpu::Sampler,
    tint: Cell<Color>,
}

impl QuadRenderer {
    /// Compiles the textured-quad program and builds the pipeline for
    /// render targets of `format`.
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Result<Self, RenderError> {
        Self::with_source(device, format, include_str!("shaders/image.wgsl"))
    }

    /// Builds the renderer from WGSL `source`, which must expose `vs_main`
    /// and `fs_main` over the bind-group layouts below.
    ///
    /// Validation errors from the shader module or the pipeline are caught
    /// and returned as `ShaderCompilation` instead of reaching the device's
    /// uncaptured-error handler.
    pub(crate) fn with_source(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        source: &str,
    ) -> Result<Self, RenderError> {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel image uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: draw_uniform_min_binding_size(),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel image texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessel image pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        let buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &POSITION_ATTRS,
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &UV_ATTRS,
            },
        ];

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessel image shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessel image pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    // Bitmaps hold straight alpha.
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(RenderError::ShaderCompilation(err.to_string()));
        }

        let position_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tessel quad position vbo"),
            contents: bytemuck::cast_slice(&QUAD_POSITIONS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uv_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tessel quad uv vbo"),
            contents: bytemuck::cast_slice(&QUAD_UVS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessel image sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        log::info!("quad renderer initialized for {format:?}");

        Ok(Self {
            format,
            pipeline,
            uniform_layout,
            texture_layout,
            position_vbo,
            uv_vbo,
            sampler,
            tint: Cell::new(Color::WHITE),
        })
    }

    /// Color format the pipeline renders into.
    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Sets the tint applied by every later draw. Opaque white disables it.
    #[inline]
    pub fn set_tint(&self, tint: Color) {
        self.tint.set(tint);
    }

    #[inline]
    pub fn tint(&self) -> Color {
        self.tint.get()
    }

    /// Bind group for one image texture (group 1).
    pub(super) fn texture_bind_group(
        &self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessel image texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Records one render pass drawing the unit quad with `uniform` and the
    /// given texture bindings.
    ///
    /// The pass loads existing target contents. Every binding set here ends
    /// with the pass, so nothing leaks into later draws.
    pub(super) fn draw_quad(
        &self,
        device: &wgpu::Device,
        target: &mut RenderTarget<'_>,
        uniform: &DrawUniform,
        texture_bind_group: &wgpu::BindGroup,
    ) {
        // A fresh buffer per draw: several draws recorded into one encoder
        // must each see their own matrices at submit time.
        let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tessel image draw ubo"),
            contents: bytemuck::bytes_of(uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessel image uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessel image pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &uniform_bind_group, &[]);
        rpass.set_bind_group(1, texture_bind_group, &[]);
        rpass.set_vertex_buffer(0, self.position_vbo.slice(..));
        rpass.set_vertex_buffer(1, self.uv_vbo.slice(..));
        rpass.draw(0..QUAD_POSITIONS.len() as u32, 0..1);
    }
}

impl std::fmt::Debug for QuadRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadRenderer")
            .field("format", &self.format)
            .field("tint", &self.tint.get())
            .finish_non_exhaustive()
    }
}

// ── one-shot latch ────────────────────────────────────────────────────────

/// One-shot initialization latch for the shared `QuadRenderer`.
///
/// The first call to `get_or_init` builds the renderer; every later call
/// returns the same renderer, or replays the same error if that first build
/// failed. There is no retry.
///
/// Not `Sync`: the render context lives on one thread.
#[derive(Debug, Default)]
pub struct RendererCell {
    cell: OnceCell<Result<Rc<QuadRenderer>, RenderError>>,
}

impl RendererCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_init(
        &self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> Result<Rc<QuadRenderer>, RenderError> {
        self.get_or_init_with(|| QuadRenderer::new(device, format))
    }

    pub(crate) fn get_or_init_with(
        &self,
        init: impl FnOnce() -> Result<QuadRenderer, RenderError>,
    ) -> Result<Rc<QuadRenderer>, RenderError> {
        self.cell.get_or_init(|| init().map(Rc::new)).clone()
    }

    /// Latched renderer, if initialization already ran and succeeded.
    pub fn get(&self) -> Option<Rc<QuadRenderer>> {
        self.cell.get().and_then(|r| r.as_ref().ok()).cloned()
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessGpu;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    #[test]
    fn uniform_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<DrawUniform>(), 112);
    }

    #[test]
    fn uniform_carries_tint() {
        let u = DrawUniform::new(Affine::IDENTITY, Affine::IDENTITY, Color::BLACK);
        assert_eq!(u.tint, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(u.mvp[2], [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn empty_cell_has_no_renderer() {
        let cell = RendererCell::new();
        assert!(!cell.is_initialized());
        assert!(cell.get().is_none());
    }

    #[test]
    fn cell_replays_first_failure_without_retrying() {
        let calls = Cell::new(0);
        let init = || {
            calls.set(calls.get() + 1);
            Err(RenderError::ShaderCompilation("unknown identifier".into()))
        };
        let cell = RendererCell::new();

        let first = cell.get_or_init_with(init).err();
        let second = cell.get_or_init_with(init).err();

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
        assert!(matches!(first, Some(RenderError::ShaderCompilation(_))));
        assert!(cell.is_initialized());
        assert!(cell.get().is_none());
    }

    #[test]
    fn invalid_wgsl_is_a_shader_error() {
        let Ok(gpu) = HeadlessGpu::new() else {
            eprintln!("skipping GPU test: no adapter");
            return;
        };
        let cell = RendererCell::new();
        let build = || QuadRenderer::with_source(gpu.device(), FORMAT, "fn vs_main( {");

        let first = cell.get_or_init_with(build).err();
        assert!(matches!(first, Some(RenderError::ShaderCompilation(_))));

        // The embedded program is never tried once the failure is latched.
        let second = cell.get_or_init(gpu.device(), FORMAT).err();
        assert_eq!(first, second);
    }

    #[test]
    fn cell_initializes_once() {
        let Ok(gpu) = HeadlessGpu::new() else {
            eprintln!("skipping GPU test: no adapter");
            return;
        };
        let cell = RendererCell::new();

        let first = cell.get_or_init(gpu.device(), FORMAT).unwrap();
        // A different format is ignored once latched.
        let second = cell
            .get_or_init(gpu.device(), wgpu::TextureFormat::Bgra8Unorm)
            .unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.format(), FORMAT);
        assert!(cell.get().is_some_and(|r| Rc::ptr_eq(&r, &first)));
    }

    #[test]
    fn tint_defaults_to_white_and_is_shared() {
        let Ok(gpu) = HeadlessGpu::new() else {
            eprintln!("skipping GPU test: no adapter");
            return;
        };
        let cell = RendererCell::new();
        let a = cell.get_or_init(gpu.device(), FORMAT).unwrap();
        assert!(a.tint().is_opaque_white());

        let b = cell.get_or_init(gpu.device(), FORMAT).unwrap();
        b.set_tint(Color::rgb(0.5, 0.5, 0.5));
        assert_eq!(a.tint(), Color::rgb(0.5, 0.5, 0.5));
    }
}
