//! GPU ownership: device, queue, surface and the resources the model is drawn with.
//!
//! [`Renderer`] is surface-agnostic and draws a [`Frame`] into any texture view.
//! [`Context`] binds a renderer to the window surface and is what the event
//! loop resizes and presents through.

use std::{iter, sync::Arc};

use anyhow::anyhow;
use winit::window::Window;

use crate::{
    camera::CameraUniform,
    data_structures::{
        model::{DrawModel, Model},
        scene_graph::SceneAsset,
        texture::{self, base_colour_layout},
    },
    pipelines::{
        UniformResources, basic::mk_basic_pipeline, light::LightUniform,
        transform::TransformUniform,
    },
    render::{Frame, FrameTarget},
    viewport::SurfaceResize,
};

#[derive(Debug)]
pub struct Renderer {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub(crate) depth_texture: texture::Texture,
    /// Multisampled colour buffer, absent when rendering single-sampled.
    pub(crate) msaa_texture: Option<texture::Texture>,
    pub camera: UniformResources,
    pub transform: UniformResources,
    pub light: UniformResources,
    texture_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    model: Option<Model>,
}

impl Renderer {
    /// `sample_count` must be supported for both `format` and the depth format,
    /// see [`pick_sample_count`].
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        size: [u32; 2],
        sample_count: u32,
    ) -> Self {
        let camera = UniformResources::new(&device, "Camera", &CameraUniform::new());
        let transform = UniformResources::new(&device, "Model Transform", &TransformUniform::new());
        let light = UniformResources::new(&device, "Light", &LightUniform::default());
        let texture_layout = base_colour_layout(&device);
        let pipeline = mk_basic_pipeline(
            &device,
            format,
            sample_count,
            &camera.bind_group_layout,
            &transform.bind_group_layout,
            &light.bind_group_layout,
            &texture_layout,
        );
        let (depth_texture, msaa_texture) = Self::targets(&device, format, size, sample_count);

        Self {
            device,
            queue,
            format,
            sample_count,
            depth_texture,
            msaa_texture,
            camera,
            transform,
            light,
            texture_layout,
            pipeline,
            model: None,
        }
    }

    fn targets(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: [u32; 2],
        sample_count: u32,
    ) -> (texture::Texture, Option<texture::Texture>) {
        let depth = texture::Texture::create_depth_texture(device, size, sample_count, "depth_texture");
        let msaa = (sample_count > 1).then(|| {
            texture::Texture::create_msaa_texture(device, size, format, sample_count, "msaa_texture")
        });
        (depth, msaa)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let (depth, msaa) =
            Self::targets(&self.device, self.format, [width, height], self.sample_count);
        self.depth_texture = depth;
        self.msaa_texture = msaa;
    }

    /// Uploads the attached asset. Later calls replace the previous model.
    pub fn upload(&mut self, asset: &SceneAsset) {
        self.model = Some(Model::upload(
            &self.device,
            &self.queue,
            asset,
            &self.texture_layout,
        ));
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /**
     * Encodes one frame into `view`.
     *
     * Without an uploaded model or a model transform the pass only clears, which
     * is how frames before the asset arrived look.
     */
    pub fn draw(&self, view: &wgpu::TextureView, frame: &Frame) -> wgpu::CommandBuffer {
        self.camera.write(&self.queue, &frame.camera);
        let model = match (&self.model, &frame.transform) {
            (Some(model), Some(transform)) => {
                self.transform.write(&self.queue, transform);
                Some(model)
            }
            _ => None,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        // Multisampled passes draw into the msaa buffer and resolve into `view`
        let (target, resolve_target, store) = match &self.msaa_texture {
            Some(msaa) => (&msaa.view, Some(view), wgpu::StoreOp::Discard),
            None => (view, None, wgpu::StoreOp::Store),
        };
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear_colour),
                        store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(model) = model {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.draw_model(
                    model,
                    &self.camera.bind_group,
                    &self.transform.bind_group,
                    &self.light.bind_group,
                );
            }
        }
        encoder.finish()
    }
}

/// Highest sample count up to `requested` that `supported` accepts, falling
/// back to single sampling.
pub fn pick_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    let picked = [16, 8, 4, 2]
        .into_iter()
        .filter(|count| *count <= requested)
        .find(|count| supported(*count))
        .unwrap_or(1);
    if picked != requested.max(1) {
        log::warn!(
            "{}x multisampling is not supported, rendering with {}x",
            requested,
            picked
        );
    }
    picked
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    pub renderer: Renderer,
    is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, sample_count: u32) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await?;

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("The surface supports no texture format"))?;
        // The canvas is layered over page content, so prefer a compositing alpha mode
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|mode| surface_caps.alpha_modes.contains(mode))
        .or_else(|| surface_caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = surface_caps
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let sample_count = pick_sample_count(sample_count, |count| {
            [surface_format, texture::Texture::DEPTH_FORMAT]
                .into_iter()
                .all(|format| {
                    adapter
                        .get_texture_format_features(format)
                        .flags
                        .sample_count_supported(count)
                })
        });
        log::info!("Rendering with {}x multisampling", sample_count);

        let renderer = Renderer::new(
            device,
            queue,
            surface_format,
            [size.width, size.height],
            sample_count,
        );

        let mut ctx = Self {
            window,
            surface,
            config,
            renderer,
            is_surface_configured: false,
        };
        ctx.resize_surface(size.width, size.height);
        Ok(ctx)
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl SurfaceResize for Context {
    fn resize_surface(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.renderer.device, &self.config);
            self.renderer.resize(width, height);
            self.is_surface_configured = true;
        }
    }
}

impl FrameTarget for Context {
    type Error = wgpu::SurfaceError;

    fn present(&mut self, frame: &Frame) -> Result<(), Self::Error> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let commands = self.renderer.draw(&view, frame);
        self.renderer.queue.submit(iter::once(commands));
        output.present();
        Ok(())
    }
}
