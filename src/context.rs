//! Central GPU and window state.
//!
//! [`Gpu`] bundles what is needed to create resources and record draws: the
//! device, its queue, the bind group layouts and the render pipelines. It does
//! not know about windows, which keeps the scene and the render batching usable
//! on an offscreen device. [`Context`] adds the window, its surface and the
//! depth buffer sized to it.

use std::sync::Arc;

use winit::window::Window;

use crate::{
    camera,
    config::SceneConfig,
    data_structures::{material, texture},
    pipelines::Pipelines,
    resize::RenderSurface,
};

/// Device side of the renderer.
///
/// The camera uniform layout is created up front so the pipelines can be built
/// before the camera itself.
#[derive(Debug)]
pub struct Gpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub pipelines: Pipelines,
    /// Layout of every single-texture material (group 0 of each pipeline).
    pub texture_layout: wgpu::BindGroupLayout,
    /// Layout of the camera uniform (group 1 of each pipeline).
    pub camera_layout: wgpu::BindGroupLayout,
    /// Format of the colour target the pipelines were built for.
    pub color_format: wgpu::TextureFormat,
}

impl Gpu {
    /// Build layouts and pipelines on an existing device.
    ///
    /// # Arguments
    ///
    /// * `device` / `queue` - as returned by `Adapter::request_device`
    /// * `color_format` - format of the target frames are drawn into
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let texture_layout = material::texture_layout(&device);
        let camera_layout = camera::camera_layout(&device);
        let pipelines = Pipelines::new(&device, color_format, &texture_layout, &camera_layout);
        Self {
            device,
            queue,
            pipelines,
            texture_layout,
            camera_layout,
            color_format,
        }
    }

    /// A device without any surface, drawing into offscreen textures only.
    #[cfg(feature = "integration-tests")]
    pub async fn headless(color_format: wgpu::TextureFormat) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("headless adapter {:?}", adapter.get_info().name);
        let (device, queue) = request_device(&adapter).await?;
        Ok(Self::new(device, queue, color_format))
    }
}

async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    Ok(adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features, so if
            // we're building for the web we'll have to disable some.
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults()
            } else {
                wgpu::Limits::default()
            },
            memory_hints: Default::default(),
            experimental_features: Default::default(),
            trace: Default::default(),
        })
        .await?)
}

/// GPU state bound to a window.
///
/// Owns the surface and its configuration, the depth buffer matching the
/// surface size and the colour the frame is cleared to. Implements
/// [`RenderSurface`] so resizes go through the [`crate::resize::ResizeHandler`].
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub gpu: Gpu,
    pub config: wgpu::SurfaceConfiguration,
    pub clear_colour: wgpu::Color,
    /// Device pixels per logical pixel of the drawing buffer.
    pub pixel_ratio: f64,
}

impl Context {
    /// Set up instance, surface, device and pipelines for `window`.
    ///
    /// # Arguments
    ///
    /// * `window` - shared with the event loop, the surface keeps it alive
    /// * `scene` - supplies the clear colour
    ///
    /// # Errors
    ///
    /// Fails when no adapter or device is available or the surface reports
    /// no usable format.
    pub async fn new(window: Arc<Window>, scene: &SceneConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
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
        log::info!("adapter {:?}", adapter.get_info().name);

        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders output linear colour and rely on an sRGB surface for the encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        log::info!("surface format {:?}", surface_format);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let gpu = Gpu::new(device, queue, config.format);
        let depth_texture = texture::Texture::create_depth_texture(
            &gpu.device,
            [config.width, config.height],
            "depth_texture",
        );

        let [r, g, b, a] = scene.clear_colour;

        Ok(Self {
            window,
            depth_texture,
            surface,
            gpu,
            config,
            clear_colour: wgpu::Color { r, g, b, a },
            pixel_ratio: 1.0,
        })
    }

    /// Reconfigure the surface at its current size, e.g. after it was lost.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.gpu.device, &self.config);
    }
}

impl RenderSurface for Context {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        let max = self.gpu.device.limits().max_texture_dimension_2d;
        let scale = |v: u32| ((v as f64 * self.pixel_ratio).round() as u32).clamp(1, max);
        self.config.width = scale(width);
        self.config.height = scale(height);
        self.reconfigure();
        self.depth_texture = texture::Texture::create_depth_texture(
            &self.gpu.device,
            [self.config.width, self.config.height],
            "depth_texture",
        );
        log::debug!(
            "drawing buffer {}x{} for {}x{} at ratio {}",
            self.config.width,
            self.config.height,
            width,
            height,
            self.pixel_ratio
        );
    }
}
