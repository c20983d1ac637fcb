//! Application event loop.
//!
//! The loop owns all scene state. Asset loaders run elsewhere (tokio tasks
//! natively, `spawn_local` on the web) and hand their results back as
//! [`SceneEvent`]s through the event loop proxy, so every mutation of the scene
//! happens on the event loop thread.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and the GPU context, builds the scene and
//!    spawns one loader per asset
//! 2. `Resized` / `ScaleFactorChanged` go through the [`ResizeHandler`]
//! 3. pointer, wheel and touch events feed the orbit controls
//! 4. every `RedrawRequested` advances the clock, the video and the camera,
//!    draws a frame and schedules the next one
//! 5. `Loaded` / `Failed` events attach assets or log why they are missing

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    camera::CameraRig,
    clock::Clock,
    config::SceneConfig,
    context::Context,
    render::{self, FrameTarget},
    resize::{ResizeHandler, Viewport},
    resources::{self, Asset, AssetKind, Load},
    scene::{Scene, SceneBuilder},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything that exists once the GPU is up.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    camera: CameraRig,
    scene: Scene,
    clock: Clock,
    resize_handler: ResizeHandler,
    max_pixel_ratio: f64,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &SceneConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        let camera = CameraRig::new(
            &ctx.gpu.device,
            &ctx.gpu.camera_layout,
            &config.camera,
            &config.controls,
            ctx.config.width as f32 / ctx.config.height as f32,
        );

        let seed = config.tori.seed.unwrap_or_else(clock_seed);
        log::info!("scene seed {}", seed);
        let layout = SceneBuilder::new(config).build(&mut StdRng::seed_from_u64(seed));
        let scene = Scene::new(&ctx.gpu, layout);

        Ok(Self {
            ctx,
            camera,
            scene,
            clock: Clock::new(),
            resize_handler: ResizeHandler,
            max_pixel_ratio: config.max_pixel_ratio,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self) {
        let size = self.ctx.window.inner_size();
        let viewport = Viewport::new(
            (size.width, size.height),
            self.ctx.window.scale_factor(),
            self.max_pixel_ratio,
        );
        if self
            .resize_handler
            .on_resize(&mut self.camera.camera, &mut self.ctx, viewport)
        {
            self.camera.controls.set_viewport_height(viewport.height as f32);
            self.is_surface_configured = true;
        }
    }

    fn apply(&mut self, asset: Asset) {
        log::info!("{} loaded", asset.kind());
        self.scene.apply(&self.ctx.gpu, asset);
    }

    fn failed(&mut self, kind: AssetKind, path: &str, reason: &str) {
        log::warn!("could not load {:?} from {}: {}", kind, path, reason);
        if kind == AssetKind::Font {
            self.scene.font_failed(reason);
        }
    }

    /// Advance everything time dependent by one frame.
    fn update(&mut self) {
        self.clock.tick();
        self.scene.update(&self.ctx.gpu, self.clock.elapsed());
        self.camera.update(&self.ctx.gpu.queue);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        render::submit_frame(
            &self.ctx.gpu,
            &FrameTarget {
                color: &view,
                depth: &self.ctx.depth_texture.view,
                clear_colour: self.ctx.clear_colour,
            },
            &self.camera.bind_group,
            self.scene.render(),
        );
        output.present();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(target_arch = "wasm32")]
fn clock_seed() -> u64 {
    (instant::now() * 1000.0) as u64
}

pub enum SceneEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    Loaded(Asset),
    Failed {
        kind: AssetKind,
        path: String,
        reason: String,
    },
}

impl std::fmt::Debug for SceneEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Loaded(asset) => f.debug_tuple("Loaded").field(&asset.kind()).finish(),
            Self::Failed { kind, path, reason } => f
                .debug_struct("Failed")
                .field("kind", kind)
                .field("path", path)
                .field("reason", reason)
                .finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<SceneEvent>,
    config: SceneConfig,
    state: Option<AppState>,
}

impl App {
    fn new(event_loop: &EventLoop<SceneEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            config,
            state: None,
        })
    }

    /// Called once the GPU state exists, on every platform.
    fn initialized(&mut self, mut state: AppState) {
        state.resize();
        state.ctx.window.request_redraw();
        self.state = Some(state);

        for load in resources::loaders(&self.config.assets) {
            self.spawn_load(load);
        }
    }

    fn spawn_load(&self, load: Load) {
        let proxy = self.proxy.clone();
        let Load { kind, path, future } = load;
        log::debug!("loading {:?} from {}", kind, path);
        let task = async move {
            let event = match future.await {
                Ok(asset) => SceneEvent::Loaded(asset),
                Err(e) => SceneEvent::Failed {
                    kind,
                    path,
                    reason: format!("{:#}", e),
                },
            };
            if proxy.send_event(event).is_err() {
                log::debug!("event loop closed before {:?} finished loading", kind);
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(task);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);
    }
}

impl ApplicationHandler<SceneEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("matcap-scene");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_SELECTOR: &str = "canvas.webgl";

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document
                .query_selector(CANVAS_SELECTOR)
                .ok()
                .flatten()
                .map(|element| element.unchecked_into());
            if canvas.is_none() {
                log::warn!("no {} element, winit creates its own canvas", CANVAS_SELECTOR);
            }
            window_attributes = window_attributes
                .with_canvas(canvas)
                .with_append(true);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("cannot create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let config = self.config.clone();
        let init_future = async move { AppState::new(window, &config).await };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(state) => self.initialized(state),
                Err(e) => {
                    log::error!("App initialization failed: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok(state) => {
                        if proxy
                            .send_event(SceneEvent::Initialized(Box::new(state)))
                            .is_err()
                        {
                            log::error!("event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("App initialization failed: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: SceneEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            SceneEvent::Initialized(state) => self.initialized(*state),
            SceneEvent::Loaded(asset) => match &mut self.state {
                Some(state) => state.apply(asset),
                None => log::warn!("{} arrived before the scene existed", asset.kind()),
            },
            SceneEvent::Failed { kind, path, reason } => match &mut self.state {
                Some(state) => state.failed(kind, &path, &reason),
                None => log::warn!("could not load {}: {}", path, reason),
            },
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.camera.controls.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => state.resize(),
            WindowEvent::RedrawRequested => {
                // schedule the next frame
                state.ctx.window.request_redraw();
                state.update();

                match state.render() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        log::debug!("surface lost, reconfiguring");
                        state.ctx.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("out of memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)?;
    }

    if log::log_enabled!(log::Level::Debug) {
        log::debug!("config {}", config.to_json()?);
    }

    let event_loop: EventLoop<SceneEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
