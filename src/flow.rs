//! Application event loop.
//!
//! [`run`] opens the window (or the canvas inside the page container), creates
//! the GPU [`Context`], fires the one asset load and then drives the viewer from
//! winit events:
//!
//! 1. `Resized` goes through the [`ViewportMonitor`] synchronously, so the
//!    placement is updated before the next frame is drawn. On the web the
//!    viewport is the browser window's, and the canvas is sized to follow it
//! 2. `RedrawRequested` runs one [`RenderLoop`] step, which schedules the next one
//! 3. the load result arrives as a user event and is attached to the [`Viewer`]
//!
//! Loading never blocks the loop: natively it runs on a helper thread driving
//! the tokio runtime, on the web it is spawned onto the browser's task queue.

use std::{fmt::Debug, sync::Arc};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    config::ViewerConfig,
    context::Context,
    data_structures::scene_graph::SceneAsset,
    render::RenderLoop,
    resources::AssetLoader,
    viewer::Viewer,
    viewport::{Viewport, ViewportMonitor},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) enum ViewerEvent {
    #[cfg(target_arch = "wasm32")]
    Initialized(Context),
    /// The browser window fired `resize`.
    #[cfg(target_arch = "wasm32")]
    HostResized,
    Loaded(anyhow::Result<SceneAsset>),
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized(_) => f.write_str("Initialized"),
            #[cfg(target_arch = "wasm32")]
            Self::HostResized => f.write_str("HostResized"),
            Self::Loaded(Ok(_)) => f.write_str("Loaded(Ok)"),
            Self::Loaded(Err(e)) => write!(f, "Loaded(Err({}))", e),
        }
    }
}

pub(crate) struct App<L: AssetLoader + 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    loader: Option<L>,
    ctx: Option<Context>,
    viewer: Viewer,
    monitor: ViewportMonitor,
    render_loop: RenderLoop,
}

impl<L> App<L>
where
    L: AssetLoader + Send + 'static,
{
    fn new(
        event_loop: &EventLoop<ViewerEvent>,
        config: ViewerConfig,
        loader: L,
    ) -> anyhow::Result<Self> {
        #[cfg(not(target_arch = "wasm32"))]
        let monitor = ViewportMonitor::unbounded();
        #[cfg(target_arch = "wasm32")]
        let monitor = ViewportMonitor::new(config.max_pixel_ratio);
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            loader: Some(loader),
            ctx: None,
            viewer: Viewer::new(config),
            monitor,
            render_loop: RenderLoop::new(),
        })
    }

    /// Issues the one asset load of this process. Later calls do nothing.
    fn start_load(&mut self) {
        let Some(loader) = self.loader.take() else {
            return;
        };
        let path = self.viewer.config().asset_path.clone();
        let proxy = self.proxy.clone();
        log::info!("Loading {}", path);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let handle = self.async_runtime.handle().clone();
            let spawned = std::thread::Builder::new()
                .name("asset-loader".to_string())
                .spawn(move || {
                    let result = handle.block_on(loader.load(&path));
                    if proxy.send_event(ViewerEvent::Loaded(result)).is_err() {
                        log::warn!("The event loop closed before {} finished loading", path);
                    }
                });
            if let Err(e) = spawned {
                log::error!("Could not start the asset loader: {}", e);
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                let result = loader.load(&path).await;
                if proxy.send_event(ViewerEvent::Loaded(result)).is_err() {
                    log::warn!("The event loop closed before {} finished loading", path);
                }
            });
        }
    }

    /// Makes a freshly created context current and lays it out for the window.
    fn install_context(&mut self, mut ctx: Context) {
        if let Some(asset) = self.viewer.state().asset() {
            ctx.renderer.upload(asset);
        }
        let window = ctx.window.clone();
        let viewport = current_viewport(&window);
        fit_canvas(&window, viewport);
        self.monitor.handle(&mut self.viewer, &mut ctx, viewport);
        self.ctx = Some(ctx);
        window.request_redraw();
    }

    #[cfg(target_arch = "wasm32")]
    fn on_host_resized(&mut self) {
        let Some(ctx) = &mut self.ctx else {
            return;
        };
        let window = ctx.window.clone();
        let viewport = current_viewport(&window);
        fit_canvas(&window, viewport);
        self.monitor.handle(&mut self.viewer, ctx, viewport);
    }

    fn on_loaded(&mut self, result: anyhow::Result<SceneAsset>) {
        match self.viewer.attach_asset(result) {
            Ok(()) => {
                if let (Some(ctx), Some(asset)) = (&mut self.ctx, self.viewer.state().asset()) {
                    ctx.renderer.upload(asset);
                }
                if let Some(placement) = self.viewer.state().placement() {
                    log::info!(
                        "Placed model for {:?} at {:?}, camera at {:?}",
                        placement.class,
                        placement.model_position,
                        placement.camera_position
                    );
                }
            }
            Err(e) => log::error!("{:#}", e),
        }
    }

    fn redraw(&mut self) {
        let Some(ctx) = &mut self.ctx else {
            return;
        };
        let window = ctx.window.clone();
        match self.render_loop.step(window.as_ref(), ctx, &self.viewer) {
            Ok(()) => (),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let viewport = current_viewport(&window);
                self.monitor.handle(&mut self.viewer, ctx, viewport);
            }
            Err(e) => {
                log::error!("Unable to render {}", e);
            }
        }
    }
}

impl<L> ApplicationHandler<ViewerEvent> for App<L>
where
    L: AssetLoader + Send + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Product Viewer");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;
            window_attributes = window_attributes.with_append(false);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create the viewer window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(target_arch = "wasm32")]
        {
            attach_canvas(&window, &self.viewer.config().container_id);
            watch_host_resize(self.proxy.clone());
        }

        let sample_count = self.viewer.config().sample_count;

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self
                .async_runtime
                .block_on(Context::new(window, sample_count))
            {
                Ok(ctx) => self.install_context(ctx),
                Err(e) => {
                    log::error!("Cannot create the GPU context: {:#}", e);
                    event_loop.exit();
                    return;
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window, sample_count).await {
                    Ok(ctx) => {
                        if proxy.send_event(ViewerEvent::Initialized(ctx)).is_err() {
                            log::warn!("The event loop closed during GPU setup");
                        }
                    }
                    Err(e) => log::error!("Cannot create the GPU context: {:#}", e),
                }
            });
        }

        self.start_load();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        log::debug!("{:?}", event);
        match event {
            #[cfg(target_arch = "wasm32")]
            ViewerEvent::Initialized(ctx) => self.install_context(ctx),
            #[cfg(target_arch = "wasm32")]
            ViewerEvent::HostResized => self.on_host_resized(),
            ViewerEvent::Loaded(result) => self.on_loaded(result),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(ctx) = &mut self.ctx {
                    #[cfg(not(target_arch = "wasm32"))]
                    let viewport = Viewport::from_physical(size, ctx.window.scale_factor());
                    #[cfg(target_arch = "wasm32")]
                    let viewport = host_viewport().unwrap_or_else(|| {
                        Viewport::from_physical(size, ctx.window.scale_factor())
                    });
                    self.monitor.handle(&mut self.viewer, ctx, viewport);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

/// The viewport the presentation is laid out for: the browser window on the
/// web, the native window otherwise.
fn current_viewport(window: &Window) -> Viewport {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(viewport) = host_viewport() {
            return viewport;
        }
    }
    Viewport::from_physical(window.inner_size(), window.scale_factor())
}

#[cfg(target_arch = "wasm32")]
fn host_viewport() -> Option<Viewport> {
    let window = web_sys::window()?;
    let width = window.inner_width().ok()?.as_f64()?;
    let height = window.inner_height().ok()?.as_f64()?;
    Some(Viewport::from_host(
        width,
        height,
        window.device_pixel_ratio(),
    ))
}

/// Resizes the canvas to cover the viewport. winit reports the new size back
/// through `Resized`. Native windows are sized by the user instead.
#[allow(unused_variables)]
fn fit_canvas(window: &Window, viewport: Viewport) {
    #[cfg(target_arch = "wasm32")]
    {
        let size = winit::dpi::LogicalSize::new(viewport.width as f64, viewport.height as f64);
        let _ = window.request_inner_size(size);
    }
}

#[cfg(target_arch = "wasm32")]
fn watch_host_resize(proxy: EventLoopProxy<ViewerEvent>) {
    use wasm_bindgen::JsCast;

    let Some(window) = web_sys::window() else {
        log::error!("No browser window to watch for resizes");
        return;
    };
    let on_resize = Closure::<dyn FnMut()>::new(move || {
        if proxy.send_event(ViewerEvent::HostResized).is_err() {
            log::warn!("The event loop closed, ignoring resize");
        }
    });
    if let Err(e) =
        window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
    {
        log::error!("Cannot watch the browser window for resizes: {:?}", e);
    }
    // the listener stays registered for the lifetime of the page
    on_resize.forget();
}

#[cfg(target_arch = "wasm32")]
fn attach_canvas(window: &Window, container_id: &str) {
    use winit::platform::web::WindowExtWebSys;

    let Some(canvas) = window.canvas() else {
        log::error!("The viewer window has no canvas");
        return;
    };
    let container = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(container_id));
    match container {
        Some(container) => {
            if let Err(e) = container.append_child(&canvas) {
                log::error!("Cannot attach the canvas to #{}: {:?}", container_id, e);
            }
        }
        None => log::error!("No element with id {} to attach the canvas to", container_id),
    }
}

/// Starts the viewer and blocks until its window is closed.
pub fn run<L>(config: ViewerConfig, loader: L) -> anyhow::Result<()>
where
    L: AssetLoader + Send + 'static,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config, loader)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
