//! Application event loop.
//!
//! [`run`] opens the window (a canvas appended to the container on the web),
//! starts the asset loads, brings up the GPU and then drives the
//! [`SceneSession`] from winit events. Loads and DOM callbacks report back
//! through [`StageEvent`]s sent to the event loop proxy, so the session is
//! only ever touched from the event loop thread.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and kicks off every asset fetch
//! 2. The renderer is created and the viewport is measured once
//! 3. `RedrawRequested` runs one render loop tick, which asks for the next
//! 4. Scroll, resize and motion preference changes are applied as they arrive

use std::{fmt::Debug, sync::Arc};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    animation::ScrollSample,
    config::StageConfig,
    data_structures::model::ModelData,
    frame::FrameClock,
    host::{PageHost, VirtualScroll},
    loader::Ticket,
    render::GpuRenderer,
    resources::FileModelSource,
    session::SceneSession,
    viewport::ViewportHost,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub enum StageEvent {
    AssetSettled {
        ticket: Ticket,
        result: anyhow::Result<ModelData>,
    },
    Scrolled(ScrollSample),
    HostResized,
    MotionPreferenceChanged(bool),
    #[cfg(target_arch = "wasm32")]
    RendererReady(Result<GpuRenderer, String>),
}

impl Debug for StageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssetSettled { ticket, result } => f
                .debug_struct("AssetSettled")
                .field("ticket", ticket)
                .field("ok", &result.is_ok())
                .finish(),
            Self::Scrolled(sample) => f.debug_tuple("Scrolled").field(sample).finish(),
            Self::HostResized => f.write_str("HostResized"),
            Self::MotionPreferenceChanged(reduce) => {
                f.debug_tuple("MotionPreferenceChanged").field(reduce).finish()
            }
            #[cfg(target_arch = "wasm32")]
            Self::RendererReady(result) => f
                .debug_tuple("RendererReady")
                .field(&result.is_ok())
                .finish(),
        }
    }
}

/// Frames are scheduled through winit redraw requests, which map to
/// `requestAnimationFrame` on the web.
pub struct WinitFrameClock {
    window: Arc<Window>,
}

impl FrameClock for WinitFrameClock {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<StageEvent>,
    config: StageConfig,
    session: SceneSession,
    source: FileModelSource,
    window: Option<Arc<Window>>,
    host: Option<PageHost>,
    renderer: Option<GpuRenderer>,
    clock: Option<WinitFrameClock>,
    scroll: VirtualScroll,
}

impl App {
    fn new(event_loop: &EventLoop<StageEvent>, config: StageConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        let session = SceneSession::new(&config);
        let source = FileModelSource::new(&config.host.assets_root);
        let scroll = VirtualScroll::new(config.host.virtual_page_height, 0.0);
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            session,
            source,
            window: None,
            host: None,
            renderer: None,
            clock: None,
            scroll,
        })
    }

    fn start_loading(&mut self) {
        for pending in self.session.start_loading(&self.source) {
            let proxy = self.proxy.clone();
            let task = async move {
                let (ticket, result) = pending.resolve().await;
                if proxy
                    .send_event(StageEvent::AssetSettled { ticket, result })
                    .is_err()
                {
                    log::warn!("Event loop closed before asset {:?} settled", ticket);
                }
            };
            #[cfg(not(target_arch = "wasm32"))]
            self.async_runtime.spawn(task);
            #[cfg(target_arch = "wasm32")]
            wasm_bindgen_futures::spawn_local(task);
        }
    }

    /// Measures the host, then sizes the projection and the surface.
    fn resize(&mut self) {
        let (Some(host), Some(renderer)) = (&self.host, &mut self.renderer) else {
            return;
        };
        self.session.resize(host, renderer);
        let (_, height) = host.client_size();
        self.scroll.set_viewport_height(height as f32);
        // The trigger range depends on the layout, so bindings are scrubbed again.
        self.rescroll();
    }

    fn rescroll(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        self.session.scroll(self.scroll.sample());

        #[cfg(target_arch = "wasm32")]
        if let Some(sample) = crate::host::web::scroll_sample(&self.config.host.trigger_selector) {
            self.session.scroll(sample);
        }
    }

    fn renderer_ready(&mut self, renderer: GpuRenderer) {
        self.renderer = Some(renderer);
        self.resize();

        if let Some(clock) = &mut self.clock {
            self.session.start_render_loop(clock);
        }
    }
}

impl ApplicationHandler<StageEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("scroll-stage");

        #[cfg(target_arch = "wasm32")]
        let container = crate::host::web::container(&self.config.host.container_id);

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            match crate::host::web::mount_canvas(container.as_ref()) {
                Ok(canvas) => window_attributes = window_attributes.with_canvas(Some(canvas)),
                Err(e) => {
                    log::error!("{:#}", e);
                    event_loop.exit();
                    return;
                }
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.host = Some(PageHost::new(window.clone()));
        }
        #[cfg(target_arch = "wasm32")]
        {
            self.host = Some(PageHost::new(window.clone(), container));
            if self.config.host.reduced_motion.is_none() {
                self.session
                    .set_reduced_motion(crate::host::web::prefers_reduced_motion());
            }
            crate::host::web::install_listeners(
                self.proxy.clone(),
                self.config.host.trigger_selector.clone(),
            );
        }

        self.clock = Some(WinitFrameClock {
            window: window.clone(),
        });
        self.window = Some(window.clone());

        self.start_loading();

        let environment = self.session.context().environment;

        #[cfg(not(target_arch = "wasm32"))]
        {
            let ctx = self
                .async_runtime
                .block_on(crate::context::Context::new(window, &environment));
            match ctx {
                Ok(ctx) => self.renderer_ready(GpuRenderer::new(ctx)),
                Err(e) => {
                    log::error!("Cannot create the GPU context: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let renderer = crate::context::Context::new(window, &environment)
                    .await
                    .map(GpuRenderer::new)
                    .map_err(|e| format!("{:#}", e));
                if proxy.send_event(StageEvent::RendererReady(renderer)).is_err() {
                    log::warn!("Event loop closed before the renderer was ready");
                }
            });
        }
    }

    #[cfg_attr(not(target_arch = "wasm32"), allow(unused_variables))]
    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: StageEvent) {
        log::trace!("{:?}", event);
        match event {
            StageEvent::AssetSettled { ticket, result } => {
                self.session.asset_settled(ticket, result);
            }
            StageEvent::Scrolled(sample) => self.session.scroll(sample),
            StageEvent::HostResized => self.resize(),
            StageEvent::MotionPreferenceChanged(reduce) => {
                if self.config.host.reduced_motion.is_some() {
                    log::debug!("Motion preference is fixed by configuration");
                } else {
                    self.session.set_reduced_motion(reduce);
                }
            }
            #[cfg(target_arch = "wasm32")]
            StageEvent::RendererReady(Ok(renderer)) => self.renderer_ready(renderer),
            #[cfg(target_arch = "wasm32")]
            StageEvent::RendererReady(Err(e)) => {
                log::error!("Cannot create the GPU context: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.session.stop_render_loop();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => self.resize(),
            WindowEvent::RedrawRequested => {
                if let (Some(renderer), Some(clock)) = (&mut self.renderer, &mut self.clock) {
                    self.session.frame(renderer, clock);
                }
            }
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::MouseWheel { delta, .. } => {
                let sample = self.scroll.on_wheel(delta);
                self.session.scroll(sample);
            }
            _ => {}
        }
    }
}

/// Runs a stage until its window closes.
pub fn run(config: StageConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        // Fails only when a logger is already installed
        let _ = console_log::init_with_level(log::Level::Info);
    }

    let event_loop: EventLoop<StageEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Browser entry point.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = startStage)]
pub fn start_stage() -> Result<(), JsValue> {
    run(StageConfig::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
