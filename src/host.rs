//! Host adapters.
//!
//! The browser build reads sizes, scroll position and the reduced-motion
//! media query straight from the DOM. Native builds have no page to scroll,
//! so [`VirtualScroll`] emulates one driven by the mouse wheel.

use std::sync::Arc;

use winit::{event::MouseScrollDelta, window::Window};

use crate::{
    animation::{ScrollSample, TriggerLayout},
    viewport::ViewportHost,
};

/// Pixels scrolled per wheel line.
const LINE_HEIGHT: f32 = 40.0;

/// A page of `page_height` logical pixels whose single trigger element spans
/// the whole document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualScroll {
    scroll_y: f32,
    page_height: f32,
    viewport_height: f32,
}

impl VirtualScroll {
    pub fn new(page_height: f32, viewport_height: f32) -> Self {
        Self {
            scroll_y: 0.0,
            page_height: page_height.max(0.0),
            viewport_height: viewport_height.max(0.0),
        }
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn max_scroll(&self) -> f32 {
        (self.page_height - self.viewport_height).max(0.0)
    }

    /// Scrolls like a browser page: wheel down moves the page down.
    pub fn on_wheel(&mut self, delta: MouseScrollDelta) -> ScrollSample {
        let dy = match delta {
            MouseScrollDelta::LineDelta(_, lines) => -lines * LINE_HEIGHT,
            MouseScrollDelta::PixelDelta(position) => -position.y as f32,
        };
        self.scroll_y = (self.scroll_y + dy).clamp(0.0, self.max_scroll());
        self.sample()
    }

    pub fn set_viewport_height(&mut self, viewport_height: f32) {
        self.viewport_height = viewport_height.max(0.0);
        self.scroll_y = self.scroll_y.clamp(0.0, self.max_scroll());
    }

    pub fn sample(&self) -> ScrollSample {
        ScrollSample {
            scroll_y: self.scroll_y,
            layout: TriggerLayout {
                element_top: 0.0,
                element_height: self.page_height,
                viewport_height: self.viewport_height,
            },
        }
    }
}

/// Measures the element the stage is mounted in.
pub struct PageHost {
    window: Arc<Window>,
    #[cfg(target_arch = "wasm32")]
    container: Option<web_sys::Element>,
}

impl PageHost {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new(window: Arc<Window>, container: Option<web_sys::Element>) -> Self {
        Self { window, container }
    }
}

impl ViewportHost for PageHost {
    #[cfg(not(target_arch = "wasm32"))]
    fn client_size(&self) -> (u32, u32) {
        let size = self
            .window
            .inner_size()
            .to_logical::<f64>(self.window.scale_factor());
        (size.width.round() as u32, size.height.round() as u32)
    }

    #[cfg(target_arch = "wasm32")]
    fn client_size(&self) -> (u32, u32) {
        match &self.container {
            Some(container) => (
                container.client_width().max(0) as u32,
                container.client_height().max(0) as u32,
            ),
            None => {
                let size = self
                    .window
                    .inner_size()
                    .to_logical::<f64>(self.window.scale_factor());
                (size.width.round() as u32, size.height.round() as u32)
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    #[cfg(target_arch = "wasm32")]
    fn device_pixel_ratio(&self) -> f64 {
        web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or_else(|| self.window.scale_factor())
    }
}

#[cfg(target_arch = "wasm32")]
pub mod web {
    //! DOM access for the browser build.

    use wasm_bindgen::{JsCast, prelude::Closure};
    use winit::event_loop::EventLoopProxy;

    use crate::{
        animation::{ScrollSample, TriggerLayout},
        flow::StageEvent,
    };

    const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

    pub fn container(id: &str) -> Option<web_sys::Element> {
        let element = web_sys::window()?.document()?.get_element_by_id(id);
        if element.is_none() {
            log::warn!("No element with id {:?}, mounting on <body>", id);
        }
        element
    }

    /// Creates the drawing canvas and appends it to `container`, or to the
    /// document body without one.
    pub fn mount_canvas(
        container: Option<&web_sys::Element>,
    ) -> anyhow::Result<web_sys::HtmlCanvasElement> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| anyhow::anyhow!("No document to mount the canvas in"))?;
        let canvas: web_sys::HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|e| anyhow::anyhow!("Could not create a canvas: {:?}", e))?
            .dyn_into()
            .map_err(|_| anyhow::anyhow!("<canvas> is not an HtmlCanvasElement"))?;
        let parent: web_sys::Node = match container {
            Some(container) => container.clone().into(),
            None => document
                .body()
                .ok_or_else(|| anyhow::anyhow!("Document has no body"))?
                .into(),
        };
        parent
            .append_child(&canvas)
            .map_err(|e| anyhow::anyhow!("Could not append the canvas: {:?}", e))?;
        Ok(canvas)
    }

    fn media_query() -> Option<web_sys::MediaQueryList> {
        web_sys::window()?.match_media(REDUCED_MOTION_QUERY).ok()?
    }

    pub fn prefers_reduced_motion() -> bool {
        media_query().map(|q| q.matches()).unwrap_or(false)
    }

    /// Reads the trigger element's geometry and the page scroll offset.
    pub fn scroll_sample(selector: &str) -> Option<ScrollSample> {
        let window = web_sys::window()?;
        let scroll_y = window.scroll_y().ok()? as f32;
        let viewport_height = window.inner_height().ok()?.as_f64()? as f32;
        let element = window.document()?.query_selector(selector).ok()??;
        let rect = element.get_bounding_client_rect();
        Some(ScrollSample {
            scroll_y,
            layout: TriggerLayout {
                element_top: rect.top() as f32 + scroll_y,
                element_height: rect.height() as f32,
                viewport_height,
            },
        })
    }

    /// Forwards page scroll, window resize and reduced-motion changes to the
    /// event loop for the lifetime of the page.
    pub fn install_listeners(proxy: EventLoopProxy<StageEvent>, selector: String) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let proxy = proxy.clone();
            let on_scroll = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
                match scroll_sample(&selector) {
                    Some(sample) => {
                        let _ = proxy.send_event(StageEvent::Scrolled(sample));
                    }
                    None => log::debug!("Trigger {:?} not found", selector),
                }
            });
            if window
                .add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())
                .is_err()
            {
                log::warn!("Could not listen to scroll events");
            }
            on_scroll.forget();
        }

        {
            let proxy = proxy.clone();
            let on_resize = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
                let _ = proxy.send_event(StageEvent::HostResized);
            });
            if window
                .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
                .is_err()
            {
                log::warn!("Could not listen to resize events");
            }
            on_resize.forget();
        }

        if let Some(query) = media_query() {
            let on_change = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                if let Some(event) = event.dyn_ref::<web_sys::MediaQueryListEvent>() {
                    let _ = proxy.send_event(StageEvent::MotionPreferenceChanged(event.matches()));
                }
            });
            if query
                .add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())
                .is_err()
            {
                log::warn!("Could not watch {}", REDUCED_MOTION_QUERY);
            }
            on_change.forget();
        }
    }
}
