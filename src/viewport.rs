//! Viewport sizing.
//!
//! [`resize`] is the single entry point that turns the host container's
//! current client size into a projection update and a render surface size.
//! It runs once at startup and again for every resize signal, without any
//! debouncing.

use crate::camera::Projection;

/// Upper bound for the device pixel ratio used for the backing resolution.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Container size in logical (CSS) pixels and the clamped pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl ViewportState {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio: clamp_pixel_ratio(pixel_ratio),
        }
    }

    /// Device pixel dimensions of the drawing buffer.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.pixel_ratio).floor() as u32,
            (self.height as f64 * self.pixel_ratio).floor() as u32,
        )
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(0, 0, 1.0)
    }
}

/// Read side of the element the stage is mounted in.
pub trait ViewportHost {
    /// Current content-box size in logical pixels.
    fn client_size(&self) -> (u32, u32);
    fn device_pixel_ratio(&self) -> f64;
}

/// Anything that owns a drawing buffer that follows the viewport.
pub trait RenderSurface {
    /// `width` and `height` are device pixels, `pixel_ratio` the factor
    /// already applied to the logical size.
    fn resize_surface(&mut self, width: u32, height: u32, pixel_ratio: f64);
}

pub fn clamp_pixel_ratio(ratio: f64) -> f64 {
    if !ratio.is_finite() || ratio <= 0.0 {
        return 1.0;
    }
    ratio.min(MAX_PIXEL_RATIO)
}

/// Measures the container and propagates the result to the projection and
/// the render surface.
pub fn resize(
    viewport: &mut ViewportState,
    projection: &mut Projection,
    surface: &mut dyn RenderSurface,
    host: &dyn ViewportHost,
) {
    let (width, height) = host.client_size();
    *viewport = ViewportState::new(width, height, host.device_pixel_ratio());

    if !projection.resize(width, height) {
        log::warn!(
            "Degenerate viewport {}x{}, keeping the previous projection",
            width,
            height
        );
    }

    let (backing_width, backing_height) = viewport.backing_size();
    log::debug!(
        "Viewport {}x{} @{} -> {}x{}",
        width,
        height,
        viewport.pixel_ratio,
        backing_width,
        backing_height
    );
    surface.resize_surface(backing_width, backing_height, viewport.pixel_ratio);
}
