//! The per-frame render loop.
//!
//! [`RenderLoop`] is an explicit controller: the host calls
//! [`RenderLoop::tick`] whenever the [`FrameClock`] it injected fires. Each
//! tick orients the camera, draws once, and asks the clock for the next
//! frame. Tests drive it with a manual clock.

use instant::{Duration, Instant};

use crate::scene::SceneContext;

/// Host frame scheduling primitive (`requestAnimationFrame`, winit redraws).
pub trait FrameClock {
    fn request_frame(&mut self);
}

pub trait Renderer {
    fn draw(&mut self, ctx: &SceneContext) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    frames: u64,
    last_frame: Option<Instant>,
    last_frame_time: Duration,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            frames: 0,
            last_frame: None,
            last_frame_time: Duration::ZERO,
        }
    }

    /// Schedules the first frame. Restarting a stopped loop is allowed.
    pub fn start(&mut self, clock: &mut dyn FrameClock) {
        if self.state == LoopState::Running {
            return;
        }
        self.state = LoopState::Running;
        clock.request_frame();
    }

    /// Frames already requested from the clock are ignored when they fire.
    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Ticks that issued a draw, including draws that failed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame_time(&self) -> Duration {
        self.last_frame_time
    }

    /// Runs one frame. Returns whether anything was drawn.
    pub fn tick(
        &mut self,
        ctx: &mut SceneContext,
        renderer: &mut dyn Renderer,
        clock: &mut dyn FrameClock,
    ) -> bool {
        if self.state != LoopState::Running {
            return false;
        }
        let now = Instant::now();
        if let Some(last) = self.last_frame {
            self.last_frame_time = now.duration_since(last);
        }
        self.last_frame = Some(now);

        ctx.camera.look_at_target();
        if let Err(e) = renderer.draw(ctx) {
            log::error!("Unable to render frame {}: {:#}", self.frames, e);
        }
        self.frames += 1;
        log::trace!("frame {} took {:?}", self.frames, self.last_frame_time);

        clock.request_frame();
        true
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}
