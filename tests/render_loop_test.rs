use cgmath::{Matrix4, Point3, Vector3};
use scroll_stage::{
    config::SceneConfig,
    frame::{LoopState, RenderLoop},
    scene::build_scene,
};

use crate::common::test_utils::{ManualClock, RecordingRenderer};

mod common;

#[test]
fn should_request_first_frame_on_start() {
    let mut render_loop = RenderLoop::new();
    let mut clock = ManualClock::default();

    render_loop.start(&mut clock);
    render_loop.start(&mut clock);

    assert_eq!(render_loop.state(), LoopState::Running);
    assert_eq!(clock.requests, 1);
}

#[test]
fn should_draw_once_and_reschedule_per_tick() {
    let mut ctx = build_scene(&SceneConfig::default());
    let mut render_loop = RenderLoop::new();
    let mut clock = ManualClock::default();
    let mut renderer = RecordingRenderer::default();

    render_loop.start(&mut clock);
    for _ in 0..3 {
        assert!(render_loop.tick(&mut ctx, &mut renderer, &mut clock));
    }

    assert_eq!(renderer.views.len(), 3);
    assert_eq!(render_loop.frames(), 3);
    assert_eq!(clock.requests, 4);
}

#[test]
fn should_orient_camera_before_drawing() {
    let mut ctx = build_scene(&SceneConfig::default());
    let mut render_loop = RenderLoop::new();
    let mut clock = ManualClock::default();
    let mut renderer = RecordingRenderer::default();
    render_loop.start(&mut clock);

    ctx.camera.target = Point3::new(2.0, 0.0, 0.0);
    render_loop.tick(&mut ctx, &mut renderer, &mut clock);

    let expected = Matrix4::look_at_rh(
        ctx.camera.position,
        Point3::new(2.0, 0.0, 0.0),
        Vector3::unit_y(),
    );
    assert_eq!(renderer.views, vec![expected]);
}

#[test]
fn should_not_draw_when_idle_or_stopped() {
    let mut ctx = build_scene(&SceneConfig::default());
    let mut render_loop = RenderLoop::new();
    let mut clock = ManualClock::default();
    let mut renderer = RecordingRenderer::default();

    assert!(!render_loop.tick(&mut ctx, &mut renderer, &mut clock));

    render_loop.start(&mut clock);
    render_loop.tick(&mut ctx, &mut renderer, &mut clock);
    render_loop.stop();
    assert!(!render_loop.tick(&mut ctx, &mut renderer, &mut clock));

    assert_eq!(renderer.views.len(), 1);
    assert_eq!(clock.requests, 2);
    assert_eq!(render_loop.state(), LoopState::Stopped);
}

#[test]
fn should_keep_running_after_a_failed_draw() {
    let mut ctx = build_scene(&SceneConfig::default());
    let mut render_loop = RenderLoop::new();
    let mut clock = ManualClock::default();
    let mut renderer = RecordingRenderer {
        fail: true,
        ..Default::default()
    };

    render_loop.start(&mut clock);
    render_loop.tick(&mut ctx, &mut renderer, &mut clock);
    render_loop.tick(&mut ctx, &mut renderer, &mut clock);

    assert!(render_loop.is_running());
    assert_eq!(render_loop.frames(), 2);
    assert_eq!(clock.requests, 3);
}
