use futures::executor::block_on;
use scroll_stage::{
    SceneSession, StageConfig,
    animation::{AnimationError, AnimationStatus},
    config::{AssetSpec, DUCK_URL},
    host::VirtualScroll,
};
use winit::event::MouseScrollDelta;

use crate::common::test_utils::{
    FixedHost, ManualClock, RecordingRenderer, RecordingSurface, ScriptedSource, assert_close,
    page_sample, triangle_model,
};

mod common;

fn duck_source() -> ScriptedSource {
    ScriptedSource::new().with_model(DUCK_URL, triangle_model("duck"), 1)
}

fn duck_position(session: &SceneSession) -> cgmath::Vector3<f32> {
    let ctx = session.context();
    let duck = ctx.registry.get("duck").unwrap();
    ctx.graph.node(duck).unwrap().local.position
}

#[test]
fn should_bind_duck_after_loading() {
    let mut session = SceneSession::new(&StageConfig::default());
    assert_eq!(session.animation_status(), &AnimationStatus::Pending);

    block_on(session.load_all(&duck_source()));

    assert!(session.is_loaded());
    assert_eq!(session.animation_status(), &AnimationStatus::Bound(1));
    assert_close(duck_position(&session), [1.5, 0.0, -4.0]);

    session.scroll(page_sample(2000.0));
    assert_close(duck_position(&session), [0.0, 0.0, 0.0]);
}

#[test]
fn should_keep_duck_at_rest_with_reduced_motion() {
    let mut config = StageConfig::default();
    config.host.reduced_motion = Some(true);
    let mut session = SceneSession::new(&config);

    block_on(session.load_all(&duck_source()));
    session.scroll(page_sample(0.0));

    assert_eq!(session.animation_status(), &AnimationStatus::Suppressed);
    assert!(session.context().timelines.is_empty());
    assert_close(duck_position(&session), [0.0, 0.0, 0.0]);
}

#[test]
fn should_follow_runtime_motion_preference_changes() {
    let mut session = SceneSession::new(&StageConfig::default());
    block_on(session.load_all(&duck_source()));
    session.scroll(page_sample(1000.0));
    assert_close(duck_position(&session), [0.75, 0.0, -2.0]);

    session.set_reduced_motion(true);
    assert_eq!(session.animation_status(), &AnimationStatus::Suppressed);
    assert_close(duck_position(&session), [0.0, 0.0, 0.0]);
    session.scroll(page_sample(0.0));
    assert_close(duck_position(&session), [0.0, 0.0, 0.0]);

    session.set_reduced_motion(false);
    assert_eq!(session.animation_status(), &AnimationStatus::Bound(1));
    assert_close(duck_position(&session), [1.5, 0.0, -4.0]);
}

#[test]
fn should_apply_reduced_motion_set_before_loading_completes() {
    let mut session = SceneSession::new(&StageConfig::default());
    session.set_reduced_motion(true);

    block_on(session.load_all(&duck_source()));

    assert_eq!(session.animation_status(), &AnimationStatus::Suppressed);
}

#[test]
fn should_report_missing_asset_when_load_fails() {
    let mut session = SceneSession::new(&StageConfig::default());
    let source = ScriptedSource::new().with_failure(DUCK_URL, "connection refused", 0);

    block_on(session.load_all(&source));

    assert!(session.is_loaded());
    assert_eq!(session.loader().report().failed.len(), 1);
    assert_eq!(
        session.animation_status(),
        &AnimationStatus::Failed(AnimationError::MissingAssetReference {
            missing: vec!["duck".to_string()]
        })
    );
}

#[test]
fn should_complete_with_empty_worklist() {
    let mut config = StageConfig::default();
    config.assets.clear();
    config.bindings.clear();
    let mut session = SceneSession::new(&config);

    let pending = session.start_loading(&ScriptedSource::new());

    assert!(pending.is_empty());
    assert!(session.is_loaded());
    assert_eq!(session.animation_status(), &AnimationStatus::Bound(0));
}

#[test]
fn should_load_several_assets_concurrently() {
    let mut config = StageConfig::default();
    config.assets = vec![
        AssetSpec::new(DUCK_URL, "duck"),
        AssetSpec::new("swan.gltf", "swan"),
    ];
    let source = duck_source().with_model("swan.gltf", triangle_model("swan"), 0);
    let mut session = SceneSession::new(&config);

    block_on(session.load_all(&source));

    assert_eq!(session.context().registry.len(), 2);
    assert_eq!(session.loader().report().loaded, vec!["swan", "duck"]);
}

#[test]
fn should_resize_and_render_through_the_session() {
    let mut session = SceneSession::new(&StageConfig::default());
    let mut surface = RecordingSurface::default();
    let host = FixedHost {
        size: (1280, 720),
        pixel_ratio: 2.0,
    };
    session.resize(&host, &mut surface);
    assert_eq!(surface.calls, vec![(2560, 1440, 2.0)]);
    assert!((session.context().projection.aspect() - 1280.0 / 720.0).abs() < 1e-6);

    let mut clock = ManualClock::default();
    let mut renderer = RecordingRenderer::default();
    session.start_render_loop(&mut clock);
    assert!(session.frame(&mut renderer, &mut clock));
    session.stop_render_loop();
    assert!(!session.frame(&mut renderer, &mut clock));

    assert_eq!(renderer.views.len(), 1);
    assert_eq!(session.render_loop().frames(), 1);
}

#[test]
fn should_rescrub_bindings_when_the_viewport_height_changes() {
    let mut session = SceneSession::new(&StageConfig::default());
    block_on(session.load_all(&duck_source()));

    let mut page = VirtualScroll::new(3000.0, 1000.0);
    session.scroll(page.on_wheel(MouseScrollDelta::LineDelta(0.0, -25.0)));
    assert_eq!(page.scroll_y(), 1000.0);
    assert_close(duck_position(&session), [0.75, 0.0, -2.0]);

    // A shorter viewport stretches the trigger range to 0..2500.
    let mut surface = RecordingSurface::default();
    let host = FixedHost {
        size: (800, 500),
        pixel_ratio: 1.0,
    };
    session.resize(&host, &mut surface);
    page.set_viewport_height(500.0);
    session.scroll(page.sample());

    assert_close(duck_position(&session), [0.9, 0.0, -2.4]);
    assert_eq!(session.context().scroll, Some(page.sample()));
}
