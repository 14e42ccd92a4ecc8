use futures::executor::block_on;
use scroll_stage::{
    animation::{
        AnimationBinder, AnimationError, AnimationStatus, BindingSpec, Ease, Edge,
        MotionPreference, ScrollSample, ScrollTrigger, TriggerLayout, TriggerPoint,
    },
    config::SceneConfig,
    loader::{AssetLoader, AssetRequest},
    scene::{SceneContext, build_scene},
};

use crate::common::test_utils::{ScriptedSource, assert_close, page_sample, triangle_model};

mod common;

/// A context with a loaded `duck` registered under the root.
fn loaded_context() -> SceneContext {
    let mut ctx = build_scene(&SceneConfig::default());
    let container = ctx.graph.create_node("duck");
    let mut loader = AssetLoader::new(
        vec![AssetRequest {
            source: "duck.gltf".to_string(),
            name: "duck".to_string(),
            container,
        }],
        |_, _| {},
    );
    let source = ScriptedSource::new().with_model("duck.gltf", triangle_model("duck"), 0);
    block_on(loader.drive(&source, &mut ctx));
    ctx
}

fn duck_position(ctx: &SceneContext) -> cgmath::Vector3<f32> {
    let duck = ctx.registry.get("duck").unwrap();
    ctx.graph.node(duck).unwrap().local.position
}

fn binder() -> AnimationBinder {
    AnimationBinder::new(vec![BindingSpec::new("duck", [1.5, 0.0, -4.0])])
}

#[test]
fn should_interpolate_from_offset_to_origin() {
    let mut ctx = loaded_context();
    assert_eq!(binder().bind(&mut ctx), Ok(1));
    assert_eq!(ctx.animation, AnimationStatus::Bound(1));
    assert_close(duck_position(&ctx), [1.5, 0.0, -4.0]);

    ctx.apply_scroll(page_sample(0.0));
    assert_close(duck_position(&ctx), [1.5, 0.0, -4.0]);

    ctx.apply_scroll(page_sample(1000.0));
    assert_close(duck_position(&ctx), [0.75, 0.0, -2.0]);

    ctx.apply_scroll(page_sample(2000.0));
    assert_close(duck_position(&ctx), [0.0, 0.0, 0.0]);
}

#[test]
fn should_clamp_outside_the_trigger_range() {
    let mut ctx = loaded_context();
    binder().bind(&mut ctx).unwrap();

    ctx.apply_scroll(page_sample(-300.0));
    assert_close(duck_position(&ctx), [1.5, 0.0, -4.0]);

    ctx.apply_scroll(page_sample(2600.0));
    assert_close(duck_position(&ctx), [0.0, 0.0, 0.0]);
}

#[test]
fn should_follow_scroll_backwards() {
    let mut ctx = loaded_context();
    binder().bind(&mut ctx).unwrap();

    ctx.apply_scroll(page_sample(2000.0));
    ctx.apply_scroll(page_sample(500.0));
    assert_close(duck_position(&ctx), [1.125, 0.0, -3.0]);
}

#[test]
fn should_scrub_to_the_scroll_seen_before_binding() {
    let mut ctx = loaded_context();
    ctx.apply_scroll(page_sample(1000.0));

    binder().bind(&mut ctx).unwrap();

    assert_close(duck_position(&ctx), [0.75, 0.0, -2.0]);
}

#[test]
fn should_not_register_when_motion_is_reduced() {
    let mut ctx = loaded_context();
    ctx.motion = MotionPreference::Reduce;

    assert_eq!(binder().bind(&mut ctx), Ok(0));
    assert_eq!(ctx.animation, AnimationStatus::Suppressed);
    assert!(ctx.timelines.is_empty());

    ctx.apply_scroll(page_sample(1000.0));
    assert_close(duck_position(&ctx), [0.0, 0.0, 0.0]);
}

#[test]
fn should_fail_on_missing_asset_without_partial_bindings() {
    let mut ctx = loaded_context();
    let binder = AnimationBinder::new(vec![
        BindingSpec::new("duck", [1.5, 0.0, -4.0]),
        BindingSpec::new("swan", [0.0, 1.0, 0.0]),
    ]);

    let err = binder.bind(&mut ctx).unwrap_err();

    assert_eq!(
        err,
        AnimationError::MissingAssetReference {
            missing: vec!["swan".to_string()]
        }
    );
    assert!(err.to_string().contains("swan"));
    assert!(ctx.timelines.is_empty());
    assert_eq!(ctx.animation, AnimationStatus::Failed(err));
    assert_close(duck_position(&ctx), [0.0, 0.0, 0.0]);
}

#[test]
fn should_not_register_twice() {
    let mut ctx = loaded_context();
    binder().bind(&mut ctx).unwrap();
    binder().bind(&mut ctx).unwrap();

    assert_eq!(ctx.timelines.len(), 1);
}

#[test]
fn should_restore_positions_on_revert() {
    let mut ctx = loaded_context();
    binder().bind(&mut ctx).unwrap();
    ctx.apply_scroll(page_sample(500.0));

    ctx.timelines.revert(&mut ctx.graph);

    assert!(ctx.timelines.is_empty());
    assert_close(duck_position(&ctx), [0.0, 0.0, 0.0]);
}

#[test]
fn should_apply_custom_trigger_and_ease() {
    let mut ctx = loaded_context();
    let trigger = ScrollTrigger::new("top bottom", "center center").unwrap();
    let binder = AnimationBinder::new(vec![
        BindingSpec::new("duck", [0.0, 2.0, 0.0])
            .with_trigger(trigger)
            .with_ease(Ease::QuadIn),
    ]);
    binder.bind(&mut ctx).unwrap();

    // top bottom: 0 + 0 - 1000 = -1000, center center: 1500 - 500 = 1000
    let sample = page_sample(0.0);
    assert_eq!(trigger.range(&sample.layout), (-1000.0, 1000.0));
    ctx.apply_scroll(sample);
    assert_close(duck_position(&ctx), [0.0, 1.5, 0.0]);
}

#[test]
fn should_parse_trigger_points() {
    assert_eq!(
        "top top".parse::<TriggerPoint>(),
        Ok(TriggerPoint::new(Edge::Top, Edge::Top))
    );
    assert_eq!(
        "bottom".parse::<TriggerPoint>(),
        Ok(TriggerPoint::new(Edge::Bottom, Edge::Bottom))
    );
    assert_eq!(
        "25% center".parse::<TriggerPoint>(),
        Ok(TriggerPoint::new(Edge::Percent(25.0), Edge::Center))
    );
    assert!("middle top".parse::<TriggerPoint>().is_err());
    assert!("top top top".parse::<TriggerPoint>().is_err());
    assert!("".parse::<TriggerPoint>().is_err());
}

#[test]
fn should_step_on_empty_ranges() {
    let trigger = ScrollTrigger::new("top top", "top top").unwrap();
    let layout = TriggerLayout {
        element_top: 100.0,
        element_height: 0.0,
        viewport_height: 800.0,
    };
    let at = |scroll_y| trigger.progress(&ScrollSample { scroll_y, layout });

    assert_eq!(at(99.0), 0.0);
    assert_eq!(at(100.0), 1.0);
}

#[test]
fn should_parse_and_apply_eases() {
    assert_eq!("none".parse::<Ease>(), Ok(Ease::Linear));
    assert_eq!("power1.inOut".parse::<Ease>(), Ok(Ease::QuadInOut));
    assert_eq!(
        "bounce".parse::<Ease>(),
        Err(AnimationError::InvalidEase("bounce".to_string()))
    );

    for ease in [
        Ease::Linear,
        Ease::QuadIn,
        Ease::QuadOut,
        Ease::QuadInOut,
        Ease::CubicOut,
    ] {
        assert_eq!(ease.apply(0.0), 0.0);
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-6);
    }
    assert_eq!(Ease::QuadIn.apply(0.5), 0.25);
    assert_eq!(Ease::QuadOut.apply(0.5), 0.75);
    assert_eq!(Ease::Linear.apply(2.0), 1.0);
}
