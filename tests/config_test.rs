use std::collections::HashMap;

use scroll_stage::{
    StageConfig,
    config::{ASSET_ROOT_ENV, REDUCED_MOTION_ENV, Rgb, SceneConfig},
    scene::{Environment, build_scene},
};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn should_default_to_the_duck_stage() {
    let config = StageConfig::default();

    assert_eq!(config.assets.len(), 1);
    assert_eq!(config.assets[0].name, "duck");
    assert_eq!(config.bindings[0].asset, "duck");
    assert_eq!(config.bindings[0].offset, [1.5, 0.0, -4.0]);
    assert_eq!(config.bindings[0].target, [0.0, 0.0, 0.0]);
    assert_eq!(config.host.reduced_motion, None);
    assert_eq!(config.host.container_id, "canvas-container");
}

#[test]
fn should_apply_environment_overrides() {
    let mut config = StageConfig::default();
    config.apply_env(lookup(&[
        (ASSET_ROOT_ENV, "/srv/models"),
        (REDUCED_MOTION_ENV, "1"),
    ]));
    assert_eq!(config.host.assets_root, "/srv/models");
    assert_eq!(config.host.reduced_motion, Some(true));

    config.apply_env(lookup(&[(REDUCED_MOTION_ENV, "false")]));
    assert_eq!(config.host.reduced_motion, Some(false));
}

#[test]
fn should_ignore_unrecognized_or_empty_values() {
    let mut config = StageConfig::default();
    let root = config.host.assets_root.clone();
    config.apply_env(lookup(&[(ASSET_ROOT_ENV, ""), (REDUCED_MOTION_ENV, "maybe")]));

    assert_eq!(config.host.assets_root, root);
    assert_eq!(config.host.reduced_motion, None);
}

#[test]
fn should_convert_colours_to_linear() {
    assert_eq!(Rgb(0xffffff).to_linear(), [1.0, 1.0, 1.0]);
    assert_eq!(Rgb(0x000000).to_linear(), [0.0, 0.0, 0.0]);
    let [r, g, b] = Rgb(0x88ff88).to_linear();
    assert!((r - 0.2462).abs() < 1e-3);
    assert_eq!(g, 1.0);
    assert_eq!(r, b);
}

#[test]
fn should_build_static_scene() {
    let config = SceneConfig::default();
    let ctx = build_scene(&config);

    assert!(ctx.graph.is_attached(ctx.floor));
    let floor = ctx.graph.node(ctx.floor).unwrap();
    assert!(floor.receive_shadow);
    assert!(!floor.cast_shadow);
    assert!(ctx.registry.is_empty());
    assert_eq!(ctx.camera.position, cgmath::Point3::new(0.0, 1.0, 5.0));
    assert_eq!(ctx.camera.target, cgmath::Point3::new(0.0, 1.0, 0.0));

    let environment = Environment::from(&config);
    assert_eq!(environment.fog.near, 15.0);
    assert_eq!(environment.fog.far, 20.0);
    assert_eq!(environment.fog.color, environment.background);
    assert!(environment.sun.cast_shadow);
    assert_eq!(environment.sun.shadow.map_size, 1024);
}

#[test]
fn should_lay_floor_flat() {
    let ctx = build_scene(&SceneConfig::default());
    let world = ctx.graph.world_transform(ctx.floor).unwrap();
    let normal = world.rotation * cgmath::Vector3::unit_z();

    assert!((normal.y - 1.0).abs() < 1e-5);
}
