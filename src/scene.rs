//! Static scene assembly and the session's explicit context.
//!
//! [`build_scene`] creates everything that does not depend on loaded
//! content: camera, lights, fog and the floor. The resulting
//! [`SceneContext`] is the one object every other component reads and
//! mutates.

use std::{f32::consts::FRAC_PI_2, sync::Arc};

use cgmath::{Deg, Matrix4, Point3, Quaternion, Rotation3, Vector3};

use crate::{
    animation::{AnimationStatus, MotionPreference, ScrollSample, ScrollTimelines},
    camera::{Camera, OPENGL_TO_WGPU_MATRIX, Projection},
    config::SceneConfig,
    data_structures::{
        model::{Material, MeshData, ModelVertex},
        scene_graph::{NodeId, SceneGraph},
    },
    loader::AssetRegistry,
    viewport::ViewportState,
};

/// Half extent of the sun's orthographic shadow camera.
const SHADOW_HALF_EXTENT: f32 = 5.0;
const SHADOW_NEAR: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub far: f32,
    pub map_size: u32,
    pub normal_bias: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub color: [f32; 3],
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow: ShadowSettings,
}

impl DirectionalLight {
    /// Clip-space transform of the shadow camera.
    pub fn view_proj(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y());
        let proj = cgmath::ortho(
            -SHADOW_HALF_EXTENT,
            SHADOW_HALF_EXTENT,
            -SHADOW_HALF_EXTENT,
            SHADOW_HALF_EXTENT,
            SHADOW_NEAR,
            self.shadow.far,
        );
        OPENGL_TO_WGPU_MATRIX * proj * view
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereLight {
    pub sky: [f32; 3],
    pub ground: [f32; 3],
    pub intensity: f32,
}

/// Lighting and post-processing parameters, colours in linear space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub background: [f32; 3],
    pub fog: Fog,
    pub sun: DirectionalLight,
    pub hemisphere: HemisphereLight,
    pub exposure: f32,
}

impl From<&SceneConfig> for Environment {
    fn from(config: &SceneConfig) -> Self {
        let background = config.background.to_linear();
        Self {
            background,
            fog: Fog {
                color: background,
                near: config.fog_near,
                far: config.fog_far,
            },
            sun: DirectionalLight {
                position: config.sun.position.into(),
                target: Point3::new(0.0, 0.0, 0.0),
                color: config.sun.color.to_linear(),
                intensity: config.sun.intensity,
                cast_shadow: config.sun.cast_shadow,
                shadow: ShadowSettings {
                    far: config.sun.shadow_far,
                    map_size: config.sun.shadow_map_size,
                    normal_bias: config.sun.shadow_normal_bias,
                },
            },
            hemisphere: HemisphereLight {
                sky: config.hemisphere.sky.to_linear(),
                ground: config.hemisphere.ground.to_linear(),
                intensity: config.hemisphere.intensity,
            },
            exposure: config.exposure,
        }
    }
}

/// Everything one stage owns.
#[derive(Debug)]
pub struct SceneContext {
    pub graph: SceneGraph,
    pub registry: AssetRegistry,
    pub camera: Camera,
    pub projection: Projection,
    pub viewport: ViewportState,
    pub environment: Environment,
    pub timelines: ScrollTimelines,
    pub motion: MotionPreference,
    /// Latest scroll reading, if any arrived yet.
    pub scroll: Option<ScrollSample>,
    pub animation: AnimationStatus,
    pub floor: NodeId,
}

impl SceneContext {
    /// Stores the sample and scrubs every active binding to it.
    pub fn apply_scroll(&mut self, sample: ScrollSample) {
        self.scroll = Some(sample);
        self.timelines.scrub(&sample, &mut self.graph);
    }
}

pub fn build_scene(config: &SceneConfig) -> SceneContext {
    let camera = Camera::new(config.camera.position, config.camera.target);
    let projection = Projection::new(
        1,
        1,
        Deg(config.camera.fovy_degrees),
        config.camera.znear,
        config.camera.zfar,
    );

    let mut graph = SceneGraph::new();
    let floor_material = Material::solid("floor", with_alpha(config.floor.color.to_linear()));
    let floor_mesh = plane_mesh("floor", config.floor.size, config.floor.size, floor_material);
    let floor = graph.create_mesh_node("floor", vec![Arc::new(floor_mesh)]);
    if let Some(node) = graph.node_mut(floor) {
        node.receive_shadow = true;
        node.local.rotation = Quaternion::from_angle_x(cgmath::Rad(-FRAC_PI_2));
    }
    let root = graph.root();
    if let Err(e) = graph.add_child(root, floor) {
        log::error!("Could not attach the floor: {}", e);
    }

    SceneContext {
        graph,
        registry: AssetRegistry::default(),
        camera,
        projection,
        viewport: ViewportState::default(),
        environment: Environment::from(config),
        timelines: ScrollTimelines::default(),
        motion: MotionPreference::default(),
        scroll: None,
        animation: AnimationStatus::Pending,
        floor,
    }
}

fn with_alpha(rgb: [f32; 3]) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], 1.0]
}

/// A `width` x `height` quad in the XY plane facing +Z.
pub fn plane_mesh(name: &str, width: f32, height: f32, material: Material) -> MeshData {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let vertex = |x: f32, y: f32, u: f32, v: f32| ModelVertex {
        position: [x, y, 0.0],
        tex_coords: [u, v],
        normal: [0.0, 0.0, 1.0],
    };
    MeshData {
        name: name.to_string(),
        vertices: vec![
            vertex(-hw, hh, 0.0, 0.0),
            vertex(hw, hh, 1.0, 0.0),
            vertex(-hw, -hh, 0.0, 1.0),
            vertex(hw, -hh, 1.0, 1.0),
        ],
        indices: vec![0, 2, 1, 2, 3, 1],
        material: Arc::new(material),
    }
}
