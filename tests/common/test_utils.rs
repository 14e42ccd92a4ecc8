#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use cgmath::{InnerSpace, Matrix4, Vector3};
use scroll_stage::{
    animation::{ScrollSample, TriggerLayout},
    data_structures::{
        instance::Instance,
        model::{Material, MeshData, ModelData, ModelNodeData, ModelVertex},
    },
    frame::{FrameClock, Renderer},
    loader::{ModelFuture, ModelSource},
    scene::SceneContext,
    viewport::{RenderSurface, ViewportHost},
};

/// Resolves after being polled `remaining + 1` times, waking itself each
/// time it yields so executors keep polling.
pub(crate) struct YieldFor {
    remaining: usize,
}

impl Future for YieldFor {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

pub(crate) fn yield_for(polls: usize) -> YieldFor {
    YieldFor { remaining: polls }
}

#[derive(Clone)]
enum Outcome {
    Model(ModelData),
    Fail(String),
}

/// A [`ModelSource`] answering from a fixed script. Each location can be
/// delayed by a number of polls to force a completion order.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    outcomes: HashMap<String, (Outcome, usize)>,
    requests: RefCell<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, location: &str, model: ModelData, delay: usize) -> Self {
        self.outcomes
            .insert(location.to_string(), (Outcome::Model(model), delay));
        self
    }

    pub fn with_failure(mut self, location: &str, message: &str, delay: usize) -> Self {
        self.outcomes
            .insert(location.to_string(), (Outcome::Fail(message.to_string()), delay));
        self
    }

    /// Locations in the order `load` was called.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ModelSource for ScriptedSource {
    fn load(&self, location: &str) -> ModelFuture {
        self.requests.borrow_mut().push(location.to_string());
        let scripted = self.outcomes.get(location).cloned();
        let location = location.to_string();
        Box::pin(async move {
            match scripted {
                Some((outcome, delay)) => {
                    yield_for(delay).await;
                    match outcome {
                        Outcome::Model(model) => Ok(model),
                        Outcome::Fail(message) => Err(anyhow::anyhow!(message)),
                    }
                }
                None => Err(anyhow::anyhow!("no such asset: {}", location)),
            }
        })
    }
}

/// A single triangle in the XY plane.
pub(crate) fn triangle_mesh(name: &str) -> MeshData {
    let vertex = |position: [f32; 3]| ModelVertex {
        position,
        tex_coords: [0.0, 0.0],
        normal: [0.0, 0.0, 1.0],
    };
    MeshData {
        name: name.to_string(),
        vertices: vec![
            vertex([0.0, 0.0, 0.0]),
            vertex([1.0, 0.0, 0.0]),
            vertex([0.0, 1.0, 0.0]),
        ],
        indices: vec![0, 1, 2],
        material: Arc::new(Material::default()),
    }
}

/// A model with an empty root node holding one triangle child.
pub(crate) fn triangle_model(name: &str) -> ModelData {
    ModelData {
        name: name.to_string(),
        nodes: vec![ModelNodeData {
            name: format!("{name}-root"),
            transform: Instance::new(),
            meshes: Vec::new(),
            children: vec![ModelNodeData {
                name: format!("{name}-mesh"),
                transform: Instance::from(Vector3::new(0.0, 0.5, 0.0)),
                meshes: vec![Arc::new(triangle_mesh(name))],
                children: Vec::new(),
            }],
        }],
    }
}

/// Trigger spanning the whole page: 3000px tall, viewed through a 1000px
/// viewport, so the default trigger runs from 0 to 2000.
pub(crate) fn page_sample(scroll_y: f32) -> ScrollSample {
    ScrollSample {
        scroll_y,
        layout: TriggerLayout {
            element_top: 0.0,
            element_height: 3000.0,
            viewport_height: 1000.0,
        },
    }
}

pub(crate) fn assert_close(actual: Vector3<f32>, expected: [f32; 3]) {
    let expected = Vector3::from(expected);
    assert!(
        (actual - expected).magnitude() < 1e-4,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

#[derive(Debug, Default)]
pub(crate) struct ManualClock {
    pub requests: usize,
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) {
        self.requests += 1;
    }
}

/// Records what the camera looked like at every draw.
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    pub views: Vec<Matrix4<f32>>,
    pub fail: bool,
}

impl Renderer for RecordingRenderer {
    fn draw(&mut self, ctx: &SceneContext) -> anyhow::Result<()> {
        self.views.push(ctx.camera.view_matrix());
        if self.fail {
            anyhow::bail!("device lost");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedHost {
    pub size: (u32, u32),
    pub pixel_ratio: f64,
}

impl ViewportHost for FixedHost {
    fn client_size(&self) -> (u32, u32) {
        self.size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    pub calls: Vec<(u32, u32, f64)>,
}

impl RenderSurface for RecordingSurface {
    fn resize_surface(&mut self, width: u32, height: u32, pixel_ratio: f64) {
        self.calls.push((width, height, pixel_ratio));
    }
}
