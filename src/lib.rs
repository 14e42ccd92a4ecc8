//! scroll-stage
//!
//! A single-page 3D stage whose content moves with the page scroll. The
//! crate loads glTF (and OBJ) models into a scene graph, binds their
//! positions to scrubbed scroll timelines unless the user prefers reduced
//! motion, and renders the result every frame with wgpu on native targets
//! and in the browser.
//!
//! High-level modules
//! - `viewport`: sizes the projection and drawing buffer from the container
//! - `scene`: static scene assembly and the [`scene::SceneContext`]
//! - `loader`: concurrent asset loading with one aggregate completion
//! - `animation`: scroll triggers, eases and the animation binder
//! - `frame`: the render loop and its injectable frame clock
//! - `session`: the controller tying the above together
//! - `flow`: the winit event loop hosting a session on a window or canvas
//! - `context`, `render`, `pipelines`: the wgpu side
//!

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod frame;
pub mod host;
pub mod loader;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod session;
pub mod viewport;

// Re-exports commonly used types for convenience in downstream code.
pub use config::StageConfig;
pub use session::SceneSession;
pub use cgmath::{Point3, Vector3};
