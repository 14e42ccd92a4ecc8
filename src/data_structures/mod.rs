//! Stage data structures: transforms, CPU models, textures and the scene graph.
//!
//! - `instance` holds node transforms and their GPU layout
//! - `model` contains vertex, mesh and material definitions produced by the loaders
//! - `scene_graph` is the arena-backed node hierarchy every component mutates
//! - `texture` wraps GPU textures (depth, shadow map, base colour)

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
