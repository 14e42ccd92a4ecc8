//! Render pipelines and the bind groups they read.

pub mod basic;
pub mod light;
pub mod shadow;
