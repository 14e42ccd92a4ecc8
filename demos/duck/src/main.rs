use scroll_stage::{StageConfig, flow};

/// Scroll with the mouse wheel to bring the duck to the front of the stage.
/// Set `SCROLL_STAGE_REDUCED_MOTION=1` to keep it in its resting position.
fn main() -> anyhow::Result<()> {
    flow::run(StageConfig::from_env())
}
