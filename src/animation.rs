//! Scroll-scrubbed position animation.
//!
//! A [`ScrollTrigger`] maps the page scroll offset to a progress in `[0, 1]`
//! between a start and an end [`TriggerPoint`]. A [`ScrollBinding`] turns that
//! progress into the position of one loaded asset. Bindings are scrubbed: the
//! position is recomputed from the latest [`ScrollSample`] every time one
//! arrives, so it never depends on elapsed time.
//!
//! [`AnimationBinder`] creates the bindings once the asset loader reports
//! completion, unless the reduced-motion preference is active.

use std::{fmt, str::FromStr};

use cgmath::Vector3;

use crate::{
    data_structures::scene_graph::{NodeId, SceneGraph},
    scene::SceneContext,
};

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// The binder references names the registry does not contain.
    MissingAssetReference { missing: Vec<String> },
    InvalidTrigger(String),
    InvalidEase(String),
}

impl fmt::Display for AnimationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAssetReference { missing } => write!(
                f,
                "scroll binding references assets that were never loaded: {}",
                missing.join(", ")
            ),
            Self::InvalidTrigger(s) => write!(f, "invalid trigger point {s:?}"),
            Self::InvalidEase(s) => write!(f, "unknown ease {s:?}"),
        }
    }
}

impl std::error::Error for AnimationError {}

/// Easing curves, named after their GSAP counterparts when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::QuadIn => t * t,
            Ease::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

impl FromStr for Ease {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" | "linear" => Ok(Ease::Linear),
            "power1.in" => Ok(Ease::QuadIn),
            "power1.out" | "power1" => Ok(Ease::QuadOut),
            "power1.inOut" => Ok(Ease::QuadInOut),
            "power2.out" | "power2" => Ok(Ease::CubicOut),
            other => Err(AnimationError::InvalidEase(other.to_string())),
        }
    }
}

/// A horizontal line on either the trigger element or the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    /// Fraction of the height measured from the top, parsed from `"25%"`.
    Percent(f32),
}

impl Edge {
    pub fn fraction(self) -> f32 {
        match self {
            Edge::Top => 0.0,
            Edge::Center => 0.5,
            Edge::Bottom => 1.0,
            Edge::Percent(p) => p / 100.0,
        }
    }
}

impl FromStr for Edge {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Edge::Top),
            "center" => Ok(Edge::Center),
            "bottom" => Ok(Edge::Bottom),
            _ => s
                .strip_suffix('%')
                .and_then(|p| p.parse::<f32>().ok())
                .filter(|p| p.is_finite())
                .map(Edge::Percent)
                .ok_or_else(|| AnimationError::InvalidTrigger(s.to_string())),
        }
    }
}

/// "When `element` edge of the trigger meets `viewport` edge of the screen".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerPoint {
    pub element: Edge,
    pub viewport: Edge,
}

impl TriggerPoint {
    pub const fn new(element: Edge, viewport: Edge) -> Self {
        Self { element, viewport }
    }

    /// Scroll offset at which the two edges line up.
    pub fn scroll_offset(&self, layout: &TriggerLayout) -> f32 {
        layout.element_top + self.element.fraction() * layout.element_height
            - self.viewport.fraction() * layout.viewport_height
    }
}

impl FromStr for TriggerPoint {
    type Err = AnimationError;

    /// Parses `"<element edge> <viewport edge>"`, e.g. `"top top"`. A single
    /// word uses the same edge for both.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let element = parts
            .next()
            .ok_or_else(|| AnimationError::InvalidTrigger(s.to_string()))?
            .parse::<Edge>()?;
        let viewport = match parts.next() {
            Some(p) => p.parse::<Edge>()?,
            None => element,
        };
        if parts.next().is_some() {
            return Err(AnimationError::InvalidTrigger(s.to_string()));
        }
        Ok(Self { element, viewport })
    }
}

/// Trigger element geometry in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerLayout {
    pub element_top: f32,
    pub element_height: f32,
    pub viewport_height: f32,
}

/// One reading of the scroll signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub scroll_y: f32,
    pub layout: TriggerLayout,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTrigger {
    pub start: TriggerPoint,
    pub end: TriggerPoint,
}

impl ScrollTrigger {
    pub fn new(start: &str, end: &str) -> Result<Self, AnimationError> {
        Ok(Self {
            start: start.parse()?,
            end: end.parse()?,
        })
    }

    pub fn range(&self, layout: &TriggerLayout) -> (f32, f32) {
        (
            self.start.scroll_offset(layout),
            self.end.scroll_offset(layout),
        )
    }

    /// Normalized progress of `sample` through the trigger range.
    ///
    /// An empty or inverted range behaves like a step at its start.
    pub fn progress(&self, sample: &ScrollSample) -> f32 {
        let (start, end) = self.range(&sample.layout);
        if end <= start {
            return if sample.scroll_y >= start { 1.0 } else { 0.0 };
        }
        ((sample.scroll_y - start) / (end - start)).clamp(0.0, 1.0)
    }
}

impl Default for ScrollTrigger {
    /// From "element top at viewport top" to "element bottom at viewport bottom".
    fn default() -> Self {
        Self {
            start: TriggerPoint::new(Edge::Top, Edge::Top),
            end: TriggerPoint::new(Edge::Bottom, Edge::Bottom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionTween {
    pub from: Vector3<f32>,
    pub to: Vector3<f32>,
    pub ease: Ease,
}

impl PositionTween {
    pub fn at(&self, progress: f32) -> Vector3<f32> {
        let t = self.ease.apply(progress);
        self.from + (self.to - self.from) * t
    }
}

/// A registered scroll-to-position mapping for one asset.
#[derive(Debug, Clone)]
pub struct ScrollBinding {
    pub asset: String,
    pub node: NodeId,
    pub tween: PositionTween,
    pub trigger: ScrollTrigger,
    /// Position the node had before the binder touched it.
    pub restore: Vector3<f32>,
}

impl ScrollBinding {
    pub fn apply(&self, sample: &ScrollSample, graph: &mut SceneGraph) {
        let progress = self.trigger.progress(sample);
        if let Some(node) = graph.node_mut(self.node) {
            node.local.position = self.tween.at(progress);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScrollTimelines {
    bindings: Vec<ScrollBinding>,
}

impl ScrollTimelines {
    pub fn register(&mut self, binding: ScrollBinding) {
        self.bindings.push(binding);
    }

    pub fn scrub(&self, sample: &ScrollSample, graph: &mut SceneGraph) {
        for binding in &self.bindings {
            binding.apply(sample, graph);
        }
    }

    /// Drops every binding and puts the bound nodes back where they were.
    pub fn revert(&mut self, graph: &mut SceneGraph) {
        for binding in self.bindings.drain(..).rev() {
            if let Some(node) = graph.node_mut(binding.node) {
                node.local.position = binding.restore;
            }
        }
    }

    pub fn bindings(&self) -> &[ScrollBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// The `prefers-reduced-motion` media feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionPreference {
    #[default]
    NoPreference,
    Reduce,
}

impl MotionPreference {
    pub fn from_reduce(reduce: bool) -> Self {
        if reduce {
            Self::Reduce
        } else {
            Self::NoPreference
        }
    }

    pub fn is_reduced(self) -> bool {
        self == Self::Reduce
    }
}

/// Declarative description of one scroll binding.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSpec {
    /// Logical asset name as registered by the loader.
    pub asset: String,
    /// Position set when the binding is created; progress 0 maps here.
    pub offset: [f32; 3],
    /// Position at progress 1.
    pub target: [f32; 3],
    pub trigger: ScrollTrigger,
    pub ease: Ease,
}

impl BindingSpec {
    pub fn new(asset: &str, offset: [f32; 3]) -> Self {
        Self {
            asset: asset.to_string(),
            offset,
            target: [0.0; 3],
            trigger: ScrollTrigger::default(),
            ease: Ease::Linear,
        }
    }

    pub fn with_trigger(mut self, trigger: ScrollTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnimationStatus {
    /// The loader has not completed yet.
    #[default]
    Pending,
    Bound(usize),
    Suppressed,
    Failed(AnimationError),
}

/// Attaches [`ScrollBinding`]s to loaded assets.
#[derive(Debug, Clone, Default)]
pub struct AnimationBinder {
    specs: Vec<BindingSpec>,
}

impl AnimationBinder {
    pub fn new(specs: Vec<BindingSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[BindingSpec] {
        &self.specs
    }

    /// Registers every binding or none of them.
    ///
    /// Does nothing while reduced motion is preferred. Existing bindings are
    /// left alone, so calling this twice does not double-register.
    pub fn bind(&self, ctx: &mut SceneContext) -> Result<usize, AnimationError> {
        if ctx.motion.is_reduced() {
            log::info!("Reduced motion preferred, skipping scroll animations");
            ctx.animation = AnimationStatus::Suppressed;
            return Ok(0);
        }
        if !ctx.timelines.is_empty() {
            return Ok(ctx.timelines.len());
        }

        let missing: Vec<String> = self
            .specs
            .iter()
            .filter(|spec| ctx.registry.get(&spec.asset).is_none())
            .map(|spec| spec.asset.clone())
            .collect();
        if !missing.is_empty() {
            let err = AnimationError::MissingAssetReference { missing };
            ctx.animation = AnimationStatus::Failed(err.clone());
            return Err(err);
        }

        for spec in &self.specs {
            let Some(node_id) = ctx.registry.get(&spec.asset) else {
                continue;
            };
            let Some(node) = ctx.graph.node_mut(node_id) else {
                continue;
            };
            let restore = node.local.position;
            node.local.position = spec.offset.into();
            ctx.timelines.register(ScrollBinding {
                asset: spec.asset.clone(),
                node: node_id,
                tween: PositionTween {
                    from: spec.offset.into(),
                    to: spec.target.into(),
                    ease: spec.ease,
                },
                trigger: spec.trigger,
                restore,
            });
        }

        if let Some(sample) = ctx.scroll {
            ctx.timelines.scrub(&sample, &mut ctx.graph);
        }
        let bound = ctx.timelines.len();
        log::info!("Bound {} scroll animation(s)", bound);
        ctx.animation = AnimationStatus::Bound(bound);
        Ok(bound)
    }
}
