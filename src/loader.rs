//! Asynchronous asset loading with a single aggregate completion callback.
//!
//! An [`AssetLoader`] is built from a fixed worklist and the callback to run
//! once every request has settled. Each request gets a slot and a
//! [`Ticket`]; settling a ticket empties its slot, and the callback is taken
//! out of its `Option` the moment the last slot empties. There is no other
//! path to the callback, so it runs at most once and never early.
//!
//! Failed requests count as settled. They are logged and collected in the
//! [`LoadReport`] handed to the callback.
//!
//! Fetching happens elsewhere: [`AssetLoader::start`] hands out one
//! [`PendingLoad`] future per request for the host to poll, and the host
//! feeds each outcome back through [`AssetLoader::settle`] on the thread that
//! owns the [`SceneContext`].

use std::{collections::HashMap, fmt};

use futures::{StreamExt, stream::FuturesUnordered};

use crate::{
    data_structures::{model::ModelData, scene_graph::NodeId},
    scene::SceneContext,
};

/// Future resolving to a parsed model.
#[cfg(not(target_arch = "wasm32"))]
pub type ModelFuture = futures::future::BoxFuture<'static, anyhow::Result<ModelData>>;
#[cfg(target_arch = "wasm32")]
pub type ModelFuture = futures::future::LocalBoxFuture<'static, anyhow::Result<ModelData>>;

/// Where models come from.
pub trait ModelSource {
    fn load(&self, location: &str) -> ModelFuture;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub source: String,
    pub name: String,
    /// Group the loaded content is grafted under. Detached until the load
    /// succeeds.
    pub container: NodeId,
}

/// Logical name to container node. Entries are only ever added.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    entries: HashMap<String, NodeId>,
}

impl AssetRegistry {
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.entries.get(name).copied()
    }

    /// Returns `false` when the name is already taken; the first entry wins.
    pub fn insert(&mut self, name: &str, node: NodeId) -> bool {
        if self.entries.contains_key(name) {
            log::warn!("Asset {} is already registered, keeping the first one", name);
            return false;
        }
        self.entries.insert(name.to_string(), node);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[derive(Debug)]
pub struct AssetLoadFailure {
    pub name: String,
    pub source: String,
    pub error: anyhow::Error,
}

impl fmt::Display for AssetLoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to load asset {} from {}: {:#}",
            self.name, self.source, self.error
        )
    }
}

impl std::error::Error for AssetLoadFailure {}

#[derive(Debug, Default)]
pub struct LoadReport {
    /// Names in settle order.
    pub loaded: Vec<String>,
    pub failed: Vec<AssetLoadFailure>,
}

impl LoadReport {
    pub fn settled(&self) -> usize {
        self.loaded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Identifies one request of one loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(usize);

impl Ticket {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// An in-flight fetch for one ticket.
pub struct PendingLoad {
    pub ticket: Ticket,
    pub future: ModelFuture,
}

impl PendingLoad {
    pub async fn resolve(self) -> (Ticket, anyhow::Result<ModelData>) {
        let result = self.future.await;
        (self.ticket, result)
    }
}

impl fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLoad")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

pub type CompletionCallback = Box<dyn FnOnce(&mut SceneContext, &LoadReport)>;

pub struct AssetLoader {
    slots: Vec<Option<AssetRequest>>,
    outstanding: usize,
    started: bool,
    report: LoadReport,
    on_complete: Option<CompletionCallback>,
}

impl AssetLoader {
    pub fn new(
        worklist: Vec<AssetRequest>,
        on_complete: impl FnOnce(&mut SceneContext, &LoadReport) + 'static,
    ) -> Self {
        let outstanding = worklist.len();
        Self {
            slots: worklist.into_iter().map(Some).collect(),
            outstanding,
            started: false,
            report: LoadReport::default(),
            on_complete: Some(Box::new(on_complete)),
        }
    }

    /// Kicks off every request. An empty worklist completes right away.
    ///
    /// Calling this again returns nothing.
    pub fn start(&mut self, source: &dyn ModelSource, ctx: &mut SceneContext) -> Vec<PendingLoad> {
        if self.started {
            log::warn!("Asset loader was already started");
            return Vec::new();
        }
        self.started = true;
        let pending: Vec<PendingLoad> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|req| (idx, req)))
            .map(|(idx, request)| {
                log::info!("Loading asset {} from {}", request.name, request.source);
                PendingLoad {
                    ticket: Ticket(idx),
                    future: source.load(&request.source),
                }
            })
            .collect();
        self.complete_if_settled(ctx);
        pending
    }

    /// Applies the outcome of one request.
    pub fn settle(
        &mut self,
        ticket: Ticket,
        result: anyhow::Result<ModelData>,
        ctx: &mut SceneContext,
    ) {
        let Some(request) = self.slots.get_mut(ticket.0).and_then(Option::take) else {
            log::warn!("Ignoring outcome for unknown or settled ticket {:?}", ticket);
            return;
        };
        self.outstanding -= 1;

        match result.and_then(|model| attach(&request, &model, ctx)) {
            Ok(()) => {
                log::info!("Loaded asset {}", request.name);
                self.report.loaded.push(request.name);
            }
            Err(error) => {
                let failure = AssetLoadFailure {
                    name: request.name,
                    source: request.source,
                    error,
                };
                log::error!("{}", failure);
                self.report.failed.push(failure);
            }
        }
        self.complete_if_settled(ctx);
    }

    fn complete_if_settled(&mut self, ctx: &mut SceneContext) {
        if self.outstanding > 0 {
            return;
        }
        if let Some(on_complete) = self.on_complete.take() {
            log::info!(
                "All {} asset request(s) settled, {} failed",
                self.report.settled(),
                self.report.failed.len()
            );
            on_complete(ctx, &self.report);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.on_complete.is_none()
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Starts the loader and settles every request as its future resolves.
    pub async fn drive(&mut self, source: &dyn ModelSource, ctx: &mut SceneContext) {
        let mut in_flight: FuturesUnordered<_> = self
            .start(source, ctx)
            .into_iter()
            .map(PendingLoad::resolve)
            .collect();
        while let Some((ticket, result)) = in_flight.next().await {
            self.settle(ticket, result, ctx);
        }
    }
}

impl fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetLoader")
            .field("slots", &self.slots)
            .field("outstanding", &self.outstanding)
            .field("complete", &self.is_complete())
            .finish()
    }
}

/// Grafts a loaded model under its container and makes it visible.
fn attach(request: &AssetRequest, model: &ModelData, ctx: &mut SceneContext) -> anyhow::Result<()> {
    // Names are registered once; a later load under the same name stays detached.
    if ctx.registry.contains(&request.name) {
        anyhow::bail!("an asset named {} is already loaded", request.name);
    }
    ctx.graph.graft(request.container, model)?;
    ctx.graph.traverse_mut(request.container, &mut |_, node| {
        if node.is_drawable() {
            node.cast_shadow = true;
            node.receive_shadow = true;
        }
    });
    let root = ctx.graph.root();
    ctx.graph.add_child(root, request.container)?;
    ctx.registry.insert(&request.name, request.container);
    Ok(())
}
