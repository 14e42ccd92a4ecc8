//! Scene graph and hierarchical scene organization.
//!
//! Nodes live in an arena owned by [`SceneGraph`] and are addressed through
//! [`NodeId`] handles. A node is "attached" when following its parents ends
//! at the root; detached subtrees (e.g. asset containers that are still
//! waiting for their content) exist in the arena but are never drawn.

use std::{fmt, sync::Arc};

use log::warn;

use crate::data_structures::{
    instance::Instance,
    model::{MeshData, ModelData, ModelNodeData},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub local: Instance,
    pub meshes: Vec<Arc<MeshData>>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            local: Instance::new(),
            meshes: Vec::new(),
            cast_shadow: false,
            receive_shadow: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_drawable(&self) -> bool {
        !self.meshes.is_empty()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneGraphError {
    UnknownNode(NodeId),
    Cycle { parent: NodeId, child: NodeId },
}

impl fmt::Display for SceneGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "node {} does not exist", id.0),
            Self::Cycle { parent, child } => write!(
                f,
                "attaching node {} under {} would create a cycle",
                child.0, parent.0
            ),
        }
    }
}

impl std::error::Error for SceneGraphError {}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    root: NodeId,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![SceneNode::new("scene")],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Creates a detached group node.
    pub fn create_node(&mut self, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode::new(name));
        id
    }

    pub fn create_mesh_node(&mut self, name: &str, meshes: Vec<Arc<MeshData>>) -> NodeId {
        let id = self.create_node(name);
        self.nodes[id.0].meshes = meshes;
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Moves `child` under `parent`, detaching it from its previous parent.
    ///
    /// Re-adding a child to its current parent is a no-op.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneGraphError> {
        if self.node(parent).is_none() {
            return Err(SceneGraphError::UnknownNode(parent));
        }
        if self.node(child).is_none() {
            return Err(SceneGraphError::UnknownNode(child));
        }
        if child == self.root || self.is_ancestor(child, parent) {
            return Err(SceneGraphError::Cycle { parent, child });
        }
        if self.nodes[child.0].parent == Some(parent) {
            return Ok(());
        }
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// True when `ancestor` is `node` or lies on its parent chain.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.node(id).is_some() && self.is_ancestor(self.root, id)
    }

    /// Depth-first pre-order walk over `start` and its descendants.
    pub fn traverse(&self, start: NodeId, f: &mut dyn FnMut(NodeId, &SceneNode)) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            f(id, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    pub fn traverse_mut(&mut self, start: NodeId, f: &mut dyn FnMut(NodeId, &mut SceneNode)) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id.0) else {
                continue;
            };
            f(id, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Composes local transforms from the topmost ancestor down to `id`.
    pub fn world_transform(&self, id: NodeId) -> Option<Instance> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let node = self.node(c)?;
            chain.push(node.local);
            current = node.parent;
        }
        Some(
            chain
                .iter()
                .rev()
                .fold(Instance::new(), |acc, local| &acc * local),
        )
    }

    /// Visits every node reachable from the root with its world transform.
    pub fn visit_attached(&self, f: &mut dyn FnMut(NodeId, &SceneNode, &Instance)) {
        let mut stack = vec![(self.root, Instance::new())];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            let world = &parent_world * &node.local;
            f(id, node, &world);
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
    }

    /// Copies the hierarchy of `model` under `parent` and returns the ids of
    /// the grafted top-level nodes.
    pub fn graft(
        &mut self,
        parent: NodeId,
        model: &ModelData,
    ) -> Result<Vec<NodeId>, SceneGraphError> {
        if self.node(parent).is_none() {
            return Err(SceneGraphError::UnknownNode(parent));
        }
        let mut grafted = Vec::with_capacity(model.nodes.len());
        for node in &model.nodes {
            grafted.push(self.graft_node(parent, node)?);
        }
        if grafted.is_empty() {
            warn!("Model {} has no nodes in its scene", model.name);
        }
        Ok(grafted)
    }

    fn graft_node(
        &mut self,
        parent: NodeId,
        data: &ModelNodeData,
    ) -> Result<NodeId, SceneGraphError> {
        let id = self.create_mesh_node(&data.name, data.meshes.clone());
        self.nodes[id.0].local = data.transform;
        self.add_child(parent, id)?;
        for child in &data.children {
            self.graft_node(id, child)?;
        }
        Ok(id)
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
