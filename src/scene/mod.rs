//! The scene graph: a tree of nodes positioning meshes and lights in the world.
//!
//! Nodes live in an arena owned by the [`SceneGraph`] and refer to each other by [`NodeId`].
//! A node owns its subtree: [`SceneGraph::remove`] destroys all descendants with it. The
//! parent link is just an id, so there are no reference cycles to leak.
//!
//! World transforms are not cached. They are composed from the root-to-node path whenever
//! they are asked for, so a query always reflects the latest transform of every ancestor.
//!
//! ```rust
//! use teng3d::math::Vec3;
//! use teng3d::scene::{SceneGraph, node::SceneNode};
//!
//! let mut scene = SceneGraph::new();
//! let arm = scene.spawn(scene.root(), SceneNode::new("arm").with_position(Vec3::new(1.0, 0.0, 0.0))).unwrap();
//! let hand = scene.spawn(arm, SceneNode::new("hand").with_position(Vec3::new(0.0, 1.0, 0.0))).unwrap();
//!
//! let world = scene.world_transform(hand).unwrap();
//! assert!(world.transform_point(Vec3::ZERO).unwrap().approx_eq(Vec3::new(1.0, 1.0, 0.0), 1e-12));
//! ```

pub mod camera;
pub mod mesh;
pub mod node;
pub mod shapes;

use crate::error::{Error, Result};
use crate::math::Mat4;
use crate::scene::node::SceneNode;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// Identifies a node within its [`SceneGraph`]. Ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    root: NodeId,
    next_id: u64,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a scene containing only an empty root node.
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, SceneNode::new("root"));
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, including the root and detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Inserts a detached node. It is not rendered until attached below the root.
    ///
    /// Any parent or child links the passed node carries are discarded.
    pub fn create_node(&mut self, mut node: SceneNode) -> NodeId {
        node.parent = None;
        node.children.clear();
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    /// Inserts `node` as the last child of `parent`.
    pub fn spawn(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId> {
        if !self.contains(parent) {
            return Err(Error::NodeNotFound(parent));
        }
        let id = self.create_node(node);
        self.add_child(parent, id)?;
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Mutable access to a node, e.g. for the movement methods on [`SceneNode`].
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Children of `id` in insertion order. Empty if the node does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|node| node.children()).unwrap_or(&[])
    }

    /// Returns true if `ancestor` is on the path from `id` up to its topmost ancestor.
    /// A node counts as its own ancestor.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Makes `child` the last child of `parent`.
    ///
    /// Fails if either node does not exist, if `child` already has a parent (detach it first),
    /// if `child` is the root, or if `parent` lies inside `child`'s subtree.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.contains(parent) {
            return Err(Error::NodeNotFound(parent));
        }
        let Some(child_node) = self.nodes.get(&child) else {
            return Err(Error::NodeNotFound(child));
        };
        if parent == child {
            return Err(Error::SelfParenting(child));
        }
        if child == self.root {
            return Err(Error::RootNotAttachable);
        }
        if let Some(existing) = child_node.parent {
            return Err(Error::AlreadyAttached {
                child,
                parent: existing,
            });
        }
        if self.is_ancestor(child, parent) {
            return Err(Error::WouldCreateCycle { parent, child });
        }

        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = Some(parent);
        }
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(child);
        }
        Ok(())
    }

    /// Unlinks `id` from its parent. The node and its subtree stay in the graph, detached.
    /// Detaching an already detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(Error::NodeNotFound(id))?;
        let Some(parent) = node.parent.take() else {
            return Ok(());
        };
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|c| *c != id);
        }
        Ok(())
    }

    /// Removes `id` and its whole subtree from the graph, returning the removed node.
    ///
    /// The returned node's child ids are stale, the children themselves are gone.
    pub fn remove(&mut self, id: NodeId) -> Result<SceneNode> {
        if id == self.root {
            return Err(Error::RootNotRemovable);
        }
        self.detach(id)?;
        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();
        stack.extend(self.children(id).iter().copied());
        while let Some(descendant) = stack.pop() {
            if let Some(node) = self.nodes.remove(&descendant) {
                stack.extend(node.children.iter().copied());
            }
        }
        self.nodes.remove(&id).ok_or(Error::NodeNotFound(id))
    }

    pub fn local_transform(&self, id: NodeId) -> Result<Mat4> {
        self.node(id)
            .map(SceneNode::local_matrix)
            .ok_or(Error::NodeNotFound(id))
    }

    /// Composes the local transforms from the topmost ancestor down to `id`.
    pub fn world_transform(&self, id: NodeId) -> Result<Mat4> {
        let mut node = self.node(id).ok_or(Error::NodeNotFound(id))?;
        let mut world = node.local_matrix();
        while let Some(parent) = node.parent {
            node = self.node(parent).ok_or(Error::NodeNotFound(parent))?;
            world = node.local_matrix() * world;
        }
        Ok(world)
    }

    /// Iterates over all nodes reachable from the root, depth-first, parents before children,
    /// siblings in insertion order, along with their world transforms.
    pub fn traverse(&self) -> Traverse<'_> {
        let mut stack = SmallVec::new();
        stack.push((self.root, Mat4::IDENTITY));
        Traverse { graph: self, stack }
    }
}

/// Iterator returned by [`SceneGraph::traverse`].
pub struct Traverse<'a> {
    graph: &'a SceneGraph,
    /// Nodes still to visit, with their parent's world transform.
    stack: SmallVec<[(NodeId, Mat4); 16]>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = (NodeId, &'a SceneNode, Mat4);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, parent_world) = self.stack.pop()?;
            let Some(node) = self.graph.node(id) else {
                continue;
            };
            let world = parent_world * node.local_matrix();
            // reversed so the first child is popped first
            for &child in node.children.iter().rev() {
                self.stack.push((child, world));
            }
            return Some((id, node, world));
        }
    }
}
