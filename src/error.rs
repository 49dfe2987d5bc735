//! Error types.
//!
//! Degenerate geometry and singular transforms are not errors: the renderer skips the
//! offending triangles and counts them in [`FrameStats`](crate::rendering::renderer::FrameStats).
//! Everything here is surfaced at construction or scene-editing time instead.

use crate::scene::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A mesh triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, but the mesh has only {vertex_count} vertices")]
    InvalidIndex {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    /// Invalid resolution, field of view, clip planes or light parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("scene node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("scene node {0} cannot be its own parent")]
    SelfParenting(NodeId),

    #[error("scene node {child} is already attached to {parent}, detach it first")]
    AlreadyAttached { child: NodeId, parent: NodeId },

    #[error("attaching {child} to {parent} would create a cycle")]
    WouldCreateCycle { parent: NodeId, child: NodeId },

    #[error("the root node cannot be attached to another node")]
    RootNotAttachable,

    #[error("the root node cannot be removed")]
    RootNotRemovable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
