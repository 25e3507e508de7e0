use crate::node::NodeId;
use thiserror::Error;

/// Contract violations of the scene graph.
///
/// None of these are recoverable by the graph itself; the caller broke a rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Null node id")]
    NullNode,

    #[error("Node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("Node {child} is already attached to {parent}")]
    AlreadyAttached { child: NodeId, parent: NodeId },

    #[error("Node {0} is not attached")]
    NotAttached(NodeId),

    #[error("Attaching {child} under {parent} would create a cycle")]
    Cycle { child: NodeId, parent: NodeId },

    #[error("Node {0} already has a transform component")]
    DuplicateTransform(NodeId),

    #[error("Node {0} is not connected to the live tree")]
    NotLive(NodeId),

    #[error("The root node cannot be {0}")]
    RootNode(&'static str),
}

pub type Result<T> = std::result::Result<T, GraphError>;
