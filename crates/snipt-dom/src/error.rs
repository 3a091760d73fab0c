use crate::document::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0:?} is not a text node")]
    NotAText(NodeId),
    #[error("node {0:?} is not an input or textarea")]
    NotAFormControl(NodeId),
    #[error("offset {offset} is out of range for node {node:?} (length {len})")]
    OffsetOutOfRange { node: NodeId, offset: usize, len: usize },
    #[error("cannot insert {child:?} into its own subtree")]
    HierarchyViolation { child: NodeId },
    #[error("node {0:?} is not attached to the document")]
    Detached(NodeId),
}

pub type Result<T> = std::result::Result<T, DomError>;
