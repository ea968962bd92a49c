//! Tree contract errors

use crate::node::NodePath;
use thiserror::Error;

/// A tree handed over by the parser does not conform to the node model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A node has the wrong number or kind of children
    #[error("malformed {kind} node at {path}: {reason}")]
    Malformed {
        /// Label of the offending node kind
        kind: &'static str,
        /// Location of the node, as child indices from the root
        path: NodePath,
        /// What is wrong with it
        reason: String,
    },
}

impl TreeError {
    /// Returns the path of the node the error refers to
    #[must_use]
    pub fn path(&self) -> &NodePath {
        match self {
            Self::Malformed { path, .. } => path,
        }
    }
}
