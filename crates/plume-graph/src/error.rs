//! Graph error definitions.

use smol_str::SmolStr;
use thiserror::Error;

use crate::node::NodeId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("element #{} has been removed from the graph", crate::raw_index(*.0))]
    RemovedNode(NodeId),

    #[error("expected {expected}, found {found}")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{name}' is already defined in package '{package}'")]
    DuplicateElement { name: SmolStr, package: String },

    #[error("'{0}' is not a package")]
    NotAPackage(SmolStr),

    #[error(transparent)]
    Syntax(#[from] plume_syntax::ParseError),
}
