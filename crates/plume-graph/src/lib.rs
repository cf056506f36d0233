//! # Plume Graph
//!
//! The in-memory program graph shared by every compiler phase.
//!
//! This crate handles:
//! - Arena storage of elements with stable ids and tombstones for removed ones
//! - Packages, user paths and the top-level namespace
//! - Stubs and their resolution state
//! - Generic types, function types and multiplicities
//! - Back references used to unbind dependents on change
//! - The built-in type hierarchy every graph starts with

mod bootstrap;
mod error;
mod generic_type;
mod graph;
mod multiplicity;
mod node;
mod print;
mod span;
mod stub;

pub use bootstrap::{special_type_names, FUNCTION_PACKAGE, PRIMITIVE_TYPES, TYPE_PACKAGE};
pub use error::GraphError;
pub use generic_type::{FunctionType, GenericType, Parameter, RawType, TypeParameter};
pub use graph::{Graph, WellKnown};
pub use multiplicity::Multiplicity;
pub use node::{
    Annotations, Argument, AssociationData, Call, CompileState, EnumerationData, FunctionData,
    ImportGroupData, Node, NodeId, NodeKind, PackageData, PathData, ProfileData, PropertyData,
    Slot, TaggedValue, TypeData,
};
pub use span::{SourceInformation, Span};
pub use stub::{Resolution, Stub, StubKind};

/// The arena index of a node, for messages and stable ordering.
pub fn raw_index(id: NodeId) -> u32 {
    u32::from(id.into_raw())
}
