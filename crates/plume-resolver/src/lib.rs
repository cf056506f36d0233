//! # Plume Resolver
//!
//! Name resolution and overload dispatch over the program graph.
//!
//! This crate handles:
//! - Binding import, property, enum and grammar stubs to graph elements
//! - C3 linearization of raw and generic type hierarchies
//! - Matching argument types and multiplicities against parameters
//! - Picking the best overload for a call, or ranking all of them
//!
//! # Example
//!
//! ```
//! use plume_graph::Graph;
//! use plume_resolver::linearize;
//!
//! let mut graph = Graph::new();
//! let integer = graph.top_level("Integer").unwrap();
//! let supertypes = linearize(&mut graph, integer).unwrap();
//! assert_eq!(supertypes[0], integer);
//! assert_eq!(supertypes.last(), Some(&graph.well_known().any));
//! ```

mod error;
mod linearize;
mod options;
mod overload;
mod stub_resolver;
mod type_matcher;

#[cfg(test)]
mod test_support;

pub use error::ResolutionError;
pub use linearize::{linearize, linearize_generic};
pub use options::{MatchOptions, NullMatching};
pub use overload::{call_signature, candidate_functions, rank_all_matches, resolve_call};
pub use stub_resolver::{
    find_property, resolve, resolve_generic_type, resolve_packageable_element, resolve_parameters,
};
pub use type_matcher::match_type;

pub use plume_types::match_multiplicity;
