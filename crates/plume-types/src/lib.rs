//! Match values for overload resolution.
//!
//! This crate handles:
//! - Raw type, generic type and function type match values
//! - Multiplicity matching and its match values
//! - The composite per-candidate ranking used to pick an overload
//! - The null and parameter behaviours that parameterize matching
//!
//! All values are immutable and totally ordered, smaller meaning better.

mod behavior;
mod error;
mod function_match;
mod multiplicity_match;
mod type_match;

pub use behavior::{MatchBehavior, NullMatchBehavior, ParameterMatchBehavior};
pub use error::MatchError;
pub use function_match::FunctionMatch;
pub use multiplicity_match::{match_multiplicity, MultiplicityMatch};
pub use type_match::{FunctionTypeMatch, GenericTypeMatch, TypeMatch};
