//! Match error definitions.

use thiserror::Error;

/// Raised when a behaviour is `Error` and the corresponding case occurs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("Value {0} may not be null")]
    NullValue(&'static str),

    #[error("Target {what} must be concrete, got: {printed}")]
    NonConcreteTarget { what: &'static str, printed: String },

    #[error("Value {what} must be concrete, got: {printed}")]
    NonConcreteValue { what: &'static str, printed: String },
}
