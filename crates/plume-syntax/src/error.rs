//! Parse error definitions.

use crate::token::TokenKind;
use thiserror::Error;

/// An error raised while reading a type, multiplicity or function descriptor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        span: std::ops::Range<usize>,
    },

    #[error("invalid character")]
    InvalidCharacter { span: std::ops::Range<usize> },

    #[error("invalid multiplicity: lower bound {lower} is greater than upper bound {upper}")]
    InvalidMultiplicity {
        lower: u32,
        upper: u32,
        span: std::ops::Range<usize>,
    },

    #[error("invalid function descriptor '{descriptor}': {cause}")]
    InvalidFunctionDescriptor {
        descriptor: String,
        cause: Box<ParseError>,
    },
}

impl ParseError {
    /// Get the span of this error.
    pub fn span(&self) -> std::ops::Range<usize> {
        match self {
            ParseError::UnexpectedToken { span, .. } => span.clone(),
            ParseError::InvalidCharacter { span } => span.clone(),
            ParseError::InvalidMultiplicity { span, .. } => span.clone(),
            ParseError::InvalidFunctionDescriptor { cause, .. } => cause.span(),
        }
    }
}
