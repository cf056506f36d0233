//! Compilation error definitions.

use miette::{Diagnostic, SourceSpan};
use plume_graph::{GraphError, SourceInformation};
use plume_resolver::ResolutionError;
use plume_syntax::ParseError;
use smol_str::SmolStr;
use thiserror::Error;

/// An error that stops a compile pass.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum CompilationError {
    #[error("Failed to read {path}: {message}")]
    #[diagnostic(code(plume::io))]
    Io { path: String, message: String },

    #[error("Invalid model document {source_id}: {message}")]
    #[diagnostic(code(plume::document))]
    Document {
        source_id: SmolStr,
        message: String,
        location: Option<SourceInformation>,
        #[label("in this document")]
        span: Option<SourceSpan>,
    },

    #[error("{error}")]
    #[diagnostic(code(plume::parse))]
    Parse {
        error: ParseError,
        /// The text that failed to parse.
        text: String,
        location: Option<SourceInformation>,
        #[label("while reading '{text}'")]
        span: Option<SourceSpan>,
    },

    #[error("Source {0} already exists")]
    #[diagnostic(code(plume::source))]
    SourceExists(SmolStr),

    #[error("Source {0} does not exist")]
    #[diagnostic(code(plume::source))]
    SourceNotFound(SmolStr),

    #[error("{error}")]
    #[diagnostic(code(plume::resolve))]
    Resolution {
        error: ResolutionError,
        location: Option<SourceInformation>,
        #[label("referenced here")]
        span: Option<SourceSpan>,
    },

    #[error("The system can't find a match for the function: {signature}")]
    #[diagnostic(code(plume::resolve))]
    NoMatchingFunction {
        signature: String,
        location: Option<SourceInformation>,
        #[label("called here")]
        span: Option<SourceSpan>,
    },

    #[error("{error}")]
    #[diagnostic(code(plume::graph))]
    Graph {
        error: GraphError,
        location: Option<SourceInformation>,
        #[label("declared here")]
        span: Option<SourceSpan>,
    },
}

fn span_of(location: Option<&SourceInformation>) -> Option<SourceSpan> {
    location.map(|location| {
        SourceSpan::from((
            location.span.start as usize,
            location.span.len() as usize,
        ))
    })
}

impl CompilationError {
    pub fn document(
        source_id: impl Into<SmolStr>,
        message: impl Into<String>,
        location: Option<SourceInformation>,
    ) -> Self {
        CompilationError::Document {
            source_id: source_id.into(),
            message: message.into(),
            span: span_of(location.as_ref()),
            location,
        }
    }

    pub fn parse(error: ParseError, text: impl Into<String>, location: Option<SourceInformation>) -> Self {
        CompilationError::Parse {
            error,
            text: text.into(),
            span: span_of(location.as_ref()),
            location,
        }
    }

    pub fn no_matching_function(signature: String, location: Option<SourceInformation>) -> Self {
        CompilationError::NoMatchingFunction {
            signature,
            span: span_of(location.as_ref()),
            location,
        }
    }

    pub fn graph(error: GraphError, location: Option<SourceInformation>) -> Self {
        CompilationError::Graph {
            error,
            span: span_of(location.as_ref()),
            location,
        }
    }

    /// Get the source location of this error, when known.
    pub fn location(&self) -> Option<&SourceInformation> {
        match self {
            CompilationError::Document { location, .. }
            | CompilationError::Parse { location, .. }
            | CompilationError::Resolution { location, .. }
            | CompilationError::NoMatchingFunction { location, .. }
            | CompilationError::Graph { location, .. } => location.as_ref(),
            CompilationError::Io { .. }
            | CompilationError::SourceExists(_)
            | CompilationError::SourceNotFound(_) => None,
        }
    }

    /// The id of the source this error points into.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            CompilationError::Document { source_id, .. } => Some(source_id),
            _ => self.location().map(|location| location.source_id.as_str()),
        }
    }
}

impl From<ResolutionError> for CompilationError {
    fn from(error: ResolutionError) -> Self {
        let location = error.location().cloned();
        CompilationError::Resolution {
            span: span_of(location.as_ref()),
            location,
            error,
        }
    }
}

impl From<GraphError> for CompilationError {
    fn from(error: GraphError) -> Self {
        CompilationError::graph(error, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_graph::Span;

    #[test]
    fn test_resolution_errors_keep_their_location() {
        let location = SourceInformation::locate("model.json", "{\n  \"A\"\n}", Span::new(5, 6));
        let err = CompilationError::from(ResolutionError::PropertyNotFound {
            property: "b".into(),
            owner: "A".into(),
            location: Some(location.clone()),
        });
        assert_eq!(
            err.to_string(),
            "The property 'b' can't be found in the type 'A' (or any supertype)."
        );
        assert_eq!(err.location(), Some(&location));
        assert_eq!(err.source_id(), Some("model.json"));
        assert!(matches!(
            err,
            CompilationError::Resolution { span: Some(span), .. } if span.offset() == 5 && span.len() == 1
        ));
    }

    #[test]
    fn test_no_match_message() {
        let err = CompilationError::no_matching_function("func(_:Integer[1])".into(), None);
        assert_eq!(
            err.to_string(),
            "The system can't find a match for the function: func(_:Integer[1])"
        );
        assert_eq!(err.source_id(), None);
    }
}
