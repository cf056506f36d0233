//! Resolution error definitions.

use plume_graph::{GraphError, NodeId, SourceInformation};
use plume_types::MatchError;
use smol_str::SmolStr;
use thiserror::Error;

/// An error raised while resolving references, linearizing or matching.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("{path} has not been defined!")]
    UnresolvedIdentifier {
        /// The reference as written.
        path: SmolStr,
        /// The segment that failed to resolve.
        id: SmolStr,
        import_group: Option<NodeId>,
        location: Option<SourceInformation>,
    },

    #[error("{id} has been found more than one time in the imports: [{}]", .candidates.join(", "))]
    AmbiguousReference {
        id: SmolStr,
        /// Sorted user paths of every match.
        candidates: Vec<String>,
        location: Option<SourceInformation>,
    },

    #[error("{id_or_path} : {profile} is not a profile!")]
    NotAProfile {
        id_or_path: SmolStr,
        profile: SmolStr,
        location: Option<SourceInformation>,
    },

    #[error("The stereotype '{name}' can't be found in profile '{profile}'")]
    StereotypeNotFound {
        name: SmolStr,
        profile: SmolStr,
        location: Option<SourceInformation>,
    },

    #[error("The tag '{name}' can't be found in profile '{profile}'")]
    TagNotFound {
        name: SmolStr,
        profile: SmolStr,
        location: Option<SourceInformation>,
    },

    #[error("The property '{property}' can't be found in the type '{owner}' (or any supertype).")]
    PropertyNotFound {
        property: SmolStr,
        owner: SmolStr,
        location: Option<SourceInformation>,
    },

    #[error("The enum value '{name}' can't be found in the enumeration {enumeration}")]
    EnumValueNotFound {
        name: SmolStr,
        enumeration: String,
        location: Option<SourceInformation>,
    },

    #[error("{}", inconsistent_hierarchy_message(.path))]
    InconsistentHierarchy {
        /// From the type being linearized down to the root inconsistency.
        path: Vec<String>,
        location: Option<SourceInformation>,
    },

    #[error("Too many matches for {signature}:{}", .candidates.iter().map(|c| format!("\n\t{c}")).collect::<String>())]
    TooManyMatches {
        signature: String,
        /// Sorted descriptors of the tied candidates.
        candidates: Vec<String>,
        location: Option<SourceInformation>,
    },

    #[error("Error finding match for function '{function}': {cause}")]
    MatchComputation {
        function: String,
        cause: Box<ResolutionError>,
    },

    #[error("'{0}' is being unbound and cannot be resolved")]
    InvalidatedStub(SmolStr),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn inconsistent_hierarchy_message(path: &[String]) -> String {
    let first = path.first().map(String::as_str).unwrap_or_default();
    let mut message = format!("Inconsistent generalization hierarchy for {first}");
    if path.len() > 1 {
        let root = path.last().map(String::as_str).unwrap_or_default();
        message.push_str(&format!(
            "; root inconsistent class: {root}; path to root class: {}",
            path.join(", ")
        ));
    }
    message
}

impl ResolutionError {
    /// Get the source location of this error, when known.
    pub fn location(&self) -> Option<&SourceInformation> {
        match self {
            ResolutionError::UnresolvedIdentifier { location, .. }
            | ResolutionError::AmbiguousReference { location, .. }
            | ResolutionError::NotAProfile { location, .. }
            | ResolutionError::StereotypeNotFound { location, .. }
            | ResolutionError::TagNotFound { location, .. }
            | ResolutionError::PropertyNotFound { location, .. }
            | ResolutionError::EnumValueNotFound { location, .. }
            | ResolutionError::InconsistentHierarchy { location, .. }
            | ResolutionError::TooManyMatches { location, .. } => location.as_ref(),
            ResolutionError::MatchComputation { cause, .. } => cause.location(),
            ResolutionError::InvalidatedStub(_)
            | ResolutionError::Match(_)
            | ResolutionError::Graph(_) => None,
        }
    }

    /// Attach a location to errors raised without one.
    pub fn or_location(mut self, fallback: Option<&SourceInformation>) -> Self {
        let slot = match &mut self {
            ResolutionError::UnresolvedIdentifier { location, .. }
            | ResolutionError::AmbiguousReference { location, .. }
            | ResolutionError::NotAProfile { location, .. }
            | ResolutionError::StereotypeNotFound { location, .. }
            | ResolutionError::TagNotFound { location, .. }
            | ResolutionError::PropertyNotFound { location, .. }
            | ResolutionError::EnumValueNotFound { location, .. }
            | ResolutionError::InconsistentHierarchy { location, .. }
            | ResolutionError::TooManyMatches { location, .. } => Some(location),
            _ => None,
        };
        if let Some(location) = slot {
            if location.is_none() {
                *location = fallback.cloned();
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inconsistent_hierarchy_messages() {
        let single = ResolutionError::InconsistentHierarchy {
            path: vec!["test::A".to_string()],
            location: None,
        };
        assert_eq!(
            single.to_string(),
            "Inconsistent generalization hierarchy for test::A"
        );

        let nested = ResolutionError::InconsistentHierarchy {
            path: vec!["test::A".into(), "test::B".into(), "test::A".into()],
            location: None,
        };
        assert_eq!(
            nested.to_string(),
            "Inconsistent generalization hierarchy for test::A; root inconsistent class: test::A; path to root class: test::A, test::B, test::A"
        );
    }

    #[test]
    fn test_too_many_matches_message() {
        let err = ResolutionError::TooManyMatches {
            signature: "func(_:Integer[1])".to_string(),
            candidates: vec![
                "test::pkg1::func(Integer[1]):Integer[1]".to_string(),
                "test::pkg2::func(Integer[1]):Integer[1]".to_string(),
            ],
            location: None,
        };
        assert_eq!(
            err.to_string(),
            "Too many matches for func(_:Integer[1]):\n\ttest::pkg1::func(Integer[1]):Integer[1]\n\ttest::pkg2::func(Integer[1]):Integer[1]"
        );
    }

    #[test]
    fn test_ambiguous_reference_message() {
        let err = ResolutionError::AmbiguousReference {
            id: SmolStr::new("X"),
            candidates: vec!["a::X".to_string(), "b::X".to_string()],
            location: None,
        };
        assert_eq!(
            err.to_string(),
            "X has been found more than one time in the imports: [a::X, b::X]"
        );
    }

    #[test]
    fn test_or_location_keeps_existing() {
        let here = SourceInformation::locate("a", "abc", plume_graph::Span::new(0, 1));
        let there = SourceInformation::locate("b", "abc", plume_graph::Span::new(1, 2));
        let err = ResolutionError::PropertyNotFound {
            property: "p".into(),
            owner: "A".into(),
            location: Some(here.clone()),
        }
        .or_location(Some(&there));
        assert_eq!(err.location(), Some(&here));

        let err = ResolutionError::InvalidatedStub("x".into()).or_location(Some(&there));
        assert_eq!(err.location(), None);
    }
}
