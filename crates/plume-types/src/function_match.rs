//! Composite ranking of one candidate function against a call's arguments.

use crate::multiplicity_match::MultiplicityMatch;
use crate::type_match::GenericTypeMatch;

/// Per-parameter matches for one candidate.
///
/// Ordered by the type matches position by position, and only when those all
/// tie, by the multiplicity matches. Vectors of different length compare by
/// length after their common prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FunctionMatch {
    pub type_matches: Vec<GenericTypeMatch>,
    pub multiplicity_matches: Vec<MultiplicityMatch>,
}

impl FunctionMatch {
    pub fn new(type_matches: Vec<GenericTypeMatch>, multiplicity_matches: Vec<MultiplicityMatch>) -> Self {
        Self {
            type_matches,
            multiplicity_matches,
        }
    }

    pub fn push(&mut self, type_match: GenericTypeMatch, multiplicity_match: MultiplicityMatch) {
        self.type_matches.push(type_match);
        self.multiplicity_matches.push(multiplicity_match);
    }

    pub fn arity(&self) -> usize {
        self.type_matches.len()
    }

    /// Whether any parameter matched only because its argument was missing.
    pub fn contains_null(&self) -> bool {
        self.type_matches.iter().any(GenericTypeMatch::contains_null)
            || self.multiplicity_matches.iter().any(MultiplicityMatch::is_null)
    }
}
