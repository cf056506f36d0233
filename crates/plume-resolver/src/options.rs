//! Matching options.

use plume_types::{MatchBehavior, NullMatchBehavior, ParameterMatchBehavior};

/// How a missing argument type or multiplicity is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NullMatching {
    /// A missing value matches nothing.
    #[default]
    Strict,
    /// A missing value matches anything, at the worst rank.
    Lenient,
}

/// Options for matching call arguments against function parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchOptions {
    pub null_matching: NullMatching,
    /// Applied when a parameter side is a type or multiplicity parameter.
    pub target_parameter: ParameterMatchBehavior,
    /// Applied when an argument side is a type or multiplicity parameter.
    pub value_parameter: ParameterMatchBehavior,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl MatchOptions {
    pub fn strict() -> Self {
        Self {
            null_matching: NullMatching::Strict,
            target_parameter: ParameterMatchBehavior::MatchAnything,
            value_parameter: ParameterMatchBehavior::MatchCautiously,
        }
    }

    pub fn lenient() -> Self {
        Self {
            null_matching: NullMatching::Lenient,
            ..Self::strict()
        }
    }

    pub fn with_null_matching(null_matching: NullMatching) -> Self {
        Self {
            null_matching,
            ..Self::strict()
        }
    }

    pub fn behavior(&self) -> MatchBehavior {
        let value_null = match self.null_matching {
            NullMatching::Strict => NullMatchBehavior::MatchNothing,
            NullMatching::Lenient => NullMatchBehavior::MatchAnything,
        };
        MatchBehavior::new(value_null, self.target_parameter, self.value_parameter)
    }
}
