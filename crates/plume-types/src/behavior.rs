//! How matching treats missing values and parameters.

/// What happens when the value side of a match is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NullMatchBehavior {
    /// Match at the worst possible rank.
    MatchAnything,
    MatchNothing,
    #[default]
    Error,
}

/// What happens when one side of a match is a type or multiplicity parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterMatchBehavior {
    MatchAnything,
    /// Match only when every possible binding of the parameter would match.
    MatchCautiously,
    MatchNothing,
    #[default]
    Error,
}

/// The three behaviours that parameterize a match computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MatchBehavior {
    pub value_null: NullMatchBehavior,
    pub target_parameter: ParameterMatchBehavior,
    pub value_parameter: ParameterMatchBehavior,
}

impl MatchBehavior {
    pub fn new(
        value_null: NullMatchBehavior,
        target_parameter: ParameterMatchBehavior,
        value_parameter: ParameterMatchBehavior,
    ) -> Self {
        Self {
            value_null,
            target_parameter,
            value_parameter,
        }
    }
}
