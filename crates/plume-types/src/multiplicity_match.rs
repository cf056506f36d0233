//! Multiplicity match values and the multiplicity matcher.

use plume_graph::Multiplicity;

use crate::behavior::{MatchBehavior, NullMatchBehavior, ParameterMatchBehavior};
use crate::error::MatchError;

/// How well a value multiplicity fits a target multiplicity, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MultiplicityMatch {
    Exact,
    NonConcrete,
    /// Never both zero. Upper bound distance is compared first.
    Simple {
        upper_distance: u32,
        lower_distance: u32,
    },
    Null,
}

impl MultiplicityMatch {
    pub fn simple(upper_distance: u32, lower_distance: u32) -> Self {
        if upper_distance == 0 && lower_distance == 0 {
            MultiplicityMatch::Exact
        } else {
            MultiplicityMatch::Simple {
                upper_distance,
                lower_distance,
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MultiplicityMatch::Null)
    }
}

fn is_zero_many(mult: &Multiplicity) -> bool {
    mult.is_zero_to_many()
}

/// Match a value multiplicity against a target multiplicity.
///
/// When `covariant`, the target must be at least as wide as the value.
/// `Ok(None)` means no match.
pub fn match_multiplicity(
    target: &Multiplicity,
    value: Option<&Multiplicity>,
    covariant: bool,
    behavior: MatchBehavior,
) -> Result<Option<MultiplicityMatch>, MatchError> {
    let Some(value) = value else {
        return match behavior.value_null {
            NullMatchBehavior::MatchAnything => Ok(Some(MultiplicityMatch::Null)),
            NullMatchBehavior::MatchNothing => Ok(None),
            NullMatchBehavior::Error => Err(MatchError::NullValue("multiplicity")),
        };
    };

    if let Multiplicity::Parameter(target_param) = target {
        return match behavior.target_parameter {
            ParameterMatchBehavior::MatchAnything => Ok(Some(MultiplicityMatch::NonConcrete)),
            ParameterMatchBehavior::MatchCautiously => Ok(match value {
                Multiplicity::Concrete { .. } if !covariant && is_zero_many(value) => {
                    Some(MultiplicityMatch::NonConcrete)
                }
                Multiplicity::Parameter(value_param) if value_param == target_param => {
                    Some(MultiplicityMatch::NonConcrete)
                }
                _ => None,
            }),
            ParameterMatchBehavior::MatchNothing => Ok(None),
            ParameterMatchBehavior::Error => Err(MatchError::NonConcreteTarget {
                what: "multiplicity",
                printed: target.to_string(),
            }),
        };
    }

    if let Multiplicity::Parameter(_) = value {
        return match behavior.value_parameter {
            ParameterMatchBehavior::MatchAnything => Ok(Some(MultiplicityMatch::NonConcrete)),
            ParameterMatchBehavior::MatchCautiously => Ok((covariant && is_zero_many(target))
                .then_some(MultiplicityMatch::Simple {
                    upper_distance: u32::MAX,
                    lower_distance: u32::MAX,
                })),
            ParameterMatchBehavior::MatchNothing => Ok(None),
            ParameterMatchBehavior::Error => Err(MatchError::NonConcreteValue {
                what: "multiplicity",
                printed: value.to_string(),
            }),
        };
    }

    let (large, small) = if covariant {
        (target, value)
    } else {
        (value, target)
    };
    let (
        Multiplicity::Concrete {
            lower: large_lower,
            upper: large_upper,
        },
        Multiplicity::Concrete {
            lower: small_lower,
            upper: small_upper,
        },
    ) = (large, small)
    else {
        return Ok(None);
    };

    let Some(lower_distance) = small_lower.checked_sub(*large_lower) else {
        return Ok(None);
    };

    let upper_distance = match (large_upper, small_upper) {
        (None, None) => 0,
        (None, Some(_)) => u32::MAX,
        (Some(_), None) => return Ok(None),
        (Some(large_upper), Some(small_upper)) => match large_upper.checked_sub(*small_upper) {
            Some(distance) => distance,
            None => return Ok(None),
        },
    };

    Ok(Some(MultiplicityMatch::simple(upper_distance, lower_distance)))
}
