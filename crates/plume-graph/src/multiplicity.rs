//! Multiplicities: cardinality constraints on values.

use plume_syntax::MultiplicityExpr;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// A cardinality constraint, either concrete bounds or a named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// `upper` is `None` when unbounded.
    Concrete { lower: u32, upper: Option<u32> },
    Parameter(SmolStr),
}

impl Multiplicity {
    pub const PURE_ONE: Multiplicity = Multiplicity::Concrete {
        lower: 1,
        upper: Some(1),
    };
    pub const ZERO_ONE: Multiplicity = Multiplicity::Concrete {
        lower: 0,
        upper: Some(1),
    };
    pub const ZERO_MANY: Multiplicity = Multiplicity::Concrete {
        lower: 0,
        upper: None,
    };
    pub const ONE_MANY: Multiplicity = Multiplicity::Concrete {
        lower: 1,
        upper: None,
    };
    pub const PURE_ZERO: Multiplicity = Multiplicity::Concrete {
        lower: 0,
        upper: Some(0),
    };

    pub fn concrete(lower: u32, upper: Option<u32>) -> Self {
        Multiplicity::Concrete { lower, upper }
    }

    pub fn exactly(count: u32) -> Self {
        Multiplicity::Concrete {
            lower: count,
            upper: Some(count),
        }
    }

    pub fn parameter(name: impl Into<SmolStr>) -> Self {
        Multiplicity::Parameter(name.into())
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Multiplicity::Concrete { .. })
    }

    pub fn parameter_name(&self) -> Option<&SmolStr> {
        match self {
            Multiplicity::Parameter(name) => Some(name),
            Multiplicity::Concrete { .. } => None,
        }
    }

    pub fn lower_bound(&self) -> Option<u32> {
        match self {
            Multiplicity::Concrete { lower, .. } => Some(*lower),
            Multiplicity::Parameter(_) => None,
        }
    }

    /// `Some(None)` for an unbounded concrete multiplicity, `None` for a parameter.
    pub fn upper_bound(&self) -> Option<Option<u32>> {
        match self {
            Multiplicity::Concrete { upper, .. } => Some(*upper),
            Multiplicity::Parameter(_) => None,
        }
    }

    pub fn is_to_one(&self) -> bool {
        matches!(self, Multiplicity::Concrete { upper: Some(1), .. })
    }

    pub fn is_zero_to_many(&self) -> bool {
        *self == Multiplicity::ZERO_MANY
    }

    /// Replace a parameter by its binding, when one is known.
    pub fn substitute(&self, bindings: &FxHashMap<SmolStr, Multiplicity>) -> Multiplicity {
        match self {
            Multiplicity::Parameter(name) => bindings
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Multiplicity::Concrete { .. } => self.clone(),
        }
    }

    /// The segment used for this multiplicity inside a function id.
    pub fn id_segment(&self) -> String {
        MultiplicityExpr::from(self).id_segment()
    }
}

impl From<&MultiplicityExpr> for Multiplicity {
    fn from(expr: &MultiplicityExpr) -> Self {
        match expr {
            MultiplicityExpr::Concrete { lower, upper } => Multiplicity::Concrete {
                lower: *lower,
                upper: *upper,
            },
            MultiplicityExpr::Parameter(name) => Multiplicity::Parameter(name.clone()),
        }
    }
}

impl From<&Multiplicity> for MultiplicityExpr {
    fn from(mult: &Multiplicity) -> Self {
        match mult {
            Multiplicity::Concrete { lower, upper } => MultiplicityExpr::Concrete {
                lower: *lower,
                upper: *upper,
            },
            Multiplicity::Parameter(name) => MultiplicityExpr::Parameter(name.clone()),
        }
    }
}

impl std::fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", MultiplicityExpr::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Multiplicity::PURE_ONE.to_string(), "[1]");
        assert_eq!(Multiplicity::ZERO_ONE.to_string(), "[0..1]");
        assert_eq!(Multiplicity::ZERO_MANY.to_string(), "[*]");
        assert_eq!(Multiplicity::ONE_MANY.to_string(), "[1..*]");
        assert_eq!(Multiplicity::parameter("m").to_string(), "[m]");
    }

    #[test]
    fn test_id_segment() {
        assert_eq!(Multiplicity::PURE_ONE.id_segment(), "1");
        assert_eq!(Multiplicity::ZERO_MANY.id_segment(), "MANY");
        assert_eq!(Multiplicity::ONE_MANY.id_segment(), "$1_MANY$");
        assert_eq!(Multiplicity::ZERO_ONE.id_segment(), "$0_1$");
    }

    #[test]
    fn test_substitute() {
        let mut bindings = FxHashMap::default();
        bindings.insert(SmolStr::new("m"), Multiplicity::ZERO_ONE);
        assert_eq!(
            Multiplicity::parameter("m").substitute(&bindings),
            Multiplicity::ZERO_ONE
        );
        assert_eq!(
            Multiplicity::parameter("n").substitute(&bindings),
            Multiplicity::parameter("n")
        );
        assert!(Multiplicity::ZERO_ONE.is_to_one());
        assert!(!Multiplicity::ONE_MANY.is_to_one());
    }
}
