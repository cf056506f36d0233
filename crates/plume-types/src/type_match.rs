//! Raw type and generic type match values.
//!
//! Every value is ordered best first: the smaller value is the better match.
//! The derived orderings rely on variant and field declaration order.

use crate::multiplicity_match::MultiplicityMatch;

/// How well a value raw type matches a target raw type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeMatch {
    Exact,
    /// One side is a type parameter.
    NonConcrete,
    /// The target sits `distance` steps up the value's linearization (never 0).
    Simple(u32),
    Function(Box<FunctionTypeMatch>),
    /// The value is the bottom type.
    Bottom,
    /// The value was missing and matched leniently.
    Null,
}

impl TypeMatch {
    /// A linearization distance, with distance 0 collapsing to `Exact`.
    pub fn distance(distance: u32) -> Self {
        if distance == 0 {
            TypeMatch::Exact
        } else {
            TypeMatch::Simple(distance)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypeMatch::Null)
    }
}

/// The match of two function types, parameters compared contravariantly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionTypeMatch {
    pub parameter_types: Vec<GenericTypeMatch>,
    pub parameter_multiplicities: Vec<MultiplicityMatch>,
    pub return_type: GenericTypeMatch,
    pub return_multiplicity: MultiplicityMatch,
}

impl FunctionTypeMatch {
    pub fn contains_null(&self) -> bool {
        self.parameter_types.iter().any(GenericTypeMatch::contains_null)
            || self.parameter_multiplicities.iter().any(MultiplicityMatch::is_null)
            || self.return_type.contains_null()
            || self.return_multiplicity.is_null()
    }
}

/// The match of two generic types: raw type, then type arguments, then
/// multiplicity arguments, lists compared element-wise then by length.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenericTypeMatch {
    pub raw: TypeMatch,
    pub type_arguments: Vec<GenericTypeMatch>,
    pub multiplicity_arguments: Vec<MultiplicityMatch>,
}

impl GenericTypeMatch {
    pub fn new(
        raw: TypeMatch,
        type_arguments: Vec<GenericTypeMatch>,
        multiplicity_arguments: Vec<MultiplicityMatch>,
    ) -> Self {
        Self {
            raw,
            type_arguments,
            multiplicity_arguments,
        }
    }

    pub fn raw_only(raw: TypeMatch) -> Self {
        Self::new(raw, Vec::new(), Vec::new())
    }

    pub fn exact() -> Self {
        Self::raw_only(TypeMatch::Exact)
    }

    pub fn non_concrete() -> Self {
        Self::raw_only(TypeMatch::NonConcrete)
    }

    pub fn null() -> Self {
        Self::raw_only(TypeMatch::Null)
    }

    /// Whether a lenient null match appears anywhere inside this match.
    pub fn contains_null(&self) -> bool {
        let raw_null = match &self.raw {
            TypeMatch::Null => true,
            TypeMatch::Function(function) => function.contains_null(),
            _ => false,
        };
        raw_null
            || self.type_arguments.iter().any(GenericTypeMatch::contains_null)
            || self.multiplicity_arguments.iter().any(MultiplicityMatch::is_null)
    }
}
