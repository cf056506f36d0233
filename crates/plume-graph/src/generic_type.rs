//! Generic types, function types and type parameters.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::multiplicity::Multiplicity;
use crate::node::NodeId;

/// The raw type of a concrete generic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawType {
    /// A type element, or a stub that resolves to one.
    Node(NodeId),
    Function(Box<FunctionType>),
}

/// A type reference: either a concrete raw type with arguments, or a type parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GenericType {
    pub raw_type: Option<RawType>,
    pub type_arguments: Vec<GenericType>,
    pub multiplicity_arguments: Vec<Multiplicity>,
    /// Set when the type is a reference to a type parameter.
    pub type_parameter: Option<SmolStr>,
}

impl GenericType {
    pub fn of(raw: NodeId) -> Self {
        Self {
            raw_type: Some(RawType::Node(raw)),
            ..Self::default()
        }
    }

    pub fn parameter(name: impl Into<SmolStr>) -> Self {
        Self {
            type_parameter: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn function(function_type: FunctionType) -> Self {
        Self {
            raw_type: Some(RawType::Function(Box::new(function_type))),
            ..Self::default()
        }
    }

    pub fn with_type_arguments(mut self, type_arguments: Vec<GenericType>) -> Self {
        self.type_arguments = type_arguments;
        self
    }

    pub fn with_multiplicity_arguments(mut self, multiplicity_arguments: Vec<Multiplicity>) -> Self {
        self.multiplicity_arguments = multiplicity_arguments;
        self
    }

    /// A generic type is concrete when it has a raw type.
    pub fn is_concrete(&self) -> bool {
        self.raw_type.is_some()
    }

    pub fn raw_node(&self) -> Option<NodeId> {
        match &self.raw_type {
            Some(RawType::Node(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn function_type(&self) -> Option<&FunctionType> {
        match &self.raw_type {
            Some(RawType::Function(function_type)) => Some(function_type),
            _ => None,
        }
    }

    /// Replace type and multiplicity parameters by their bindings.
    pub fn substitute(
        &self,
        types: &FxHashMap<SmolStr, GenericType>,
        multiplicities: &FxHashMap<SmolStr, Multiplicity>,
    ) -> GenericType {
        if let Some(name) = &self.type_parameter {
            return types.get(name).cloned().unwrap_or_else(|| self.clone());
        }
        GenericType {
            raw_type: self.raw_type.as_ref().map(|raw| match raw {
                RawType::Node(id) => RawType::Node(*id),
                RawType::Function(function_type) => {
                    RawType::Function(Box::new(function_type.substitute(types, multiplicities)))
                }
            }),
            type_arguments: self
                .type_arguments
                .iter()
                .map(|arg| arg.substitute(types, multiplicities))
                .collect(),
            multiplicity_arguments: self
                .multiplicity_arguments
                .iter()
                .map(|mult| mult.substitute(multiplicities))
                .collect(),
            type_parameter: None,
        }
    }

    /// Every node id referenced by this type, including inside arguments and function types.
    pub fn referenced_nodes(&self, out: &mut Vec<NodeId>) {
        match &self.raw_type {
            Some(RawType::Node(id)) => out.push(*id),
            Some(RawType::Function(function_type)) => function_type.referenced_nodes(out),
            None => {}
        }
        for arg in &self.type_arguments {
            arg.referenced_nodes(out);
        }
    }
}

/// A function parameter, or a parameter slot of a function type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Unnamed in function types like `{String[1]->Boolean[1]}`.
    pub name: Option<SmolStr>,
    pub generic_type: GenericType,
    pub multiplicity: Multiplicity,
}

impl Parameter {
    pub fn new(generic_type: GenericType, multiplicity: Multiplicity) -> Self {
        Self {
            name: None,
            generic_type,
            multiplicity,
        }
    }

    pub fn named(name: impl Into<SmolStr>, generic_type: GenericType, multiplicity: Multiplicity) -> Self {
        Self {
            name: Some(name.into()),
            generic_type,
            multiplicity,
        }
    }
}

/// The signature of a function: parameters and return.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub parameters: Vec<Parameter>,
    pub return_type: GenericType,
    pub return_multiplicity: Multiplicity,
}

impl FunctionType {
    pub fn substitute(
        &self,
        types: &FxHashMap<SmolStr, GenericType>,
        multiplicities: &FxHashMap<SmolStr, Multiplicity>,
    ) -> FunctionType {
        FunctionType {
            parameters: self
                .parameters
                .iter()
                .map(|param| Parameter {
                    name: param.name.clone(),
                    generic_type: param.generic_type.substitute(types, multiplicities),
                    multiplicity: param.multiplicity.substitute(multiplicities),
                })
                .collect(),
            return_type: self.return_type.substitute(types, multiplicities),
            return_multiplicity: self.return_multiplicity.substitute(multiplicities),
        }
    }

    pub fn referenced_nodes(&self, out: &mut Vec<NodeId>) {
        for param in &self.parameters {
            param.generic_type.referenced_nodes(out);
        }
        self.return_type.referenced_nodes(out);
    }

    /// Structural equality ignoring parameter names.
    pub fn same_signature(&self, other: &FunctionType) -> bool {
        self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.generic_type == b.generic_type && a.multiplicity == b.multiplicity)
            && self.return_type == other.return_type
            && self.return_multiplicity == other.return_multiplicity
    }
}

/// A type parameter declared on a class or function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub name: SmolStr,
    pub contravariant: bool,
}

impl TypeParameter {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            contravariant: false,
        }
    }

    pub fn contravariant(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            contravariant: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use la_arena::{Idx, RawIdx};

    fn id(n: u32) -> NodeId {
        Idx::from_raw(RawIdx::from(n))
    }

    #[test]
    fn test_substitute_type_and_multiplicity_parameters() {
        let mut types = FxHashMap::default();
        types.insert(SmolStr::new("T"), GenericType::of(id(1)));
        let mut mults = FxHashMap::default();
        mults.insert(SmolStr::new("m"), Multiplicity::ZERO_ONE);

        let list_of_t = GenericType::of(id(7))
            .with_type_arguments(vec![GenericType::parameter("T")])
            .with_multiplicity_arguments(vec![Multiplicity::parameter("m")]);
        let substituted = list_of_t.substitute(&types, &mults);

        assert_eq!(substituted.type_arguments, vec![GenericType::of(id(1))]);
        assert_eq!(substituted.multiplicity_arguments, vec![Multiplicity::ZERO_ONE]);
        assert!(substituted.is_concrete());
    }

    #[test]
    fn test_substitute_inside_function_type() {
        let mut types = FxHashMap::default();
        types.insert(SmolStr::new("V"), GenericType::of(id(2)));
        let function = GenericType::function(FunctionType {
            parameters: vec![Parameter::new(GenericType::parameter("V"), Multiplicity::PURE_ONE)],
            return_type: GenericType::parameter("V"),
            return_multiplicity: Multiplicity::parameter("n"),
        });
        let substituted = function.substitute(&types, &FxHashMap::default());
        let function_type = substituted.function_type().unwrap();
        assert_eq!(function_type.parameters[0].generic_type, GenericType::of(id(2)));
        assert_eq!(function_type.return_multiplicity, Multiplicity::parameter("n"));
    }

    #[test]
    fn test_referenced_nodes() {
        let ty = GenericType::of(id(3)).with_type_arguments(vec![GenericType::function(FunctionType {
            parameters: vec![Parameter::new(GenericType::of(id(4)), Multiplicity::PURE_ONE)],
            return_type: GenericType::of(id(5)),
            return_multiplicity: Multiplicity::PURE_ONE,
        })]);
        let mut out = Vec::new();
        ty.referenced_nodes(&mut out);
        assert_eq!(out, vec![id(3), id(4), id(5)]);
    }
}
