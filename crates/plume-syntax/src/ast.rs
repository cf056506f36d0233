//! Syntax trees for type expressions and function descriptors.

use smol_str::SmolStr;

/// A multiplicity as written in source: `[1]`, `[0..1]`, `[*]`, `[1..*]` or `[m]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MultiplicityExpr {
    /// `upper` is `None` for `*`.
    Concrete { lower: u32, upper: Option<u32> },
    Parameter(SmolStr),
}

impl MultiplicityExpr {
    /// The segment used for this multiplicity inside a function id.
    ///
    /// `1` for `[1]`, `MANY` for `[*]`, `$1_MANY$` for `[1..*]`, `$0_1$` for
    /// `[0..1]` and the parameter name for `[m]`.
    pub fn id_segment(&self) -> String {
        match self {
            MultiplicityExpr::Parameter(name) => name.to_string(),
            MultiplicityExpr::Concrete {
                lower: 0,
                upper: None,
            } => "MANY".to_string(),
            MultiplicityExpr::Concrete { lower, upper: None } => format!("${lower}_MANY$"),
            MultiplicityExpr::Concrete {
                lower,
                upper: Some(upper),
            } if lower == upper => lower.to_string(),
            MultiplicityExpr::Concrete {
                lower,
                upper: Some(upper),
            } => format!("${lower}_{upper}$"),
        }
    }
}

impl std::fmt::Display for MultiplicityExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultiplicityExpr::Parameter(name) => write!(f, "[{name}]"),
            MultiplicityExpr::Concrete {
                lower: 0,
                upper: None,
            } => f.write_str("[*]"),
            MultiplicityExpr::Concrete { lower, upper: None } => write!(f, "[{lower}..*]"),
            MultiplicityExpr::Concrete {
                lower,
                upper: Some(upper),
            } if lower == upper => write!(f, "[{lower}]"),
            MultiplicityExpr::Concrete {
                lower,
                upper: Some(upper),
            } => write!(f, "[{lower}..{upper}]"),
        }
    }
}

/// A type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// `path::to::Type<A, B|m>`; a bare name may also denote a type parameter.
    Named {
        path: SmolStr,
        type_arguments: Vec<TypeExpr>,
        multiplicity_arguments: Vec<MultiplicityExpr>,
    },
    /// `{A[1], B[*]->C[0..1]}`
    Function {
        parameters: Vec<(TypeExpr, MultiplicityExpr)>,
        return_type: Box<TypeExpr>,
        return_multiplicity: MultiplicityExpr,
    },
}

impl TypeExpr {
    /// A named type without arguments.
    pub fn named(path: impl Into<SmolStr>) -> Self {
        TypeExpr::Named {
            path: path.into(),
            type_arguments: Vec::new(),
            multiplicity_arguments: Vec::new(),
        }
    }
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Named {
                path,
                type_arguments,
                multiplicity_arguments,
            } => {
                f.write_str(path)?;
                if type_arguments.is_empty() && multiplicity_arguments.is_empty() {
                    return Ok(());
                }
                f.write_str("<")?;
                for (i, arg) in type_arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                if !multiplicity_arguments.is_empty() {
                    f.write_str("|")?;
                    for (i, mult) in multiplicity_arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        let text = mult.to_string();
                        f.write_str(&text[1..text.len() - 1])?;
                    }
                }
                f.write_str(">")
            }
            TypeExpr::Function {
                parameters,
                return_type,
                return_multiplicity,
            } => {
                f.write_str("{")?;
                for (i, (ty, mult)) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ty}{mult}")?;
                }
                write!(f, "->{return_type}{return_multiplicity}}}")
            }
        }
    }
}

/// A type parameter declaration, `T` or contravariant `-T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameterExpr {
    pub name: SmolStr,
    pub contravariant: bool,
}

/// `pkg::name(Type[mult], ...):ReturnType[mult]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    /// Qualified function name, without parameter list.
    pub path: SmolStr,
    pub parameters: Vec<(SmolStr, MultiplicityExpr)>,
    pub return_type: SmolStr,
    pub return_multiplicity: MultiplicityExpr,
}

impl FunctionDescriptor {
    /// The package part of the path, if any.
    pub fn package_path(&self) -> Option<&str> {
        self.path.rsplit_once("::").map(|(package, _)| package)
    }

    /// The simple function name.
    pub fn function_name(&self) -> &str {
        self.path
            .rsplit_once("::")
            .map_or(self.path.as_str(), |(_, name)| name)
    }

    /// The id under which a function with this signature is stored in its package.
    pub fn function_id(&self) -> String {
        let mut id = self.function_name().to_string();
        if self.parameters.is_empty() {
            id.push('_');
        }
        for (ty, mult) in &self.parameters {
            push_id_segment(&mut id, ty, &mult.id_segment());
        }
        push_id_segment(&mut id, &self.return_type, &self.return_multiplicity.id_segment());
        id
    }

    /// The fully qualified function id.
    pub fn qualified_id(&self) -> String {
        match self.package_path() {
            Some(package) => format!("{package}::{}", self.function_id()),
            None => self.function_id(),
        }
    }
}

/// Append `_Type_mult_` to a function id.
pub fn push_id_segment(id: &mut String, type_name: &str, multiplicity_segment: &str) {
    id.push('_');
    id.push_str(type_name);
    id.push('_');
    id.push_str(multiplicity_segment);
    id.push('_');
}
