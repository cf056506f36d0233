//! Model documents: the JSON form in which sources declare elements.
//!
//! A document names the package its elements live in, the packages it
//! imports, and a list of element declarations. Types and multiplicities are
//! written in the textual syntax read by `plume-syntax`.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::CompilationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub elements: Vec<ElementDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementDecl {
    Class(ClassDecl),
    Enumeration(EnumerationDecl),
    Profile(ProfileDecl),
    Association(AssociationDecl),
    Function(FunctionDecl),
    Path(PathDecl),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    /// `T` or contravariant `-T`.
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub multiplicity_parameters: Vec<String>,
    /// Supertypes; the top type when empty.
    #[serde(default)]
    pub generalizations: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub qualified_properties: Vec<QualifiedPropertyDecl>,
    #[serde(default)]
    pub stereotypes: Vec<String>,
    #[serde(default)]
    pub tagged_values: Vec<TaggedValueDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationDecl {
    pub name: String,
    pub values: Vec<String>,
    #[serde(default)]
    pub stereotypes: Vec<String>,
    #[serde(default)]
    pub tagged_values: Vec<TaggedValueDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDecl {
    pub name: String,
    #[serde(default)]
    pub stereotypes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An association between two classes. Each end is added to the class typing
/// the other end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDecl {
    pub name: String,
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub qualified_properties: Vec<AssociationQualifiedPropertyDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub multiplicity_parameters: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
    pub return_type: String,
    #[serde(default = "default_multiplicity")]
    pub return_multiplicity: String,
    #[serde(default)]
    pub calls: Vec<CallDecl>,
    /// Enum values used by the body, as `Enumeration.VALUE`.
    #[serde(default)]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub stereotypes: Vec<String>,
    #[serde(default)]
    pub tagged_values: Vec<TaggedValueDecl>,
}

/// A navigation path: a class followed by property names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDecl {
    pub name: String,
    pub start: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_multiplicity")]
    pub multiplicity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedPropertyDecl {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_multiplicity")]
    pub multiplicity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationQualifiedPropertyDecl {
    /// The class the property is added to.
    pub owner: String,
    #[serde(flatten)]
    pub property: QualifiedPropertyDecl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_multiplicity")]
    pub multiplicity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedValueDecl {
    /// `profile%tag`
    pub tag: String,
    pub value: String,
}

/// A call made by a function body. Arguments are typed values such as
/// `Integer[1]`; `null` stands for an argument whose type is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDecl {
    pub function: String,
    #[serde(default)]
    pub arguments: Vec<Option<String>>,
}

fn default_multiplicity() -> String {
    String::from("[1]")
}

impl SourceDocument {
    pub fn parse(source_id: &str, text: &str) -> Result<Self, CompilationError> {
        serde_json::from_str(text).map_err(|err| {
            let location = (err.line() > 0).then(|| {
                let offset = offset_of(text, err.line(), err.column());
                plume_graph::SourceInformation::locate(
                    source_id,
                    text,
                    plume_graph::Span::new(offset, offset),
                )
            });
            CompilationError::document(source_id, err.to_string(), location)
        })
    }

    /// Names this document makes visible: elements, properties and enum values.
    pub fn introduced_names(&self) -> Vec<SmolStr> {
        let mut names = Vec::new();
        for element in &self.elements {
            names.push(SmolStr::new(element.name()));
            match element {
                ElementDecl::Class(class) => {
                    names.extend(class.properties.iter().map(|p| SmolStr::new(&p.name)));
                    names.extend(
                        class
                            .qualified_properties
                            .iter()
                            .map(|p| SmolStr::new(&p.name)),
                    );
                }
                ElementDecl::Association(association) => {
                    names.extend(association.properties.iter().map(|p| SmolStr::new(&p.name)));
                    names.extend(
                        association
                            .qualified_properties
                            .iter()
                            .map(|p| SmolStr::new(&p.property.name)),
                    );
                }
                ElementDecl::Enumeration(enumeration) => {
                    names.extend(enumeration.values.iter().map(SmolStr::new));
                }
                ElementDecl::Profile(profile) => {
                    names.extend(profile.stereotypes.iter().map(SmolStr::new));
                    names.extend(profile.tags.iter().map(SmolStr::new));
                }
                ElementDecl::Function(_) | ElementDecl::Path(_) => {}
            }
        }
        names
    }
}

impl ElementDecl {
    pub fn name(&self) -> &str {
        match self {
            ElementDecl::Class(decl) => &decl.name,
            ElementDecl::Enumeration(decl) => &decl.name,
            ElementDecl::Profile(decl) => &decl.name,
            ElementDecl::Association(decl) => &decl.name,
            ElementDecl::Function(decl) => &decl.name,
            ElementDecl::Path(decl) => &decl.name,
        }
    }
}

/// Byte offset of a 1-based line and column.
fn offset_of(text: &str, line: usize, column: usize) -> u32 {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len()) as u32
}
