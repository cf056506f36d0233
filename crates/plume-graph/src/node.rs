//! Graph elements.

use indexmap::IndexMap;
use la_arena::Idx;
use smol_str::SmolStr;

use crate::generic_type::{FunctionType, GenericType, TypeParameter};
use crate::multiplicity::Multiplicity;
use crate::span::SourceInformation;
use crate::stub::{Resolution, Stub};

pub type NodeId = Idx<Slot>;

/// An arena slot. Removed elements leave a tombstone so ids are never reused.
#[derive(Debug, Clone)]
pub enum Slot {
    Live(Node),
    Removed,
}

/// How far an element has progressed through compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompileState {
    #[default]
    Unprocessed,
    Processed,
    Validated,
}

/// A graph element.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: SmolStr,
    /// Containing package for packageable elements.
    pub package: Option<NodeId>,
    /// The top-level element this node was created for, if it is not one itself.
    pub owner: Option<NodeId>,
    pub source: Option<SourceInformation>,
    pub state: CompileState,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(name: impl Into<SmolStr>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            package: None,
            owner: None,
            source: None,
            state: CompileState::Unprocessed,
            kind,
        }
    }

    pub fn with_package(mut self, package: NodeId) -> Self {
        self.package = Some(package);
        self
    }

    pub fn with_owner(mut self, owner: NodeId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_source(mut self, source: Option<SourceInformation>) -> Self {
        self.source = source;
        self
    }

    pub fn with_state(mut self, state: CompileState) -> Self {
        self.state = state;
        self
    }

    /// Type data for classes, primitive types and enumerations.
    pub fn type_data(&self) -> Option<&TypeData> {
        match &self.kind {
            NodeKind::Class(data) | NodeKind::PrimitiveType(data) => Some(data),
            NodeKind::Enumeration(data) => Some(&data.type_data),
            _ => None,
        }
    }

    pub fn type_data_mut(&mut self) -> Option<&mut TypeData> {
        match &mut self.kind {
            NodeKind::Class(data) | NodeKind::PrimitiveType(data) => Some(data),
            NodeKind::Enumeration(data) => Some(&mut data.type_data),
            _ => None,
        }
    }

    pub fn stub(&self) -> Option<&Stub> {
        match &self.kind {
            NodeKind::Stub(stub) => Some(stub),
            _ => None,
        }
    }

    pub fn is_type(&self) -> bool {
        self.type_data().is_some()
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Package(PackageData),
    Class(TypeData),
    PrimitiveType(TypeData),
    Enumeration(EnumerationData),
    EnumValue { enumeration: NodeId },
    Property(PropertyData),
    Association(AssociationData),
    Function(FunctionData),
    Profile(ProfileData),
    Stereotype { profile: NodeId },
    Tag { profile: NodeId },
    ImportGroup(ImportGroupData),
    Path(PathData),
    Stub(Stub),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Package(_) => "package",
            NodeKind::Class(_) => "class",
            NodeKind::PrimitiveType(_) => "primitive type",
            NodeKind::Enumeration(_) => "enumeration",
            NodeKind::EnumValue { .. } => "enum value",
            NodeKind::Property(_) => "property",
            NodeKind::Association(_) => "association",
            NodeKind::Function(_) => "function",
            NodeKind::Profile(_) => "profile",
            NodeKind::Stereotype { .. } => "stereotype",
            NodeKind::Tag { .. } => "tag",
            NodeKind::ImportGroup(_) => "import group",
            NodeKind::Path(_) => "path",
            NodeKind::Stub(stub) => stub.kind.label(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PackageData {
    /// Children in declaration order.
    pub children: IndexMap<SmolStr, NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct TypeData {
    pub type_parameters: Vec<TypeParameter>,
    pub multiplicity_parameters: Vec<SmolStr>,
    /// Direct supertypes in declaration order.
    pub generalizations: Vec<GenericType>,
    /// Direct subtypes, maintained by the back-reference index.
    pub specializations: Vec<NodeId>,
    pub properties: Vec<NodeId>,
    pub qualified_properties: Vec<NodeId>,
    /// Properties contributed by associations.
    pub properties_from_associations: Vec<NodeId>,
    pub qualified_properties_from_associations: Vec<NodeId>,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, Default)]
pub struct EnumerationData {
    pub type_data: TypeData,
    pub values: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct PropertyData {
    /// The class or association declaring the property.
    pub owner: NodeId,
    pub generic_type: GenericType,
    pub multiplicity: Multiplicity,
    pub qualified: bool,
    /// Parameters of a qualified property, without the implicit `this`.
    pub parameters: Vec<crate::generic_type::Parameter>,
}

#[derive(Debug, Clone, Default)]
pub struct AssociationData {
    pub properties: Vec<NodeId>,
    pub qualified_properties: Vec<NodeId>,
    /// `(class, property)` pairs added to classes while processing.
    pub contributions: Vec<(NodeId, NodeId)>,
}

#[derive(Debug, Clone)]
pub struct FunctionData {
    /// The user-facing name, without signature.
    pub function_name: SmolStr,
    pub function_type: FunctionType,
    pub type_parameters: Vec<TypeParameter>,
    pub multiplicity_parameters: Vec<SmolStr>,
    /// Calls made from the body, resolved against candidate functions.
    pub calls: Vec<Call>,
    /// Enum value stubs and other element references made by the body.
    pub references: Vec<NodeId>,
    pub annotations: Annotations,
}

/// A call to a named function from a function body.
#[derive(Debug, Clone)]
pub struct Call {
    /// Simple or qualified name as written.
    pub function_name: SmolStr,
    pub import_group: NodeId,
    pub arguments: Vec<Argument>,
    pub resolution: Resolution,
    pub source: Option<SourceInformation>,
}

impl Call {
    pub fn new(function_name: impl Into<SmolStr>, import_group: NodeId, arguments: Vec<Argument>) -> Self {
        Self {
            function_name: function_name.into(),
            import_group,
            arguments,
            resolution: Resolution::Unresolved,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Option<SourceInformation>) -> Self {
        self.source = source;
        self
    }
}

/// The inferred type of a call argument. `None` parts stand for a null value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Argument {
    pub generic_type: Option<GenericType>,
    pub multiplicity: Option<Multiplicity>,
}

impl Argument {
    pub fn new(generic_type: GenericType, multiplicity: Multiplicity) -> Self {
        Self {
            generic_type: Some(generic_type),
            multiplicity: Some(multiplicity),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileData {
    pub stereotypes: Vec<NodeId>,
    pub tags: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Annotations {
    /// Stereotype stubs.
    pub stereotypes: Vec<NodeId>,
    pub tagged_values: Vec<TaggedValue>,
}

#[derive(Debug, Clone)]
pub struct TaggedValue {
    /// Tag stub.
    pub tag: NodeId,
    pub value: SmolStr,
}

#[derive(Debug, Clone, Default)]
pub struct ImportGroupData {
    /// Imported package paths, as written.
    pub imports: Vec<SmolStr>,
}

/// A navigation path: a start type followed by property steps.
#[derive(Debug, Clone)]
pub struct PathData {
    /// Import stub for the start class.
    pub start: NodeId,
    /// Property stubs, each owned by the previous step.
    pub steps: Vec<NodeId>,
}
