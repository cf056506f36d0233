//! Stubs: placeholders for references that are bound lazily.

use smol_str::SmolStr;

use crate::node::NodeId;

/// What a stub refers to before it is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubKind {
    /// A bare name or a qualified path, looked up through an import group.
    Import {
        id_or_path: SmolStr,
        import_group: NodeId,
    },
    /// A property named on an owner type (the owner may itself be a stub).
    Property { owner: NodeId, property_name: SmolStr },
    /// An enum value named on an enumeration (the enumeration may be a stub).
    Enum {
        enumeration: NodeId,
        enum_name: SmolStr,
    },
    /// A wrapper carrying grammar-level information around another element.
    GrammarInfo { value: NodeId },
}

impl StubKind {
    pub fn label(&self) -> &'static str {
        match self {
            StubKind::Import { .. } => "import stub",
            StubKind::Property { .. } => "property stub",
            StubKind::Enum { .. } => "enum stub",
            StubKind::GrammarInfo { .. } => "grammar info stub",
        }
    }
}

/// The binding state of a stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    Unresolved,
    Resolved(NodeId),
    /// The previous binding is being torn down and must not be read.
    Invalidated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stub {
    pub kind: StubKind,
    pub resolution: Resolution,
}

impl Stub {
    pub fn new(kind: StubKind) -> Self {
        Self {
            kind,
            resolution: Resolution::Unresolved,
        }
    }

    pub fn resolved(&self) -> Option<NodeId> {
        match self.resolution {
            Resolution::Resolved(id) => Some(id),
            _ => None,
        }
    }

    /// The text a user wrote for this reference, used in messages.
    pub fn display_name(&self) -> &str {
        match &self.kind {
            StubKind::Import { id_or_path, .. } => id_or_path,
            StubKind::Property { property_name, .. } => property_name,
            StubKind::Enum { enum_name, .. } => enum_name,
            StubKind::GrammarInfo { .. } => "<grammar info>",
        }
    }
}
