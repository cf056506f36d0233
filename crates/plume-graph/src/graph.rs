//! The element graph: an arena of nodes plus the indices kept beside it.

use indexmap::IndexSet;
use la_arena::Arena;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::error::GraphError;
use crate::node::{
    CompileState, FunctionData, Node, NodeId, NodeKind, PackageData, Slot, TypeData,
};
use crate::stub::{Resolution, Stub};

/// Ids of the bootstrapped elements the compiler refers to directly.
#[derive(Debug, Clone, Copy)]
pub struct WellKnown {
    pub root: NodeId,
    /// The top type.
    pub any: NodeId,
    /// The bottom type.
    pub nil: NodeId,
    pub function: NodeId,
    pub enum_type: NodeId,
    pub package: NodeId,
}

/// The program graph.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Arena<Slot>,
    well_known: WellKnown,
    /// Elements reachable by bare name from anywhere.
    top_level: FxHashMap<SmolStr, NodeId>,
    /// Packages implicitly imported by every import group.
    core_imports: Vec<SmolStr>,
    /// Function elements keyed by their simple name.
    functions_by_name: FxHashMap<SmolStr, Vec<NodeId>>,
    /// Element to the elements its compilation depended on.
    references: FxHashMap<NodeId, IndexSet<NodeId>>,
    /// Element to the elements whose compilation depended on it.
    referrers: FxHashMap<NodeId, IndexSet<NodeId>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create a graph holding the root package and the built-in types.
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Slot::Live(
            Node::new("Root", NodeKind::Package(PackageData::default()))
                .with_state(CompileState::Validated),
        ));
        let mut graph = Self {
            nodes,
            well_known: WellKnown {
                root,
                any: root,
                nil: root,
                function: root,
                enum_type: root,
                package: root,
            },
            top_level: FxHashMap::default(),
            core_imports: Vec::new(),
            functions_by_name: FxHashMap::default(),
            references: FxHashMap::default(),
            referrers: FxHashMap::default(),
        };
        graph.top_level.insert(SmolStr::new("Root"), root);
        crate::bootstrap::bootstrap(&mut graph);
        graph
    }

    pub fn root(&self) -> NodeId {
        self.well_known.root
    }

    pub fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    pub(crate) fn well_known_mut(&mut self) -> &mut WellKnown {
        &mut self.well_known
    }

    pub fn core_imports(&self) -> &[SmolStr] {
        &self.core_imports
    }

    pub fn set_core_imports(&mut self, imports: Vec<SmolStr>) {
        self.core_imports = imports;
    }

    /// Allocate a node without attaching it to a package.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.alloc(Slot::Live(node))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        match &self.nodes[id] {
            Slot::Live(node) => Ok(node),
            Slot::Removed => Err(GraphError::RemovedNode(id)),
        }
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        match &mut self.nodes[id] {
            Slot::Live(node) => Ok(node),
            Slot::Removed => Err(GraphError::RemovedNode(id)),
        }
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        matches!(self.nodes[id], Slot::Live(_))
    }

    pub fn live_nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().filter_map(|(id, slot)| match slot {
            Slot::Live(node) => Some((id, node)),
            Slot::Removed => None,
        })
    }

    /// Tombstone a node and detach it from its package and the function index.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let Slot::Live(node) = std::mem::replace(&mut self.nodes[id], Slot::Removed) else {
            return None;
        };

        if let Some(package) = node.package {
            if let Ok(Node {
                kind: NodeKind::Package(data),
                ..
            }) = self.node_mut(package)
            {
                if data.children.get(&node.name) == Some(&id) {
                    data.children.shift_remove(&node.name);
                }
            }
        }

        if let NodeKind::Function(function) = &node.kind {
            if let Some(ids) = self.functions_by_name.get_mut(&function.function_name) {
                ids.retain(|candidate| *candidate != id);
                if ids.is_empty() {
                    self.functions_by_name.remove(&function.function_name);
                }
            }
        }

        Some(node)
    }

    pub fn type_data(&self, id: NodeId) -> Result<&TypeData, GraphError> {
        let node = self.node(id)?;
        node.type_data().ok_or(GraphError::UnexpectedKind {
            expected: "type",
            found: node.kind.label(),
        })
    }

    pub fn type_data_mut(&mut self, id: NodeId) -> Result<&mut TypeData, GraphError> {
        let node = self.node_mut(id)?;
        let found = node.kind.label();
        node.type_data_mut()
            .ok_or(GraphError::UnexpectedKind {
                expected: "type",
                found,
            })
    }

    pub fn function(&self, id: NodeId) -> Result<&FunctionData, GraphError> {
        match &self.node(id)?.kind {
            NodeKind::Function(data) => Ok(data),
            other => Err(GraphError::UnexpectedKind {
                expected: "function",
                found: other.label(),
            }),
        }
    }

    pub fn function_mut(&mut self, id: NodeId) -> Result<&mut FunctionData, GraphError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Function(data) => Ok(data),
            other => Err(GraphError::UnexpectedKind {
                expected: "function",
                found: other.label(),
            }),
        }
    }

    pub fn stub(&self, id: NodeId) -> Result<&Stub, GraphError> {
        match &self.node(id)?.kind {
            NodeKind::Stub(stub) => Ok(stub),
            other => Err(GraphError::UnexpectedKind {
                expected: "stub",
                found: other.label(),
            }),
        }
    }

    pub fn is_stub(&self, id: NodeId) -> bool {
        matches!(self.node(id), Ok(Node { kind: NodeKind::Stub(_), .. }))
    }

    pub fn set_resolution(&mut self, id: NodeId, resolution: Resolution) -> Result<(), GraphError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Stub(stub) => {
                stub.resolution = resolution;
                Ok(())
            }
            other => Err(GraphError::UnexpectedKind {
                expected: "stub",
                found: other.label(),
            }),
        }
    }

    /// Follow resolved stubs to the element they stand for.
    ///
    /// Unresolved stubs and ordinary elements are returned unchanged.
    pub fn resolve_through(&self, id: NodeId) -> Result<NodeId, GraphError> {
        let mut current = id;
        while let NodeKind::Stub(stub) = &self.node(current)?.kind {
            match stub.resolution {
                Resolution::Resolved(target) => current = target,
                _ => break,
            }
        }
        Ok(current)
    }

    pub fn is_top_type(&self, id: NodeId) -> bool {
        id == self.well_known.any
    }

    pub fn is_bottom_type(&self, id: NodeId) -> bool {
        id == self.well_known.nil
    }

    pub fn top_level(&self, name: &str) -> Option<NodeId> {
        self.top_level.get(name).copied()
    }

    pub(crate) fn register_top_level(&mut self, name: SmolStr, id: NodeId) {
        self.top_level.insert(name, id);
    }

    pub fn find_in_package(&self, package: NodeId, name: &str) -> Option<NodeId> {
        match self.node(package).ok()?.kind {
            NodeKind::Package(ref data) => data.children.get(name).copied(),
            _ => None,
        }
    }

    pub fn package_children(&self, package: NodeId) -> Result<Vec<NodeId>, GraphError> {
        match &self.node(package)?.kind {
            NodeKind::Package(data) => Ok(data.children.values().copied().collect()),
            other => Err(GraphError::UnexpectedKind {
                expected: "package",
                found: other.label(),
            }),
        }
    }

    /// Look up an element by user path (`a::b::C`), including `Root` and top-level types.
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        if let Some(id) = self.top_level(path) {
            return Some(id);
        }
        let mut current = self.root();
        for segment in path.split("::") {
            current = self.find_in_package(current, segment.trim())?;
        }
        Some(current)
    }

    /// Return the package at `path`, creating missing packages on the way.
    pub fn ensure_package(&mut self, path: &str) -> Result<NodeId, GraphError> {
        let mut current = self.root();
        if path.is_empty() || path == "Root" {
            return Ok(current);
        }
        for segment in path.split("::") {
            let segment = segment.trim();
            current = match self.find_in_package(current, segment) {
                Some(existing) => match self.node(existing)?.kind {
                    NodeKind::Package(_) => existing,
                    _ => return Err(GraphError::NotAPackage(SmolStr::new(segment))),
                },
                None => {
                    let package = Node::new(segment, NodeKind::Package(PackageData::default()))
                        .with_package(current)
                        .with_state(CompileState::Validated);
                    self.add_element(current, package)?
                }
            };
        }
        Ok(current)
    }

    /// Allocate a packageable element and attach it to `package`.
    pub fn add_element(&mut self, package: NodeId, mut node: Node) -> Result<NodeId, GraphError> {
        if self.find_in_package(package, &node.name).is_some() {
            return Err(GraphError::DuplicateElement {
                name: node.name.clone(),
                package: self.user_path(package),
            });
        }
        if !matches!(self.node(package)?.kind, NodeKind::Package(_)) {
            return Err(GraphError::NotAPackage(self.node(package)?.name.clone()));
        }

        node.package = Some(package);
        let name = node.name.clone();
        let function_name = match &node.kind {
            NodeKind::Function(function) => Some(function.function_name.clone()),
            _ => None,
        };
        let id = self.alloc(node);

        if let NodeKind::Package(data) = &mut self.node_mut(package)?.kind {
            data.children.insert(name, id);
        }
        if let Some(function_name) = function_name {
            self.functions_by_name.entry(function_name).or_default().push(id);
        }
        Ok(id)
    }

    /// The fully qualified path of an element, `Root` children printing bare.
    pub fn user_path(&self, id: NodeId) -> String {
        let Ok(node) = self.node(id) else {
            return String::from("<removed>");
        };
        match node.package {
            Some(package) if package != self.root() => {
                format!("{}::{}", self.user_path(package), node.name)
            }
            _ => node.name.to_string(),
        }
    }

    /// Packages searched for a bare name: explicit imports first, then core imports.
    pub fn import_group_packages(&self, import_group: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let imports = match &self.node(import_group)?.kind {
            NodeKind::ImportGroup(data) => &data.imports,
            other => {
                return Err(GraphError::UnexpectedKind {
                    expected: "import group",
                    found: other.label(),
                })
            }
        };

        let mut packages = IndexSet::new();
        for path in imports.iter().chain(self.core_imports.iter()) {
            if let Some(package) = self.find_by_path(path) {
                if matches!(self.node(package)?.kind, NodeKind::Package(_)) {
                    packages.insert(package);
                }
            }
        }
        Ok(packages.into_iter().collect())
    }

    /// Function elements with the given simple name.
    pub fn functions_named(&self, name: &str) -> &[NodeId] {
        self.functions_by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The top-level element a node belongs to.
    pub fn element_of(&self, id: NodeId) -> NodeId {
        self.node(id).ok().and_then(|node| node.owner).unwrap_or(id)
    }

    /// Record that compiling `from` depended on `to`. Both ends are lifted to elements.
    pub fn add_reference(&mut self, from: NodeId, to: NodeId) {
        let from = self.element_of(from);
        let to = self.element_of(to);
        if from == to {
            return;
        }
        self.references.entry(from).or_default().insert(to);
        self.referrers.entry(to).or_default().insert(from);
    }

    /// Elements whose compilation depended on `element`.
    pub fn referrers(&self, element: NodeId) -> Vec<NodeId> {
        self.referrers
            .get(&element)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Elements `element` depended on.
    pub fn references(&self, element: NodeId) -> Vec<NodeId> {
        self.references
            .get(&element)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Drop every forward edge of `element` and the matching back edges.
    pub fn clear_references_from(&mut self, element: NodeId) {
        let Some(targets) = self.references.remove(&element) else {
            return;
        };
        for target in targets {
            if let Some(set) = self.referrers.get_mut(&target) {
                set.shift_remove(&element);
                if set.is_empty() {
                    self.referrers.remove(&target);
                }
            }
        }
    }

    /// Drop every back edge pointing at `element`, along with the forward edges.
    pub fn clear_references_to(&mut self, element: NodeId) {
        let Some(sources) = self.referrers.remove(&element) else {
            return;
        };
        for source in sources {
            if let Some(set) = self.references.get_mut(&source) {
                set.shift_remove(&element);
                if set.is_empty() {
                    self.references.remove(&source);
                }
            }
        }
    }
}
