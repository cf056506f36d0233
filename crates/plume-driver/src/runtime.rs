//! The incremental compiler runtime.
//!
//! A runtime owns the graph and the sources it was built from. Sources are
//! created, modified and deleted freely; nothing happens to the graph until
//! [`Runtime::compile`] runs a pass:
//!
//! 1. Parse every pending source document.
//! 2. Unbind the elements of changed sources, everything that depended on
//!    them, and everything that mentions a name the new documents introduce.
//!    All of these are unbound before any of them is rebound.
//! 3. Remove the elements of changed sources.
//! 4. Load the new documents.
//! 5. Process unprocessed elements: resolve their stubs and calls.
//! 6. Validate processed elements: linearize types.

use std::collections::VecDeque;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use plume_graph::{
    Annotations, Argument, Call, CompileState, GenericType, Graph, ImportGroupData, Node, NodeId,
    NodeKind, Resolution, SourceInformation, StubKind,
};
use plume_resolver::{
    call_signature, linearize, rank_all_matches, resolve, resolve_call, resolve_generic_type,
    resolve_parameters, MatchOptions, NullMatching, ResolutionError,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smol_str::SmolStr;

use crate::config::CompilerConfig;
use crate::document::SourceDocument;
use crate::error::CompilationError;
use crate::loader::{resolved_argument, Loader};
use crate::snapshot::GraphSnapshot;

#[derive(Debug, Clone)]
struct Source {
    text: String,
    import_group: Option<NodeId>,
    elements: Vec<NodeId>,
    /// Whether `elements` reflect `text`.
    loaded: bool,
}

/// What a compile pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompileReport {
    pub loaded: usize,
    pub unbound: usize,
    pub removed: usize,
    pub processed: usize,
    pub validated: usize,
}

/// The outcome of resolving an ad hoc call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallResolution {
    pub signature: String,
    /// Descriptor of the function the call binds to.
    pub best: Option<String>,
    /// Every function the call could bind to under lenient matching, best first.
    pub ranked: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Type,
    Association,
    Function,
    Path,
    Other,
}

#[derive(Debug)]
pub struct Runtime {
    graph: Graph,
    config: CompilerConfig,
    sources: IndexMap<SmolStr, Source>,
    /// Nodes owned by each loaded element.
    owned: FxHashMap<NodeId, Vec<NodeId>>,
    /// Elements and import groups to remove on the next compile.
    stale: Vec<NodeId>,
    /// Import group for ad hoc calls: core imports only.
    query_imports: NodeId,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

/// Attach a fallback location to a resolution error.
fn at(location: Option<&SourceInformation>) -> impl Fn(ResolutionError) -> CompilationError + '_ {
    move |err| err.or_location(location).into()
}

impl Runtime {
    pub fn new(config: CompilerConfig) -> Self {
        let mut graph = Graph::new();
        graph.set_core_imports(config.core_imports.clone());
        let query_imports = graph.alloc(Node::new(
            "imports_query",
            NodeKind::ImportGroup(ImportGroupData::default()),
        ));
        Self {
            graph,
            config,
            sources: IndexMap::new(),
            owned: FxHashMap::default(),
            stale: Vec::new(),
            query_imports,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(SmolStr::as_str)
    }

    pub fn source_text(&self, source_id: &str) -> Option<&str> {
        self.sources.get(source_id).map(|source| source.text.as_str())
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(&self.graph)
    }

    pub fn create_source(
        &mut self,
        source_id: impl Into<SmolStr>,
        text: impl Into<String>,
    ) -> Result<(), CompilationError> {
        let source_id = source_id.into();
        if self.sources.contains_key(&source_id) {
            return Err(CompilationError::SourceExists(source_id));
        }
        self.sources.insert(
            source_id,
            Source {
                text: text.into(),
                import_group: None,
                elements: Vec::new(),
                loaded: false,
            },
        );
        Ok(())
    }

    pub fn modify_source(&mut self, source_id: &str, text: impl Into<String>) -> Result<(), CompilationError> {
        let source = self
            .sources
            .get_mut(source_id)
            .ok_or_else(|| CompilationError::SourceNotFound(SmolStr::new(source_id)))?;
        source.text = text.into();
        source.loaded = false;
        Ok(())
    }

    pub fn delete_source(&mut self, source_id: &str) -> Result<(), CompilationError> {
        let mut source = self
            .sources
            .shift_remove(source_id)
            .ok_or_else(|| CompilationError::SourceNotFound(SmolStr::new(source_id)))?;
        self.stale.append(&mut source.elements);
        self.stale.extend(source.import_group);
        Ok(())
    }

    /// Read a file into a source named after its path, replacing any previous text.
    pub fn load_file(&mut self, path: &Path) -> Result<(), CompilationError> {
        let text = std::fs::read_to_string(path).map_err(|err| CompilationError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let source_id = path.display().to_string();
        if self.sources.contains_key(source_id.as_str()) {
            self.modify_source(&source_id, text)
        } else {
            self.create_source(source_id, text)
        }
    }

    /// Run a compile pass over every pending change.
    ///
    /// The first error stops the pass. Work already committed stays in the
    /// graph and the failed elements are retried by the next pass.
    pub fn compile(&mut self) -> Result<CompileReport, CompilationError> {
        let mut report = CompileReport::default();

        if self.config.verbose {
            tracing::info!("Parsing...");
        }
        let mut documents = Vec::new();
        for (source_id, source) in &self.sources {
            if !source.loaded {
                documents.push((source_id.clone(), SourceDocument::parse(source_id, &source.text)?));
            }
        }
        for (source_id, _) in &documents {
            if let Some(source) = self.sources.get_mut(source_id) {
                self.stale.append(&mut source.elements);
                self.stale.extend(source.import_group.take());
            }
        }
        let introduced: FxHashSet<SmolStr> = documents
            .iter()
            .flat_map(|(_, document)| document.introduced_names())
            .collect();

        if self.config.verbose {
            tracing::info!("Unbinding...");
        }
        let stale = std::mem::take(&mut self.stale);
        let affected = self.affected_elements(&stale, &introduced);
        for element in &affected {
            self.unbind(*element)?;
        }
        for element in &stale {
            self.remove_element(*element);
        }
        for element in &affected {
            if self.graph.is_live(*element) {
                self.rebind(*element)?;
            }
        }
        report.removed = stale.len();
        report.unbound = affected.len();

        if self.config.verbose {
            tracing::info!("Loading {} source(s)...", documents.len());
        }
        for (source_id, document) in &documents {
            report.loaded += self.load_source(source_id, document)?;
        }

        if self.config.verbose {
            tracing::info!("Processing...");
        }
        for element in self.elements_in(CompileState::Unprocessed)? {
            self.process(element)?;
            report.processed += 1;
        }

        if self.config.verbose {
            tracing::info!("Validating...");
        }
        for element in self.elements_in(CompileState::Processed)? {
            self.validate(element)?;
            report.validated += 1;
        }

        if self.config.verbose {
            tracing::info!(
                "Compiled: {} loaded, {} unbound, {} processed",
                report.loaded,
                report.unbound,
                report.processed
            );
        }
        Ok(report)
    }

    fn load_source(&mut self, source_id: &SmolStr, document: &SourceDocument) -> Result<usize, CompilationError> {
        let Some(text) = self.sources.get(source_id).map(|source| source.text.clone()) else {
            return Ok(0);
        };
        let mut loader = Loader::new(&mut self.graph, source_id, &text, document)?;
        let import_group = loader.import_group();
        let mut loaded = Vec::with_capacity(document.elements.len());
        let result = document.elements.iter().try_for_each(|element| {
            loaded.push(loader.load(element)?);
            Ok::<_, CompilationError>(())
        });

        // Whatever did load is recorded so the next pass can remove it.
        if let Some(source) = self.sources.get_mut(source_id) {
            source.import_group = Some(import_group);
            source.elements = loaded.iter().map(|element| element.id).collect();
            source.loaded = result.is_ok();
        }
        let count = loaded.len();
        for element in loaded {
            self.owned.insert(element.id, element.owned);
        }
        result.map(|()| count)
    }

    /// Loaded elements in the given state, associations first, then in source order.
    fn elements_in(&self, state: CompileState) -> Result<Vec<NodeId>, CompilationError> {
        let mut associations = Vec::new();
        let mut others = Vec::new();
        for source in self.sources.values() {
            for element in &source.elements {
                if self.graph.node(*element)?.state != state {
                    continue;
                }
                match self.element_kind(*element)? {
                    ElementKind::Association => associations.push(*element),
                    _ => others.push(*element),
                }
            }
        }
        associations.append(&mut others);
        Ok(associations)
    }

    fn element_kind(&self, element: NodeId) -> Result<ElementKind, CompilationError> {
        let node = self.graph.node(element)?;
        Ok(match node.kind {
            NodeKind::Class(_) | NodeKind::PrimitiveType(_) | NodeKind::Enumeration(_) => ElementKind::Type,
            NodeKind::Association(_) => ElementKind::Association,
            NodeKind::Function(_) => ElementKind::Function,
            NodeKind::Path(_) => ElementKind::Path,
            _ => ElementKind::Other,
        })
    }

    /// The closure of `stale`, plus elements mentioning an introduced name,
    /// over the referrer relation.
    fn affected_elements(&self, stale: &[NodeId], introduced: &FxHashSet<SmolStr>) -> IndexSet<NodeId> {
        let mut queue: VecDeque<NodeId> = stale.iter().copied().collect();
        if !introduced.is_empty() {
            for source in self.sources.values() {
                for element in &source.elements {
                    let processed = self
                        .graph
                        .node(*element)
                        .is_ok_and(|node| node.state != CompileState::Unprocessed);
                    if processed
                        && self
                            .mentioned_names(*element)
                            .iter()
                            .any(|name| introduced.contains(name))
                    {
                        queue.push_back(*element);
                    }
                }
            }
        }

        let mut affected = IndexSet::new();
        while let Some(element) = queue.pop_front() {
            if !self.graph.is_live(element) || !affected.insert(element) {
                continue;
            }
            queue.extend(self.graph.referrers(element));
        }
        affected
    }

    /// Simple names an element's stubs and calls refer to.
    fn mentioned_names(&self, element: NodeId) -> Vec<SmolStr> {
        let mut names = Vec::new();
        for id in self.owned.get(&element).into_iter().flatten() {
            let Ok(stub) = self.graph.stub(*id) else {
                continue;
            };
            match &stub.kind {
                StubKind::Import { id_or_path, .. } => {
                    for part in id_or_path.split(['@', '%']) {
                        let simple = part.rsplit("::").next().unwrap_or(part);
                        names.push(SmolStr::new(simple));
                    }
                }
                StubKind::Property { property_name, .. } => names.push(property_name.clone()),
                StubKind::Enum { enum_name, .. } => names.push(enum_name.clone()),
                StubKind::GrammarInfo { .. } => {}
            }
        }
        if let Ok(function) = self.graph.function(element) {
            for call in &function.calls {
                let name = call.function_name.as_str();
                names.push(SmolStr::new(name.rsplit("::").next().unwrap_or(name)));
            }
        }
        names
    }

    /// Tear down everything processing recorded for an element and invalidate its stubs.
    fn unbind(&mut self, element: NodeId) -> Result<(), CompilationError> {
        tracing::debug!(element = %self.graph.user_path(element), "unbinding");

        let generalizations: Vec<NodeId> = self
            .graph
            .node(element)?
            .type_data()
            .map(|data| data.generalizations.iter().filter_map(GenericType::raw_node).collect())
            .unwrap_or_default();
        for general in generalizations {
            let parent = self.graph.resolve_through(general)?;
            if let Ok(data) = self.graph.type_data_mut(parent) {
                data.specializations.retain(|child| *child != element);
            }
        }

        let contributions = match &mut self.graph.node_mut(element)?.kind {
            NodeKind::Association(data) => std::mem::take(&mut data.contributions),
            NodeKind::Function(data) => {
                for call in &mut data.calls {
                    call.resolution = Resolution::Invalidated;
                }
                Vec::new()
            }
            _ => Vec::new(),
        };
        for (class, property) in contributions {
            if let Ok(data) = self.graph.type_data_mut(class) {
                data.properties_from_associations.retain(|p| *p != property);
                data.qualified_properties_from_associations.retain(|p| *p != property);
            }
        }

        for id in self.owned.get(&element).into_iter().flatten() {
            if self.graph.is_stub(*id) {
                self.graph.set_resolution(*id, Resolution::Invalidated)?;
            }
        }
        self.graph.clear_references_from(element);
        self.graph.node_mut(element)?.state = CompileState::Unprocessed;
        Ok(())
    }

    /// Make an unbound element's stubs and calls resolvable again.
    fn rebind(&mut self, element: NodeId) -> Result<(), CompilationError> {
        for id in self.owned.get(&element).into_iter().flatten() {
            if self.graph.is_stub(*id) {
                self.graph.set_resolution(*id, Resolution::Unresolved)?;
            }
        }
        if let NodeKind::Function(data) = &mut self.graph.node_mut(element)?.kind {
            for call in &mut data.calls {
                call.resolution = Resolution::Unresolved;
            }
        }
        Ok(())
    }

    fn remove_element(&mut self, element: NodeId) {
        tracing::debug!(element = %self.graph.user_path(element), "removing");
        for id in self.owned.remove(&element).unwrap_or_default() {
            self.graph.remove(id);
        }
        self.graph.clear_references_from(element);
        self.graph.clear_references_to(element);
        self.graph.remove(element);
    }

    fn process(&mut self, element: NodeId) -> Result<(), CompilationError> {
        tracing::debug!(element = %self.graph.user_path(element), "processing");
        match self.element_kind(element)? {
            ElementKind::Type => self.process_type(element)?,
            ElementKind::Association => self.process_association(element)?,
            ElementKind::Function => self.process_function(element)?,
            ElementKind::Path => self.process_path(element)?,
            ElementKind::Other => {}
        }
        self.graph.node_mut(element)?.state = CompileState::Processed;
        Ok(())
    }

    fn process_type(&mut self, element: NodeId) -> Result<(), CompilationError> {
        let location = self.graph.node(element)?.source.clone();
        let data = self.graph.type_data(element)?;
        let generalizations = data.generalizations.clone();
        let properties: Vec<NodeId> = data
            .properties
            .iter()
            .chain(&data.qualified_properties)
            .copied()
            .collect();
        let annotations = data.annotations.clone();

        for general in &generalizations {
            let general = resolve_generic_type(&mut self.graph, general).map_err(at(location.as_ref()))?;
            let Some(parent) = general.raw_node() else {
                continue;
            };
            let data = self
                .graph
                .type_data_mut(parent)
                .map_err(|err| CompilationError::graph(err, location.clone()))?;
            if !data.specializations.contains(&element) {
                data.specializations.push(element);
            }
        }
        for property in properties {
            self.process_property(property)?;
        }
        self.process_annotations(&annotations, location.as_ref())
    }

    fn process_property(&mut self, property: NodeId) -> Result<(), CompilationError> {
        let node = self.graph.node(property)?;
        let location = node.source.clone();
        let NodeKind::Property(data) = &node.kind else {
            return Ok(());
        };
        let generic_type = data.generic_type.clone();
        let parameters = data.parameters.clone();
        resolve_generic_type(&mut self.graph, &generic_type).map_err(at(location.as_ref()))?;
        resolve_parameters(&mut self.graph, &parameters).map_err(at(location.as_ref()))?;
        Ok(())
    }

    fn process_annotations(
        &mut self,
        annotations: &Annotations,
        location: Option<&SourceInformation>,
    ) -> Result<(), CompilationError> {
        let stubs = annotations
            .stereotypes
            .iter()
            .chain(annotations.tagged_values.iter().map(|tagged| &tagged.tag));
        for stub in stubs {
            resolve(&mut self.graph, *stub).map_err(at(location))?;
        }
        Ok(())
    }

    fn process_association(&mut self, element: NodeId) -> Result<(), CompilationError> {
        let location = self.graph.node(element)?.source.clone();
        let NodeKind::Association(data) = &self.graph.node(element)?.kind else {
            return Ok(());
        };
        let properties = data.properties.clone();
        let qualified_properties = data.qualified_properties.clone();
        for property in properties.iter().chain(&qualified_properties) {
            self.process_property(*property)?;
        }

        // Each end is added to the class typing the other end.
        let mut contributions = Vec::new();
        if let [first, second] = properties.as_slice() {
            let first_class = self.property_class(*first, location.as_ref())?;
            let second_class = self.property_class(*second, location.as_ref())?;
            contributions.push((first_class, *second));
            contributions.push((second_class, *first));
        }
        for property in &qualified_properties {
            let receiver = match &self.graph.node(*property)?.kind {
                NodeKind::Property(data) => data
                    .parameters
                    .first()
                    .and_then(|this| this.generic_type.raw_node()),
                _ => None,
            };
            if let Some(receiver) = receiver {
                contributions.push((self.graph.resolve_through(receiver)?, *property));
            }
        }

        for (class, property) in &contributions {
            let qualified = matches!(
                &self.graph.node(*property)?.kind,
                NodeKind::Property(data) if data.qualified
            );
            let data = self
                .graph
                .type_data_mut(*class)
                .map_err(|err| CompilationError::graph(err, location.clone()))?;
            let target = if qualified {
                &mut data.qualified_properties_from_associations
            } else {
                &mut data.properties_from_associations
            };
            if !target.contains(property) {
                target.push(*property);
            }
        }
        if let NodeKind::Association(data) = &mut self.graph.node_mut(element)?.kind {
            data.contributions = contributions;
        }
        Ok(())
    }

    /// The resolved class of a processed property.
    fn property_class(
        &self,
        property: NodeId,
        location: Option<&SourceInformation>,
    ) -> Result<NodeId, CompilationError> {
        let raw = match &self.graph.node(property)?.kind {
            NodeKind::Property(data) => data.generic_type.raw_node(),
            _ => None,
        };
        let Some(raw) = raw else {
            return Err(CompilationError::document(
                location.map_or("", |location| location.source_id.as_str()),
                format!(
                    "association end '{}' must be typed by a class",
                    self.graph.node(property)?.name
                ),
                location.cloned(),
            ));
        };
        Ok(self.graph.resolve_through(raw)?)
    }

    fn process_function(&mut self, element: NodeId) -> Result<(), CompilationError> {
        let location = self.graph.node(element)?.source.clone();
        let data = self.graph.function(element)?;
        let function_type = data.function_type.clone();
        let references = data.references.clone();
        let annotations = data.annotations.clone();
        let call_count = data.calls.len();

        resolve_parameters(&mut self.graph, &function_type.parameters).map_err(at(location.as_ref()))?;
        resolve_generic_type(&mut self.graph, &function_type.return_type).map_err(at(location.as_ref()))?;
        for reference in references {
            resolve(&mut self.graph, reference).map_err(at(location.as_ref()))?;
        }
        self.process_annotations(&annotations, location.as_ref())?;
        for index in 0..call_count {
            self.process_call(element, index)?;
        }
        Ok(())
    }

    fn process_call(&mut self, element: NodeId, index: usize) -> Result<(), CompilationError> {
        let Some(call) = self.graph.function(element)?.calls.get(index).cloned() else {
            return Ok(());
        };
        let options = self.config.match_options();
        if options.null_matching == NullMatching::Lenient
            && call
                .arguments
                .iter()
                .any(|argument| argument.generic_type.is_none() || argument.multiplicity.is_none())
        {
            tracing::warn!(
                call = %call.function_name,
                "matching a call with unknown argument types; equally ranked candidates are chosen by descriptor"
            );
        }

        let target = match resolve_call(&mut self.graph, &call, options) {
            Ok(Some(target)) => target,
            Ok(None) => {
                return Err(CompilationError::no_matching_function(
                    call_signature(&self.graph, &call),
                    call.source.clone(),
                ))
            }
            Err(err) => return Err(at(call.source.as_ref())(err)),
        };
        if let Some(slot) = self.graph.function_mut(element)?.calls.get_mut(index) {
            slot.resolution = Resolution::Resolved(target);
        }
        self.graph.add_reference(element, target);
        tracing::debug!(
            call = %call.function_name,
            function = %self.graph.function_descriptor(target)?,
            "resolved call"
        );
        Ok(())
    }

    fn process_path(&mut self, element: NodeId) -> Result<(), CompilationError> {
        let location = self.graph.node(element)?.source.clone();
        let NodeKind::Path(data) = &self.graph.node(element)?.kind else {
            return Ok(());
        };
        let stubs: Vec<NodeId> = std::iter::once(data.start).chain(data.steps.iter().copied()).collect();
        for stub in stubs {
            resolve(&mut self.graph, stub).map_err(at(location.as_ref()))?;
        }
        Ok(())
    }

    fn validate(&mut self, element: NodeId) -> Result<(), CompilationError> {
        if self.element_kind(element)? == ElementKind::Type {
            let location = self.graph.node(element)?.source.clone();
            linearize(&mut self.graph, element).map_err(at(location.as_ref()))?;
        }
        self.graph.node_mut(element)?.state = CompileState::Validated;
        Ok(())
    }

    fn element_by_path(&self, path: &str) -> Result<NodeId, CompilationError> {
        self.graph.find_by_path(path).ok_or_else(|| {
            ResolutionError::UnresolvedIdentifier {
                path: SmolStr::new(path),
                id: SmolStr::new(path.rsplit("::").next().unwrap_or(path)),
                import_group: None,
                location: None,
            }
            .into()
        })
    }

    /// User paths of a type's linearization.
    pub fn linearize(&mut self, path: &str) -> Result<Vec<String>, CompilationError> {
        let ty = self.element_by_path(path)?;
        let linearization = linearize(&mut self.graph, ty)?;
        Ok(linearization
            .into_iter()
            .map(|ty| self.graph.user_path(ty))
            .collect())
    }

    /// Find a function by descriptor, such as `pkg::f(String[1]):Boolean[1]`.
    pub fn find_function(&self, descriptor: &str) -> Result<Option<NodeId>, CompilationError> {
        Ok(self.graph.function_by_descriptor(descriptor)?)
    }

    /// Resolve a call to `function` with arguments written as typed values
    /// (`Integer[1]`); `None` stands for an argument of unknown type.
    pub fn resolve_query(
        &mut self,
        function: &str,
        arguments: &[Option<String>],
    ) -> Result<CallResolution, CompilationError> {
        let arguments = arguments
            .iter()
            .map(|argument| match argument {
                Some(text) => resolved_argument(&self.graph, text, self.query_imports),
                None => Ok(Argument::default()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let call = Call::new(function, self.query_imports, arguments);

        let best = resolve_call(&mut self.graph, &call, self.config.match_options())?
            .map(|target| self.graph.function_descriptor(target))
            .transpose()?;
        let ranked = rank_all_matches(&mut self.graph, &call, MatchOptions::lenient())?
            .into_iter()
            .map(|target| self.graph.function_descriptor(target))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CallResolution {
            signature: call_signature(&self.graph, &call),
            best,
            ranked,
        })
    }
}
