//! Building graph elements and their stubs from model documents.

use plume_graph::{
    Annotations, Argument, AssociationData, Call, EnumerationData, FunctionData, FunctionType,
    GenericType, Graph, ImportGroupData, Multiplicity, Node, NodeId, NodeKind, Parameter,
    PathData, ProfileData, PropertyData, SourceInformation, Span, Stub, StubKind, TaggedValue,
    TypeData, TypeParameter,
};
use plume_syntax::{
    parse_multiplicity, parse_type, parse_type_parameter, parse_typed_value, MultiplicityExpr,
    TypeExpr,
};
use smol_str::SmolStr;

use crate::document::{
    AssociationDecl, ClassDecl, ElementDecl, EnumerationDecl, FunctionDecl, ParameterDecl,
    PathDecl, ProfileDecl, PropertyDecl, QualifiedPropertyDecl, SourceDocument, TaggedValueDecl,
};
use crate::error::CompilationError;

/// An element created by the loader, with the nodes it owns.
#[derive(Debug, Clone)]
pub struct LoadedElement {
    pub id: NodeId,
    /// Stubs, properties, enum values and profile members created for the element.
    pub owned: Vec<NodeId>,
}

/// Finds source locations by searching the document text for quoted strings.
struct Locator<'a> {
    source_id: &'a str,
    text: &'a str,
}

impl Locator<'_> {
    /// Locate `"needle"`, preferring an occurrence at or after `from`.
    fn find(&self, needle: &str, from: u32) -> Option<SourceInformation> {
        let quoted = format!("\"{needle}\"");
        let from = (from as usize).min(self.text.len());
        let start = self
            .text
            .get(from..)
            .and_then(|rest| rest.find(&quoted))
            .map(|offset| offset + from)
            .or_else(|| self.text.find(&quoted))?;
        // Skip the opening quote.
        let start = start as u32 + 1;
        Some(SourceInformation::locate(
            self.source_id,
            self.text,
            Span::new(start, start + needle.len() as u32),
        ))
    }
}

pub struct Loader<'a> {
    graph: &'a mut Graph,
    locator: Locator<'a>,
    import_group: NodeId,
    package: NodeId,
    /// The element attached to the package by the current `load`.
    added: Option<NodeId>,
}

/// Names that stand for type parameters while converting type expressions.
#[derive(Default)]
struct Scope<'s> {
    type_parameters: &'s [TypeParameter],
}

impl Scope<'_> {
    fn is_parameter(&self, name: &str) -> bool {
        self.type_parameters.iter().any(|param| param.name == name)
    }
}

impl<'a> Loader<'a> {
    /// Create the import group for a document and prepare to load its elements.
    pub fn new(
        graph: &'a mut Graph,
        source_id: &'a str,
        text: &'a str,
        document: &SourceDocument,
    ) -> Result<Self, CompilationError> {
        let package = graph
            .ensure_package(&document.package)
            .map_err(|err| CompilationError::graph(err, None))?;
        // A document always sees its own package.
        let mut imports: Vec<SmolStr> = document.imports.iter().map(SmolStr::new).collect();
        if !document.package.is_empty() {
            imports.push(SmolStr::new(&document.package));
        }
        let import_group = graph.alloc(Node::new(
            format!("imports_{source_id}"),
            NodeKind::ImportGroup(ImportGroupData { imports }),
        ));
        Ok(Self {
            graph,
            locator: Locator { source_id, text },
            import_group,
            package,
            added: None,
        })
    }

    pub fn import_group(&self) -> NodeId {
        self.import_group
    }

    /// Load one element. On failure nothing it created is left in the graph.
    pub fn load(&mut self, decl: &ElementDecl) -> Result<LoadedElement, CompilationError> {
        let location = self.locator.find(decl.name(), 0);
        let mut owned = Vec::new();
        self.added = None;
        let loaded = match decl {
            ElementDecl::Class(decl) => self.load_class(decl, location, &mut owned),
            ElementDecl::Enumeration(decl) => self.load_enumeration(decl, location, &mut owned),
            ElementDecl::Profile(decl) => self.load_profile(decl, location, &mut owned),
            ElementDecl::Association(decl) => self.load_association(decl, location, &mut owned),
            ElementDecl::Function(decl) => self.load_function(decl, location, &mut owned),
            ElementDecl::Path(decl) => self.load_path(decl, location, &mut owned),
        };
        let id = match loaded {
            Ok(id) => id,
            Err(err) => {
                for id in owned.into_iter().chain(self.added.take()) {
                    self.graph.remove(id);
                }
                return Err(err);
            }
        };
        tracing::debug!(
            element = %self.graph.user_path(id),
            owned = owned.len(),
            "loaded element"
        );
        Ok(LoadedElement { id, owned })
    }

    fn add(&mut self, node: Node) -> Result<NodeId, CompilationError> {
        let location = node.source.clone();
        let id = self
            .graph
            .add_element(self.package, node)
            .map_err(|err| CompilationError::graph(err, location))?;
        self.added = Some(id);
        Ok(id)
    }

    /// Allocate a node for the element being loaded; ownership is set once the element exists.
    fn owned_node(&mut self, node: Node, owned: &mut Vec<NodeId>) -> NodeId {
        let id = self.graph.alloc(node);
        owned.push(id);
        id
    }

    fn set_owner(&mut self, element: NodeId, owned: &[NodeId]) -> Result<(), CompilationError> {
        for id in owned {
            self.graph.node_mut(*id)?.owner = Some(element);
        }
        Ok(())
    }

    fn import_stub(&mut self, id_or_path: &str, from: u32, owned: &mut Vec<NodeId>) -> NodeId {
        let location = self.locator.find(id_or_path, from);
        self.import_stub_at(id_or_path, location, owned)
    }

    fn import_stub_at(
        &mut self,
        id_or_path: &str,
        location: Option<SourceInformation>,
        owned: &mut Vec<NodeId>,
    ) -> NodeId {
        let stub = Node::new(
            id_or_path,
            NodeKind::Stub(Stub::new(StubKind::Import {
                id_or_path: SmolStr::new(id_or_path),
                import_group: self.import_group,
            })),
        )
        .with_source(location);
        self.owned_node(stub, owned)
    }

    fn parse_type(&self, text: &str, from: u32) -> Result<TypeExpr, CompilationError> {
        parse_type(text).map_err(|err| CompilationError::parse(err, text, self.locator.find(text, from)))
    }

    fn parse_multiplicity(&self, text: &str, from: u32) -> Result<Multiplicity, CompilationError> {
        parse_multiplicity(text)
            .map(|expr| Multiplicity::from(&expr))
            .map_err(|err| CompilationError::parse(err, text, self.locator.find(text, from)))
    }

    fn type_parameters(&self, decls: &[String], from: u32) -> Result<Vec<TypeParameter>, CompilationError> {
        decls
            .iter()
            .map(|text| {
                let param = parse_type_parameter(text)
                    .map_err(|err| CompilationError::parse(err, text, self.locator.find(text, from)))?;
                Ok(TypeParameter {
                    name: param.name,
                    contravariant: param.contravariant,
                })
            })
            .collect()
    }

    /// Convert a type expression, creating an import stub for every named type.
    fn generic_type(
        &mut self,
        expr: &TypeExpr,
        scope: &Scope<'_>,
        text: &str,
        from: u32,
        owned: &mut Vec<NodeId>,
    ) -> GenericType {
        match expr {
            TypeExpr::Named {
                path,
                type_arguments,
                multiplicity_arguments,
            } => {
                if type_arguments.is_empty() && scope.is_parameter(path) {
                    return GenericType::parameter(path.clone());
                }
                let location = self
                    .locator
                    .find(text, from)
                    .or_else(|| self.locator.find(path, from));
                let stub = self.import_stub_at(path, location, owned);
                let type_arguments = type_arguments
                    .iter()
                    .map(|arg| self.generic_type(arg, scope, text, from, owned))
                    .collect();
                GenericType::of(stub)
                    .with_type_arguments(type_arguments)
                    .with_multiplicity_arguments(
                        multiplicity_arguments.iter().map(Multiplicity::from).collect(),
                    )
            }
            TypeExpr::Function {
                parameters,
                return_type,
                return_multiplicity,
            } => GenericType::function(FunctionType {
                parameters: parameters
                    .iter()
                    .map(|(ty, mult)| {
                        Parameter::new(
                            self.generic_type(ty, scope, text, from, owned),
                            Multiplicity::from(mult),
                        )
                    })
                    .collect(),
                return_type: self.generic_type(return_type, scope, text, from, owned),
                return_multiplicity: Multiplicity::from(return_multiplicity),
            }),
        }
    }

    fn typed(
        &mut self,
        type_text: &str,
        scope: &Scope<'_>,
        from: u32,
        owned: &mut Vec<NodeId>,
    ) -> Result<GenericType, CompilationError> {
        let expr = self.parse_type(type_text, from)?;
        Ok(self.generic_type(&expr, scope, type_text, from, owned))
    }

    fn parameters(
        &mut self,
        decls: &[ParameterDecl],
        scope: &Scope<'_>,
        from: u32,
        owned: &mut Vec<NodeId>,
    ) -> Result<Vec<Parameter>, CompilationError> {
        decls
            .iter()
            .map(|param| {
                Ok(Parameter::named(
                    param.name.as_str(),
                    self.typed(&param.type_name, scope, from, owned)?,
                    self.parse_multiplicity(&param.multiplicity, from)?,
                ))
            })
            .collect()
    }

    fn annotations(
        &mut self,
        stereotypes: &[String],
        tagged_values: &[TaggedValueDecl],
        from: u32,
        owned: &mut Vec<NodeId>,
    ) -> Annotations {
        Annotations {
            stereotypes: stereotypes
                .iter()
                .map(|stereotype| self.import_stub(stereotype, from, owned))
                .collect(),
            tagged_values: tagged_values
                .iter()
                .map(|tagged| TaggedValue {
                    tag: self.import_stub(&tagged.tag, from, owned),
                    value: SmolStr::new(&tagged.value),
                })
                .collect(),
        }
    }

    fn property(
        &mut self,
        decl: &PropertyDecl,
        owner: NodeId,
        scope: &Scope<'_>,
        from: u32,
        owned: &mut Vec<NodeId>,
    ) -> Result<NodeId, CompilationError> {
        let location = self.locator.find(&decl.name, from);
        let generic_type = self.typed(&decl.type_name, scope, from, owned)?;
        let multiplicity = self.parse_multiplicity(&decl.multiplicity, from)?;
        let property = Node::new(
            decl.name.as_str(),
            NodeKind::Property(PropertyData {
                owner,
                generic_type,
                multiplicity,
                qualified: false,
                parameters: Vec::new(),
            }),
        )
        .with_source(location);
        Ok(self.owned_node(property, owned))
    }

    fn qualified_property(
        &mut self,
        decl: &QualifiedPropertyDecl,
        owner: NodeId,
        scope: &Scope<'_>,
        from: u32,
        owned: &mut Vec<NodeId>,
    ) -> Result<NodeId, CompilationError> {
        let location = self.locator.find(&decl.name, from);
        let parameters = self.parameters(&decl.parameters, scope, from, owned)?;
        let generic_type = self.typed(&decl.type_name, scope, from, owned)?;
        let multiplicity = self.parse_multiplicity(&decl.multiplicity, from)?;
        let property = Node::new(
            decl.name.as_str(),
            NodeKind::Property(PropertyData {
                owner,
                generic_type,
                multiplicity,
                qualified: true,
                parameters,
            }),
        )
        .with_source(location);
        Ok(self.owned_node(property, owned))
    }

    fn load_class(
        &mut self,
        decl: &ClassDecl,
        location: Option<SourceInformation>,
        owned: &mut Vec<NodeId>,
    ) -> Result<NodeId, CompilationError> {
        let from = location.as_ref().map_or(0, |location| location.span.start);
        let class = self.add(Node::new(decl.name.as_str(), NodeKind::Class(TypeData::default())).with_source(location))?;

        let type_parameters = self.type_parameters(&decl.type_parameters, from)?;
        let scope = Scope {
            type_parameters: &type_parameters,
        };
        let generalizations = if decl.generalizations.is_empty() {
            vec![GenericType::of(self.graph.well_known().any)]
        } else {
            decl.generalizations
                .iter()
                .map(|general| self.typed(general, &scope, from, owned))
                .collect::<Result<_, _>>()?
        };
        let properties = decl
            .properties
            .iter()
            .map(|property| self.property(property, class, &scope, from, owned))
            .collect::<Result<_, _>>()?;
        let qualified_properties = decl
            .qualified_properties
            .iter()
            .map(|property| self.qualified_property(property, class, &scope, from, owned))
            .collect::<Result<_, _>>()?;
        let annotations = self.annotations(&decl.stereotypes, &decl.tagged_values, from, owned);

        let data = self.graph.type_data_mut(class)?;
        data.multiplicity_parameters = decl.multiplicity_parameters.iter().map(SmolStr::new).collect();
        data.generalizations = generalizations;
        data.properties = properties;
        data.qualified_properties = qualified_properties;
        data.annotations = annotations;
        data.type_parameters = type_parameters;
        self.set_owner(class, owned)?;
        Ok(class)
    }

    fn load_enumeration(
        &mut self,
        decl: &EnumerationDecl,
        location: Option<SourceInformation>,
        owned: &mut Vec<NodeId>,
    ) -> Result<NodeId, CompilationError> {
        let from = location.as_ref().map_or(0, |location| location.span.start);
        let enumeration = self.add(
            Node::new(decl.name.as_str(), NodeKind::Enumeration(EnumerationData::default()))
                .with_source(location),
        )?;
        let values = decl
            .values
            .iter()
            .map(|value| {
                let node = Node::new(value.as_str(), NodeKind::EnumValue { enumeration })
                    .with_source(self.locator.find(value, from));
                self.owned_node(node, owned)
            })
            .collect();
        let annotations = self.annotations(&decl.stereotypes, &decl.tagged_values, from, owned);
        let enum_type = self.graph.well_known().enum_type;

        if let NodeKind::Enumeration(data) = &mut self.graph.node_mut(enumeration)?.kind {
            data.values = values;
            data.type_data.generalizations = vec![GenericType::of(enum_type)];
            data.type_data.annotations = annotations;
        }
        self.set_owner(enumeration, owned)?;
        Ok(enumeration)
    }

    fn load_profile(
        &mut self,
        decl: &ProfileDecl,
        location: Option<SourceInformation>,
        owned: &mut Vec<NodeId>,
    ) -> Result<NodeId, CompilationError> {
        let from = location.as_ref().map_or(0, |location| location.span.start);
        let profile = self.add(
            Node::new(decl.name.as_str(), NodeKind::Profile(ProfileData::default()))
                .with_source(location),
        )?;
        let stereotypes = decl
            .stereotypes
            .iter()
            .map(|name| {
                let node = Node::new(name.as_str(), NodeKind::Stereotype { profile })
                    .with_source(self.locator.find(name, from));
                self.owned_node(node, owned)
            })
            .collect();
        let tags = decl
            .tags
            .iter()
            .map(|name| {
                let node = Node::new(name.as_str(), NodeKind::Tag { profile })
                    .with_source(self.locator.find(name, from));
                self.owned_node(node, owned)
            })
            .collect();
        self.graph.node_mut(profile)?.kind = NodeKind::Profile(ProfileData { stereotypes, tags });
        self.set_owner(profile, owned)?;
        Ok(profile)
    }

    fn load_association(
        &mut self,
        decl: &AssociationDecl,
        location: Option<SourceInformation>,
        owned: &mut Vec<NodeId>,
    ) -> Result<NodeId, CompilationError> {
        if decl.properties.len() != 2 {
            return Err(CompilationError::document(
                self.locator.source_id,
                format!(
                    "association '{}' must declare exactly two properties, found {}",
                    decl.name,
                    decl.properties.len()
                ),
                location,
            ));
        }
        let from = location.as_ref().map_or(0, |location| location.span.start);
        let association = self.add(
            Node::new(decl.name.as_str(), NodeKind::Association(AssociationData::default()))
                .with_source(location),
        )?;
        let scope = Scope::default();
        let properties = decl
            .properties
            .iter()
            .map(|property| self.property(property, association, &scope, from, owned))
            .collect::<Result<_, _>>()?;
        let mut qualified_properties = Vec::new();
        for decl in &decl.qualified_properties {
            let property = self.qualified_property(&decl.property, association, &scope, from, owned)?;
            // The class receiving the property is its first parameter.
            let receiver = self.typed(&decl.owner, &scope, from, owned)?;
            if let NodeKind::Property(data) = &mut self.graph.node_mut(property)?.kind {
                data.parameters.insert(0, Parameter::named("this", receiver, Multiplicity::PURE_ONE));
            }
            qualified_properties.push(property);
        }
        self.graph.node_mut(association)?.kind = NodeKind::Association(AssociationData {
            properties,
            qualified_properties,
            contributions: Vec::new(),
        });
        self.set_owner(association, owned)?;
        Ok(association)
    }

    fn load_function(
        &mut self,
        decl: &FunctionDecl,
        location: Option<SourceInformation>,
        owned: &mut Vec<NodeId>,
    ) -> Result<NodeId, CompilationError> {
        let from = location.as_ref().map_or(0, |location| location.span.start);
        let type_parameters = self.type_parameters(&decl.type_parameters, from)?;
        let scope = Scope {
            type_parameters: &type_parameters,
        };
        let parameters = self.parameters(&decl.parameters, &scope, from, owned)?;
        let return_type = self.typed(&decl.return_type, &scope, from, owned)?;
        let return_multiplicity = self.parse_multiplicity(&decl.return_multiplicity, from)?;
        let function_type = FunctionType {
            parameters,
            return_type,
            return_multiplicity,
        };

        let mut calls = Vec::with_capacity(decl.calls.len());
        for call in &decl.calls {
            let call_location = self.locator.find(&call.function, from);
            let mut arguments = Vec::with_capacity(call.arguments.len());
            for argument in &call.arguments {
                let Some(text) = argument else {
                    arguments.push(Argument::default());
                    continue;
                };
                let (ty, mult) = parse_typed_value(text)
                    .map_err(|err| CompilationError::parse(err, text, self.locator.find(text, from)))?;
                let generic_type = self.generic_type(&ty, &scope, text, from, owned);
                arguments.push(Argument::new(generic_type, Multiplicity::from(&mult)));
            }
            calls.push(
                Call::new(call.function.as_str(), self.import_group, arguments)
                    .with_source(call_location),
            );
        }

        let mut references = Vec::with_capacity(decl.enum_values.len());
        for text in &decl.enum_values {
            let Some((enumeration, value)) = text.rsplit_once('.') else {
                return Err(CompilationError::document(
                    self.locator.source_id,
                    format!("enum reference '{text}' must be written Enumeration.VALUE"),
                    self.locator.find(text, from),
                ));
            };
            let enumeration = self.import_stub(enumeration, from, owned);
            let stub = Node::new(
                value,
                NodeKind::Stub(Stub::new(StubKind::Enum {
                    enumeration,
                    enum_name: SmolStr::new(value),
                })),
            )
            .with_source(self.locator.find(text, from));
            references.push(self.owned_node(stub, owned));
        }

        let annotations = self.annotations(&decl.stereotypes, &decl.tagged_values, from, owned);
        let id = self.graph.function_id(&decl.name, &function_type);
        let function = self.add(
            Node::new(
                id,
                NodeKind::Function(FunctionData {
                    function_name: SmolStr::new(&decl.name),
                    function_type,
                    multiplicity_parameters: decl
                        .multiplicity_parameters
                        .iter()
                        .map(SmolStr::new)
                        .collect(),
                    type_parameters,
                    calls,
                    references,
                    annotations,
                }),
            )
            .with_source(location),
        )?;
        self.set_owner(function, owned)?;
        Ok(function)
    }

    fn load_path(
        &mut self,
        decl: &PathDecl,
        location: Option<SourceInformation>,
        owned: &mut Vec<NodeId>,
    ) -> Result<NodeId, CompilationError> {
        let from = location.as_ref().map_or(0, |location| location.span.start);
        let start = self.import_stub(&decl.start, from, owned);
        let mut previous = start;
        let mut steps = Vec::with_capacity(decl.steps.len());
        for step in &decl.steps {
            let stub = Node::new(
                step.as_str(),
                NodeKind::Stub(Stub::new(StubKind::Property {
                    owner: previous,
                    property_name: SmolStr::new(step),
                })),
            )
            .with_source(self.locator.find(step, from));
            previous = self.owned_node(stub, owned);
            steps.push(previous);
        }
        let path = self.add(
            Node::new(decl.name.as_str(), NodeKind::Path(PathData { start, steps }))
                .with_source(location),
        )?;
        self.set_owner(path, owned)?;
        Ok(path)
    }
}

/// Convert a typed value such as `Integer[1]` to an argument, resolving names
/// directly instead of through stubs.
pub fn resolved_argument(
    graph: &Graph,
    text: &str,
    import_group: NodeId,
) -> Result<Argument, CompilationError> {
    let (ty, mult) =
        parse_typed_value(text).map_err(|err| CompilationError::parse(err, text, None))?;
    Ok(Argument::new(
        resolved_type(graph, &ty, import_group)?,
        Multiplicity::from(&mult),
    ))
}

fn resolved_type(
    graph: &Graph,
    expr: &TypeExpr,
    import_group: NodeId,
) -> Result<GenericType, CompilationError> {
    match expr {
        TypeExpr::Named {
            path,
            type_arguments,
            multiplicity_arguments,
        } => {
            let raw = plume_resolver::resolve_packageable_element(graph, path, import_group, None)?;
            let type_arguments = type_arguments
                .iter()
                .map(|arg| resolved_type(graph, arg, import_group))
                .collect::<Result<_, _>>()?;
            Ok(GenericType::of(raw)
                .with_type_arguments(type_arguments)
                .with_multiplicity_arguments(
                    multiplicity_arguments
                        .iter()
                        .map(|mult: &MultiplicityExpr| Multiplicity::from(mult))
                        .collect(),
                ))
        }
        TypeExpr::Function {
            parameters,
            return_type,
            return_multiplicity,
        } => Ok(GenericType::function(FunctionType {
            parameters: parameters
                .iter()
                .map(|(ty, mult)| {
                    Ok(Parameter::new(
                        resolved_type(graph, ty, import_group)?,
                        Multiplicity::from(mult),
                    ))
                })
                .collect::<Result<_, CompilationError>>()?,
            return_type: resolved_type(graph, return_type, import_group)?,
            return_multiplicity: Multiplicity::from(return_multiplicity),
        })),
    }
}
