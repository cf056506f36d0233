//! Binding stubs to the elements they stand for.

use plume_graph::{
    special_type_names, GenericType, Graph, NodeId, NodeKind, Parameter, RawType, Resolution,
    SourceInformation, StubKind,
};
use smol_str::SmolStr;

use crate::error::ResolutionError;
use crate::linearize::linearize;

/// Resolve a node, seeing through any kind of stub.
///
/// Non-stub nodes are returned unchanged. The first successful resolution of
/// a stub is cached on it and recorded as a back reference from the stub's
/// owning element, so the binding can be torn down on unbind.
pub fn resolve(graph: &mut Graph, id: NodeId) -> Result<NodeId, ResolutionError> {
    let node = graph.node(id)?;
    let NodeKind::Stub(stub) = &node.kind else {
        return Ok(id);
    };
    match stub.resolution {
        Resolution::Resolved(target) => return Ok(target),
        Resolution::Invalidated => {
            return Err(ResolutionError::InvalidatedStub(SmolStr::new(
                stub.display_name(),
            )))
        }
        Resolution::Unresolved => {}
    }

    let kind = stub.kind.clone();
    let location = node.source.clone();
    let target = match kind {
        StubKind::Import {
            id_or_path,
            import_group,
        } => resolve_import(graph, &id_or_path, import_group, location.as_ref())?,
        StubKind::Property {
            owner,
            property_name,
        } => resolve_property(graph, owner, &property_name, location.as_ref())?,
        StubKind::Enum {
            enumeration,
            enum_name,
        } => resolve_enum(graph, enumeration, &enum_name, location.as_ref())?,
        StubKind::GrammarInfo { value } => resolve(graph, value)?,
    };

    graph.set_resolution(id, Resolution::Resolved(target))?;
    graph.add_reference(id, target);
    Ok(target)
}

/// Resolve every stub referenced by a generic type, returning a copy that
/// refers to the resolved elements directly.
pub fn resolve_generic_type(
    graph: &mut Graph,
    ty: &GenericType,
) -> Result<GenericType, ResolutionError> {
    let raw_type = match &ty.raw_type {
        Some(RawType::Node(id)) => Some(RawType::Node(resolve(graph, *id)?)),
        Some(RawType::Function(function_type)) => {
            let mut resolved = function_type.as_ref().clone();
            for param in &mut resolved.parameters {
                param.generic_type = resolve_generic_type(graph, &param.generic_type)?;
            }
            resolved.return_type = resolve_generic_type(graph, &resolved.return_type)?;
            Some(RawType::Function(Box::new(resolved)))
        }
        None => None,
    };
    let type_arguments = ty
        .type_arguments
        .iter()
        .map(|arg| resolve_generic_type(graph, arg))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GenericType {
        raw_type,
        type_arguments,
        multiplicity_arguments: ty.multiplicity_arguments.clone(),
        type_parameter: ty.type_parameter.clone(),
    })
}

/// Resolve the types of a parameter list.
pub fn resolve_parameters(
    graph: &mut Graph,
    parameters: &[Parameter],
) -> Result<Vec<Parameter>, ResolutionError> {
    parameters
        .iter()
        .map(|param| {
            Ok(Parameter {
                name: param.name.clone(),
                generic_type: resolve_generic_type(graph, &param.generic_type)?,
                multiplicity: param.multiplicity.clone(),
            })
        })
        .collect()
}

fn resolve_import(
    graph: &mut Graph,
    id_or_path: &str,
    import_group: NodeId,
    location: Option<&SourceInformation>,
) -> Result<NodeId, ResolutionError> {
    if let Some((profile, name)) = id_or_path.split_once('@') {
        let profile_id = resolve_profile(graph, id_or_path, profile, import_group, location)?;
        return find_profile_member(graph, profile_id, name, true).ok_or_else(|| {
            ResolutionError::StereotypeNotFound {
                name: SmolStr::new(name),
                profile: SmolStr::new(profile),
                location: location.cloned(),
            }
        });
    }
    if let Some((profile, name)) = id_or_path.split_once('%') {
        let profile_id = resolve_profile(graph, id_or_path, profile, import_group, location)?;
        return find_profile_member(graph, profile_id, name, false).ok_or_else(|| {
            ResolutionError::TagNotFound {
                name: SmolStr::new(name),
                profile: SmolStr::new(profile),
                location: location.cloned(),
            }
        });
    }
    resolve_packageable_element(graph, id_or_path, import_group, location)
}

fn resolve_profile(
    graph: &Graph,
    id_or_path: &str,
    profile: &str,
    import_group: NodeId,
    location: Option<&SourceInformation>,
) -> Result<NodeId, ResolutionError> {
    let element = resolve_packageable_element(graph, profile, import_group, location)?;
    match graph.node(element)?.kind {
        NodeKind::Profile(_) => Ok(element),
        _ => Err(ResolutionError::NotAProfile {
            id_or_path: SmolStr::new(id_or_path),
            profile: SmolStr::new(profile),
            location: location.cloned(),
        }),
    }
}

fn find_profile_member(graph: &Graph, profile: NodeId, name: &str, stereotype: bool) -> Option<NodeId> {
    let NodeKind::Profile(data) = &graph.node(profile).ok()?.kind else {
        return None;
    };
    let members = if stereotype { &data.stereotypes } else { &data.tags };
    members
        .iter()
        .copied()
        .find(|member| graph.node(*member).is_ok_and(|node| node.name == name))
}

/// Look up a packageable element by bare name or qualified path.
pub fn resolve_packageable_element(
    graph: &Graph,
    id_or_path: &str,
    import_group: NodeId,
    location: Option<&SourceInformation>,
) -> Result<NodeId, ResolutionError> {
    if special_type_names().any(|name| name == id_or_path) {
        if let Some(special) = graph.top_level(id_or_path) {
            return Ok(special);
        }
    }

    if let Some((_, id)) = id_or_path.rsplit_once("::") {
        return graph
            .find_by_path(id_or_path)
            .ok_or_else(|| ResolutionError::UnresolvedIdentifier {
                path: SmolStr::new(id_or_path),
                id: SmolStr::new(id),
                import_group: Some(import_group),
                location: location.cloned(),
            });
    }

    let mut found = Vec::new();
    for package in graph.import_group_packages(import_group)? {
        if let Some(element) = graph.find_in_package(package, id_or_path) {
            if !found.contains(&element) {
                found.push(element);
            }
        }
    }

    match found.as_slice() {
        [] => graph
            .find_by_path(id_or_path)
            .ok_or_else(|| ResolutionError::UnresolvedIdentifier {
                path: SmolStr::new(id_or_path),
                id: SmolStr::new(id_or_path),
                import_group: Some(import_group),
                location: location.cloned(),
            }),
        [single] => Ok(*single),
        many => {
            let mut candidates: Vec<String> =
                many.iter().map(|element| graph.user_path(*element)).collect();
            candidates.sort();
            Err(ResolutionError::AmbiguousReference {
                id: SmolStr::new(id_or_path),
                candidates,
                location: location.cloned(),
            })
        }
    }
}

/// The type a property stub's owner denotes: a type directly, or the type
/// of a previously navigated property.
fn owner_type(graph: &mut Graph, owner: NodeId) -> Result<NodeId, ResolutionError> {
    let owner = resolve(graph, owner)?;
    let property_type = match &graph.node(owner)?.kind {
        NodeKind::Property(data) => data.generic_type.raw_node(),
        _ => return Ok(owner),
    };
    match property_type {
        Some(raw) => resolve(graph, raw),
        None => Ok(owner),
    }
}

fn resolve_property(
    graph: &mut Graph,
    owner: NodeId,
    property_name: &str,
    location: Option<&SourceInformation>,
) -> Result<NodeId, ResolutionError> {
    let owner = owner_type(graph, owner)?;
    match find_property(graph, owner, property_name)? {
        Some(property) => Ok(property),
        None => Err(ResolutionError::PropertyNotFound {
            property: SmolStr::new(property_name),
            owner: graph.node(owner)?.name.clone(),
            location: location.cloned(),
        }),
    }
}

/// Find a property or qualified property by name on a type or any of its
/// supertypes, in linearization order.
pub fn find_property(
    graph: &mut Graph,
    owner: NodeId,
    property_name: &str,
) -> Result<Option<NodeId>, ResolutionError> {
    for ty in linearize(graph, owner)? {
        let data = graph.type_data(ty)?;
        let found = data
            .properties
            .iter()
            .chain(&data.properties_from_associations)
            .chain(&data.qualified_properties)
            .chain(&data.qualified_properties_from_associations)
            .copied()
            .find(|property| {
                graph
                    .node(*property)
                    .is_ok_and(|node| node.name == property_name)
            });
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

fn resolve_enum(
    graph: &mut Graph,
    enumeration: NodeId,
    enum_name: &str,
    location: Option<&SourceInformation>,
) -> Result<NodeId, ResolutionError> {
    let enumeration = resolve(graph, enumeration)?;
    let values = match &graph.node(enumeration)?.kind {
        NodeKind::Enumeration(data) => data.values.clone(),
        other => {
            return Err(plume_graph::GraphError::UnexpectedKind {
                expected: "enumeration",
                found: other.label(),
            }
            .into())
        }
    };
    values
        .into_iter()
        .find(|value| graph.node(*value).is_ok_and(|node| node.name == enum_name))
        .ok_or_else(|| ResolutionError::EnumValueNotFound {
            name: SmolStr::new(enum_name),
            enumeration: graph.user_path(enumeration),
            location: location.cloned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use plume_graph::{EnumerationData, Multiplicity, Node, ProfileData, PropertyData, Stub};

    fn stub(graph: &mut Graph, owner: NodeId, kind: StubKind) -> NodeId {
        graph.alloc(Node::new("stub", NodeKind::Stub(Stub::new(kind))).with_owner(owner))
    }

    fn add_property(graph: &mut Graph, class: NodeId, name: &str, ty: GenericType) -> NodeId {
        let property = graph.alloc(
            Node::new(
                name,
                NodeKind::Property(PropertyData {
                    owner: class,
                    generic_type: ty,
                    multiplicity: Multiplicity::PURE_ONE,
                    qualified: false,
                    parameters: Vec::new(),
                }),
            )
            .with_owner(class),
        );
        graph.type_data_mut(class).unwrap().properties.push(property);
        property
    }

    #[test]
    fn test_import_resolves_through_imports_once() {
        let mut graph = Graph::new();
        let a = add_class(&mut graph, "model", "A", &[]);
        let user = add_class(&mut graph, "app", "User", &[]);
        let group = import_group(&mut graph, &["model"]);
        let reference = import_stub(&mut graph, user, "A", group);

        assert_eq!(resolve(&mut graph, reference).unwrap(), a);
        assert_eq!(graph.stub(reference).unwrap().resolution, Resolution::Resolved(a));
        assert_eq!(graph.referrers(a), vec![user]);
        assert_eq!(resolve(&mut graph, reference).unwrap(), a);
        assert_eq!(resolve(&mut graph, a).unwrap(), a);
    }

    #[test]
    fn test_special_and_core_types() {
        let mut graph = Graph::new();
        let user = add_class(&mut graph, "app", "User", &[]);
        let group = import_group(&mut graph, &[]);

        let string = import_stub(&mut graph, user, "String", group);
        assert_eq!(resolve(&mut graph, string).unwrap(), graph.top_level("String").unwrap());

        let any = import_stub(&mut graph, user, "Any", group);
        assert!(matches!(
            resolve(&mut graph, any),
            Err(ResolutionError::UnresolvedIdentifier { .. })
        ));

        graph.set_core_imports(vec!["meta::pure::metamodel::type".into()]);
        let any = import_stub(&mut graph, user, "Any", group);
        assert_eq!(resolve(&mut graph, any).unwrap(), graph.well_known().any);
    }

    #[test]
    fn test_qualified_path() {
        let mut graph = Graph::new();
        let a = add_class(&mut graph, "model::core", "A", &[]);
        let user = add_class(&mut graph, "app", "User", &[]);
        let group = import_group(&mut graph, &[]);

        let found = import_stub(&mut graph, user, "model::core::A", group);
        assert_eq!(resolve(&mut graph, found).unwrap(), a);

        let missing = import_stub(&mut graph, user, "model::core::B", group);
        let err = resolve(&mut graph, missing).unwrap_err();
        assert_eq!(err.to_string(), "model::core::B has not been defined!");
        assert!(matches!(
            err,
            ResolutionError::UnresolvedIdentifier { ref id, import_group: Some(g), .. }
                if id == "B" && g == group
        ));
    }

    #[test]
    fn test_ambiguous_import() {
        let mut graph = Graph::new();
        add_class(&mut graph, "b", "X", &[]);
        add_class(&mut graph, "a", "X", &[]);
        let user = add_class(&mut graph, "app", "User", &[]);
        let group = import_group(&mut graph, &["b", "a"]);
        let reference = import_stub(&mut graph, user, "X", group);

        let err = resolve(&mut graph, reference).unwrap_err();
        assert_eq!(
            err.to_string(),
            "X has been found more than one time in the imports: [a::X, b::X]"
        );
        assert_eq!(graph.stub(reference).unwrap().resolution, Resolution::Unresolved);
    }

    #[test]
    fn test_invalidated_stub_is_not_read() {
        let mut graph = Graph::new();
        let a = add_class(&mut graph, "model", "A", &[]);
        let group = import_group(&mut graph, &["model"]);
        let reference = import_stub(&mut graph, a, "A", group);
        graph.set_resolution(reference, Resolution::Invalidated).unwrap();
        assert_eq!(
            resolve(&mut graph, reference),
            Err(ResolutionError::InvalidatedStub("A".into()))
        );
    }

    #[test]
    fn test_property_found_on_supertype() {
        let mut graph = Graph::new();
        let string = primitive(&graph, "String");
        let base = add_class(&mut graph, "model", "Base", &[]);
        let name = add_property(&mut graph, base, "name", string);
        let derived = add_class(&mut graph, "model", "Derived", &["model::Base"]);

        let reference = stub(
            &mut graph,
            derived,
            StubKind::Property {
                owner: derived,
                property_name: "name".into(),
            },
        );
        assert_eq!(resolve(&mut graph, reference).unwrap(), name);

        let missing = stub(
            &mut graph,
            derived,
            StubKind::Property {
                owner: derived,
                property_name: "b".into(),
            },
        );
        assert_eq!(
            resolve(&mut graph, missing).unwrap_err().to_string(),
            "The property 'b' can't be found in the type 'Derived' (or any supertype)."
        );
    }

    #[test]
    fn test_property_contributed_by_association() {
        let mut graph = Graph::new();
        let a = add_class(&mut graph, "model", "A", &[]);
        let b = add_class(&mut graph, "model", "B", &[]);
        let to_b = graph.alloc(Node::new(
            "b",
            NodeKind::Property(PropertyData {
                owner: a,
                generic_type: GenericType::of(b),
                multiplicity: Multiplicity::ZERO_MANY,
                qualified: false,
                parameters: Vec::new(),
            }),
        ));
        graph
            .type_data_mut(a)
            .unwrap()
            .properties_from_associations
            .push(to_b);

        let reference = stub(
            &mut graph,
            a,
            StubKind::Property {
                owner: a,
                property_name: "b".into(),
            },
        );
        assert_eq!(resolve(&mut graph, reference).unwrap(), to_b);
    }

    #[test]
    fn test_navigation_steps_use_property_types() {
        let mut graph = Graph::new();
        let string = primitive(&graph, "String");
        let address = add_class(&mut graph, "model", "Address", &[]);
        let street = add_property(&mut graph, address, "street", string);
        let person = add_class(&mut graph, "model", "Person", &[]);
        add_property(&mut graph, person, "address", GenericType::of(address));
        let group = import_group(&mut graph, &["model"]);

        let start = import_stub(&mut graph, person, "Person", group);
        let first = stub(
            &mut graph,
            person,
            StubKind::Property {
                owner: start,
                property_name: "address".into(),
            },
        );
        let second = stub(
            &mut graph,
            person,
            StubKind::Property {
                owner: first,
                property_name: "street".into(),
            },
        );
        assert_eq!(resolve(&mut graph, second).unwrap(), street);
        assert_eq!(graph.referrers(address), vec![person]);
    }

    #[test]
    fn test_enum_values() {
        let mut graph = Graph::new();
        let package = graph.ensure_package("model").unwrap();
        let color = graph
            .add_element(
                package,
                Node::new("Color", NodeKind::Enumeration(EnumerationData::default())),
            )
            .unwrap();
        let red = graph.alloc(Node::new("RED", NodeKind::EnumValue { enumeration: color }).with_owner(color));
        match &mut graph.node_mut(color).unwrap().kind {
            NodeKind::Enumeration(data) => data.values.push(red),
            _ => unreachable!(),
        }
        let user = add_class(&mut graph, "app", "User", &[]);
        let group = import_group(&mut graph, &["model"]);
        let enumeration = import_stub(&mut graph, user, "Color", group);

        let found = stub(
            &mut graph,
            user,
            StubKind::Enum {
                enumeration,
                enum_name: "RED".into(),
            },
        );
        assert_eq!(resolve(&mut graph, found).unwrap(), red);

        let missing = stub(
            &mut graph,
            user,
            StubKind::Enum {
                enumeration,
                enum_name: "BLUE".into(),
            },
        );
        assert_eq!(
            resolve(&mut graph, missing).unwrap_err().to_string(),
            "The enum value 'BLUE' can't be found in the enumeration model::Color"
        );
    }

    #[test]
    fn test_stereotypes_and_tags() {
        let mut graph = Graph::new();
        let package = graph.ensure_package("meta").unwrap();
        let profile = graph
            .add_element(package, Node::new("doc", NodeKind::Profile(ProfileData::default())))
            .unwrap();
        let deprecated = graph
            .alloc(Node::new("deprecated", NodeKind::Stereotype { profile }).with_owner(profile));
        let description =
            graph.alloc(Node::new("description", NodeKind::Tag { profile }).with_owner(profile));
        match &mut graph.node_mut(profile).unwrap().kind {
            NodeKind::Profile(data) => {
                data.stereotypes.push(deprecated);
                data.tags.push(description);
            }
            _ => unreachable!(),
        }
        let user = add_class(&mut graph, "app", "User", &[]);
        let group = import_group(&mut graph, &["meta", "app"]);

        let stereotype = import_stub(&mut graph, user, "doc@deprecated", group);
        assert_eq!(resolve(&mut graph, stereotype).unwrap(), deprecated);
        let tag = import_stub(&mut graph, user, "meta::doc%description", group);
        assert_eq!(resolve(&mut graph, tag).unwrap(), description);

        let missing_stereotype = import_stub(&mut graph, user, "doc@experimental", group);
        assert_eq!(
            resolve(&mut graph, missing_stereotype).unwrap_err().to_string(),
            "The stereotype 'experimental' can't be found in profile 'doc'"
        );
        let missing_tag = import_stub(&mut graph, user, "doc%todo", group);
        assert_eq!(
            resolve(&mut graph, missing_tag).unwrap_err().to_string(),
            "The tag 'todo' can't be found in profile 'doc'"
        );
        let not_a_profile = import_stub(&mut graph, user, "User@x", group);
        assert_eq!(
            resolve(&mut graph, not_a_profile).unwrap_err().to_string(),
            "User@x : User is not a profile!"
        );
    }

    #[test]
    fn test_grammar_info_and_generic_types() {
        let mut graph = Graph::new();
        let a = add_class(&mut graph, "model", "A", &[]);
        let group = import_group(&mut graph, &["model"]);
        let inner = import_stub(&mut graph, a, "A", group);
        let wrapper = stub(&mut graph, a, StubKind::GrammarInfo { value: inner });
        assert_eq!(resolve(&mut graph, wrapper).unwrap(), a);

        let list = add_class(&mut graph, "model", "List", &[]);
        let element = import_stub(&mut graph, list, "A", group);
        let ty = GenericType::of(list).with_type_arguments(vec![GenericType::of(element)]);
        assert_eq!(
            resolve_generic_type(&mut graph, &ty).unwrap(),
            GenericType::of(list).with_type_arguments(vec![GenericType::of(a)])
        );
    }
}
