//! Graph builders shared by the resolver tests.

use plume_graph::{
    Annotations, FunctionData, FunctionType, GenericType, Graph, ImportGroupData, Multiplicity,
    Node, NodeId, NodeKind, Parameter, Stub, StubKind, TypeData,
};

/// A built-in type by name, `Any` included.
pub fn primitive(graph: &Graph, name: &str) -> GenericType {
    if name == "Any" {
        return GenericType::of(graph.well_known().any);
    }
    let id = graph
        .find_by_path(name)
        .unwrap_or_else(|| panic!("unknown type {name}"));
    GenericType::of(id)
}

pub fn import_group(graph: &mut Graph, imports: &[&str]) -> NodeId {
    graph.alloc(Node::new(
        "imports",
        NodeKind::ImportGroup(ImportGroupData {
            imports: imports.iter().map(|path| (*path).into()).collect(),
        }),
    ))
}

pub fn import_stub(graph: &mut Graph, owner: NodeId, id_or_path: &str, group: NodeId) -> NodeId {
    graph.alloc(
        Node::new(
            id_or_path,
            NodeKind::Stub(Stub::new(StubKind::Import {
                id_or_path: id_or_path.into(),
                import_group: group,
            })),
        )
        .with_owner(owner),
    )
}

/// Add a class whose generalizations are import stubs for `parents`, or the
/// top type when there are none.
pub fn add_class(graph: &mut Graph, package: &str, name: &str, parents: &[&str]) -> NodeId {
    let package = graph.ensure_package(package).unwrap();
    let class = graph
        .add_element(package, Node::new(name, NodeKind::Class(TypeData::default())))
        .unwrap();
    let group = import_group(graph, &[]);

    let generalizations = if parents.is_empty() {
        vec![GenericType::of(graph.well_known().any)]
    } else {
        parents
            .iter()
            .map(|parent| GenericType::of(import_stub(graph, class, parent, group)))
            .collect()
    };
    graph.type_data_mut(class).unwrap().generalizations = generalizations;
    class
}

pub fn add_function(
    graph: &mut Graph,
    package: &str,
    name: &str,
    parameters: &[(&str, Multiplicity)],
    returns: (&str, Multiplicity),
) -> NodeId {
    let parameters = parameters
        .iter()
        .map(|(ty, multiplicity)| (primitive(graph, ty), multiplicity.clone()))
        .collect();
    let returns = (primitive(graph, returns.0), returns.1);
    add_typed_function(graph, package, name, parameters, returns)
}

pub fn add_typed_function(
    graph: &mut Graph,
    package: &str,
    name: &str,
    parameters: Vec<(GenericType, Multiplicity)>,
    returns: (GenericType, Multiplicity),
) -> NodeId {
    let function_type = FunctionType {
        parameters: parameters
            .into_iter()
            .enumerate()
            .map(|(index, (ty, multiplicity))| {
                Parameter::named(format!("p{index}"), ty, multiplicity)
            })
            .collect(),
        return_type: returns.0,
        return_multiplicity: returns.1,
    };
    let id = graph.function_id(name, &function_type);
    let package = graph.ensure_package(package).unwrap();
    graph
        .add_element(
            package,
            Node::new(
                id,
                NodeKind::Function(FunctionData {
                    function_name: name.into(),
                    function_type,
                    type_parameters: Vec::new(),
                    multiplicity_parameters: Vec::new(),
                    calls: Vec::new(),
                    references: Vec::new(),
                    annotations: Annotations::default(),
                }),
            ),
        )
        .unwrap()
}
