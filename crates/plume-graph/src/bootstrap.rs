//! Built-in elements present in every graph.

use smol_str::SmolStr;

use crate::generic_type::{GenericType, TypeParameter};
use crate::graph::Graph;
use crate::node::{CompileState, Node, NodeId, NodeKind, TypeData};

pub const TYPE_PACKAGE: &str = "meta::pure::metamodel::type";
pub const FUNCTION_PACKAGE: &str = "meta::pure::metamodel::function";

/// Primitive types and their direct supertype, `None` meaning the top type.
pub const PRIMITIVE_TYPES: &[(&str, Option<&str>)] = &[
    ("String", None),
    ("Boolean", None),
    ("Number", None),
    ("Integer", Some("Number")),
    ("Float", Some("Number")),
    ("Decimal", Some("Number")),
    ("Date", None),
    ("StrictDate", Some("Date")),
    ("DateTime", Some("Date")),
    ("LatestDate", Some("Date")),
    ("StrictTime", None),
    ("Byte", None),
];

/// Names that resolve without any import.
pub fn special_type_names() -> impl Iterator<Item = &'static str> {
    PRIMITIVE_TYPES
        .iter()
        .map(|(name, _)| *name)
        .chain(["Package", "Root"])
}

fn built_in(name: &str, kind: NodeKind) -> Node {
    Node::new(name, kind).with_state(CompileState::Validated)
}

fn class_data(generalizations: Vec<GenericType>) -> TypeData {
    TypeData {
        generalizations,
        ..TypeData::default()
    }
}

fn add_built_in(graph: &mut Graph, package: NodeId, node: Node) -> NodeId {
    // Bootstrap names are fixed and unique, so attaching cannot collide.
    match graph.add_element(package, node.clone()) {
        Ok(id) => id,
        Err(_) => graph.alloc(node),
    }
}

pub(crate) fn bootstrap(graph: &mut Graph) {
    let root = graph.root();
    let type_package = graph.ensure_package(TYPE_PACKAGE).unwrap_or(root);
    let function_package = graph.ensure_package(FUNCTION_PACKAGE).unwrap_or(root);

    let any = add_built_in(graph, type_package, built_in("Any", NodeKind::Class(TypeData::default())));
    let any_type = GenericType::of(any);

    let nil = add_built_in(
        graph,
        type_package,
        built_in("Nil", NodeKind::Class(class_data(vec![any_type.clone()]))),
    );
    let enum_type = add_built_in(
        graph,
        type_package,
        built_in("Enum", NodeKind::Class(class_data(vec![any_type.clone()]))),
    );
    let function = add_built_in(
        graph,
        function_package,
        built_in(
            "Function",
            NodeKind::Class(TypeData {
                type_parameters: vec![TypeParameter::new("T")],
                generalizations: vec![any_type.clone()],
                ..TypeData::default()
            }),
        ),
    );

    let package = graph.alloc(built_in(
        "Package",
        NodeKind::Class(class_data(vec![any_type.clone()])),
    ));
    graph.register_top_level(SmolStr::new("Package"), package);

    for (name, parent) in PRIMITIVE_TYPES {
        let generalization = match parent.and_then(|parent| graph.top_level(parent)) {
            Some(parent) => GenericType::of(parent),
            None => any_type.clone(),
        };
        let id = graph.alloc(built_in(
            name,
            NodeKind::PrimitiveType(class_data(vec![generalization])),
        ));
        graph.register_top_level(SmolStr::new(*name), id);
    }

    let well_known = graph.well_known_mut();
    well_known.any = any;
    well_known.nil = nil;
    well_known.enum_type = enum_type;
    well_known.function = function;
    well_known.package = package;

    let specializations: Vec<(NodeId, NodeId)> = graph
        .live_nodes()
        .filter_map(|(id, node)| Some((id, node.type_data()?)))
        .flat_map(|(id, data)| {
            data.generalizations
                .iter()
                .filter_map(GenericType::raw_node)
                .map(move |general| (general, id))
                .collect::<Vec<_>>()
        })
        .collect();
    for (general, specific) in specializations {
        if let Ok(data) = graph.type_data_mut(general) {
            data.specializations.push(specific);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_top_level() {
        let graph = Graph::new();
        for name in special_type_names() {
            assert!(graph.top_level(name).is_some(), "{name}");
        }
        assert_eq!(graph.find_by_path("Root"), Some(graph.root()));
    }

    #[test]
    fn test_any_and_nil_live_in_type_package() {
        let graph = Graph::new();
        let any = graph.find_by_path("meta::pure::metamodel::type::Any").unwrap();
        let nil = graph.find_by_path("meta::pure::metamodel::type::Nil").unwrap();
        assert!(graph.is_top_type(any));
        assert!(graph.is_bottom_type(nil));
        assert_eq!(graph.user_path(any), "meta::pure::metamodel::type::Any");
        assert!(graph.top_level("Any").is_none());
    }

    #[test]
    fn test_integer_generalizes_number() {
        let graph = Graph::new();
        let integer = graph.top_level("Integer").unwrap();
        let number = graph.top_level("Number").unwrap();
        let data = graph.type_data(integer).unwrap();
        assert_eq!(data.generalizations[0].raw_node(), Some(number));
        assert!(graph.type_data(number).unwrap().specializations.contains(&integer));
    }
}
