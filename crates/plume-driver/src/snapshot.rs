//! A deterministic, serializable view of the graph.
//!
//! Snapshots refer to elements by user path and sort every list, so two
//! graphs built in different orders compare equal when they describe the same
//! program.

use plume_graph::{CompileState, Graph, NodeId, NodeKind, Resolution};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    pub elements: Vec<ElementSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementSnapshot {
    pub path: String,
    pub kind: &'static str,
    pub state: CompileState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generalizations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub specializations: Vec<String>,
    /// `name: Type[mult]`, qualified properties included.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties_from_associations: Vec<String>,
    /// `name -> descriptor`, or `name -> ?` while unresolved.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl GraphSnapshot {
    pub fn capture(graph: &Graph) -> Self {
        let mut elements: Vec<ElementSnapshot> = graph
            .live_nodes()
            .filter(|(_, node)| {
                node.package.is_some()
                    && node.owner.is_none()
                    && !matches!(node.kind, NodeKind::Package(_))
            })
            .map(|(id, _)| capture_element(graph, id))
            .collect();
        elements.sort_by(|a, b| a.path.cmp(&b.path));
        Self { elements }
    }

    pub fn element(&self, path: &str) -> Option<&ElementSnapshot> {
        self.elements.iter().find(|element| element.path == path)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn sorted_paths(graph: &Graph, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
    let mut paths: Vec<String> = ids.into_iter().map(|id| graph.user_path(id)).collect();
    paths.sort();
    paths
}

fn describe_property(graph: &Graph, property: NodeId) -> String {
    let Ok(node) = graph.node(property) else {
        return String::from("<removed>");
    };
    match &node.kind {
        NodeKind::Property(data) => format!(
            "{}: {}{}",
            node.name,
            graph.print_generic_type(&data.generic_type, true),
            data.multiplicity
        ),
        _ => node.name.to_string(),
    }
}

fn capture_element(graph: &Graph, id: NodeId) -> ElementSnapshot {
    let mut snapshot = ElementSnapshot {
        path: graph.user_path(id),
        kind: "<removed>",
        state: CompileState::Unprocessed,
        generalizations: Vec::new(),
        specializations: Vec::new(),
        properties: Vec::new(),
        properties_from_associations: Vec::new(),
        calls: Vec::new(),
        references: sorted_paths(graph, graph.references(id)),
    };
    let Ok(node) = graph.node(id) else {
        return snapshot;
    };
    snapshot.kind = node.kind.label();
    snapshot.state = node.state;

    if let Some(data) = node.type_data() {
        snapshot.generalizations = data
            .generalizations
            .iter()
            .map(|general| graph.print_generic_type(general, true))
            .collect();
        snapshot.specializations = sorted_paths(graph, data.specializations.iter().copied());
        snapshot.properties = data
            .properties
            .iter()
            .chain(&data.qualified_properties)
            .map(|property| describe_property(graph, *property))
            .collect();
        let mut from_associations: Vec<String> = data
            .properties_from_associations
            .iter()
            .chain(&data.qualified_properties_from_associations)
            .map(|property| describe_property(graph, *property))
            .collect();
        from_associations.sort();
        snapshot.properties_from_associations = from_associations;
    }

    match &node.kind {
        NodeKind::Association(data) => {
            snapshot.properties = data
                .properties
                .iter()
                .chain(&data.qualified_properties)
                .map(|property| describe_property(graph, *property))
                .collect();
        }
        NodeKind::Function(data) => {
            snapshot.calls = data
                .calls
                .iter()
                .map(|call| {
                    let target = match call.resolution {
                        Resolution::Resolved(target) => graph
                            .function_descriptor(target)
                            .unwrap_or_else(|_| String::from("<removed>")),
                        Resolution::Unresolved | Resolution::Invalidated => String::from("?"),
                    };
                    format!("{} -> {}", call.function_name, target)
                })
                .collect();
        }
        _ => {}
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_graph::{GenericType, Node, TypeData};

    #[test]
    fn test_capture_sorts_by_path() {
        let mut graph = Graph::new();
        let any = graph.well_known().any;
        let package = graph.ensure_package("test").unwrap();
        for name in ["B", "A"] {
            let data = TypeData {
                generalizations: vec![GenericType::of(any)],
                ..TypeData::default()
            };
            graph
                .add_element(package, Node::new(name, NodeKind::Class(data)))
                .unwrap();
        }

        let snapshot = GraphSnapshot::capture(&graph);
        let paths: Vec<&str> = snapshot
            .elements
            .iter()
            .map(|element| element.path.as_str())
            .filter(|path| path.starts_with("test::"))
            .collect();
        assert_eq!(paths, vec!["test::A", "test::B"]);

        let a = snapshot.element("test::A").unwrap();
        assert_eq!(a.kind, "class");
        assert_eq!(a.state, CompileState::Unprocessed);
        assert_eq!(a.generalizations, vec!["meta::pure::metamodel::type::Any".to_string()]);
        assert!(snapshot.element("meta::pure::metamodel::type::Any").is_some());
    }

    #[test]
    fn test_json_skips_empty_lists() {
        let graph = Graph::new();
        let json = GraphSnapshot::capture(&graph).to_json().unwrap();
        assert!(json.contains("\"path\": \"meta::pure::metamodel::type::Nil\""));
        assert!(!json.contains("\"calls\""));
    }
}
