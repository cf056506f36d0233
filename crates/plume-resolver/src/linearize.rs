//! C3 linearization of generalization hierarchies.
//!
//! The same merge runs over raw types (node ids) and over generic types, in
//! which case the type and multiplicity arguments of each type are bound into
//! its generalizations before they are linearized in turn.

use std::collections::VecDeque;

use plume_graph::{GenericType, Graph, NodeId, SourceInformation};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::error::ResolutionError;
use crate::stub_resolver::{resolve, resolve_generic_type};

/// Linearize the hierarchy of a type element, the type itself first.
pub fn linearize(graph: &mut Graph, ty: NodeId) -> Result<Vec<NodeId>, ResolutionError> {
    let ty = resolve(graph, ty)?;
    run(&RawTypes, graph, ty)
}

/// Linearize the hierarchy of a generic type, binding its arguments into
/// every supertype on the way up.
///
/// Type parameters and function types have no generalizations, so their
/// linearization is the type alone.
pub fn linearize_generic(
    graph: &mut Graph,
    ty: &GenericType,
) -> Result<Vec<GenericType>, ResolutionError> {
    let ty = resolve_generic_type(graph, ty)?;
    run(&GenericTypes, graph, ty)
}

/// The view of a hierarchy the merge works on.
trait Hierarchy {
    type Item: Clone + PartialEq;

    fn generalizations(
        &self,
        graph: &mut Graph,
        item: &Self::Item,
    ) -> Result<Vec<Self::Item>, ResolutionError>;

    /// The type element an item instantiates, if any.
    fn element(&self, item: &Self::Item) -> Option<NodeId>;

    fn describe(&self, graph: &Graph, item: &Self::Item) -> String;

    fn location(&self, graph: &Graph, item: &Self::Item) -> Option<SourceInformation>;
}

struct RawTypes;

impl Hierarchy for RawTypes {
    type Item = NodeId;

    fn generalizations(
        &self,
        graph: &mut Graph,
        item: &NodeId,
    ) -> Result<Vec<NodeId>, ResolutionError> {
        let declared: Vec<NodeId> = graph
            .type_data(*item)?
            .generalizations
            .iter()
            .filter_map(GenericType::raw_node)
            .collect();
        declared
            .into_iter()
            .map(|general| resolve(graph, general))
            .collect()
    }

    fn element(&self, item: &NodeId) -> Option<NodeId> {
        Some(*item)
    }

    fn describe(&self, graph: &Graph, item: &NodeId) -> String {
        graph.user_path(*item)
    }

    fn location(&self, graph: &Graph, item: &NodeId) -> Option<SourceInformation> {
        graph.node(*item).ok().and_then(|node| node.source.clone())
    }
}

struct GenericTypes;

impl Hierarchy for GenericTypes {
    type Item = GenericType;

    fn generalizations(
        &self,
        graph: &mut Graph,
        item: &GenericType,
    ) -> Result<Vec<GenericType>, ResolutionError> {
        let Some(raw) = item.raw_node() else {
            return Ok(Vec::new());
        };
        let data = graph.type_data(raw)?;

        let types: FxHashMap<SmolStr, GenericType> = data
            .type_parameters
            .iter()
            .zip(&item.type_arguments)
            .map(|(param, arg)| (param.name.clone(), arg.clone()))
            .collect();
        let multiplicities = data
            .multiplicity_parameters
            .iter()
            .cloned()
            .zip(item.multiplicity_arguments.iter().cloned())
            .collect();
        let declared = data.generalizations.clone();

        declared
            .iter()
            .map(|general| {
                let resolved = resolve_generic_type(graph, general)?;
                Ok(resolved.substitute(&types, &multiplicities))
            })
            .collect()
    }

    fn element(&self, item: &GenericType) -> Option<NodeId> {
        item.raw_node()
    }

    fn describe(&self, graph: &Graph, item: &GenericType) -> String {
        graph.print_generic_type(item, true)
    }

    fn location(&self, graph: &Graph, item: &GenericType) -> Option<SourceInformation> {
        let raw = item.raw_node()?;
        graph.node(raw).ok().and_then(|node| node.source.clone())
    }
}

enum Failure<T> {
    /// The path from the type being linearized to the inconsistent one.
    Inconsistent(Vec<T>),
    Resolution(ResolutionError),
}

fn run<H: Hierarchy>(
    hierarchy: &H,
    graph: &mut Graph,
    item: H::Item,
) -> Result<Vec<H::Item>, ResolutionError> {
    let mut stack = Vec::new();
    match c3(hierarchy, graph, &item, &mut stack) {
        Ok(linearization) => Ok(linearization),
        Err(Failure::Resolution(err)) => Err(err),
        Err(Failure::Inconsistent(path)) => {
            let location = path
                .last()
                .and_then(|root| hierarchy.location(graph, root));
            Err(ResolutionError::InconsistentHierarchy {
                path: path
                    .iter()
                    .map(|item| hierarchy.describe(graph, item))
                    .collect(),
                location,
            })
        }
    }
}

fn c3<H: Hierarchy>(
    hierarchy: &H,
    graph: &mut Graph,
    item: &H::Item,
    stack: &mut Vec<H::Item>,
) -> Result<Vec<H::Item>, Failure<H::Item>> {
    // A type element may appear once on the stack, whatever its arguments:
    // `A<T> extends A<A<T>>` never repeats a whole generic type.
    let element = hierarchy.element(item);
    let seen = stack.iter().any(|other| {
        other == item || (element.is_some() && hierarchy.element(other) == element)
    });
    if seen {
        return Err(Failure::Inconsistent(vec![item.clone()]));
    }
    stack.push(item.clone());
    let result = calculate(hierarchy, graph, item, stack);
    stack.pop();
    result
}

fn calculate<H: Hierarchy>(
    hierarchy: &H,
    graph: &mut Graph,
    item: &H::Item,
    stack: &mut Vec<H::Item>,
) -> Result<Vec<H::Item>, Failure<H::Item>> {
    let generalizations = hierarchy
        .generalizations(graph, item)
        .map_err(Failure::Resolution)?;
    if generalizations.is_empty() {
        return Ok(vec![item.clone()]);
    }

    let mut queues = Vec::with_capacity(generalizations.len() + 2);
    queues.push(VecDeque::from([item.clone()]));
    for general in &generalizations {
        match c3(hierarchy, graph, general, stack) {
            Ok(linearization) => queues.push(VecDeque::from(linearization)),
            Err(Failure::Inconsistent(mut path)) => {
                path.insert(0, item.clone());
                return Err(Failure::Inconsistent(path));
            }
            Err(err) => return Err(err),
        }
    }
    queues.push(VecDeque::from(generalizations));

    merge(item, queues)
}

fn merge<T: Clone + PartialEq>(item: &T, mut queues: Vec<VecDeque<T>>) -> Result<Vec<T>, Failure<T>> {
    let mut result = Vec::new();
    while !queues.is_empty() {
        let next = queues
            .iter()
            .filter_map(VecDeque::front)
            .find(|head| {
                !queues
                    .iter()
                    .any(|queue| queue.iter().skip(1).any(|other| other == *head))
            })
            .cloned();
        let Some(next) = next else {
            return Err(Failure::Inconsistent(vec![item.clone()]));
        };

        for queue in &mut queues {
            if queue.front() == Some(&next) {
                queue.pop_front();
            }
        }
        queues.retain(|queue| !queue.is_empty());
        result.push(next);
    }
    Ok(result)
}
