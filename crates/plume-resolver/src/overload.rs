//! Choosing the function a call refers to among same-named overloads.

use plume_graph::{Argument, Call, GraphError, Graph, NodeId, NodeKind};
use plume_types::{match_multiplicity, FunctionMatch};

use crate::error::ResolutionError;
use crate::options::MatchOptions;
use crate::type_matcher::match_type;

/// Resolve a call to the single best matching function.
///
/// Returns `Ok(None)` when no candidate matches. Ties between candidates are
/// an error unless the best match only holds because an argument was missing,
/// in which case the tied candidate with the smallest descriptor is returned.
pub fn resolve_call(
    graph: &mut Graph,
    call: &Call,
    options: MatchOptions,
) -> Result<Option<NodeId>, ResolutionError> {
    let matches = matching_candidates(graph, call, options)?;
    let Some(best) = matches.iter().map(|(ranking, _)| ranking).min().cloned() else {
        return Ok(None);
    };

    let mut tied = matches
        .iter()
        .filter(|(ranking, _)| *ranking == best)
        .map(|(_, function)| Ok((graph.function_descriptor(*function)?, *function)))
        .collect::<Result<Vec<_>, GraphError>>()?;
    if let [(_, only)] = tied.as_slice() {
        return Ok(Some(*only));
    }

    tied.sort();
    if best.contains_null() {
        return Ok(tied.first().map(|(_, function)| *function));
    }
    Err(ResolutionError::TooManyMatches {
        signature: call_signature(graph, call),
        candidates: tied.into_iter().map(|(descriptor, _)| descriptor).collect(),
        location: call.source.clone(),
    })
}

/// Every function matching a call, best first.
///
/// Candidates of equal rank are ordered by descriptor.
pub fn rank_all_matches(
    graph: &mut Graph,
    call: &Call,
    options: MatchOptions,
) -> Result<Vec<NodeId>, ResolutionError> {
    let matches = matching_candidates(graph, call, options)?;
    let mut ranked = matches
        .into_iter()
        .map(|(ranking, function)| Ok((ranking, graph.function_descriptor(function)?, function)))
        .collect::<Result<Vec<_>, GraphError>>()?;
    ranked.sort();
    Ok(ranked.into_iter().map(|(_, _, function)| function).collect())
}

/// Functions a call may refer to, before any matching.
///
/// A qualified call only sees functions in the named package. Otherwise the
/// packages of the call's import group and the root package are searched,
/// and when they hold no function of that name, the top-level packages.
pub fn candidate_functions(graph: &Graph, call: &Call) -> Result<Vec<NodeId>, ResolutionError> {
    let Some((package, simple_name)) = call.function_name.rsplit_once("::") else {
        let mut packages = graph.import_group_packages(call.import_group)?;
        if !packages.contains(&graph.root()) {
            packages.push(graph.root());
        }
        let visible = functions_in(graph, &call.function_name, &packages);
        if !visible.is_empty() {
            return Ok(visible);
        }

        let top_level: Vec<NodeId> = graph
            .package_children(graph.root())?
            .into_iter()
            .filter(|child| {
                graph
                    .node(*child)
                    .is_ok_and(|node| matches!(node.kind, NodeKind::Package(_)))
            })
            .collect();
        return Ok(functions_in(graph, &call.function_name, &top_level));
    };

    Ok(match graph.find_by_path(package) {
        Some(package) => functions_in(graph, simple_name, &[package]),
        None => Vec::new(),
    })
}

fn functions_in(graph: &Graph, name: &str, packages: &[NodeId]) -> Vec<NodeId> {
    graph
        .functions_named(name)
        .iter()
        .copied()
        .filter(|function| {
            graph
                .node(*function)
                .is_ok_and(|node| node.package.is_some_and(|package| packages.contains(&package)))
        })
        .collect()
}

fn matching_candidates(
    graph: &mut Graph,
    call: &Call,
    options: MatchOptions,
) -> Result<Vec<(FunctionMatch, NodeId)>, ResolutionError> {
    let mut matches = Vec::new();
    for function in candidate_functions(graph, call)? {
        let parameters = graph.function(function)?.function_type.parameters.clone();
        if parameters.len() != call.arguments.len() {
            continue;
        }

        let mut ranking = FunctionMatch::default();
        let mut matched = true;
        for (parameter, argument) in parameters.iter().zip(&call.arguments) {
            match match_argument(graph, parameter, argument, options) {
                Ok(Some((type_match, multiplicity_match))) => {
                    ranking.push(type_match, multiplicity_match)
                }
                Ok(None) => {
                    matched = false;
                    break;
                }
                Err(cause) => {
                    return Err(ResolutionError::MatchComputation {
                        function: graph.function_descriptor(function)?,
                        cause: Box::new(cause),
                    })
                }
            }
        }
        if matched {
            matches.push((ranking, function));
        }
    }
    Ok(matches)
}

fn match_argument(
    graph: &mut Graph,
    parameter: &plume_graph::Parameter,
    argument: &Argument,
    options: MatchOptions,
) -> Result<Option<(plume_types::GenericTypeMatch, plume_types::MultiplicityMatch)>, ResolutionError>
{
    let behavior = options.behavior();
    let Some(type_match) = match_type(
        graph,
        &parameter.generic_type,
        argument.generic_type.as_ref(),
        true,
        behavior,
    )?
    else {
        return Ok(None);
    };
    let multiplicity_match = match_multiplicity(
        &parameter.multiplicity,
        argument.multiplicity.as_ref(),
        true,
        behavior,
    )?;
    Ok(multiplicity_match.map(|multiplicity_match| (type_match, multiplicity_match)))
}

/// Render a call as `name(_:Type[mult], ...)`.
pub fn call_signature(graph: &Graph, call: &Call) -> String {
    let arguments: Vec<String> = call
        .arguments
        .iter()
        .map(|argument| {
            let ty = argument
                .generic_type
                .as_ref()
                .map_or_else(|| String::from("?"), |ty| graph.print_generic_type(ty, false));
            let multiplicity = argument
                .multiplicity
                .as_ref()
                .map_or_else(|| String::from("[?]"), ToString::to_string);
            format!("_:{ty}{multiplicity}")
        })
        .collect();
    format!("{}({})", call.function_name, arguments.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::NullMatching;
    use crate::test_support::*;
    use plume_graph::{FunctionType, GenericType, Multiplicity, Parameter};

    fn call(graph: &mut Graph, name: &str, imports: &[&str], arguments: Vec<Argument>) -> Call {
        let group = import_group(graph, imports);
        Call::new(name, group, arguments)
    }

    fn argument(graph: &Graph, ty: &str, multiplicity: Multiplicity) -> Argument {
        Argument::new(primitive(graph, ty), multiplicity)
    }

    #[test]
    fn test_single_candidate() {
        let mut graph = Graph::new();
        let func = add_function(
            &mut graph,
            "test",
            "func",
            &[("Integer", Multiplicity::PURE_ONE)],
            ("Integer", Multiplicity::PURE_ONE),
        );
        let one = argument(&graph, "Integer", Multiplicity::PURE_ONE);
        let call = call(&mut graph, "func", &["test"], vec![one]);
        assert_eq!(resolve_call(&mut graph, &call, MatchOptions::strict()).unwrap(), Some(func));
    }

    #[test]
    fn test_closest_supertype_wins() {
        let mut graph = Graph::new();
        let to_number = add_function(
            &mut graph,
            "test",
            "describe",
            &[("Number", Multiplicity::PURE_ONE)],
            ("String", Multiplicity::PURE_ONE),
        );
        let to_any = add_function(
            &mut graph,
            "test",
            "describe",
            &[("Any", Multiplicity::PURE_ONE)],
            ("String", Multiplicity::PURE_ONE),
        );

        let integer = argument(&graph, "Integer", Multiplicity::PURE_ONE);
        let call = call(&mut graph, "describe", &["test"], vec![integer]);
        assert_eq!(
            resolve_call(&mut graph, &call, MatchOptions::strict()).unwrap(),
            Some(to_number)
        );
        assert_eq!(
            rank_all_matches(&mut graph, &call, MatchOptions::strict()).unwrap(),
            vec![to_number, to_any]
        );

        let string = argument(&graph, "String", Multiplicity::PURE_ONE);
        let call = Call::new("describe", call.import_group, vec![string]);
        assert_eq!(
            resolve_call(&mut graph, &call, MatchOptions::strict()).unwrap(),
            Some(to_any)
        );
    }

    #[test]
    fn test_type_match_decides_before_multiplicity() {
        let mut graph = Graph::new();
        let exact_type = add_function(
            &mut graph,
            "test",
            "f",
            &[("Integer", Multiplicity::ZERO_MANY)],
            ("Integer", Multiplicity::PURE_ONE),
        );
        add_function(
            &mut graph,
            "test",
            "f",
            &[("Any", Multiplicity::PURE_ONE)],
            ("Integer", Multiplicity::PURE_ONE),
        );
        let one = argument(&graph, "Integer", Multiplicity::PURE_ONE);
        let call = call(&mut graph, "f", &["test"], vec![one]);
        assert_eq!(
            resolve_call(&mut graph, &call, MatchOptions::strict()).unwrap(),
            Some(exact_type)
        );
    }

    #[test]
    fn test_no_match_is_not_an_error() {
        let mut graph = Graph::new();
        add_function(
            &mut graph,
            "test",
            "f",
            &[("Integer", Multiplicity::PURE_ONE)],
            ("Integer", Multiplicity::PURE_ONE),
        );
        let string = argument(&graph, "String", Multiplicity::PURE_ONE);
        let wrong_type = call(&mut graph, "f", &["test"], vec![string]);
        assert_eq!(resolve_call(&mut graph, &wrong_type, MatchOptions::strict()).unwrap(), None);

        let wrong_arity = Call::new("f", wrong_type.import_group, vec![]);
        assert_eq!(resolve_call(&mut graph, &wrong_arity, MatchOptions::strict()).unwrap(), None);

        let many = argument(&graph, "Integer", Multiplicity::ZERO_MANY);
        let too_wide = Call::new("f", wrong_type.import_group, vec![many]);
        assert_eq!(resolve_call(&mut graph, &too_wide, MatchOptions::strict()).unwrap(), None);
    }

    #[test]
    fn test_functions_outside_imports_are_invisible() {
        let mut graph = Graph::new();
        add_function(
            &mut graph,
            "hidden",
            "f",
            &[("Integer", Multiplicity::PURE_ONE)],
            ("Integer", Multiplicity::PURE_ONE),
        );
        let one = argument(&graph, "Integer", Multiplicity::PURE_ONE);
        let unqualified = call(&mut graph, "f", &["test"], vec![one.clone()]);
        assert_eq!(resolve_call(&mut graph, &unqualified, MatchOptions::strict()).unwrap(), None);

        let qualified = Call::new("hidden::f", unqualified.import_group, vec![one]);
        assert!(resolve_call(&mut graph, &qualified, MatchOptions::strict())
            .unwrap()
            .is_some());
    }

    fn ambiguous_graph() -> (Graph, Call) {
        let mut graph = Graph::new();
        for package in ["test::pkg1", "test::pkg2"] {
            add_function(
                &mut graph,
                package,
                "func",
                &[("Integer", Multiplicity::PURE_ONE)],
                ("Integer", Multiplicity::PURE_ONE),
            );
        }
        let one = argument(&graph, "Integer", Multiplicity::PURE_ONE);
        let call = call(&mut graph, "func", &["test::pkg2", "test::pkg1"], vec![one]);
        (graph, call)
    }

    #[test]
    fn test_too_many_matches() {
        let (mut graph, call) = ambiguous_graph();
        let err = resolve_call(&mut graph, &call, MatchOptions::strict()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Too many matches for func(_:Integer[1]):\n\ttest::pkg1::func(Integer[1]):Integer[1]\n\ttest::pkg2::func(Integer[1]):Integer[1]"
        );
        assert_eq!(
            rank_all_matches(&mut graph, &call, MatchOptions::strict())
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_return_type_alone_does_not_break_a_tie() {
        let mut graph = Graph::new();
        for returns in ["String", "Integer"] {
            add_function(
                &mut graph,
                "test",
                "f",
                &[("Integer", Multiplicity::PURE_ONE)],
                (returns, Multiplicity::PURE_ONE),
            );
        }
        let one = argument(&graph, "Integer", Multiplicity::PURE_ONE);
        let call = call(&mut graph, "f", &["test"], vec![one]);

        let err = resolve_call(&mut graph, &call, MatchOptions::strict()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Too many matches for f(_:Integer[1]):\n\ttest::f(Integer[1]):Integer[1]\n\ttest::f(Integer[1]):String[1]"
        );
    }

    #[test]
    fn test_top_level_packages_are_searched_last() {
        let mut graph = Graph::new();
        let top = add_function(
            &mut graph,
            "test",
            "g",
            &[("Integer", Multiplicity::PURE_ONE)],
            ("Integer", Multiplicity::PURE_ONE),
        );
        add_function(
            &mut graph,
            "test::nested",
            "h",
            &[("Integer", Multiplicity::PURE_ONE)],
            ("Integer", Multiplicity::PURE_ONE),
        );

        let g = call(&mut graph, "g", &[], Vec::new());
        assert_eq!(candidate_functions(&graph, &g).unwrap(), vec![top]);
        let h = call(&mut graph, "h", &[], Vec::new());
        assert!(candidate_functions(&graph, &h).unwrap().is_empty());

        let imported = add_function(
            &mut graph,
            "other",
            "g",
            &[("String", Multiplicity::PURE_ONE)],
            ("Integer", Multiplicity::PURE_ONE),
        );
        let g = call(&mut graph, "g", &["other"], Vec::new());
        assert_eq!(candidate_functions(&graph, &g).unwrap(), vec![imported]);
    }

    #[test]
    fn test_lenient_tie_picks_first_descriptor() {
        let (mut graph, call) = ambiguous_graph();
        let missing = Call::new("func", call.import_group, vec![Argument::default()]);

        assert_eq!(resolve_call(&mut graph, &missing, MatchOptions::strict()).unwrap(), None);
        let chosen = resolve_call(&mut graph, &missing, MatchOptions::lenient())
            .unwrap()
            .unwrap();
        assert_eq!(
            graph.function_descriptor(chosen).unwrap(),
            "test::pkg1::func(Integer[1]):Integer[1]"
        );
    }

    #[test]
    fn test_failure_names_the_candidate() {
        let mut graph = Graph::new();
        let integer = primitive(&graph, "Integer");
        let function = add_typed_function(
            &mut graph,
            "test",
            "f",
            vec![(GenericType::default(), Multiplicity::PURE_ONE)],
            (integer, Multiplicity::PURE_ONE),
        );
        let group = import_group(&mut graph, &["test"]);
        let missing = import_stub(&mut graph, function, "Missing", group);
        graph.function_mut(function).unwrap().function_type.parameters[0].generic_type =
            GenericType::of(missing);

        let one = argument(&graph, "Integer", Multiplicity::PURE_ONE);
        let call = Call::new("f", group, vec![one]);
        let err = resolve_call(&mut graph, &call, MatchOptions::strict()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error finding match for function 'test::f(Missing[1]):Integer[1]': Missing has not been defined!"
        );
    }

    #[test]
    fn test_function_typed_arguments_with_and_without_lambda_types() {
        let mut graph = Graph::new();
        let function = graph.well_known().function;
        let boolean = primitive(&graph, "Boolean");
        let string = primitive(&graph, "String");
        let param = |name: &str| GenericType::parameter(name);
        let one = || Multiplicity::PURE_ONE;
        let lambda = |parameters: Vec<GenericType>, returns: GenericType| {
            GenericType::of(function).with_type_arguments(vec![GenericType::function(FunctionType {
                parameters: parameters
                    .into_iter()
                    .map(|ty| Parameter::new(ty, one()))
                    .collect(),
                return_type: returns,
                return_multiplicity: one(),
            })])
        };

        let remove_duplicates = add_typed_function(
            &mut graph,
            "test",
            "removeDuplicates",
            vec![
                (param("T"), Multiplicity::ZERO_MANY),
                (lambda(vec![param("T")], param("V")), Multiplicity::ZERO_ONE),
                (lambda(vec![param("V"), param("V")], boolean.clone()), Multiplicity::ZERO_ONE),
            ],
            (param("T"), Multiplicity::ZERO_MANY),
        );
        add_typed_function(
            &mut graph,
            "test",
            "removeDuplicates",
            vec![(param("T"), Multiplicity::ZERO_MANY)],
            (param("T"), Multiplicity::ZERO_MANY),
        );

        let group = import_group(&mut graph, &["test"]);
        let with_lambdas = Call::new(
            "removeDuplicates",
            group,
            vec![
                Argument::new(string.clone(), Multiplicity::ZERO_MANY),
                Argument::new(lambda(vec![string.clone()], string.clone()), Multiplicity::ZERO_ONE),
                Argument::new(
                    lambda(vec![string.clone(), string.clone()], boolean),
                    Multiplicity::ZERO_ONE,
                ),
            ],
        );
        let bare = Call::new(
            "removeDuplicates",
            group,
            vec![
                Argument::new(string, Multiplicity::ZERO_MANY),
                Argument::new(GenericType::of(function), Multiplicity::ZERO_ONE),
                Argument::new(GenericType::of(function), Multiplicity::ZERO_ONE),
            ],
        );

        let options = MatchOptions::with_null_matching(NullMatching::Lenient);
        assert_eq!(
            resolve_call(&mut graph, &with_lambdas, options).unwrap(),
            Some(remove_duplicates)
        );
        assert_eq!(
            resolve_call(&mut graph, &bare, options).unwrap(),
            Some(remove_duplicates)
        );
    }

    #[test]
    fn test_call_signature_marks_missing_parts() {
        let mut graph = Graph::new();
        let one = argument(&graph, "Integer", Multiplicity::PURE_ONE);
        let call = call(&mut graph, "f", &[], vec![one, Argument::default()]);
        assert_eq!(call_signature(&graph, &call), "f(_:Integer[1], _:?[?])");
    }
}
