//! Matching value types against target types.
//!
//! A match is computed between a target (a parameter type) and a value (an
//! argument type). With `covariant` the value must be a subtype of the
//! target; otherwise the roles are swapped, as for function type parameters.

use plume_graph::{FunctionType, GenericType, Graph};
use plume_types::{
    match_multiplicity, FunctionTypeMatch, GenericTypeMatch, MatchBehavior, MatchError,
    NullMatchBehavior, ParameterMatchBehavior, TypeMatch,
};

use crate::error::ResolutionError;
use crate::linearize::{linearize, linearize_generic};
use crate::stub_resolver::resolve_generic_type;

/// Match a value generic type against a target generic type.
///
/// `Ok(None)` means the value does not match. A missing value is handled by
/// the null behaviour of `behavior`.
pub fn match_type(
    graph: &mut Graph,
    target: &GenericType,
    value: Option<&GenericType>,
    covariant: bool,
    behavior: MatchBehavior,
) -> Result<Option<GenericTypeMatch>, ResolutionError> {
    let Some(value) = value else {
        return match behavior.value_null {
            NullMatchBehavior::MatchAnything => Ok(Some(GenericTypeMatch::null())),
            NullMatchBehavior::MatchNothing => Ok(None),
            NullMatchBehavior::Error => Err(MatchError::NullValue("type").into()),
        };
    };

    let target = resolve_generic_type(graph, target)?;
    let value = resolve_generic_type(graph, value)?;
    if target == value {
        return Ok(Some(GenericTypeMatch::exact()));
    }

    if let Some(target_param) = &target.type_parameter {
        return match behavior.target_parameter {
            ParameterMatchBehavior::MatchAnything => Ok(Some(GenericTypeMatch::non_concrete())),
            ParameterMatchBehavior::MatchCautiously => {
                let matched = match &value.type_parameter {
                    Some(value_param) => value_param == target_param,
                    None if covariant => is_bottom(graph, &value),
                    None => is_top(graph, &value),
                };
                Ok(matched.then(GenericTypeMatch::non_concrete))
            }
            ParameterMatchBehavior::MatchNothing => Ok(None),
            ParameterMatchBehavior::Error => Err(MatchError::NonConcreteTarget {
                what: "type",
                printed: graph.print_generic_type(&target, true),
            }
            .into()),
        };
    }

    if value.type_parameter.is_some() {
        return match behavior.value_parameter {
            ParameterMatchBehavior::MatchAnything => Ok(Some(GenericTypeMatch::non_concrete())),
            ParameterMatchBehavior::MatchCautiously => {
                let matched = if covariant {
                    is_top(graph, &target)
                } else {
                    is_bottom(graph, &target)
                };
                Ok(matched.then(GenericTypeMatch::non_concrete))
            }
            ParameterMatchBehavior::MatchNothing => Ok(None),
            ParameterMatchBehavior::Error => Err(MatchError::NonConcreteValue {
                what: "type",
                printed: graph.print_generic_type(&value, true),
            }
            .into()),
        };
    }

    let Some(raw) = match_raw_type(graph, &target, &value, covariant, behavior)? else {
        return Ok(None);
    };

    let (sub, sup) = if covariant {
        (&value, &target)
    } else {
        (&target, &value)
    };
    if is_bottom(graph, sub) || is_top(graph, sup) {
        return Ok(Some(GenericTypeMatch::raw_only(raw)));
    }
    let Some(common_raw) = sup.raw_node() else {
        return Ok(Some(GenericTypeMatch::raw_only(raw)));
    };

    // View the subtype side as an instance of the supertype's raw type, so
    // that both sides carry arguments for the same parameters.
    let Some(view) = linearize_generic(graph, sub)?
        .into_iter()
        .find(|general| general.raw_node() == Some(common_raw))
    else {
        return Ok(None);
    };
    let (target, value) = if covariant {
        (target, view)
    } else {
        (view, value)
    };

    let data = graph.type_data(common_raw)?;
    let type_parameters = data.type_parameters.clone();
    let multiplicity_parameter_count = data.multiplicity_parameters.len();

    let mut type_arguments = Vec::new();
    if !target.type_arguments.is_empty() {
        if !value.type_arguments.is_empty()
            && value.type_arguments.len() != target.type_arguments.len()
        {
            return Ok(None);
        }
        for (index, target_argument) in target.type_arguments.iter().enumerate() {
            let argument_covariant = match type_parameters.get(index) {
                Some(param) if param.contravariant => !covariant,
                _ => covariant,
            };
            let value_argument = value.type_arguments.get(index);
            match match_type(graph, target_argument, value_argument, argument_covariant, behavior)? {
                Some(argument_match) => type_arguments.push(argument_match),
                None => return Ok(None),
            }
        }
    }

    let mut multiplicity_arguments = Vec::with_capacity(multiplicity_parameter_count);
    if !target.multiplicity_arguments.is_empty() {
        if !value.multiplicity_arguments.is_empty()
            && value.multiplicity_arguments.len() != target.multiplicity_arguments.len()
        {
            return Ok(None);
        }
        for (index, target_argument) in target.multiplicity_arguments.iter().enumerate() {
            let value_argument = value.multiplicity_arguments.get(index);
            match match_multiplicity(target_argument, value_argument, covariant, behavior)? {
                Some(argument_match) => multiplicity_arguments.push(argument_match),
                None => return Ok(None),
            }
        }
    }

    Ok(Some(GenericTypeMatch::new(
        raw,
        type_arguments,
        multiplicity_arguments,
    )))
}

/// Match the raw types of two concrete, resolved generic types.
fn match_raw_type(
    graph: &mut Graph,
    target: &GenericType,
    value: &GenericType,
    covariant: bool,
    behavior: MatchBehavior,
) -> Result<Option<TypeMatch>, ResolutionError> {
    if target.raw_type == value.raw_type {
        return Ok(Some(TypeMatch::Exact));
    }
    let (sup, sub) = if covariant {
        (target, value)
    } else {
        (value, target)
    };
    if is_bottom(graph, sub) {
        return Ok(Some(TypeMatch::Bottom));
    }

    if sup.function_type().is_some() {
        let (Some(target_function), Some(value_function)) =
            (target.function_type(), value.function_type())
        else {
            return Ok(None);
        };
        if target_function.same_signature(value_function) {
            return Ok(Some(TypeMatch::Exact));
        }
        return Ok(
            match_function_type(graph, target_function, value_function, covariant, behavior)?
                .map(|function_match| TypeMatch::Function(Box::new(function_match))),
        );
    }
    if sub.function_type().is_some() {
        return Ok(is_top(graph, sup).then_some(TypeMatch::Simple(1)));
    }

    let (Some(sup_raw), Some(sub_raw)) = (sup.raw_node(), sub.raw_node()) else {
        return Ok(None);
    };
    let linearization = linearize(graph, sub_raw)?;
    Ok(linearization
        .iter()
        .position(|general| *general == sup_raw)
        .and_then(|distance| u32::try_from(distance).ok())
        .map(TypeMatch::distance))
}

fn match_function_type(
    graph: &mut Graph,
    target: &FunctionType,
    value: &FunctionType,
    covariant: bool,
    behavior: MatchBehavior,
) -> Result<Option<FunctionTypeMatch>, ResolutionError> {
    if target.parameters.len() != value.parameters.len() {
        return Ok(None);
    }

    let mut parameter_types = Vec::with_capacity(target.parameters.len());
    let mut parameter_multiplicities = Vec::with_capacity(target.parameters.len());
    for (target_param, value_param) in target.parameters.iter().zip(&value.parameters) {
        let Some(type_match) = match_type(
            graph,
            &target_param.generic_type,
            Some(&value_param.generic_type),
            !covariant,
            behavior,
        )?
        else {
            return Ok(None);
        };
        let Some(multiplicity_match) = match_multiplicity(
            &target_param.multiplicity,
            Some(&value_param.multiplicity),
            !covariant,
            behavior,
        )?
        else {
            return Ok(None);
        };
        parameter_types.push(type_match);
        parameter_multiplicities.push(multiplicity_match);
    }

    let Some(return_type) = match_type(
        graph,
        &target.return_type,
        Some(&value.return_type),
        covariant,
        behavior,
    )?
    else {
        return Ok(None);
    };
    let Some(return_multiplicity) = match_multiplicity(
        &target.return_multiplicity,
        Some(&value.return_multiplicity),
        covariant,
        behavior,
    )?
    else {
        return Ok(None);
    };

    Ok(Some(FunctionTypeMatch {
        parameter_types,
        parameter_multiplicities,
        return_type,
        return_multiplicity,
    }))
}

fn is_top(graph: &Graph, ty: &GenericType) -> bool {
    ty.raw_node().is_some_and(|raw| graph.is_top_type(raw))
}

fn is_bottom(graph: &Graph, ty: &GenericType) -> bool {
    ty.raw_node().is_some_and(|raw| graph.is_bottom_type(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MatchOptions;
    use crate::test_support::*;
    use plume_graph::{Multiplicity, Parameter, TypeParameter};
    use plume_types::MultiplicityMatch;

    fn strict() -> MatchBehavior {
        MatchOptions::strict().behavior()
    }

    fn top_level(graph: &Graph, name: &str) -> GenericType {
        GenericType::of(graph.top_level(name).unwrap())
    }

    fn function_of(graph: &Graph, parameter: &str, result: &str) -> GenericType {
        GenericType::function(FunctionType {
            parameters: vec![Parameter::new(top_level(graph, parameter), Multiplicity::PURE_ONE)],
            return_type: top_level(graph, result),
            return_multiplicity: Multiplicity::PURE_ONE,
        })
    }

    #[test]
    fn test_identical_types_match_exactly() {
        let mut graph = Graph::new();
        let string = top_level(&graph, "String");
        let result = match_type(&mut graph, &string, Some(&string), true, strict()).unwrap();
        assert_eq!(result, Some(GenericTypeMatch::exact()));
    }

    #[test]
    fn test_subtype_distance() {
        let mut graph = Graph::new();
        let number = top_level(&graph, "Number");
        let integer = top_level(&graph, "Integer");
        let any = GenericType::of(graph.well_known().any);

        let to_number = match_type(&mut graph, &number, Some(&integer), true, strict()).unwrap();
        assert_eq!(to_number, Some(GenericTypeMatch::raw_only(TypeMatch::Simple(1))));
        let to_any = match_type(&mut graph, &any, Some(&integer), true, strict()).unwrap();
        assert_eq!(to_any, Some(GenericTypeMatch::raw_only(TypeMatch::Simple(2))));
        assert!(to_number < to_any);

        let backwards = match_type(&mut graph, &integer, Some(&number), true, strict()).unwrap();
        assert_eq!(backwards, None);
        let contravariant = match_type(&mut graph, &integer, Some(&number), false, strict()).unwrap();
        assert_eq!(contravariant, Some(GenericTypeMatch::raw_only(TypeMatch::Simple(1))));
    }

    #[test]
    fn test_bottom_matches_every_covariant_target() {
        let mut graph = Graph::new();
        let nil = GenericType::of(graph.well_known().nil);
        let string = top_level(&graph, "String");
        let result = match_type(&mut graph, &string, Some(&nil), true, strict()).unwrap();
        assert_eq!(result, Some(GenericTypeMatch::raw_only(TypeMatch::Bottom)));
    }

    #[test]
    fn test_null_value_behaviors() {
        let mut graph = Graph::new();
        let string = top_level(&graph, "String");
        assert_eq!(match_type(&mut graph, &string, None, true, strict()).unwrap(), None);
        assert_eq!(
            match_type(&mut graph, &string, None, true, MatchOptions::lenient().behavior()).unwrap(),
            Some(GenericTypeMatch::null())
        );
        assert_eq!(
            match_type(&mut graph, &string, None, true, MatchBehavior::default()),
            Err(ResolutionError::Match(MatchError::NullValue("type")))
        );
    }

    #[test]
    fn test_type_parameters() {
        let mut graph = Graph::new();
        let string = top_level(&graph, "String");
        let any = GenericType::of(graph.well_known().any);
        let param = GenericType::parameter("T");

        let anything = match_type(&mut graph, &param, Some(&string), true, strict()).unwrap();
        assert_eq!(anything, Some(GenericTypeMatch::non_concrete()));

        let to_any = match_type(&mut graph, &any, Some(&param), true, strict()).unwrap();
        assert_eq!(to_any, Some(GenericTypeMatch::non_concrete()));
        let to_string = match_type(&mut graph, &string, Some(&param), true, strict()).unwrap();
        assert_eq!(to_string, None);
    }

    #[test]
    fn test_function_types() {
        let mut graph = Graph::new();
        let any = GenericType::of(graph.well_known().any);
        let target = function_of(&graph, "Integer", "Number");
        let same = function_of(&graph, "Integer", "Number");
        let wider = function_of(&graph, "Number", "Integer");
        let unrelated = function_of(&graph, "Integer", "String");

        let exact = match_type(&mut graph, &target, Some(&same), true, strict()).unwrap();
        assert_eq!(exact, Some(GenericTypeMatch::exact()));

        let Some(GenericTypeMatch {
            raw: TypeMatch::Function(function_match),
            ..
        }) = match_type(&mut graph, &target, Some(&wider), true, strict()).unwrap()
        else {
            panic!("expected a function type match");
        };
        assert_eq!(
            function_match.parameter_types,
            vec![GenericTypeMatch::raw_only(TypeMatch::Simple(1))]
        );
        assert_eq!(function_match.return_type, GenericTypeMatch::raw_only(TypeMatch::Simple(1)));

        assert_eq!(match_type(&mut graph, &target, Some(&unrelated), true, strict()).unwrap(), None);

        let to_any = match_type(&mut graph, &any, Some(&target), true, strict()).unwrap();
        assert_eq!(to_any, Some(GenericTypeMatch::raw_only(TypeMatch::Simple(1))));
        let string = top_level(&graph, "String");
        assert_eq!(match_type(&mut graph, &string, Some(&target), true, strict()).unwrap(), None);
    }

    #[test]
    fn test_type_arguments_through_generalization() {
        let mut graph = Graph::new();
        let list = add_class(&mut graph, "test", "List", &[]);
        graph.type_data_mut(list).unwrap().type_parameters = vec![TypeParameter::new("T")];
        let sorted = add_class(&mut graph, "test", "SortedList", &[]);
        {
            let data = graph.type_data_mut(sorted).unwrap();
            data.type_parameters = vec![TypeParameter::new("U")];
            data.generalizations =
                vec![GenericType::of(list).with_type_arguments(vec![GenericType::parameter("U")])];
        }

        let list_of = |graph: &Graph, name: &str| {
            GenericType::of(list).with_type_arguments(vec![top_level(graph, name)])
        };
        let sorted_integers =
            GenericType::of(sorted).with_type_arguments(vec![top_level(&graph, "Integer")]);
        let numbers = list_of(&graph, "Number");
        let strings = list_of(&graph, "String");

        let result = match_type(&mut graph, &numbers, Some(&sorted_integers), true, strict()).unwrap();
        assert_eq!(
            result,
            Some(GenericTypeMatch::new(
                TypeMatch::Simple(1),
                vec![GenericTypeMatch::raw_only(TypeMatch::Simple(1))],
                vec![],
            ))
        );
        assert_eq!(
            match_type(&mut graph, &strings, Some(&sorted_integers), true, strict()).unwrap(),
            None
        );
    }

    #[test]
    fn test_contravariant_type_parameter_flips_direction() {
        let mut graph = Graph::new();
        let consumer = add_class(&mut graph, "test", "Consumer", &[]);
        graph.type_data_mut(consumer).unwrap().type_parameters =
            vec![TypeParameter::contravariant("T")];
        let of = |graph: &Graph, name: &str| {
            GenericType::of(consumer).with_type_arguments(vec![top_level(graph, name)])
        };
        let integers = of(&graph, "Integer");
        let numbers = of(&graph, "Number");

        assert!(match_type(&mut graph, &integers, Some(&numbers), true, strict())
            .unwrap()
            .is_some());
        assert_eq!(
            match_type(&mut graph, &numbers, Some(&integers), true, strict()).unwrap(),
            None
        );
    }

    #[test]
    fn test_missing_type_arguments_match_leniently() {
        let mut graph = Graph::new();
        let function = graph.well_known().function;
        let lambda = function_of(&graph, "String", "String");
        let target = GenericType::of(function).with_type_arguments(vec![lambda]);
        let bare = GenericType::of(function);

        assert_eq!(
            match_type(&mut graph, &target, Some(&bare), true, strict()).unwrap(),
            None
        );
        let lenient =
            match_type(&mut graph, &target, Some(&bare), true, MatchOptions::lenient().behavior())
                .unwrap()
                .unwrap();
        assert!(lenient.contains_null());
        assert_eq!(lenient.raw, TypeMatch::Exact);
    }

    #[test]
    fn test_multiplicity_arguments() {
        let mut graph = Graph::new();
        let holder = add_class(&mut graph, "test", "Holder", &[]);
        graph.type_data_mut(holder).unwrap().multiplicity_parameters = vec!["m".into()];
        let with = |mult: Multiplicity| GenericType::of(holder).with_multiplicity_arguments(vec![mult]);
        let many = with(Multiplicity::ZERO_MANY);
        let one = with(Multiplicity::PURE_ONE);

        let result = match_type(&mut graph, &many, Some(&one), true, strict()).unwrap();
        assert_eq!(
            result,
            Some(GenericTypeMatch::new(
                TypeMatch::Exact,
                vec![],
                vec![MultiplicityMatch::simple(u32::MAX, 1)],
            ))
        );
        assert_eq!(match_type(&mut graph, &one, Some(&many), true, strict()).unwrap(), None);
    }
}
