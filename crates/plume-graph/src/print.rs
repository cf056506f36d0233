//! Human-readable rendering of types and function signatures.

use plume_syntax::{parse_function_descriptor, push_id_segment};

use crate::error::GraphError;
use crate::generic_type::{FunctionType, GenericType, RawType};
use crate::graph::Graph;
use crate::node::{NodeId, NodeKind};
use crate::stub::{Resolution, StubKind};

impl Graph {
    /// Name of a raw type element, seeing through stubs without resolving them.
    pub fn raw_type_name(&self, id: NodeId, full_path: bool) -> String {
        let Ok(node) = self.node(id) else {
            return String::from("<removed>");
        };
        match &node.kind {
            NodeKind::Stub(stub) => match (stub.resolution, &stub.kind) {
                (Resolution::Resolved(target), _) => self.raw_type_name(target, full_path),
                (_, StubKind::Import { id_or_path, .. }) if !full_path => id_or_path
                    .rsplit("::")
                    .next()
                    .unwrap_or(id_or_path.as_str())
                    .to_string(),
                _ => stub.display_name().to_string(),
            },
            _ if full_path => self.user_path(id),
            _ => node.name.to_string(),
        }
    }

    /// Render a generic type: `Name<A, B|m>`, `{A[1]->B[*]}` or a parameter name.
    pub fn print_generic_type(&self, ty: &GenericType, full_paths: bool) -> String {
        let mut out = match (&ty.type_parameter, &ty.raw_type) {
            (Some(name), _) => return name.to_string(),
            (None, Some(RawType::Node(id))) => self.raw_type_name(*id, full_paths),
            (None, Some(RawType::Function(function_type))) => {
                return self.print_function_type(function_type, full_paths)
            }
            (None, None) => String::from("?"),
        };

        if !ty.type_arguments.is_empty() || !ty.multiplicity_arguments.is_empty() {
            out.push('<');
            let args: Vec<String> = ty
                .type_arguments
                .iter()
                .map(|arg| self.print_generic_type(arg, full_paths))
                .collect();
            out.push_str(&args.join(", "));
            if !ty.multiplicity_arguments.is_empty() {
                out.push('|');
                let mults: Vec<String> = ty
                    .multiplicity_arguments
                    .iter()
                    .map(|mult| {
                        let text = mult.to_string();
                        text.trim_start_matches('[').trim_end_matches(']').to_string()
                    })
                    .collect();
                out.push_str(&mults.join(", "));
            }
            out.push('>');
        }
        out
    }

    pub fn print_function_type(&self, function_type: &FunctionType, full_paths: bool) -> String {
        let params: Vec<String> = function_type
            .parameters
            .iter()
            .map(|param| {
                format!(
                    "{}{}",
                    self.print_generic_type(&param.generic_type, full_paths),
                    param.multiplicity
                )
            })
            .collect();
        format!(
            "{{{}->{}{}}}",
            params.join(", "),
            self.print_generic_type(&function_type.return_type, full_paths),
            function_type.return_multiplicity
        )
    }

    /// `pkg::name(String[1], Integer[*]):Boolean[1]`; functions in `Root` print without a package.
    pub fn function_descriptor(&self, id: NodeId) -> Result<String, GraphError> {
        let function = self.function(id)?;
        let node = self.node(id)?;

        let mut out = String::new();
        if let Some(package) = node.package.filter(|package| *package != self.root()) {
            out.push_str(&self.user_path(package));
            out.push_str("::");
        }
        out.push_str(&function.function_name);
        out.push('(');
        let params: Vec<String> = function
            .function_type
            .parameters
            .iter()
            .map(|param| {
                format!(
                    "{}{}",
                    self.print_generic_type(&param.generic_type, false),
                    param.multiplicity
                )
            })
            .collect();
        out.push_str(&params.join(", "));
        out.push_str("):");
        out.push_str(&self.print_generic_type(&function.function_type.return_type, false));
        out.push_str(&function.function_type.return_multiplicity.to_string());
        Ok(out)
    }

    /// The name under which a function with this signature is stored in its package.
    pub fn function_id(&self, function_name: &str, function_type: &FunctionType) -> String {
        let mut id = function_name.to_string();
        if function_type.parameters.is_empty() {
            id.push('_');
        }
        for param in &function_type.parameters {
            push_id_segment(
                &mut id,
                &self.id_type_name(&param.generic_type),
                &param.multiplicity.id_segment(),
            );
        }
        push_id_segment(
            &mut id,
            &self.id_type_name(&function_type.return_type),
            &function_type.return_multiplicity.id_segment(),
        );
        id
    }

    fn id_type_name(&self, ty: &GenericType) -> String {
        match (&ty.type_parameter, &ty.raw_type) {
            (Some(name), _) => name.to_string(),
            (None, Some(RawType::Node(id))) => self.raw_type_name(*id, false),
            (None, Some(RawType::Function(_))) => String::from("Function"),
            (None, None) => String::from("Any"),
        }
    }

    /// Find the function a descriptor names.
    ///
    /// Returns `Ok(None)` when the descriptor is well formed but nothing matches.
    pub fn function_by_descriptor(&self, descriptor: &str) -> Result<Option<NodeId>, GraphError> {
        let descriptor = parse_function_descriptor(descriptor)?;
        let package = match descriptor.package_path() {
            Some(path) => match self.find_by_path(path) {
                Some(package) => package,
                None => return Ok(None),
            },
            None => self.root(),
        };
        Ok(self.find_in_package(package, &descriptor.function_id()))
    }
}
